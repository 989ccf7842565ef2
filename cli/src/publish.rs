// Copyright 2024 The Subsplit Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A thin consumer of the core's public API: lists remote refs, runs one
//! split per selected ref, then shells out to `git push`.

use subsplit_core::{Config, GitCompat, Splitter, Store};
use tracing::info;

use crate::args::PublishArgs;
use crate::command_error::CommandError;
use crate::progress::ProgressTicker;

struct RefTarget {
    origin: String,
    target: String,
    commit: Option<String>,
}

pub fn run(args: &PublishArgs) -> Result<(), CommandError> {
    let prefixes = crate::args::parse_prefixes(&args.prefix)?;
    let git_compat = GitCompat::parse(&args.git)?;
    let store = Store::open(&args.path)?;

    let targets = select_targets(&store, args)?;
    for target in targets {
        let mut config = Config::new(&args.path, prefixes.clone());
        config.origin = target.origin.clone();
        config.target = Some(target.target.clone());
        config.commit = target.commit.clone();
        config.git_compat = git_compat;
        config.debug = args.debug;

        info!(origin = %target.origin, target = %target.target, "publishing ref");
        let splitter = Splitter::with_store(config, store.clone())?;
        let ticker = ProgressTicker::spawn(splitter.result(), args.progress);
        let head = splitter.split();
        ticker.stop();
        let head = head?;

        push(&args.push, head, &target.target)?;
    }
    Ok(())
}

fn select_targets(store: &Store, args: &PublishArgs) -> Result<Vec<RefTarget>, CommandError> {
    if args.heads || args.tags {
        let wanted_prefix = if args.heads { "refs/heads/" } else { "refs/tags/" };
        let refs = store.list_remote_refs(&args.push).map_err(|source| CommandError::RemoteList {
            url: args.push.clone(),
            source,
        })?;
        return Ok(refs
            .into_iter()
            .filter(|(name, _)| name.starts_with(wanted_prefix))
            .map(|(name, _)| RefTarget {
                origin: name.clone(),
                target: name,
                commit: None,
            })
            .collect());
    }

    args.refs.iter().map(|raw| parse_ref_flag(raw)).collect()
}

/// Parses `FROM[:TO][@COMMIT]`.
fn parse_ref_flag(raw: &str) -> Result<RefTarget, CommandError> {
    let (rest, commit) = match raw.split_once('@') {
        Some((rest, commit)) => (rest, Some(commit.to_string())),
        None => (raw, None),
    };
    let (from, to) = match rest.split_once(':') {
        Some((from, to)) => (from.to_string(), to.to_string()),
        None => (rest.to_string(), rest.to_string()),
    };
    Ok(RefTarget {
        origin: from,
        target: to,
        commit,
    })
}

fn push(url: &str, head: subsplit_core::ObjectId, target: &str) -> Result<(), CommandError> {
    let refspec = format!("{}:{target}", head.hex());
    let status = std::process::Command::new("git")
        .args(["push", url, &refspec])
        .status()?;
    if !status.success() {
        return Err(CommandError::PushFailed(status));
    }
    Ok(())
}
