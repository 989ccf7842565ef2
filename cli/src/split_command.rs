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

use subsplit_core::{Config, GitCompat, Splitter};

use crate::args::{parse_prefixes, SplitArgs};
use crate::command_error::CommandError;
use crate::progress::ProgressTicker;
use crate::project_config;

/// Builds a `Config` from the parsed flags, merged with an optional JSON
/// project file under flag precedence, runs the splitter, and returns
/// the resulting head oid as a hex string.
pub fn run(args: &SplitArgs) -> Result<String, CommandError> {
    let defaults = match &args.project {
        Some(path) => Some(project_config::load(path)?),
        None => None,
    };

    let prefixes = if args.prefix.is_empty() {
        defaults.as_ref().map(|d| d.prefixes.clone()).unwrap_or_default()
    } else {
        parse_prefixes(&args.prefix)?
    };

    let origin = defaults
        .as_ref()
        .and_then(|d| d.origin.clone())
        .filter(|_| args.origin == "HEAD")
        .unwrap_or_else(|| args.origin.clone());

    let target = args.target.clone().or_else(|| defaults.as_ref().and_then(|d| d.target.clone()));

    let git_version = defaults
        .as_ref()
        .and_then(|d| d.git_compat.clone())
        .filter(|_| args.git == "latest")
        .unwrap_or_else(|| args.git.clone());

    let mut config = Config::new(&args.path, prefixes);
    config.origin = origin;
    config.target = target;
    config.commit = args.commit.clone();
    config.git_compat = GitCompat::parse(&git_version)?;
    config.debug = args.debug;
    config.scratch = args.scratch;

    let splitter = Splitter::new(config)?;
    let ticker = ProgressTicker::spawn(splitter.result(), args.progress);
    let head = splitter.split();
    ticker.stop();
    Ok(head?.hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> SplitArgs {
        SplitArgs {
            prefix: vec![],
            project: None,
            origin: "HEAD".to_string(),
            target: None,
            commit: None,
            scratch: false,
            debug: false,
            git: "latest".to_string(),
            progress: false,
            path: ".".into(),
        }
    }

    #[test]
    fn explicit_prefix_flags_win_over_the_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let project_path = dir.path().join("project.json");
        std::fs::write(
            &project_path,
            r#"{"prefixes": [{"from": "ignored", "to": ""}]}"#,
        )
        .unwrap();

        let mut args = base_args();
        args.project = Some(project_path);
        args.prefix = vec!["src:lib".to_string()];

        let defaults = project_config::load(args.project.as_ref().unwrap()).unwrap();
        let prefixes = if args.prefix.is_empty() {
            defaults.prefixes
        } else {
            parse_prefixes(&args.prefix).unwrap()
        };
        assert_eq!(prefixes.len(), 1);
        assert_eq!(prefixes[0].from, "src");
        assert_eq!(prefixes[0].to, "lib");
    }
}
