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

use clap::{Parser, Subcommand};

use crate::command_error::CommandError;

#[derive(Parser, Debug)]
#[command(name = "subsplit", version, about = "Split a directory prefix's history into its own branch")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split one branch's history onto the configured prefixes.
    Split(SplitArgs),
    /// Split and push several remote refs in one pass.
    Publish(PublishArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct SplitArgs {
    /// A `FROM[:TO]` projection rule; repeatable.
    #[arg(long = "prefix", value_name = "FROM[:TO]")]
    pub prefix: Vec<String>,

    /// Optional JSON project file providing defaults for the flags below.
    #[arg(long)]
    pub project: Option<std::path::PathBuf>,

    #[arg(long, default_value = "HEAD")]
    pub origin: String,

    #[arg(long)]
    pub target: Option<String>,

    #[arg(long)]
    pub commit: Option<String>,

    #[arg(long)]
    pub scratch: bool,

    #[arg(long)]
    pub debug: bool,

    #[arg(long, default_value = "latest", value_name = "<1.8.2|<2.8.0|latest>")]
    pub git: String,

    #[arg(long)]
    pub progress: bool,

    #[arg(long, default_value = ".")]
    pub path: std::path::PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct PublishArgs {
    #[arg(long = "push", value_name = "URL")]
    pub push: String,

    #[arg(long, conflicts_with_all = ["tags", "refs"])]
    pub heads: bool,

    #[arg(long, conflicts_with_all = ["heads", "refs"])]
    pub tags: bool,

    #[arg(long = "ref", value_name = "FROM[:TO][@COMMIT]", conflicts_with_all = ["heads", "tags"])]
    pub refs: Vec<String>,

    #[arg(long = "prefix", value_name = "FROM[:TO]")]
    pub prefix: Vec<String>,

    #[arg(long, default_value = "latest", value_name = "<1.8.2|<2.8.0|latest>")]
    pub git: String,

    #[arg(long)]
    pub progress: bool,

    #[arg(long)]
    pub debug: bool,

    #[arg(long, default_value = ".")]
    pub path: std::path::PathBuf,
}

/// Splits `FROM[:TO]` into its source and destination halves, `TO`
/// defaulting to empty (root) when absent.
pub fn parse_prefix_flag(raw: &str) -> subsplit_core::Prefix {
    match raw.split_once(':') {
        Some((from, to)) => subsplit_core::Prefix::new(from, to),
        None => subsplit_core::Prefix::new(raw, ""),
    }
}

pub fn parse_prefixes(raw: &[String]) -> Result<Vec<subsplit_core::Prefix>, CommandError> {
    let prefixes: Vec<_> = raw.iter().map(|p| parse_prefix_flag(p)).collect();
    let mut seen = std::collections::HashSet::new();
    for prefix in &prefixes {
        if !seen.insert(prefix.to.clone()) {
            return Err(CommandError::Config(subsplit_core::ConfigError::DuplicatePrefixDestination(
                prefix.to.clone(),
            )));
        }
    }
    Ok(prefixes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_flag_splits_once_on_colon() {
        let prefix = parse_prefix_flag("src:lib/core");
        assert_eq!(prefix.from, "src");
        assert_eq!(prefix.to, "lib/core");
    }

    #[test]
    fn prefix_flag_without_colon_targets_root() {
        let prefix = parse_prefix_flag("src");
        assert_eq!(prefix.from, "src");
        assert_eq!(prefix.to, "");
    }

    #[test]
    fn duplicate_destinations_are_rejected_before_the_core_runs() {
        let err = parse_prefixes(&["a:x".to_string(), "b:x".to_string()]).unwrap_err();
        assert!(matches!(err, CommandError::Config(_)));
    }
}
