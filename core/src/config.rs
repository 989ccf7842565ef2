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

//! Run configuration: prefixes, git-compatibility level and the
//! cache-key fingerprint derived from both.

use std::collections::HashSet;
use std::path::PathBuf;

use sha1::{Digest, Sha1};

use crate::error::ConfigError;

/// A single `from -> to` directory projection rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    pub from: String,
    pub to: String,
    pub excludes: HashSet<String>,
}

impl Prefix {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            excludes: HashSet::new(),
        }
    }

    pub fn with_excludes(mut self, excludes: impl IntoIterator<Item = String>) -> Self {
        self.excludes = excludes.into_iter().collect();
        self
    }
}

/// Simulated git-version compatibility level, selected via `--git`.
///
/// `Legacy` (<1.8.2) applies subject/body message normalization.
/// `PreMergeGuard` (<2.8.0) passes messages through verbatim.
/// `Latest` additionally enables the independent-history merge-preservation
/// rule in the commit rewriter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GitCompat {
    Legacy = 1,
    PreMergeGuard = 2,
    Latest = 3,
}

impl GitCompat {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "<1.8.2" => Ok(Self::Legacy),
            "<2.8.0" => Ok(Self::PreMergeGuard),
            "latest" => Ok(Self::Latest),
            other => Err(ConfigError::UnsupportedGitVersion(other.to_string())),
        }
    }

    fn fingerprint_component(self) -> &'static str {
        match self {
            Self::Legacy => "1",
            Self::PreMergeGuard => "2",
            Self::Latest => "3",
        }
    }
}

/// A 20-byte fingerprint identifying one cache bucket: a function of
/// `commit` (or the literal "oldest"), `git_compat`, and the ordered
/// `(from, to)` pairs. Exclusions are deliberately excluded from this
/// hash — see the design notes on cache-key sensitivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 20]);

impl CacheKey {
    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hex())
    }
}

/// The immutable input to a split run.
#[derive(Debug, Clone)]
pub struct Config {
    pub repo_path: PathBuf,
    pub origin: String,
    pub commit: Option<String>,
    pub target: Option<String>,
    pub prefixes: Vec<Prefix>,
    pub git_compat: GitCompat,
    pub debug: bool,
    pub scratch: bool,
}

impl Config {
    pub fn new(repo_path: impl Into<PathBuf>, prefixes: Vec<Prefix>) -> Self {
        Self {
            repo_path: repo_path.into(),
            origin: "HEAD".to_string(),
            commit: None,
            target: None,
            prefixes,
            git_compat: GitCompat::Latest,
            debug: false,
            scratch: false,
        }
    }

    /// Validates the configuration and computes its [`CacheKey`]. Does not
    /// touch the repository; reference-name validity against git's syntax
    /// rules is checked with `git2::Reference::is_valid_name`.
    pub fn validate(&self) -> Result<CacheKey, ConfigError> {
        if !git2::Reference::is_valid_name(&self.origin) && self.origin != "HEAD" {
            return Err(ConfigError::InvalidRefName(self.origin.clone()));
        }
        if let Some(target) = &self.target {
            if !git2::Reference::is_valid_name(target) {
                return Err(ConfigError::InvalidRefName(target.clone()));
            }
        }
        let mut seen_destinations = HashSet::new();
        for prefix in &self.prefixes {
            if !seen_destinations.insert(prefix.to.clone()) {
                return Err(ConfigError::DuplicatePrefixDestination(prefix.to.clone()));
            }
        }
        Ok(self.cache_key())
    }

    fn cache_key(&self) -> CacheKey {
        let mut hasher = Sha1::new();
        match &self.commit {
            Some(commit) => hasher.update(commit.as_bytes()),
            None => hasher.update(b"oldest"),
        }
        hasher.update(b"\0");
        hasher.update(self.git_compat.fingerprint_component().as_bytes());
        for prefix in &self.prefixes {
            hasher.update(b"\0");
            hasher.update(prefix.from.as_bytes());
            hasher.update(b"\0");
            hasher.update(prefix.to.as_bytes());
        }
        let digest = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest);
        CacheKey(bytes)
    }

    /// `true` when there is exactly one prefix with an empty destination
    /// and no excludes — the tree-projector fast path.
    pub fn simple_prefix(&self) -> Option<&str> {
        match self.prefixes.as_slice() {
            [only] if only.to.is_empty() && only.excludes.is_empty() => Some(only.from.as_str()),
            _ => None,
        }
    }
}
