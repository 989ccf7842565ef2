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

use thiserror::Error;

/// Errors produced while validating a [`crate::config::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid reference name: {0}")]
    InvalidRefName(String),
    #[error("unsupported git version {0:?}, expected one of \"<1.8.2\", \"<2.8.0\", \"latest\"")]
    UnsupportedGitVersion(String),
    #[error("cannot have two prefix splits under the same destination: {0:?}")]
    DuplicatePrefixDestination(String),
}

/// Errors raised by the object-store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open repository at {path}")]
    Open {
        path: String,
        #[source]
        source: git2::Error,
    },
    #[error("failed to resolve {name:?}")]
    Resolve {
        name: String,
        #[source]
        source: git2::Error,
    },
    #[error("failed to start revwalk")]
    Revwalk(#[source] git2::Error),
    #[error(transparent)]
    Git(#[from] git2::Error),
}

/// Errors raised while projecting a commit's tree onto the configured
/// prefixes.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("cannot split as there is a merge conflict between two paths")]
    MergeConflict,
    #[error("unexpected tree entry kind at {0:?} while pruning excludes")]
    UnexpectedEntryKind(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by the persistent mapping cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("timed out acquiring the cache lock at {0:?}")]
    Timeout(std::path::PathBuf),
    #[error(transparent)]
    Sled(#[from] sled::Error),
}

/// The top-level error type returned by a split run.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("unable to create branch {0:?} as it is empty")]
    EmptyTarget(String),
    #[error("failed to update target reference {name:?}")]
    TargetUpdate {
        name: String,
        #[source]
        source: git2::Error,
    },
    #[error("failed to write commit")]
    CommitWrite(#[source] git2::Error),
}

pub type SplitResult<T> = Result<T, SplitError>;
