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

use std::process::ExitCode;

use thiserror::Error;

/// Everything the CLI can fail with; always maps to exit code 1.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] subsplit_core::ConfigError),
    #[error(transparent)]
    Split(#[from] subsplit_core::SplitError),
    #[error(transparent)]
    Store(#[from] subsplit_core::StoreError),
    #[error("failed to read project file {path}")]
    ProjectFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed project file {path}")]
    ProjectFileParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to list refs on {url}")]
    RemoteList {
        url: String,
        #[source]
        source: subsplit_core::StoreError,
    },
    #[error("git push failed with status {0}")]
    PushFailed(std::process::ExitStatus),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CommandError {
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::FAILURE
    }
}
