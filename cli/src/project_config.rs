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

//! Loads the optional JSON project file and merges it under command-line
//! flag precedence.

use std::path::Path;

use serde::Deserialize;
use subsplit_core::Prefix;

use crate::command_error::CommandError;

#[derive(Debug, Deserialize)]
struct ProjectPrefix {
    from: String,
    #[serde(default)]
    to: String,
    #[serde(default)]
    excludes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectFile {
    origin: Option<String>,
    target: Option<String>,
    #[serde(default)]
    prefixes: Vec<ProjectPrefix>,
    git_compat: Option<String>,
}

/// The file-provided defaults, already shaped as core types.
#[derive(Debug, Default)]
pub struct ProjectDefaults {
    pub origin: Option<String>,
    pub target: Option<String>,
    pub prefixes: Vec<Prefix>,
    pub git_compat: Option<String>,
}

/// Reads and parses `path` into [`ProjectDefaults`]. A missing file is
/// only an error when the caller explicitly requested one — this
/// function is only called when `path` is `Some`.
pub fn load(path: &Path) -> Result<ProjectDefaults, CommandError> {
    let text = std::fs::read_to_string(path).map_err(|source| CommandError::ProjectFile {
        path: path.display().to_string(),
        source,
    })?;
    let file: ProjectFile = serde_json::from_str(&text).map_err(|source| CommandError::ProjectFileParse {
        path: path.display().to_string(),
        source,
    })?;
    Ok(ProjectDefaults {
        origin: file.origin,
        target: file.target,
        prefixes: file
            .prefixes
            .into_iter()
            .map(|p| Prefix::new(p.from, p.to).with_excludes(p.excludes))
            .collect(),
        git_compat: file.git_compat,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_documented_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        std::fs::write(
            &path,
            r#"{
                "origin": "refs/heads/main",
                "target": "refs/heads/split",
                "prefixes": [{"from": "src/lib", "to": "", "excludes": ["vendor"]}],
                "git_compat": "latest"
            }"#,
        )
        .unwrap();

        let defaults = load(&path).unwrap();
        assert_eq!(defaults.origin.as_deref(), Some("refs/heads/main"));
        assert_eq!(defaults.target.as_deref(), Some("refs/heads/split"));
        assert_eq!(defaults.prefixes.len(), 1);
        assert_eq!(defaults.prefixes[0].from, "src/lib");
        assert!(defaults.prefixes[0].excludes.contains("vendor"));
        assert_eq!(defaults.git_compat.as_deref(), Some("latest"));
    }

    #[test]
    fn malformed_file_surfaces_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load(&path), Err(CommandError::ProjectFileParse { .. })));
    }

    #[test]
    fn missing_file_is_only_an_error_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(load(&path), Err(CommandError::ProjectFile { .. })));
    }
}
