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

//! Hermetic, disposable git repositories for exercising the splitting
//! engine against real libgit2-written commit graphs.

use std::path::Path;
use std::sync::Once;

use tempfile::TempDir;

/// Isolates libgit2 from the host's `~/.gitconfig`/system config so tests
/// behave the same on any machine.
pub fn hermetic_libgit2() {
    static CONFIGURE_GIT2: Once = Once::new();
    CONFIGURE_GIT2.call_once(|| unsafe {
        git2::opts::set_search_path(git2::ConfigLevel::System, "").unwrap();
        git2::opts::set_search_path(git2::ConfigLevel::Global, "").unwrap();
        git2::opts::set_search_path(git2::ConfigLevel::XDG, "").unwrap();
        git2::opts::set_search_path(git2::ConfigLevel::ProgramData, "").unwrap();
    });
}

/// A throwaway on-disk repository, deleted when dropped.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn init() -> Self {
        hermetic_libgit2();
        let dir = tempfile::Builder::new().prefix("subsplit-test-").tempdir().unwrap();
        git2::Repository::init(dir.path()).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn open(&self) -> git2::Repository {
        git2::Repository::open(self.path()).unwrap()
    }
}

fn test_signature() -> git2::Signature<'static> {
    git2::Signature::new("Test User", "test.user@example.com", &git2::Time::new(1_700_000_000, 0)).unwrap()
}

/// Writes `contents` as a blob at each `(path, contents)` pair, building
/// the intermediate trees, and commits the result with `parents`.
/// Returns the new commit id.
pub fn commit(repo: &git2::Repository, files: &[(&str, &str)], parents: &[git2::Oid], message: &str) -> git2::Oid {
    let tree_id = build_tree(repo, files);
    let tree = repo.find_tree(tree_id).unwrap();
    let parent_commits: Vec<git2::Commit> = parents.iter().map(|id| repo.find_commit(*id).unwrap()).collect();
    let parent_refs: Vec<&git2::Commit> = parent_commits.iter().collect();
    let sig = test_signature();
    repo.commit(None, &sig, &sig, message, &tree, &parent_refs).unwrap()
}

/// Builds a tree from `(path, contents)` pairs, creating nested
/// directories for `/`-separated paths. Returns the root tree's id.
pub fn build_tree(repo: &git2::Repository, files: &[(&str, &str)]) -> git2::Oid {
    let mut layout: std::collections::BTreeMap<&str, Vec<(&str, &str)>> = std::collections::BTreeMap::new();
    for &(path, contents) in files {
        match path.split_once('/') {
            Some((dir, rest)) => layout.entry(dir).or_default().push((rest, contents)),
            None => layout.entry("").or_default().push((path, contents)),
        }
    }

    let mut builder = repo.treebuilder(None).unwrap();
    if let Some(top_files) = layout.remove("") {
        for (name, contents) in top_files {
            let blob_id = repo.blob(contents.as_bytes()).unwrap();
            builder.insert(name, blob_id, 0o100644).unwrap();
        }
    }
    for (dir, nested) in layout {
        let sub_tree_id = build_tree(repo, &nested);
        builder.insert(dir, sub_tree_id, 0o040000).unwrap();
    }
    builder.write().unwrap()
}

/// Creates `name` pointing at `target`, overwriting any existing ref.
pub fn set_ref(repo: &git2::Repository, name: &str, target: git2::Oid) {
    repo.reference(name, target, true, "test setup").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_tree_nests_directories_by_path() {
        let test_repo = TestRepo::init();
        let repo = test_repo.open();
        let tree_id = build_tree(&repo, &[("src/a.txt", "a"), ("docs/x.md", "x"), ("top.txt", "top")]);
        let tree = repo.find_tree(tree_id).unwrap();
        assert_eq!(tree.len(), 3);
        let src = tree.get_name("src").unwrap();
        assert_eq!(src.kind(), Some(git2::ObjectType::Tree));
    }

    #[test]
    fn commit_chains_onto_its_parents() {
        let test_repo = TestRepo::init();
        let repo = test_repo.open();
        let c1 = commit(&repo, &[("src/a.txt", "a")], &[], "first");
        let c2 = commit(&repo, &[("src/a.txt", "a"), ("src/b.txt", "b")], &[c1], "second");
        let commit2 = repo.find_commit(c2).unwrap();
        assert_eq!(commit2.parent_count(), 1);
        assert_eq!(commit2.parent_id(0).unwrap(), c1);
    }
}
