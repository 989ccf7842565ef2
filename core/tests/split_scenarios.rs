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

use subsplit_core::{Config, Prefix, SplitError, Splitter};
use subsplit_testutils::{build_tree, commit, set_ref, TestRepo};

fn config(repo: &TestRepo, prefixes: Vec<Prefix>) -> Config {
    let mut config = Config::new(repo.path(), prefixes);
    config.origin = "refs/heads/main".to_string();
    config.target = Some("refs/heads/split".to_string());
    config
}

#[test]
fn s1_single_prefix_preserves_identity() {
    let test_repo = TestRepo::init();
    let repo = test_repo.open();
    let c1 = commit(&repo, &[("src/a.txt", "a")], &[], "c1");
    let c2 = commit(&repo, &[("src/a.txt", "a"), ("src/b.txt", "b"), ("docs/x.md", "x")], &[c1], "c2");
    set_ref(&repo, "refs/heads/main", c2);
    drop(repo);

    let config = config(&test_repo, vec![Prefix::new("src", "")]);
    let splitter = Splitter::new(config).unwrap();
    let head = splitter.split().unwrap();

    let repo = test_repo.open();
    let head_commit = repo.find_commit(head.to_git2()).unwrap();
    let tree = head_commit.tree().unwrap();
    assert_eq!(tree.len(), 2);
    assert!(tree.get_name("a.txt").is_some());
    assert!(tree.get_name("b.txt").is_some());
    assert_eq!(head_commit.parent_count(), 1);
}

#[test]
fn s2_rename_prefix_wraps_output() {
    let test_repo = TestRepo::init();
    let repo = test_repo.open();
    let c1 = commit(&repo, &[("src/a.txt", "a")], &[], "c1");
    let c2 = commit(&repo, &[("src/a.txt", "a"), ("src/b.txt", "b")], &[c1], "c2");
    set_ref(&repo, "refs/heads/main", c2);
    drop(repo);

    let config = config(&test_repo, vec![Prefix::new("src", "lib")]);
    let splitter = Splitter::new(config).unwrap();
    let head = splitter.split().unwrap();

    let repo = test_repo.open();
    let tree = repo.find_commit(head.to_git2()).unwrap().tree().unwrap();
    assert_eq!(tree.len(), 1);
    let lib_entry = tree.get_name("lib").unwrap();
    let lib_tree = repo.find_tree(lib_entry.id()).unwrap();
    assert_eq!(lib_tree.len(), 2);
}

#[test]
fn s3_merge_with_no_independent_history_collapses() {
    let test_repo = TestRepo::init();
    let repo = test_repo.open();
    let c1 = commit(&repo, &[("src/a.txt", "a")], &[], "c1");
    let c2 = commit(&repo, &[("src/a.txt", "a"), ("src/b.txt", "b"), ("docs/x.md", "x")], &[c1], "c2");
    let b1 = commit(&repo, &[("src/a.txt", "a"), ("src/b.txt", "b"), ("docs/x.md", "x changed")], &[c2], "b1");
    let merge = commit(&repo, &[("src/a.txt", "a"), ("src/b.txt", "b"), ("docs/x.md", "x changed")], &[c2, b1], "merge");
    set_ref(&repo, "refs/heads/main", merge);
    drop(repo);

    let config = config(&test_repo, vec![Prefix::new("src", "")]);
    let splitter = Splitter::new(config).unwrap();
    let result = splitter.result();
    splitter.split().unwrap();

    // c1, c2, b1, merge traversed; merge has no independent `src` history on
    // the b1 side (it only touched docs), so it collapses onto c2's image.
    assert_eq!(result.traversed(), 4);
    assert_eq!(result.created(), 2);
}

#[test]
fn s4_two_prefixes_merge_into_one_tree() {
    let test_repo = TestRepo::init();
    let repo = test_repo.open();
    let c1 = commit(&repo, &[("src/a.txt", "a")], &[], "c1");
    let c2 = commit(&repo, &[("src/a.txt", "a"), ("src/b.txt", "b"), ("docs/x.md", "x")], &[c1], "c2");
    set_ref(&repo, "refs/heads/main", c2);
    drop(repo);

    let config = config(
        &test_repo,
        vec![Prefix::new("src", "lib"), Prefix::new("docs", "doc")],
    );
    let splitter = Splitter::new(config).unwrap();
    let head = splitter.split().unwrap();

    let repo = test_repo.open();
    let tree = repo.find_commit(head.to_git2()).unwrap().tree().unwrap();
    assert_eq!(tree.len(), 2);
    let lib_tree = repo.find_tree(tree.get_name("lib").unwrap().id()).unwrap();
    assert_eq!(lib_tree.len(), 2);
    let doc_tree = repo.find_tree(tree.get_name("doc").unwrap().id()).unwrap();
    assert_eq!(doc_tree.len(), 1);
}

#[test]
fn s5_duplicate_destination_rejected_at_config_time() {
    let test_repo = TestRepo::init();
    let config = config(
        &test_repo,
        vec![Prefix::new("a", "x"), Prefix::new("b", "x")],
    );
    let err = Splitter::new(config).unwrap_err();
    assert!(matches!(err, SplitError::Config(_)));
}

#[test]
fn s6_scratch_resume_only_processes_new_commits() {
    let test_repo = TestRepo::init();
    let repo = test_repo.open();
    let c1 = commit(&repo, &[("src/a.txt", "a")], &[], "c1");
    let c2 = commit(&repo, &[("src/a.txt", "a"), ("src/b.txt", "b")], &[c1], "c2");
    set_ref(&repo, "refs/heads/main", c2);
    drop(repo);

    let first_head = Splitter::new(config(&test_repo, vec![Prefix::new("src", "")]))
        .unwrap()
        .split()
        .unwrap();

    let repo = test_repo.open();
    let c3 = commit(&repo, &[("src/a.txt", "a2"), ("src/b.txt", "b")], &[c2], "c3");
    set_ref(&repo, "refs/heads/main", c3);
    drop(repo);

    let splitter = Splitter::new(config(&test_repo, vec![Prefix::new("src", "")])).unwrap();
    let result = splitter.result();
    let second_head = splitter.split().unwrap();

    assert_eq!(result.traversed(), 1);
    assert_eq!(result.created(), 1);
    assert_ne!(first_head, second_head);
}

#[test]
fn cache_persists_across_reopened_handles() {
    let test_repo = TestRepo::init();
    let repo = test_repo.open();
    let c1 = commit(&repo, &[("src/a.txt", "a")], &[], "c1");
    set_ref(&repo, "refs/heads/main", c1);
    drop(repo);

    let cfg = config(&test_repo, vec![Prefix::new("src", "")]);
    let cache_key = cfg.validate().unwrap();
    let head = Splitter::new(cfg).unwrap().split().unwrap();

    let mut cache = subsplit_core::Cache::open(&test_repo.path().join(".git"), cache_key).unwrap();
    let input = subsplit_core::ObjectId::from_git2(c1);
    assert_eq!(cache.get(input).unwrap(), Some(head));
}

#[test]
fn build_tree_helper_supports_nested_multi_prefix_layout() {
    let test_repo = TestRepo::init();
    let repo = test_repo.open();
    let tree_id = build_tree(&repo, &[("src/a.txt", "a"), ("src/sub/b.txt", "b"), ("docs/x.md", "x")]);
    let tree = repo.find_tree(tree_id).unwrap();
    assert_eq!(tree.len(), 2);
}
