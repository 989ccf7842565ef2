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

//! Thin adapter over a content-addressed git object store.
//!
//! Every operation that mutates shared libgit2 state (revwalk creation,
//! tree/commit writes) is serialized under [`Store`]'s internal mutex, so
//! a caller can share one [`Store`] with an external agent (e.g. a
//! fetcher) without corrupting libgit2's internal state.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::StoreError;
use crate::object_id::ObjectId;

/// A commit read back from the store.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub id: ObjectId,
    pub parent_ids: Vec<ObjectId>,
    pub tree_id: ObjectId,
    pub author: Signature,
    pub committer: Signature,
    pub raw_message: Vec<u8>,
    pub message: String,
}

/// An author/committer signature: name, email and a git `when`.
#[derive(Debug, Clone)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub when: git2::Time,
}

impl Signature {
    fn from_git2(sig: &git2::Signature<'_>) -> Self {
        Self {
            name: sig.name().unwrap_or("").to_string(),
            email: sig.email().unwrap_or("").to_string(),
            when: sig.when(),
        }
    }

    /// Builds a `git2::Signature`, substituting `nobody@example.com` for
    /// an empty email as required by the output commit rules.
    fn to_git2(&self) -> Result<git2::Signature<'static>, git2::Error> {
        let email = if self.email.is_empty() {
            "nobody@example.com"
        } else {
            &self.email
        };
        git2::Signature::new(&self.name, email, &self.when)
    }
}

/// One entry of a tree, as seen by the projector.
#[derive(Debug, Clone, Copy)]
pub struct TreeEntry {
    pub id: ObjectId,
    pub filemode: i32,
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Tree,
    Blob,
    Commit,
    Other,
}

const TREE_FILEMODE: i32 = 0o040000;

/// Shared handle to an on-disk git repository, guarded by a mutex so it
/// can be handed to cooperating external callers.
#[derive(Clone)]
pub struct Store {
    repo: Arc<Mutex<git2::Repository>>,
    path: PathBuf,
}

impl Store {
    /// Opens an on-disk repository. Fails if `path` is not a repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let repo = git2::Repository::open(&path).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let git_dir = repo.path().to_path_buf();
        Ok(Self {
            repo: Arc::new(Mutex::new(repo)),
            path: git_dir,
        })
    }

    /// Wraps an already-open repository, e.g. one shared by a caller that
    /// also needs to fetch into it concurrently.
    pub fn from_repository(repo: git2::Repository) -> Self {
        let path = repo.path().to_path_buf();
        Self {
            repo: Arc::new(Mutex::new(repo)),
            path,
        }
    }

    /// Directory to place `splitsh.db` in: the git directory, or the
    /// repository root itself for a bare repository.
    pub fn state_dir(&self) -> PathBuf {
        self.path.clone()
    }

    fn lock(&self) -> MutexGuard<'_, git2::Repository> {
        self.repo.lock().expect("git repository mutex poisoned")
    }

    /// Resolves `name` to its target object and fully-qualified reference
    /// name, when `name` is a reference.
    pub fn revparse_ext(&self, name: &str) -> Result<(ObjectId, Option<String>), StoreError> {
        let repo = self.lock();
        let (object, reference) =
            repo.revparse_ext(name).map_err(|source| StoreError::Resolve {
                name: name.to_string(),
                source,
            })?;
        let ref_name = reference.and_then(|r| r.name().map(str::to_string));
        Ok((ObjectId::from_git2(object.id()), ref_name))
    }

    pub fn revparse_single(&self, name: &str) -> Result<ObjectId, StoreError> {
        let repo = self.lock();
        let object = repo
            .revparse_single(name)
            .map_err(|source| StoreError::Resolve {
                name: name.to_string(),
                source,
            })?;
        Ok(ObjectId::from_git2(object.id()))
    }

    pub fn reference_create(
        &self,
        name: &str,
        target: ObjectId,
        force: bool,
    ) -> Result<(), StoreError> {
        let repo = self.lock();
        repo.reference(name, target.to_git2(), force, "subsplit: update target")?;
        Ok(())
    }

    pub fn reference_set_target(&self, name: &str, target: ObjectId) -> Result<(), StoreError> {
        let repo = self.lock();
        let mut reference = repo.find_reference(name)?;
        reference.set_target(target.to_git2(), "subsplit: update target")?;
        Ok(())
    }

    pub fn reference_exists(&self, name: &str) -> bool {
        let repo = self.lock();
        let exists = repo.find_reference(name).is_ok();
        exists
    }

    pub fn delete_local_branch(&self, name: &str) -> Result<(), StoreError> {
        let repo = self.lock();
        let result = match repo.find_branch(name, git2::BranchType::Local) {
            Ok(mut branch) => {
                branch.delete()?;
                Ok(())
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        };
        result
    }

    /// Collects a revwalk range into an ordered, owned commit-id stream.
    /// Sorted topological + reverse (oldest first) as required by the
    /// traversal driver.
    pub fn walk_range(&self, from_exclusive: Option<ObjectId>, to: ObjectId) -> Result<Vec<ObjectId>, StoreError> {
        match from_exclusive {
            Some(from) => self.walk_push_range(&format!("{}..{}", from.hex(), to.hex())),
            None => self.walk_push_range(&to.hex()),
        }
    }

    /// Full walk from a single starting point, same sort order.
    pub fn walk_from(&self, start: ObjectId) -> Result<Vec<ObjectId>, StoreError> {
        self.walk_range(None, start)
    }

    /// Collects a revwalk described by a literal git range expression
    /// (e.g. `"A..B"`, `"A^..B"`, or a single oid to walk from).
    pub fn walk_push_range(&self, range_expr: &str) -> Result<Vec<ObjectId>, StoreError> {
        let repo = self.lock();
        let mut walk = repo.revwalk().map_err(StoreError::Revwalk)?;
        walk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)?;
        if range_expr.contains("..") {
            walk.push_range(range_expr)?;
        } else {
            let oid = git2::Oid::from_str(range_expr).map_err(StoreError::from)?;
            walk.push(oid)?;
        }
        walk.map(|r| r.map(ObjectId::from_git2).map_err(StoreError::from))
            .collect()
    }

    pub fn lookup_commit(&self, id: ObjectId) -> Result<CommitInfo, StoreError> {
        let repo = self.lock();
        let commit = repo.find_commit(id.to_git2())?;
        let parent_ids = commit.parent_ids().map(ObjectId::from_git2).collect();
        let tree_id = ObjectId::from_git2(commit.tree_id());
        let raw_message = commit.message_raw_bytes().to_vec();
        let message = commit.message().unwrap_or_default().to_string();
        let author = Signature::from_git2(&commit.author());
        let committer = Signature::from_git2(&commit.committer());
        let result = Ok(CommitInfo {
            id,
            parent_ids,
            tree_id,
            author,
            committer,
            raw_message,
            message,
        });
        result
    }

    pub fn lookup_commit_tree(&self, id: ObjectId) -> Result<ObjectId, StoreError> {
        let repo = self.lock();
        let commit = repo.find_commit(id.to_git2())?;
        Ok(ObjectId::from_git2(commit.tree_id()))
    }

    /// Looks up `path` inside the tree `tree_id`. `path == ""` returns the
    /// tree itself.
    pub fn tree_entry_by_path(
        &self,
        tree_id: ObjectId,
        path: &str,
    ) -> Result<Option<TreeEntry>, StoreError> {
        let repo = self.lock();
        if path.is_empty() {
            return Ok(Some(TreeEntry {
                id: tree_id,
                filemode: TREE_FILEMODE,
                kind: EntryKind::Tree,
            }));
        }
        let tree = repo.find_tree(tree_id.to_git2())?;
        match tree.get_path(Path::new(path)) {
            Ok(entry) => Ok(Some(TreeEntry {
                id: ObjectId::from_git2(entry.id()),
                filemode: entry.filemode(),
                kind: entry_kind(entry.kind()),
            })),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Top-level entries of a tree, in tree order.
    pub fn tree_entries(&self, tree_id: ObjectId) -> Result<Vec<(String, TreeEntry)>, StoreError> {
        let repo = self.lock();
        let tree = repo.find_tree(tree_id.to_git2())?;
        let mut entries = Vec::with_capacity(tree.len());
        for entry in tree.iter() {
            let name = entry.name().unwrap_or_default().to_string();
            entries.push((
                name,
                TreeEntry {
                    id: ObjectId::from_git2(entry.id()),
                    filemode: entry.filemode(),
                    kind: entry_kind(entry.kind()),
                },
            ));
        }
        Ok(entries)
    }

    /// Builds a tree from `(name, entry)` pairs in a single libgit2
    /// treebuilder pass.
    pub fn build_tree(&self, entries: &[(String, TreeEntry)]) -> Result<ObjectId, StoreError> {
        let repo = self.lock();
        let mut builder = repo.treebuilder(None)?;
        for (name, entry) in entries {
            builder.insert(name, entry.id.to_git2(), entry.filemode)?;
        }
        let oid = builder.write()?;
        Ok(ObjectId::from_git2(oid))
    }

    /// Wraps `inner` under a chain of single-entry directories, one per
    /// `/`-separated segment of `to`, innermost first.
    pub fn wrap_tree(&self, to: &str, inner: ObjectId) -> Result<ObjectId, StoreError> {
        let repo = self.lock();
        let mut current = inner;
        for segment in to.rsplit('/').filter(|s| !s.is_empty()) {
            let mut builder = repo.treebuilder(None)?;
            builder.insert(segment, current.to_git2(), TREE_FILEMODE)?;
            current = ObjectId::from_git2(builder.write()?);
        }
        Ok(current)
    }

    /// Three-way merges `t1` and `t2` against an empty ancestor, so every
    /// entry on either side is treated as new. Returns `None` on conflict.
    pub fn merge_trees_no_base(
        &self,
        t1: ObjectId,
        t2: ObjectId,
    ) -> Result<Option<ObjectId>, StoreError> {
        let repo = self.lock();
        let tree1 = repo.find_tree(t1.to_git2())?;
        let tree2 = repo.find_tree(t2.to_git2())?;
        let empty_tree_id = repo.treebuilder(None)?.write()?;
        let empty_tree = repo.find_tree(empty_tree_id)?;
        let mut index = repo.merge_trees(&empty_tree, &tree1, &tree2, None)?;
        if index.has_conflicts() {
            return Ok(None);
        }
        let oid = index.write_tree_to(&repo)?;
        Ok(Some(ObjectId::from_git2(oid)))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_commit(
        &self,
        author: &Signature,
        committer: &Signature,
        message: &str,
        tree: ObjectId,
        parents: &[ObjectId],
    ) -> Result<ObjectId, StoreError> {
        let repo = self.lock();
        let git_tree = repo.find_tree(tree.to_git2())?;
        let git_parents: Vec<git2::Commit> = parents
            .iter()
            .map(|id| repo.find_commit(id.to_git2()))
            .collect::<Result<_, _>>()?;
        let parent_refs: Vec<&git2::Commit> = git_parents.iter().collect();
        let git_author = author.to_git2()?;
        let git_committer = committer.to_git2()?;
        let oid = repo.commit(
            None,
            &git_author,
            &git_committer,
            message,
            &git_tree,
            &parent_refs,
        )?;
        Ok(ObjectId::from_git2(oid))
    }

    /// Lists remote heads/tags without fetching, for the publish driver.
    pub fn list_remote_refs(&self, url: &str) -> Result<Vec<(String, ObjectId)>, StoreError> {
        let repo = self.lock();
        let mut remote = repo.remote_anonymous(url)?;
        remote.connect(git2::Direction::Fetch)?;
        let heads = remote
            .list()?
            .iter()
            .map(|head| (head.name().to_string(), ObjectId::from_git2(head.oid())))
            .collect();
        remote.disconnect()?;
        Ok(heads)
    }
}

fn entry_kind(kind: Option<git2::ObjectType>) -> EntryKind {
    match kind {
        Some(git2::ObjectType::Tree) => EntryKind::Tree,
        Some(git2::ObjectType::Blob) => EntryKind::Blob,
        Some(git2::ObjectType::Commit) => EntryKind::Commit,
        _ => EntryKind::Other,
    }
}

pub fn reference_name_is_valid(name: &str) -> bool {
    git2::Reference::is_valid_name(name)
}
