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

//! Turns a projected tree plus its new-parent images into an output
//! commit, reusing a parent outright when nothing changed.

use itertools::Itertools;

use crate::config::GitCompat;
use crate::error::{ProjectionError, StoreError};
use crate::message::normalize_legacy;
use crate::object_id::ObjectId;
use crate::store::{CommitInfo, Store};

/// The result of rewriting one commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rewritten {
    pub id: ObjectId,
    pub created: bool,
}

/// Rewrites `commit`, whose tree has already been projected to
/// `projected_tree`, given the deduplicated images of its kept parents.
pub fn rewrite(
    store: &Store,
    git_compat: GitCompat,
    commit: &CommitInfo,
    new_parents: &[ObjectId],
    projected_tree: ObjectId,
) -> Result<Rewritten, ProjectionError> {
    let kept_parents = dedup_resolvable(store, new_parents)?;

    let mut identical = None;
    let mut non_identical = None;
    for &parent in &kept_parents {
        let parent_tree = store.lookup_commit_tree(parent)?;
        if parent_tree == projected_tree {
            identical = Some(parent);
        } else {
            non_identical = Some(parent);
        }
    }

    let copy_commit = if git_compat >= GitCompat::Latest {
        match (identical, non_identical) {
            (Some(a), Some(b)) => !store.walk_range(Some(a), b)?.is_empty(),
            _ => false,
        }
    } else {
        false
    };

    if let (Some(reuse), false) = (identical, copy_commit) {
        return Ok(Rewritten {
            id: reuse,
            created: false,
        });
    }

    let message = if git_compat == GitCompat::Legacy {
        normalize_legacy(&commit.message)
    } else {
        String::from_utf8_lossy(&commit.raw_message).into_owned()
    };

    let new_id = store.create_commit(
        &commit.author,
        &commit.committer,
        &message,
        projected_tree,
        &kept_parents,
    )?;
    Ok(Rewritten {
        id: new_id,
        created: true,
    })
}

/// Deduplicates `parents` preserving first-occurrence order, dropping any
/// whose top tree cannot be resolved.
fn dedup_resolvable(store: &Store, parents: &[ObjectId]) -> Result<Vec<ObjectId>, StoreError> {
    Ok(parents
        .iter()
        .copied()
        .unique()
        .filter(|parent| store.lookup_commit_tree(*parent).is_ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        let ids: Vec<ObjectId> = (1u8..=3).map(|b| ObjectId::from_bytes(&[b; 20])).collect();
        let duplicated = vec![ids[0], ids[1], ids[0], ids[2], ids[1]];
        let mut seen = std::collections::HashSet::new();
        let unique: Vec<_> = duplicated.into_iter().filter(|id| seen.insert(*id)).collect();
        assert_eq!(unique, ids);
    }
}
