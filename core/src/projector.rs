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

//! Projects an input commit's tree onto the configured prefixes.

use tracing::trace;

use crate::config::{Config, Prefix};
use crate::error::ProjectionError;
use crate::object_id::ObjectId;
use crate::store::{EntryKind, Store};

/// Projects `tree_id` according to `config`. `Ok(None)` means no prefix
/// contributed — the commit is absent from the output.
pub fn project(store: &Store, config: &Config, tree_id: ObjectId) -> Result<Option<ObjectId>, ProjectionError> {
    if let Some(from) = config.simple_prefix() {
        return Ok(store.tree_entry_by_path(tree_id, from)?.and_then(|entry| {
            (entry.kind == EntryKind::Tree).then_some(entry.id)
        }));
    }

    let mut current: Option<ObjectId> = None;
    for prefix in &config.prefixes {
        let Some(contribution) = project_one(store, prefix, tree_id)? else {
            continue;
        };
        current = Some(match current {
            None => contribution,
            Some(existing) => match store.merge_trees_no_base(existing, contribution)? {
                Some(merged) => merged,
                None => return Err(ProjectionError::MergeConflict),
            },
        });
    }
    Ok(current)
}

fn project_one(store: &Store, prefix: &Prefix, tree_id: ObjectId) -> Result<Option<ObjectId>, ProjectionError> {
    let Some(entry) = store.tree_entry_by_path(tree_id, &prefix.from)? else {
        trace!(from = %prefix.from, "prefix not present in tree, skipping");
        return Ok(None);
    };
    if entry.kind != EntryKind::Tree {
        trace!(from = %prefix.from, "prefix resolves to a non-tree entry, skipping");
        return Ok(None);
    }

    let sub_tree = if prefix.excludes.is_empty() {
        entry.id
    } else {
        prune(store, entry.id, &prefix.excludes)?
    };

    let wrapped = if prefix.to.is_empty() {
        sub_tree
    } else {
        store.wrap_tree(&prefix.to, sub_tree)?
    };
    Ok(Some(wrapped))
}

/// Rebuilds the top level of `tree_id`, dropping directory entries named
/// in `excludes` and keeping every other entry — blob or directory — as
/// originally written.
fn prune(store: &Store, tree_id: ObjectId, excludes: &std::collections::HashSet<String>) -> Result<ObjectId, ProjectionError> {
    let entries = store.tree_entries(tree_id)?;
    let mut kept = Vec::with_capacity(entries.len());
    for (name, entry) in entries {
        match entry.kind {
            EntryKind::Tree if excludes.contains(&name) => continue,
            EntryKind::Tree | EntryKind::Blob => kept.push((name, entry)),
            EntryKind::Commit | EntryKind::Other => {
                return Err(ProjectionError::UnexpectedEntryKind(name));
            }
        }
    }
    Ok(store.build_tree(&kept)?)
}
