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

//! Ties the store, cache, projector and rewriter together into one
//! commit-graph traversal.

use std::time::Instant;

use tracing::{debug, info, info_span};

use crate::cache::Cache;
use crate::config::Config;
use crate::error::SplitError;
use crate::object_id::ObjectId;
use crate::projector;
use crate::result::ResultObserver;
use crate::rewriter;
use crate::store::Store;

/// Owns everything a single split run needs.
pub struct Splitter {
    store: Store,
    config: Config,
    cache: Cache,
    result: ResultObserver,
}

impl std::fmt::Debug for Splitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Splitter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Splitter {
    /// Validates `config`, opens the repository and its mapping cache.
    pub fn new(config: Config) -> Result<Self, SplitError> {
        let cache_key = config.validate()?;
        let _span = info_span!("open repository", path = %config.repo_path.display()).entered();
        let store = Store::open(&config.repo_path)?;
        let mut cache = Cache::open(&store.state_dir(), cache_key)?;
        if config.scratch {
            cache.flush()?;
        }
        Ok(Self {
            store,
            config,
            cache,
            result: ResultObserver::new(),
        })
    }

    /// Wraps an already-open store, e.g. one an external fetcher also
    /// holds a handle to.
    pub fn with_store(config: Config, store: Store) -> Result<Self, SplitError> {
        let cache_key = config.validate()?;
        let mut cache = Cache::open(&store.state_dir(), cache_key)?;
        if config.scratch {
            cache.flush()?;
        }
        Ok(Self {
            store,
            config,
            cache,
            result: ResultObserver::new(),
        })
    }

    pub fn result(&self) -> ResultObserver {
        self.result.clone()
    }

    /// Runs the split and returns the output head oid.
    pub fn split(mut self) -> Result<ObjectId, SplitError> {
        let start = Instant::now();
        let outcome = self.run();
        self.result.end(start);
        self.cache.close()?;
        outcome
    }

    fn run(&mut self) -> Result<ObjectId, SplitError> {
        let (origin_id, origin_name) = self.resolve_origin()?;
        let commits = self.push_revs(origin_id, &origin_name)?;

        let _span = info_span!("traversal", origin = %origin_name, commits = commits.len()).entered();

        let mut last_input = None;
        for input_id in commits {
            last_input = Some(input_id);
            self.result.incr_traversed();

            if self.cache.get(input_id)?.is_some() {
                continue;
            }

            let commit = self.store.lookup_commit(input_id)?;
            let parent_images = self.cache.gets(&commit.parent_ids)?;

            let projected = {
                let _span = info_span!("project commit", commit = %input_id).entered();
                projector::project(&self.store, &self.config, commit.tree_id)?
            };
            let Some(projected_tree) = projected else {
                debug!(commit = %input_id, "projected tree absent, skipping");
                continue;
            };

            let rewritten = {
                let _span = info_span!("rewrite commit", commit = %input_id).entered();
                rewriter::rewrite(
                    &self.store,
                    self.config.git_compat,
                    &commit,
                    &parent_images,
                    projected_tree,
                )?
            };
            if rewritten.created {
                self.result.incr_created();
            }
            self.cache.set(input_id, rewritten.id, rewritten.created)?;
            self.result.set_head(rewritten.id);
        }

        if let Some(last_input_id) = last_input {
            self.cache.set_head(&origin_name, last_input_id);
        }

        self.update_target()
    }

    fn resolve_origin(&self) -> Result<(ObjectId, String), SplitError> {
        let (origin_id, ref_name) = self.store.revparse_ext(&self.config.origin)?;
        Ok((origin_id, ref_name.unwrap_or_else(|| self.config.origin.clone())))
    }

    fn push_revs(&mut self, origin_id: ObjectId, origin_name: &str) -> Result<Vec<ObjectId>, SplitError> {
        if let Some(resume_from) = self.cache.get_head(origin_name)? {
            let head_image = self.cache.get(resume_from)?;
            if let Some(head) = head_image {
                self.result.set_head(head);
            }
            return Ok(self.store.walk_range(Some(resume_from), origin_id)?);
        }

        if let Some(commit) = &self.config.commit {
            let start = self.store.revparse_single(commit)?;
            if let Some(head) = self.cache.get(start)? {
                self.result.set_head(head);
            }
            return Ok(self
                .store
                .walk_push_range(&format!("{}^..{}", start.hex(), origin_id.hex()))?);
        }

        info!(origin = %origin_name, "full walk from origin");
        Ok(self.store.walk_from(origin_id)?)
    }

    fn update_target(&self) -> Result<ObjectId, SplitError> {
        let head = self.result.head();
        if let Some(target) = &self.config.target {
            let Some(head) = head else {
                return Err(SplitError::EmptyTarget(target.clone()));
            };
            if self.store.reference_exists(target) {
                self.store
                    .reference_set_target(target, head)
                    .map_err(|source| SplitError::TargetUpdate {
                        name: target.clone(),
                        source: git2_error_of(source),
                    })?;
            } else {
                self.store
                    .reference_create(target, head, false)
                    .map_err(|source| SplitError::TargetUpdate {
                        name: target.clone(),
                        source: git2_error_of(source),
                    })?;
            }
            return Ok(head);
        }
        Ok(head.unwrap_or(self.store.revparse_single(&self.config.origin)?))
    }
}

fn git2_error_of(err: crate::error::StoreError) -> git2::Error {
    match err {
        crate::error::StoreError::Git(e) => e,
        crate::error::StoreError::Open { source, .. } => source,
        crate::error::StoreError::Resolve { source, .. } => source,
        crate::error::StoreError::Revwalk(e) => e,
    }
}
