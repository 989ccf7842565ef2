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

//! The incremental mapping cache: a bucketed key/value store, one bucket
//! per [`CacheKey`](crate::config::CacheKey), durable as `splitsh.db`
//! alongside the repository.
//!
//! Writes land in an in-memory overlay during a run and are committed to
//! disk in a single transaction on [`Cache::close`]. Reads check the
//! overlay first, then the durable tree, hoisting a store hit into the
//! overlay so repeated reads of the same key stay in memory.

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::CacheKey;
use crate::error::CacheError;
use crate::object_id::ObjectId;

const FILE_NAME: &str = "splitsh.db";
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

const OLDEST_SUFFIX: &str = "/oldest";
const NEWEST_SUFFIX: &str = "/newest";
const HEAD_PREFIX: &str = "head/";

/// The bucketed mapping cache for one repository.
pub struct Cache {
    db: sled::Db,
    key: CacheKey,
    tree: sled::Tree,
    overlay: HashMap<Vec<u8>, Vec<u8>>,
}

impl Cache {
    /// Opens (creating if absent) `splitsh.db` in `state_dir`, retrying
    /// with backoff for up to [`ACQUIRE_TIMEOUT`] if another process
    /// currently holds the file lock.
    pub fn open(state_dir: &Path, key: CacheKey) -> Result<Self, CacheError> {
        let path = state_dir.join(FILE_NAME);
        let db = open_with_timeout(&path)?;
        let tree = db.open_tree(key.hex().as_bytes())?;
        Ok(Self {
            db,
            key,
            tree,
            overlay: HashMap::new(),
        })
    }

    pub fn key(&self) -> CacheKey {
        self.key
    }

    pub fn get_head(&mut self, branch: &str) -> Result<Option<ObjectId>, CacheError> {
        self.get_raw(head_key(branch).as_bytes())
            .map(|v| v.map(|bytes| ObjectId::from_bytes(&bytes)))
    }

    pub fn set_head(&mut self, branch: &str, input_oid: ObjectId) {
        self.set_raw(head_key(branch).into_bytes(), input_oid.as_bytes().to_vec());
    }

    pub fn get(&mut self, input_oid: ObjectId) -> Result<Option<ObjectId>, CacheError> {
        self.get_raw(input_oid.as_bytes())
            .map(|v| v.map(|bytes| ObjectId::from_bytes(&bytes)))
    }

    /// Looks up each id in order, dropping misses — the order of hits is
    /// preserved.
    pub fn gets(&mut self, input_oids: &[ObjectId]) -> Result<Vec<ObjectId>, CacheError> {
        let mut out = Vec::with_capacity(input_oids.len());
        for id in input_oids {
            if let Some(mapped) = self.get(*id)? {
                out.push(mapped);
            }
        }
        Ok(out)
    }

    /// Records the forward mapping plus the appropriate reverse marker:
    /// `/oldest` the first time a `created` commit produces this output,
    /// `/newest` every time an existing output is reused.
    pub fn set(&mut self, input_oid: ObjectId, output_oid: ObjectId, created: bool) -> Result<(), CacheError> {
        self.set_raw(input_oid.as_bytes().to_vec(), output_oid.as_bytes().to_vec());
        if created {
            let oldest_key = format!("{}{}", output_oid.hex(), OLDEST_SUFFIX);
            if self.get_raw(oldest_key.as_bytes())?.is_none() {
                self.set_raw(oldest_key.into_bytes(), input_oid.as_bytes().to_vec());
            }
        } else {
            let newest_key = format!("{}{}", output_oid.hex(), NEWEST_SUFFIX);
            self.set_raw(newest_key.into_bytes(), input_oid.as_bytes().to_vec());
        }
        Ok(())
    }

    /// Deletes and recreates the bucket for a from-scratch rebuild.
    pub fn flush(&mut self) -> Result<(), CacheError> {
        self.overlay.clear();
        self.db.drop_tree(self.key.hex().as_bytes())?;
        self.tree = self.db.open_tree(self.key.hex().as_bytes())?;
        Ok(())
    }

    /// Commits the write overlay to disk in one transaction and releases
    /// the handle.
    pub fn close(mut self) -> Result<(), CacheError> {
        self.commit_overlay()
    }

    fn commit_overlay(&mut self) -> Result<(), CacheError> {
        if self.overlay.is_empty() {
            return Ok(());
        }
        let mut batch = sled::Batch::default();
        for (k, v) in self.overlay.drain() {
            batch.insert(k, v);
        }
        self.tree.apply_batch(batch)?;
        self.tree.flush()?;
        Ok(())
    }

    fn get_raw(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, CacheError> {
        if let Some(value) = self.overlay.get(key) {
            return Ok(Some(value.clone()));
        }
        match self.tree.get(key)? {
            Some(ivec) => {
                let value = ivec.to_vec();
                self.overlay.insert(key.to_vec(), value.clone());
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set_raw(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.overlay.insert(key, value);
    }
}

fn head_key(branch: &str) -> String {
    format!("{HEAD_PREFIX}{branch}")
}

fn open_with_timeout(path: &Path) -> Result<sled::Db, CacheError> {
    let deadline = Instant::now() + ACQUIRE_TIMEOUT;
    let mut delay = Duration::from_millis(5);
    loop {
        match sled::open(path) {
            Ok(db) => return Ok(db),
            Err(sled::Error::Io(_)) if Instant::now() < deadline => {
                std::thread::sleep(delay);
                delay = (delay * 2).min(Duration::from_millis(200));
            }
            Err(e) => return Err(CacheError::from(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Prefix};

    fn key() -> CacheKey {
        Config::new("/tmp/unused", vec![Prefix::new("src", "")])
            .validate()
            .unwrap()
    }

    fn oid(byte: u8) -> ObjectId {
        ObjectId::from_bytes(&[byte; 20])
    }

    #[test]
    fn forward_mapping_round_trips_through_overlay_and_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = Cache::open(dir.path(), key()).unwrap();
        cache.set(oid(1), oid(2), true).unwrap();
        assert_eq!(cache.get(oid(1)).unwrap(), Some(oid(2)));
        cache.close().unwrap();

        let mut reopened = Cache::open(dir.path(), key()).unwrap();
        assert_eq!(reopened.get(oid(1)).unwrap(), Some(oid(2)));
    }

    #[test]
    fn gets_drops_misses_and_preserves_hit_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = Cache::open(dir.path(), key()).unwrap();
        cache.set(oid(1), oid(10), true).unwrap();
        cache.set(oid(3), oid(30), true).unwrap();
        let mapped = cache.gets(&[oid(1), oid(2), oid(3)]).unwrap();
        assert_eq!(mapped, vec![oid(10), oid(30)]);
    }

    #[test]
    fn oldest_marker_is_written_once_newest_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = Cache::open(dir.path(), key()).unwrap();
        cache.set(oid(1), oid(9), true).unwrap();
        cache.set(oid(2), oid(9), false).unwrap();
        cache.set(oid(3), oid(9), false).unwrap();

        let oldest_key = format!("{}{}", oid(9).hex(), OLDEST_SUFFIX);
        let newest_key = format!("{}{}", oid(9).hex(), NEWEST_SUFFIX);
        assert_eq!(
            cache.get_raw(oldest_key.as_bytes()).unwrap(),
            Some(oid(1).as_bytes().to_vec())
        );
        assert_eq!(
            cache.get_raw(newest_key.as_bytes()).unwrap(),
            Some(oid(3).as_bytes().to_vec())
        );
    }

    #[test]
    fn flush_discards_prior_mappings() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = Cache::open(dir.path(), key()).unwrap();
        cache.set(oid(1), oid(2), true).unwrap();
        cache.flush().unwrap();
        assert_eq!(cache.get(oid(1)).unwrap(), None);
    }

    #[test]
    fn head_resume_pointer_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = Cache::open(dir.path(), key()).unwrap();
        assert_eq!(cache.get_head("refs/heads/main").unwrap(), None);
        cache.set_head("refs/heads/main", oid(7));
        assert_eq!(cache.get_head("refs/heads/main").unwrap(), Some(oid(7)));
    }
}
