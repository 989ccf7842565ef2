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

//! Thread-safe run accounting, consulted by an external progress
//! reporter while the traversal driver is still writing to it.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::object_id::ObjectId;

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    traversed: u64,
    created: u64,
    head: Option<ObjectId>,
    elapsed: Option<Duration>,
}

/// A shared, cloneable handle to one run's counters.
#[derive(Clone, Default)]
pub struct ResultObserver {
    inner: Arc<RwLock<Counters>>,
}

impl ResultObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr_traversed(&self) {
        self.inner.write().expect("result lock poisoned").traversed += 1;
    }

    pub fn incr_created(&self) {
        self.inner.write().expect("result lock poisoned").created += 1;
    }

    pub fn set_head(&self, head: ObjectId) {
        self.inner.write().expect("result lock poisoned").head = Some(head);
    }

    pub fn traversed(&self) -> u64 {
        self.inner.read().expect("result lock poisoned").traversed
    }

    pub fn created(&self) -> u64 {
        self.inner.read().expect("result lock poisoned").created
    }

    pub fn head(&self) -> Option<ObjectId> {
        self.inner.read().expect("result lock poisoned").head
    }

    /// Records the elapsed time since `start`.
    pub fn end(&self, start: Instant) {
        self.inner.write().expect("result lock poisoned").elapsed = Some(start.elapsed());
    }

    /// The recorded duration rounded to the nearest multiple of
    /// `precision` (half-away-from-zero); `None` before `end` is called,
    /// or unrounded if `precision` is zero.
    pub fn duration(&self, precision: Duration) -> Option<Duration> {
        let elapsed = self.inner.read().expect("result lock poisoned").elapsed?;
        if precision.is_zero() {
            return Some(elapsed);
        }
        let bucket = precision.as_secs_f64();
        let buckets = (elapsed.as_secs_f64() / bucket).round();
        Some(Duration::from_secs_f64(buckets * bucket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_independently() {
        let result = ResultObserver::new();
        result.incr_traversed();
        result.incr_traversed();
        result.incr_created();
        assert_eq!(result.traversed(), 2);
        assert_eq!(result.created(), 1);
    }

    #[test]
    fn head_tracks_the_latest_value_set() {
        let result = ResultObserver::new();
        assert_eq!(result.head(), None);
        let a = ObjectId::from_bytes(&[1; 20]);
        let b = ObjectId::from_bytes(&[2; 20]);
        result.set_head(a);
        result.set_head(b);
        assert_eq!(result.head(), Some(b));
    }

    #[test]
    fn duration_rounds_to_nearest_bucket() {
        let result = ResultObserver::new();
        result.end(Instant::now() - Duration::from_secs(14));
        let rounded = result.duration(Duration::from_secs(10)).unwrap();
        assert_eq!(rounded, Duration::from_secs(10));
    }

    #[test]
    fn duration_rounds_half_away_from_zero() {
        let result = ResultObserver::new();
        result.end(Instant::now() - Duration::from_secs(15));
        let rounded = result.duration(Duration::from_secs(10)).unwrap();
        assert_eq!(rounded, Duration::from_secs(20));
    }

    #[test]
    fn duration_zero_precision_returns_elapsed_unrounded() {
        let result = ResultObserver::new();
        result.end(Instant::now() - Duration::from_millis(1250));
        let rounded = result.duration(Duration::ZERO).unwrap();
        assert!(rounded >= Duration::from_millis(1250));
    }

    #[test]
    fn duration_is_none_before_end_is_called() {
        let result = ResultObserver::new();
        assert_eq!(result.duration(Duration::from_secs(1)), None);
    }
}
