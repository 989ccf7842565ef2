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

//! A background ticker that renders `traversed`/`created`/elapsed to
//! stderr while a split runs, overwriting the current line.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use subsplit_core::ResultObserver;

const TICK_INTERVAL: Duration = Duration::from_millis(50);

pub struct ProgressTicker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressTicker {
    /// Spawns the ticker. Returns `None` (no-op handle) when progress
    /// reporting was not requested.
    pub fn spawn(result: ResultObserver, enabled: bool) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        if !enabled {
            return Self { stop, handle: None };
        }
        let stop_flag = stop.clone();
        let start = Instant::now();
        let handle = std::thread::spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                render(&result, start);
                std::thread::sleep(TICK_INTERVAL);
            }
            render(&result, start);
            eprintln!();
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stops the ticker and waits for its final render. Called as soon as
    /// the split call returns, so the ticker never outlives the run.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn render(result: &ResultObserver, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    eprint!(
        "\rtraversed={} created={} elapsed={elapsed:.1}s",
        result.traversed(),
        result.created(),
    );
    let _ = std::io::stderr().flush();
}
