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

//! Subtree-splitting engine: projects a directory prefix's history out
//! of a git commit graph into a standalone, rewritten graph, caching the
//! oid mapping so repeated runs only process new commits.

pub mod cache;
pub mod config;
pub mod driver;
pub mod error;
pub mod message;
pub mod object_id;
pub mod projector;
pub mod result;
pub mod rewriter;
pub mod store;

pub use cache::Cache;
pub use config::{CacheKey, Config, GitCompat, Prefix};
pub use driver::Splitter;
pub use error::{CacheError, ConfigError, ProjectionError, SplitError, SplitResult, StoreError};
pub use object_id::ObjectId;
pub use result::ResultObserver;
pub use store::Store;
