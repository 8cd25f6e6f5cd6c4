//! Concurrent fetching.
//!
//! This module provides the bounded [`WorkerPool`], the HTTP client policy
//! shared by connectors, and the two pool-driven stages of a run: the
//! [`PaginatedListFetcher`] (creator listing pages to post identifiers) and
//! the [`PostDetailFetcher`] (post identifiers to download targets).

mod detail;
mod error;
mod http_client;
mod list;
mod pool;
mod progress;

pub use detail::{PostDetailFetcher, PostOutcome, derive_targets};
pub use error::{ErrorCategory, FetchCause, FetchError, FetchStage, TaskSubject};
pub use http_client::{
    ApiClient, ClientError, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS,
    HttpSettings, endpoint,
};
pub use list::{CreatorRequest, ListOutcome, PaginatedListFetcher};
pub use pool::{FetchTask, PoolOutcome, WorkerPool};
pub use progress::{LogProgress, NoopProgress, ProgressReporter};
