//! Content Harvester Core Library
//!
//! Collects download targets from creator platforms. Given creator and post
//! identifiers, it walks the creators' paginated listings, fetches every
//! post's metadata and extracts the files hosted by the platform plus links
//! to third-party file hosts, with a bounded number of concurrent calls and
//! per-item error capture.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`input`] - Identifier and page range validation
//! - [`platform`] - Immutable per-platform configuration
//! - [`auth`] - Session cookie loading
//! - [`connector`] - Platform API clients (Pixiv Fanbox, Kemono)
//! - [`fetch`] - Worker pool, HTTP policy, list and detail stages
//! - [`extract`] - Link extraction, host classification, password hints
//! - [`aggregate`] - Deduplicated run results
//! - [`harvest`] - The run driver
//!
//! File transfer is out of scope; the [`RunResult`] is handed to a
//! downstream stage.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregate;
pub mod auth;
pub mod connector;
pub mod extract;
pub mod fetch;
pub mod harvest;
pub mod input;
pub mod platform;
pub mod target;
mod user_agent;

// Re-export commonly used types
pub use aggregate::{ResultAggregator, RunResult};
pub use auth::SessionCookie;
pub use connector::{Connector, MediaSelection, build_connector};
pub use extract::ExternalHost;
pub use fetch::{
    CreatorRequest, FetchError, FetchStage, HttpSettings, LogProgress, ProgressReporter,
    WorkerPool,
};
pub use harvest::{DevError, HarvestError, HarvestRequest, Harvester, RunState};
pub use input::{Identifier, InputError, PageRange};
pub use platform::{Platform, PlatformConfig, PlatformRegistry};
pub use target::{DownloadTarget, TargetKind};
pub use user_agent::BROWSER_USER_AGENT;
