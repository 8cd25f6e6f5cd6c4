//! Per-item fetch errors.
//!
//! A [`FetchError`] records one failed list page or post. It is collected
//! into the run result and never aborts the batch.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Pipeline phase an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStage {
    /// Creator discovery or listing page.
    List,
    /// Post metadata.
    Detail,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => f.write_str("list"),
            Self::Detail => f.write_str("detail"),
        }
    }
}

/// Broad error class used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Transport failure, including timeouts.
    Connection,
    /// Non-2xx response.
    Response,
    /// Body could not be decoded into the expected schema.
    Json,
    /// The task did not run to completion.
    Aborted,
}

/// Why a single fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchCause {
    /// Network-level failure (DNS, refused connection, TLS, reset body).
    #[error("connection to {url} failed: {reason}")]
    Connection {
        /// Requested URL.
        url: String,
        /// Underlying error text.
        reason: String,
    },

    /// The per-call deadline elapsed.
    #[error("request to {url} timed out")]
    Timeout {
        /// Requested URL.
        url: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Response {
        /// Requested URL.
        url: String,
        /// Status code.
        status: u16,
    },

    /// The response body did not match the expected JSON schema.
    #[error("unexpected JSON from {url}: {reason}")]
    Json {
        /// Requested URL.
        url: String,
        /// Decoder message.
        reason: String,
    },

    /// The task panicked or could not be scheduled.
    #[error("task aborted: {reason}")]
    Aborted {
        /// What happened.
        reason: String,
    },
}

impl FetchCause {
    /// Returns the reporting category for this cause.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Connection { .. } | Self::Timeout { .. } => ErrorCategory::Connection,
            Self::Response { .. } => ErrorCategory::Response,
            Self::Json { .. } => ErrorCategory::Json,
            Self::Aborted { .. } => ErrorCategory::Aborted,
        }
    }
}

/// A recorded failure for one creator, page or post.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{stage}] {subject}: {cause}")]
pub struct FetchError {
    /// Identifier (and page, for list pages) the failure belongs to.
    pub subject: String,
    /// Phase the failure happened in.
    pub stage: FetchStage,
    /// What went wrong.
    #[source]
    pub cause: FetchCause,
}

impl FetchError {
    /// Creates a fetch error.
    pub fn new(subject: impl Into<String>, stage: FetchStage, cause: FetchCause) -> Self {
        Self {
            subject: subject.into(),
            stage,
            cause,
        }
    }

    /// Returns the reporting category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.cause.category()
    }

    /// Maps a reqwest transport error for `url` into a fetch error.
    pub fn transport(
        subject: impl Into<String>,
        stage: FetchStage,
        url: &str,
        error: &reqwest::Error,
    ) -> Self {
        let cause = if error.is_timeout() {
            FetchCause::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchCause::Connection {
                url: url.to_string(),
                reason: error.to_string(),
            }
        };
        Self::new(subject, stage, cause)
    }
}

/// Subject and stage of a task, captured before it runs.
///
/// Lets the pool attribute a failure to the right item even when the task
/// itself never returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSubject {
    /// Identifier text for the task.
    pub subject: String,
    /// Stage the task belongs to.
    pub stage: FetchStage,
}

impl TaskSubject {
    /// Creates a task subject.
    pub fn new(subject: impl Into<String>, stage: FetchStage) -> Self {
        Self {
            subject: subject.into(),
            stage,
        }
    }

    /// Builds an `Aborted` error for this subject.
    #[must_use]
    pub fn aborted(self, reason: impl Into<String>) -> FetchError {
        FetchError::new(
            self.subject,
            self.stage,
            FetchCause::Aborted {
                reason: reason.into(),
            },
        )
    }
}
