//! Error types for input validation.

use thiserror::Error;

use crate::platform::Platform;

/// Errors raised while validating user-supplied identifiers and page specs.
///
/// Every variant is fatal: input is rejected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Page specification does not match `N` or `N-M`.
    #[error("invalid page range '{spec}': {reason}\n  Suggestion: Use a format like \"1-10\" or \"3\" (pages start at 1)")]
    InvalidPageRange {
        /// The rejected specification.
        spec: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Creator URL or ID is not recognised for the platform.
    #[error("invalid {platform} creator '{input}': {reason}\n  Suggestion: {suggestion}")]
    InvalidCreator {
        /// Target platform.
        platform: Platform,
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
        /// How to fix the issue.
        suggestion: String,
    },

    /// Post URL is not recognised for the platform.
    #[error("invalid {platform} post '{input}': {reason}\n  Suggestion: {suggestion}")]
    InvalidPost {
        /// Target platform.
        platform: Platform,
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
        /// How to fix the issue.
        suggestion: String,
    },

    /// More page specs were supplied than creators.
    #[error(
        "{pages} page range(s) supplied for {creators} creator(s)\n  Suggestion: Provide at most one --pages value per --creator, in the same order"
    )]
    PageCountMismatch {
        /// Number of creators.
        creators: usize,
        /// Number of page specs.
        pages: usize,
    },

    /// Session credentials are missing, ambiguous or unusable.
    #[error("invalid session credentials: {reason}\n  Suggestion: {suggestion}")]
    InvalidSession {
        /// Why the credentials were rejected.
        reason: String,
        /// How to fix the issue.
        suggestion: String,
    },
}

impl InputError {
    /// Creates an `InvalidPageRange` error.
    #[must_use]
    pub fn page_range(spec: &str, reason: &str) -> Self {
        Self::InvalidPageRange {
            spec: spec.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates an `InvalidCreator` error with the platform's expected format as suggestion.
    #[must_use]
    pub fn creator(platform: Platform, input: &str, reason: &str) -> Self {
        Self::InvalidCreator {
            platform,
            input: input.to_string(),
            reason: reason.to_string(),
            suggestion: creator_format(platform).to_string(),
        }
    }

    /// Creates an `InvalidPost` error with the platform's expected format as suggestion.
    #[must_use]
    pub fn post(platform: Platform, input: &str, reason: &str) -> Self {
        Self::InvalidPost {
            platform,
            input: input.to_string(),
            reason: reason.to_string(),
            suggestion: post_format(platform).to_string(),
        }
    }

    /// Creates an `InvalidSession` error.
    #[must_use]
    pub fn session(reason: &str, suggestion: &str) -> Self {
        Self::InvalidSession {
            reason: reason.to_string(),
            suggestion: suggestion.to_string(),
        }
    }
}

fn creator_format(platform: Platform) -> &'static str {
    match platform {
        Platform::PixivFanbox => {
            "Use a creator ID or a URL like https://www.fanbox.cc/@creator or https://creator.fanbox.cc"
        }
        Platform::Kemono => "Use a URL like https://kemono.su/patreon/user/12345",
    }
}

fn post_format(platform: Platform) -> &'static str {
    match platform {
        Platform::PixivFanbox => {
            "Use a post ID like 12345 or a URL like https://www.fanbox.cc/@creator/posts/12345"
        }
        Platform::Kemono => "Use a URL like https://kemono.su/patreon/user/12345/post/67890",
    }
}
