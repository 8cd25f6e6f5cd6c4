//! Download targets produced by a run.

use serde::Serialize;

use crate::extract::ExternalHost;
use crate::input::Identifier;

/// Where a target is fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A file served by the platform itself.
    Direct,
    /// A link to a third-party file host.
    External(ExternalHost),
}

/// One URL for the downstream download stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadTarget {
    /// Absolute URL.
    pub url: String,
    /// Direct platform file or external host link.
    pub kind: TargetKind,
    /// Post the URL was found in.
    pub origin_post: Identifier,
}

impl DownloadTarget {
    /// Creates a direct platform target.
    pub fn direct(url: impl Into<String>, origin_post: Identifier) -> Self {
        Self {
            url: url.into(),
            kind: TargetKind::Direct,
            origin_post,
        }
    }

    /// Creates a target on a third-party host.
    pub fn external(url: impl Into<String>, host: ExternalHost, origin_post: Identifier) -> Self {
        Self {
            url: url.into(),
            kind: TargetKind::External(host),
            origin_post,
        }
    }

    /// Returns the external host, if any.
    #[must_use]
    pub fn external_host(&self) -> Option<ExternalHost> {
        match self.kind {
            TargetKind::Direct => None,
            TargetKind::External(host) => Some(host),
        }
    }
}
