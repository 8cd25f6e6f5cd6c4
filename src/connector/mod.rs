//! Platform connectors.
//!
//! A [`Connector`] knows one platform's JSON API: how to discover a
//! creator's listing pages, what post identifiers a page holds, and which
//! files and text a post carries. The pipeline in [`crate::harvest`] drives
//! every connector the same way through this trait.

mod fanbox;
#[cfg(test)]
pub(crate) mod fake;
mod kemono;

use std::sync::Arc;

use async_trait::async_trait;

pub use fanbox::{FanboxConnector, FanboxOptions};
pub use kemono::{KEMONO_PAGE_SIZE, KemonoConnector, KemonoOptions};

use crate::auth::SessionCookie;
use crate::fetch::{ClientError, FetchError, HttpSettings};
use crate::input::Identifier;
use crate::platform::{Platform, PlatformRegistry};

/// One listing page of a creator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub number: u32,
    /// Absolute URL of the page.
    pub url: String,
}

/// Post metadata reduced to what target extraction needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPost {
    /// The post.
    pub identifier: Identifier,
    /// Post title, when the platform returns one.
    pub title: Option<String>,
    /// Absolute URLs of files hosted by the platform, in post order.
    pub direct_urls: Vec<String>,
    /// Free text scanned for external links and password hints.
    pub text: String,
}

/// Which kinds of platform-hosted files to collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct MediaSelection {
    /// Cover images.
    pub thumbnails: bool,
    /// Inline post images.
    pub images: bool,
    /// File attachments.
    pub attachments: bool,
}

impl Default for MediaSelection {
    fn default() -> Self {
        Self {
            thumbnails: true,
            images: true,
            attachments: true,
        }
    }
}

/// A platform API as seen by the harvesting pipeline.
#[async_trait]
pub trait Connector: Send + Sync + std::fmt::Debug {
    /// Platform this connector talks to.
    fn platform(&self) -> Platform;

    /// Lists every listing page of `creator`, in page order.
    async fn discover_pages(&self, creator: &Identifier) -> Result<Vec<PageRequest>, FetchError>;

    /// Returns the post identifiers on one listing page.
    async fn fetch_page(
        &self,
        creator: &Identifier,
        page: &PageRequest,
    ) -> Result<Vec<Identifier>, FetchError>;

    /// Fetches one post's metadata.
    async fn fetch_post(&self, post: &Identifier) -> Result<ParsedPost, FetchError>;
}

/// Builds the connector for `platform` from the registry's configuration.
///
/// # Errors
///
/// Returns [`ClientError`] when the HTTP client cannot be built.
pub fn build_connector(
    platform: Platform,
    registry: &PlatformRegistry,
    settings: &HttpSettings,
    session: Option<&SessionCookie>,
    media: MediaSelection,
) -> Result<Arc<dyn Connector>, ClientError> {
    let config = registry.get(platform);
    Ok(match platform {
        Platform::PixivFanbox => Arc::new(FanboxConnector::new(
            config,
            settings,
            session,
            FanboxOptions::from(media),
        )?),
        Platform::Kemono => Arc::new(KemonoConnector::new(
            config,
            settings,
            session,
            KemonoOptions::from(media),
        )?),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_connector_dispatches_on_platform() {
        let registry = PlatformRegistry::new();
        for platform in Platform::ALL {
            let connector = build_connector(
                platform,
                &registry,
                &HttpSettings::default(),
                None,
                MediaSelection::default(),
            )
            .unwrap();
            assert_eq!(connector.platform(), platform);
        }
    }
}
