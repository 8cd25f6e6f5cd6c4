//! Kemono API connector.
//!
//! Kemono mirrors creators from several upstream services; every endpoint is
//! scoped by `{service}/user/{creator}`:
//!
//! - `.../profile` returns `post_count`
//! - `.../posts?o={offset}` returns one listing page of [`KEMONO_PAGE_SIZE`] posts
//! - `.../post/{id}` returns one post
//!
//! File paths in posts are relative to the content base.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{Connector, MediaSelection, PageRequest, ParsedPost};
use crate::auth::SessionCookie;
use crate::fetch::{
    ApiClient, ClientError, FetchCause, FetchError, FetchStage, HttpSettings, endpoint,
};
use crate::input::{Identifier, Service};
use crate::platform::{Platform, PlatformConfig};

/// Posts per Kemono listing page.
pub const KEMONO_PAGE_SIZE: u32 = 50;

/// What a Kemono post contributes as direct targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KemonoOptions {
    /// Include the main file and attachments.
    pub attachments: bool,
}

impl Default for KemonoOptions {
    fn default() -> Self {
        Self { attachments: true }
    }
}

impl From<MediaSelection> for KemonoOptions {
    fn from(media: MediaSelection) -> Self {
        Self {
            attachments: media.attachments,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Profile {
    post_count: u32,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    id: String,
}

/// Post detail, either bare or wrapped in `{"post": ...}` depending on API version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PostResponse {
    Wrapped { post: KemonoPost },
    Bare(KemonoPost),
}

impl PostResponse {
    fn into_post(self) -> KemonoPost {
        match self {
            Self::Wrapped { post } | Self::Bare(post) => post,
        }
    }
}

#[derive(Debug, Deserialize)]
struct KemonoPost {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    embed: Option<KemonoEmbed>,
    #[serde(default)]
    file: Option<KemonoFile>,
    #[serde(default)]
    attachments: Vec<KemonoFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KemonoEmbed {
    url: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KemonoFile {
    path: Option<String>,
}

impl KemonoPost {
    fn direct_urls(&self, content_base: &str, options: KemonoOptions) -> Vec<String> {
        if !options.attachments {
            return Vec::new();
        }
        let base = content_base.trim_end_matches('/');
        let mut urls: Vec<String> = Vec::new();
        for path in self
            .file
            .iter()
            .chain(&self.attachments)
            .filter_map(|file| file.path.as_deref())
            .filter(|path| !path.is_empty())
        {
            let url = format!("{base}/{}", path.trim_start_matches('/'));
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }

    fn scan_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        parts.extend(self.content.as_deref());
        if let Some(embed) = &self.embed {
            parts.extend(embed.url.as_deref());
            parts.extend(embed.description.as_deref());
        }
        parts.join("\n")
    }
}

/// Connector for the Kemono JSON API.
#[derive(Debug)]
pub struct KemonoConnector {
    client: ApiClient,
    api_base: String,
    content_base: String,
    options: KemonoOptions,
}

impl KemonoConnector {
    /// Creates a connector for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the HTTP client cannot be built.
    pub fn new(
        config: &PlatformConfig,
        settings: &HttpSettings,
        session: Option<&SessionCookie>,
        options: KemonoOptions,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: ApiClient::new(config, settings, session)?,
            api_base: config.api_base.clone(),
            content_base: config.content_base.clone(),
            options,
        })
    }

    fn creator_path(creator: &Identifier) -> Result<String, FetchError> {
        let Service::Kemono(service) = creator.service() else {
            return Err(FetchError::new(
                creator.to_string(),
                FetchStage::List,
                FetchCause::Aborted {
                    reason: "not a Kemono identifier".to_string(),
                },
            ));
        };
        Ok(format!(
            "{}/user/{}",
            service.as_str(),
            urlencoding::encode(creator.creator_id())
        ))
    }
}

/// Number of listing pages holding `post_count` posts.
fn page_count(post_count: u32) -> u32 {
    post_count.div_ceil(KEMONO_PAGE_SIZE)
}

#[async_trait]
impl Connector for KemonoConnector {
    fn platform(&self) -> Platform {
        Platform::Kemono
    }

    #[instrument(skip(self), fields(creator = %creator))]
    async fn discover_pages(&self, creator: &Identifier) -> Result<Vec<PageRequest>, FetchError> {
        let subject = creator.to_string();
        let creator_path = Self::creator_path(creator)?;
        let url = endpoint(
            &self.api_base,
            &format!("{creator_path}/profile"),
            &subject,
            FetchStage::List,
        )?;
        let profile: Profile = self.client.get_json(url, &subject, FetchStage::List).await?;

        let mut pages = Vec::new();
        for number in 1..=page_count(profile.post_count) {
            let mut url = endpoint(
                &self.api_base,
                &format!("{creator_path}/posts"),
                &subject,
                FetchStage::List,
            )?;
            url.query_pairs_mut()
                .append_pair("o", &((number - 1) * KEMONO_PAGE_SIZE).to_string());
            pages.push(PageRequest {
                number,
                url: url.to_string(),
            });
        }
        debug!(post_count = profile.post_count, pages = pages.len(), "discovered listing pages");
        Ok(pages)
    }

    #[instrument(skip(self, page), fields(creator = %creator, page = page.number))]
    async fn fetch_page(
        &self,
        creator: &Identifier,
        page: &PageRequest,
    ) -> Result<Vec<Identifier>, FetchError> {
        let subject = format!("{creator} page {}", page.number);
        let url = url::Url::parse(&page.url).map_err(|error| {
            FetchError::new(
                subject.clone(),
                FetchStage::List,
                FetchCause::Connection {
                    url: page.url.clone(),
                    reason: format!("invalid page URL: {error}"),
                },
            )
        })?;
        let items: Vec<ListItem> = self.client.get_json(url, &subject, FetchStage::List).await?;

        Ok(items
            .into_iter()
            .map(|item| Identifier::post(creator.service(), creator.creator_id(), item.id))
            .collect())
    }

    #[instrument(skip(self), fields(post = %post))]
    async fn fetch_post(&self, post: &Identifier) -> Result<ParsedPost, FetchError> {
        let subject = post.to_string();
        let creator_path = Self::creator_path(post).map_err(|error| FetchError {
            stage: FetchStage::Detail,
            ..error
        })?;
        let url = endpoint(
            &self.api_base,
            &format!(
                "{creator_path}/post/{}",
                urlencoding::encode(post.post_id().unwrap_or_default())
            ),
            &subject,
            FetchStage::Detail,
        )?;
        let response: PostResponse = self.client.get_json(url, &subject, FetchStage::Detail).await?;
        let detail = response.into_post();
        debug!(id = %detail.id, attachments = detail.attachments.len(), "parsed post");

        Ok(ParsedPost {
            identifier: post.clone(),
            direct_urls: detail.direct_urls(&self.content_base, self.options),
            text: detail.scan_text(),
            title: detail.title,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_rounds_up() {
        assert_eq!(page_count(0), 0);
        assert_eq!(page_count(1), 1);
        assert_eq!(page_count(50), 1);
        assert_eq!(page_count(51), 2);
        assert_eq!(page_count(340), 7);
    }

    #[test]
    fn test_post_response_accepts_both_shapes() {
        let bare: PostResponse = serde_json::from_str(r#"{"id":"9","title":"t"}"#).unwrap();
        assert_eq!(bare.into_post().id, "9");
        let wrapped: PostResponse =
            serde_json::from_str(r#"{"post":{"id":"10"},"attachments":[]}"#).unwrap();
        assert_eq!(wrapped.into_post().id, "10");
    }

    #[test]
    fn test_direct_urls_join_content_base_and_dedupe() {
        let post: KemonoPost = serde_json::from_str(
            r#"{"id":"1","file":{"name":"a.png","path":"/aa/bb/a.png"},
                "attachments":[{"path":"/aa/bb/a.png"},{"path":"/cc/dd/b.zip"},{}]}"#,
        )
        .unwrap();
        assert_eq!(
            post.direct_urls("https://kemono.su/data/", KemonoOptions::default()),
            vec![
                "https://kemono.su/data/aa/bb/a.png",
                "https://kemono.su/data/cc/dd/b.zip"
            ]
        );
        assert!(
            post.direct_urls("https://kemono.su/data", KemonoOptions { attachments: false })
                .is_empty()
        );
    }

    #[test]
    fn test_empty_embed_object_is_accepted() {
        let post: KemonoPost = serde_json::from_str(
            r#"{"id":"1","content":"<p>pass: x</p>","embed":{},"file":{}}"#,
        )
        .unwrap();
        assert_eq!(post.scan_text(), "<p>pass: x</p>");
        assert!(post.direct_urls("https://k/data", KemonoOptions::default()).is_empty());
    }
}
