//! Pixiv Fanbox API connector.
//!
//! Endpoints (all under the API base, with `Origin`/`Referer` set to the
//! site URL and the `FANBOXSESSID` cookie when available):
//!
//! - `post.paginateCreator?creatorId=` returns the creator's listing page URLs
//! - each listing page URL returns `body.items[].id`
//! - `post.info?postId=` returns one post

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{Connector, MediaSelection, PageRequest, ParsedPost};
use crate::auth::SessionCookie;
use crate::fetch::{
    ApiClient, ClientError, FetchCause, FetchError, FetchStage, HttpSettings, endpoint,
};
use crate::input::{Identifier, Service};
use crate::platform::{Platform, PlatformConfig};

/// What a Fanbox post contributes as direct targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanboxOptions {
    /// Include the post cover image.
    pub thumbnails: bool,
    /// Include inline images.
    pub images: bool,
    /// Include file attachments.
    pub attachments: bool,
}

impl Default for FanboxOptions {
    fn default() -> Self {
        MediaSelection::default().into()
    }
}

impl From<MediaSelection> for FanboxOptions {
    fn from(media: MediaSelection) -> Self {
        Self {
            thumbnails: media.thumbnails,
            images: media.images,
            attachments: media.attachments,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PaginateResponse {
    body: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ListPageResponse {
    body: ListPageBody,
}

#[derive(Debug, Deserialize)]
struct ListPageBody {
    items: Vec<ListItem>,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PostInfoResponse {
    body: FanboxPost,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FanboxPost {
    title: Option<String>,
    cover_image_url: Option<String>,
    /// `null` when the viewer's plan does not unlock the post.
    body: Option<FanboxPostBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FanboxPostBody {
    text: Option<String>,
    images: Vec<FanboxImage>,
    files: Vec<FanboxFile>,
    blocks: Vec<FanboxBlock>,
    image_map: BTreeMap<String, FanboxImage>,
    file_map: BTreeMap<String, FanboxFile>,
    url_embed_map: BTreeMap<String, FanboxUrlEmbed>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FanboxImage {
    original_url: String,
}

#[derive(Debug, Deserialize)]
struct FanboxFile {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FanboxBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
    image_id: Option<String>,
    file_id: Option<String>,
    url_embed_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FanboxUrlEmbed {
    url: Option<String>,
    html: Option<String>,
}

impl FanboxPostBody {
    /// Direct file URLs in post order, filtered by `options`.
    ///
    /// Article posts reference `imageMap`/`fileMap` entries from their blocks;
    /// map entries no block references are appended in key order.
    fn direct_urls(&self, options: FanboxOptions) -> Vec<String> {
        let mut urls = Vec::new();
        if options.images {
            urls.extend(self.images.iter().map(|image| image.original_url.clone()));
        }
        if options.attachments {
            urls.extend(self.files.iter().map(|file| file.url.clone()));
        }

        let mut used_images = HashSet::new();
        let mut used_files = HashSet::new();
        for block in &self.blocks {
            match block.kind.as_str() {
                "image" if options.images => {
                    if let Some(image) = block.image_id.as_ref().and_then(|id| {
                        used_images.insert(id.as_str());
                        self.image_map.get(id)
                    }) {
                        urls.push(image.original_url.clone());
                    }
                }
                "file" if options.attachments => {
                    if let Some(file) = block.file_id.as_ref().and_then(|id| {
                        used_files.insert(id.as_str());
                        self.file_map.get(id)
                    }) {
                        urls.push(file.url.clone());
                    }
                }
                _ => {}
            }
        }
        if options.images {
            urls.extend(
                self.image_map
                    .iter()
                    .filter(|(id, _)| !used_images.contains(id.as_str()))
                    .map(|(_, image)| image.original_url.clone()),
            );
        }
        if options.attachments {
            urls.extend(
                self.file_map
                    .iter()
                    .filter(|(id, _)| !used_files.contains(id.as_str()))
                    .map(|(_, file)| file.url.clone()),
            );
        }
        urls
    }

    /// Text scanned for links and password hints.
    fn scan_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(text) = &self.text {
            parts.push(text);
        }
        for block in &self.blocks {
            if let Some(text) = &block.text {
                parts.push(text);
            }
            if let Some(embed) = block
                .url_embed_id
                .as_ref()
                .and_then(|id| self.url_embed_map.get(id))
            {
                parts.extend(embed.url.as_deref());
                parts.extend(embed.html.as_deref());
            }
        }
        parts.join("\n")
    }
}

/// Connector for `api.fanbox.cc`.
#[derive(Debug)]
pub struct FanboxConnector {
    client: ApiClient,
    api_base: String,
    options: FanboxOptions,
}

impl FanboxConnector {
    /// Creates a connector for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the HTTP client cannot be built.
    pub fn new(
        config: &PlatformConfig,
        settings: &HttpSettings,
        session: Option<&SessionCookie>,
        options: FanboxOptions,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: ApiClient::new(config, settings, session)?,
            api_base: config.api_base.clone(),
            options,
        })
    }

    fn query_endpoint(
        &self,
        path: &str,
        key: &str,
        value: &str,
        subject: &str,
        stage: FetchStage,
    ) -> Result<Url, FetchError> {
        let mut url = endpoint(&self.api_base, path, subject, stage)?;
        url.query_pairs_mut().append_pair(key, value);
        Ok(url)
    }
}

#[async_trait]
impl Connector for FanboxConnector {
    fn platform(&self) -> Platform {
        Platform::PixivFanbox
    }

    #[instrument(skip(self), fields(creator = %creator))]
    async fn discover_pages(&self, creator: &Identifier) -> Result<Vec<PageRequest>, FetchError> {
        let subject = creator.to_string();
        let url = self.query_endpoint(
            "post.paginateCreator",
            "creatorId",
            creator.creator_id(),
            &subject,
            FetchStage::List,
        )?;
        let response: PaginateResponse = self.client.get_json(url, &subject, FetchStage::List).await?;

        let pages = response
            .body
            .into_iter()
            .zip(1_u32..)
            .map(|(url, number)| PageRequest { number, url })
            .collect::<Vec<_>>();
        debug!(pages = pages.len(), "discovered listing pages");
        Ok(pages)
    }

    #[instrument(skip(self, page), fields(creator = %creator, page = page.number))]
    async fn fetch_page(
        &self,
        creator: &Identifier,
        page: &PageRequest,
    ) -> Result<Vec<Identifier>, FetchError> {
        let subject = format!("{creator} page {}", page.number);
        let url = Url::parse(&page.url).map_err(|error| {
            FetchError::new(
                subject.clone(),
                FetchStage::List,
                FetchCause::Connection {
                    url: page.url.clone(),
                    reason: format!("invalid page URL: {error}"),
                },
            )
        })?;
        let response: ListPageResponse = self.client.get_json(url, &subject, FetchStage::List).await?;

        Ok(response
            .body
            .items
            .into_iter()
            .map(|item| Identifier::post(Service::Fanbox, creator.creator_id(), item.id))
            .collect())
    }

    #[instrument(skip(self), fields(post = %post))]
    async fn fetch_post(&self, post: &Identifier) -> Result<ParsedPost, FetchError> {
        let subject = post.to_string();
        let post_id = post.post_id().unwrap_or_default();
        let url = self.query_endpoint("post.info", "postId", post_id, &subject, FetchStage::Detail)?;
        let response: PostInfoResponse = self.client.get_json(url, &subject, FetchStage::Detail).await?;
        let info = response.body;

        let mut direct_urls = Vec::new();
        if self.options.thumbnails {
            direct_urls.extend(info.cover_image_url.filter(|url| !url.is_empty()));
        }
        let text = match &info.body {
            Some(body) => {
                direct_urls.extend(body.direct_urls(self.options));
                body.scan_text()
            }
            None => {
                debug!("post body is restricted");
                String::new()
            }
        };

        Ok(ParsedPost {
            identifier: post.clone(),
            title: info.title,
            direct_urls,
            text,
        })
    }
}
