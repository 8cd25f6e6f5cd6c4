//! In-memory connector for pipeline unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Connector, PageRequest, ParsedPost};
use crate::fetch::{FetchCause, FetchError, FetchStage};
use crate::input::Identifier;
use crate::platform::Platform;

/// Scripted connector: creators have `pages` listing pages, page `n` lists
/// posts `"{n}0"` and `"{n}1"`, and posts carry the configured content.
#[derive(Debug, Default)]
pub(crate) struct FakeConnector {
    pub pages: HashMap<String, u32>,
    pub failing_creators: HashSet<String>,
    pub failing_pages: HashSet<u32>,
    pub repeated_post: Option<String>,
    pub posts: HashMap<String, (Vec<String>, String)>,
    pub failing_posts: HashSet<String>,
    pub fetched_pages: Mutex<Vec<u32>>,
}

impl FakeConnector {
    pub fn with_creator(mut self, creator_id: &str, pages: u32) -> Self {
        self.pages.insert(creator_id.to_string(), pages);
        self
    }

    pub fn with_post(mut self, post_id: &str, direct: &[&str], text: &str) -> Self {
        self.posts.insert(
            post_id.to_string(),
            (direct.iter().map(ToString::to_string).collect(), text.to_string()),
        );
        self
    }

    pub fn fetched_pages(&self) -> Vec<u32> {
        let mut pages = self.fetched_pages.lock().map(|p| p.clone()).unwrap_or_default();
        pages.sort_unstable();
        pages
    }
}

fn not_found(subject: String, stage: FetchStage) -> FetchError {
    FetchError::new(
        subject,
        stage,
        FetchCause::Response {
            url: "http://fake".to_string(),
            status: 404,
        },
    )
}

#[async_trait]
impl Connector for FakeConnector {
    fn platform(&self) -> Platform {
        Platform::PixivFanbox
    }

    async fn discover_pages(&self, creator: &Identifier) -> Result<Vec<PageRequest>, FetchError> {
        if self.failing_creators.contains(creator.creator_id()) {
            return Err(not_found(creator.to_string(), FetchStage::List));
        }
        let count = self.pages.get(creator.creator_id()).copied().unwrap_or(0);
        Ok((1..=count)
            .map(|number| PageRequest {
                number,
                url: format!("http://fake/{}/{number}", creator.creator_id()),
            })
            .collect())
    }

    async fn fetch_page(
        &self,
        creator: &Identifier,
        page: &PageRequest,
    ) -> Result<Vec<Identifier>, FetchError> {
        if let Ok(mut fetched) = self.fetched_pages.lock() {
            fetched.push(page.number);
        }
        if self.failing_pages.contains(&page.number) {
            return Err(not_found(
                format!("{creator} page {}", page.number),
                FetchStage::List,
            ));
        }
        let mut ids = vec![format!("{}0", page.number), format!("{}1", page.number)];
        ids.extend(self.repeated_post.clone());
        Ok(ids
            .into_iter()
            .map(|id| Identifier::post(creator.service(), creator.creator_id(), id))
            .collect())
    }

    async fn fetch_post(&self, post: &Identifier) -> Result<ParsedPost, FetchError> {
        let post_id = post.post_id().unwrap_or_default();
        if self.failing_posts.contains(post_id) {
            return Err(not_found(post.to_string(), FetchStage::Detail));
        }
        let (direct_urls, text) = self.posts.get(post_id).cloned().unwrap_or_default();
        Ok(ParsedPost {
            identifier: post.clone(),
            title: Some(format!("post {post_id}")),
            direct_urls,
            text,
        })
    }
}
