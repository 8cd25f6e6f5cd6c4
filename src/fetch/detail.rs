//! Post identifiers to download targets.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::pool::{FetchTask, PoolOutcome, WorkerPool};
use super::progress::ProgressReporter;
use super::{FetchError, FetchStage, TaskSubject};
use crate::connector::{Connector, ParsedPost};
use crate::extract::{classify_external, detect_password, extract_urls};
use crate::input::Identifier;
use crate::target::DownloadTarget;

/// Targets derived from one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostOutcome {
    /// The post.
    pub post: Identifier,
    /// Post title, when known.
    pub title: Option<String>,
    /// Platform-hosted files.
    pub direct: Vec<DownloadTarget>,
    /// Links to known third-party file hosts found in the post text.
    pub external: Vec<DownloadTarget>,
    /// The post text hints that its files need a password.
    pub password_protected: bool,
}

/// Splits a parsed post into direct and external targets.
///
/// Links in the text to hosts outside the known provider list are dropped.
#[must_use]
pub fn derive_targets(parsed: ParsedPost) -> PostOutcome {
    let ParsedPost {
        identifier,
        title,
        direct_urls,
        text,
    } = parsed;

    let external = extract_urls(&text)
        .into_iter()
        .filter_map(|url| {
            classify_external(&url).map(|host| DownloadTarget::external(url, host, identifier.clone()))
        })
        .collect::<Vec<_>>();
    let direct = direct_urls
        .into_iter()
        .map(|url| DownloadTarget::direct(url, identifier.clone()))
        .collect::<Vec<_>>();
    let password_protected = detect_password(&text);

    debug!(
        post = %identifier,
        direct = direct.len(),
        external = external.len(),
        password_protected,
        "derived targets"
    );

    PostOutcome {
        post: identifier,
        title,
        direct,
        external,
        password_protected,
    }
}

struct PostDetailTask {
    connector: Arc<dyn Connector>,
    post: Identifier,
}

#[async_trait]
impl FetchTask for PostDetailTask {
    type Output = PostOutcome;

    fn subject(&self) -> TaskSubject {
        TaskSubject::new(self.post.to_string(), FetchStage::Detail)
    }

    async fn run(self) -> Result<PostOutcome, FetchError> {
        let parsed = self.connector.fetch_post(&self.post).await?;
        Ok(derive_targets(parsed))
    }
}

/// Fetches post metadata through the worker pool.
#[derive(Debug, Clone)]
pub struct PostDetailFetcher {
    connector: Arc<dyn Connector>,
    pool: WorkerPool,
}

impl PostDetailFetcher {
    /// Creates a fetcher running post tasks on `pool`.
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, pool: WorkerPool) -> Self {
        Self { connector, pool }
    }

    /// Fetches every post once. `posts` must already be deduplicated.
    #[instrument(skip_all, fields(posts = posts.len()))]
    pub async fn fetch(
        &self,
        posts: &[Identifier],
        progress: Arc<dyn ProgressReporter>,
    ) -> PoolOutcome<PostOutcome> {
        let tasks = posts
            .iter()
            .map(|post| PostDetailTask {
                connector: Arc::clone(&self.connector),
                post: post.clone(),
            })
            .collect::<Vec<_>>();

        let outcome = self.pool.run(tasks, progress).await;
        info!(
            fetched = outcome.results.len(),
            errors = outcome.errors.len(),
            "post details complete"
        );
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::connector::fake::FakeConnector;
    use crate::extract::ExternalHost;
    use crate::fetch::NoopProgress;
    use crate::input::Service;
    use crate::target::TargetKind;

    fn post(id: &str) -> Identifier {
        Identifier::post(Service::Fanbox, "artist", id)
    }

    #[tokio::test]
    async fn test_failed_posts_become_detail_errors() {
        let mut connector = FakeConnector::default();
        for id in ["1", "2", "3", "4", "5"] {
            let url = format!("https://files/{id}.zip");
            connector = connector.with_post(id, &[url.as_str()], "");
        }
        connector.failing_posts.insert("2".to_string());
        connector.failing_posts.insert("4".to_string());

        let fetcher = PostDetailFetcher::new(Arc::new(connector), WorkerPool::new(5));
        let posts: Vec<_> = ["1", "2", "3", "4", "5"].into_iter().map(post).collect();
        let outcome = fetcher.fetch(&posts, Arc::new(NoopProgress)).await;

        assert_eq!(outcome.errors.len(), 2);
        assert!(outcome.errors.iter().all(|e| e.stage == FetchStage::Detail));
        let urls: Vec<_> = outcome
            .results
            .iter()
            .flat_map(|o| o.direct.iter().map(|t| t.url.as_str()))
            .collect();
        assert_eq!(
            urls,
            vec!["https://files/1.zip", "https://files/3.zip", "https://files/5.zip"]
        );
    }

    #[test]
    fn test_drive_link_and_attachment_split() {
        let outcome = derive_targets(ParsedPost {
            identifier: post("7"),
            title: None,
            direct_urls: vec!["https://downloads.fanbox.cc/files/post/7/a.zip".to_string()],
            text: "DL: https://drive.google.com/file/d/abc/view and see https://example.com".to_string(),
        });

        assert_eq!(outcome.direct.len(), 1);
        assert_eq!(outcome.direct[0].kind, TargetKind::Direct);
        assert_eq!(outcome.external.len(), 1);
        assert_eq!(
            outcome.external[0].kind,
            TargetKind::External(ExternalHost::GoogleDrive)
        );
        assert_eq!(outcome.external[0].origin_post, post("7"));
        assert!(!outcome.password_protected);
    }

    #[test]
    fn test_password_hint_is_flagged() {
        let outcome = derive_targets(ParsedPost {
            identifier: post("8"),
            title: Some("zip".to_string()),
            direct_urls: Vec::new(),
            text: "パスワードは支援者限定".to_string(),
        });
        assert!(outcome.password_protected);
        assert!(outcome.direct.is_empty());
    }
}
