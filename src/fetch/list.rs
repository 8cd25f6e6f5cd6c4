//! Creator listing pages to post identifiers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::pool::{FetchTask, WorkerPool};
use super::progress::ProgressReporter;
use super::{FetchError, FetchStage, TaskSubject};
use crate::connector::{Connector, PageRequest};
use crate::input::{Identifier, PageRange, dedupe_identifiers};

/// A creator together with the pages requested for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorRequest {
    /// Creator identifier.
    pub creator: Identifier,
    /// Pages to fetch; pages past the creator's last page are ignored.
    pub pages: PageRange,
}

impl CreatorRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(creator: Identifier, pages: PageRange) -> Self {
        Self { creator, pages }
    }
}

/// Post identifiers and errors from the list stage.
#[derive(Debug, Default)]
pub struct ListOutcome {
    /// Deduplicated post identifiers in discovery order.
    pub posts: Vec<Identifier>,
    /// Failed discoveries and pages, all with stage `list`.
    pub errors: Vec<FetchError>,
}

struct ListPageTask {
    connector: Arc<dyn Connector>,
    creator: Identifier,
    page: PageRequest,
}

#[async_trait]
impl FetchTask for ListPageTask {
    type Output = Vec<Identifier>;

    fn subject(&self) -> TaskSubject {
        TaskSubject::new(
            format!("{} page {}", self.creator, self.page.number),
            FetchStage::List,
        )
    }

    async fn run(self) -> Result<Vec<Identifier>, FetchError> {
        self.connector.fetch_page(&self.creator, &self.page).await
    }
}

/// Walks creators' listing pages through the worker pool.
#[derive(Debug, Clone)]
pub struct PaginatedListFetcher {
    connector: Arc<dyn Connector>,
    pool: WorkerPool,
}

impl PaginatedListFetcher {
    /// Creates a fetcher running page tasks on `pool`.
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, pool: WorkerPool) -> Self {
        Self { connector, pool }
    }

    /// Discovers each creator's pages, fetches the in-range ones and returns
    /// the deduplicated post identifiers.
    ///
    /// Discovery runs one creator at a time; page fetches for all creators
    /// share one pool run. A failed discovery or page is recorded and the rest
    /// continue.
    #[instrument(skip_all, fields(creators = creators.len()))]
    pub async fn fetch(
        &self,
        creators: &[CreatorRequest],
        progress: Arc<dyn ProgressReporter>,
    ) -> ListOutcome {
        let mut outcome = ListOutcome::default();
        let mut tasks = Vec::new();

        for request in creators {
            let pages = match self.connector.discover_pages(&request.creator).await {
                Ok(pages) => pages,
                Err(error) => {
                    warn!(creator = %request.creator, error = %error, "page discovery failed");
                    outcome.errors.push(error);
                    continue;
                }
            };

            let available = pages.len();
            let selected: Vec<PageRequest> = pages
                .into_iter()
                .filter(|page| request.pages.contains(page.number))
                .collect();
            debug!(
                creator = %request.creator,
                range = %request.pages,
                available,
                selected = selected.len(),
                "selected listing pages"
            );

            tasks.extend(selected.into_iter().map(|page| ListPageTask {
                connector: Arc::clone(&self.connector),
                creator: request.creator.clone(),
                page,
            }));
        }

        let pooled = self.pool.run(tasks, progress).await;
        outcome.errors.extend(pooled.errors);
        outcome.posts = dedupe_identifiers(pooled.results.into_iter().flatten().collect());

        info!(
            posts = outcome.posts.len(),
            errors = outcome.errors.len(),
            "listing complete"
        );
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::connector::fake::FakeConnector;
    use crate::fetch::NoopProgress;
    use crate::input::Service;

    fn creator(id: &str) -> Identifier {
        Identifier::creator(Service::Fanbox, id)
    }

    fn request(id: &str, pages: &str) -> CreatorRequest {
        CreatorRequest::new(creator(id), PageRange::parse(pages).unwrap())
    }

    async fn run(connector: FakeConnector, requests: &[CreatorRequest]) -> (ListOutcome, Arc<FakeConnector>) {
        let connector = Arc::new(connector);
        let fetcher = PaginatedListFetcher::new(connector.clone(), WorkerPool::new(3));
        let outcome = fetcher.fetch(requests, Arc::new(NoopProgress)).await;
        (outcome, connector)
    }

    #[tokio::test]
    async fn test_range_selects_only_requested_pages() {
        let (outcome, connector) = run(
            FakeConnector::default().with_creator("artist", 7),
            &[request("artist", "3-5")],
        )
        .await;

        assert_eq!(connector.fetched_pages(), vec![3, 4, 5]);
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.posts.len(), 6);
    }

    #[tokio::test]
    async fn test_range_past_last_page_is_silently_empty() {
        let (outcome, connector) = run(
            FakeConnector::default().with_creator("artist", 7),
            &[request("artist", "10-20")],
        )
        .await;

        assert!(connector.fetched_pages().is_empty());
        assert!(outcome.posts.is_empty());
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn test_unbounded_range_fetches_every_page() {
        let (_, connector) = run(
            FakeConnector::default().with_creator("artist", 4),
            &[request("artist", "")],
        )
        .await;
        assert_eq!(connector.fetched_pages(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_failed_page_does_not_stop_siblings() {
        let mut connector = FakeConnector::default().with_creator("artist", 5);
        connector.failing_pages.insert(2);
        let (outcome, connector) = run(connector, &[request("artist", "")]).await;

        assert_eq!(connector.fetched_pages(), vec![1, 2, 3, 4, 5]);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].stage, FetchStage::List);
        assert_eq!(outcome.errors[0].subject, "fanbox/artist page 2");
        assert_eq!(outcome.posts.len(), 8);
    }

    #[tokio::test]
    async fn test_failed_discovery_is_recorded_and_other_creators_continue() {
        let mut connector = FakeConnector::default()
            .with_creator("broken", 3)
            .with_creator("fine", 2);
        connector.failing_creators.insert("broken".to_string());
        let (outcome, _) = run(connector, &[request("broken", ""), request("fine", "")]).await;

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].subject, "fanbox/broken");
        assert_eq!(outcome.posts.len(), 4);
        assert!(outcome.posts.iter().all(|p| p.creator_id() == "fine"));
    }

    #[tokio::test]
    async fn test_posts_are_deduplicated_in_discovery_order() {
        let mut connector = FakeConnector::default().with_creator("artist", 3);
        connector.repeated_post = Some("pinned".to_string());
        let (outcome, _) = run(connector, &[request("artist", "")]).await;

        let ids: Vec<_> = outcome.posts.iter().filter_map(Identifier::post_id).collect();
        assert_eq!(ids, vec!["10", "11", "pinned", "20", "21", "30", "31"]);
    }
}
