//! The harvesting pipeline.
//!
//! A [`Harvester`] drives one run: creators are expanded into post
//! identifiers by the list stage, those are merged with directly requested
//! posts and deduplicated, and the detail stage turns them into download
//! targets. Both stages use the same bounded [`WorkerPool`].
//!
//! ```text
//! Created -> ListsFetching -> ListsDone -> DetailsFetching -> DetailsDone -> Aggregated
//! ```

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::aggregate::{ResultAggregator, RunResult};
use crate::connector::Connector;
use crate::fetch::{
    ClientError, CreatorRequest, FetchStage, NoopProgress, PaginatedListFetcher,
    PostDetailFetcher, ProgressReporter, WorkerPool,
};
use crate::input::{Identifier, InputError, PageRange, dedupe_identifiers};
use crate::platform::{Platform, PlatformRegistry};

/// Contract breaches by the caller of the library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DevError {
    /// An identifier belongs to another platform than the connector's.
    #[error("{identifier} is not a {expected} identifier")]
    PlatformMismatch {
        /// Offending identifier.
        identifier: String,
        /// Connector platform.
        expected: Platform,
    },

    /// A post identifier was passed where a creator was expected.
    #[error("{0} is a post, expected a creator")]
    ExpectedCreator(String),

    /// A creator identifier was passed where a post was expected.
    #[error("{0} is a creator, expected a post")]
    ExpectedPost(String),

    /// Creators and page ranges were not paired one to one.
    #[error("got {creators} creators but {pages} page ranges")]
    MismatchedLengths {
        /// Number of creators.
        creators: usize,
        /// Number of page ranges.
        pages: usize,
    },

    /// The run tried to move to an earlier or skipped state.
    #[error("run cannot move from {from} to {to}")]
    StateRegression {
        /// Current state.
        from: RunState,
        /// Requested state.
        to: RunState,
    },
}

/// Top-level library error.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// User input was rejected.
    #[error(transparent)]
    Input(#[from] InputError),

    /// The library was called incorrectly.
    #[error("internal error: {0}")]
    Dev(#[from] DevError),

    /// The HTTP client could not be set up.
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Phase of a run. Transitions only move forward by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    /// Nothing fetched yet.
    Created,
    /// Listing pages in flight.
    ListsFetching,
    /// Every listing page finished.
    ListsDone,
    /// Post details in flight.
    DetailsFetching,
    /// Every post finished.
    DetailsDone,
    /// Result finalized.
    Aggregated,
}

impl RunState {
    fn next(self) -> Option<Self> {
        match self {
            Self::Created => Some(Self::ListsFetching),
            Self::ListsFetching => Some(Self::ListsDone),
            Self::ListsDone => Some(Self::DetailsFetching),
            Self::DetailsFetching => Some(Self::DetailsDone),
            Self::DetailsDone => Some(Self::Aggregated),
            Self::Aggregated => None,
        }
    }

    /// Moves to `to` if it is the direct successor of `self`.
    ///
    /// # Errors
    ///
    /// Returns [`DevError::StateRegression`] for any other transition.
    pub fn advance(&mut self, to: Self) -> Result<(), DevError> {
        if self.next() == Some(to) {
            debug!(from = %self, to = %to, "run state");
            *self = to;
            Ok(())
        } else {
            Err(DevError::StateRegression { from: *self, to })
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::ListsFetching => "lists-fetching",
            Self::ListsDone => "lists-done",
            Self::DetailsFetching => "details-fetching",
            Self::DetailsDone => "details-done",
            Self::Aggregated => "aggregated",
        };
        f.write_str(name)
    }
}

/// Validated input of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestRequest {
    creators: Vec<CreatorRequest>,
    posts: Vec<Identifier>,
}

impl HarvestRequest {
    /// Creates a request, dropping repeated creators (first page range wins)
    /// and repeated posts.
    #[must_use]
    pub fn new(creators: Vec<CreatorRequest>, posts: Vec<Identifier>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let creators = creators
            .into_iter()
            .filter(|request| seen.insert(request.creator.clone()))
            .collect();
        Self {
            creators,
            posts: dedupe_identifiers(posts),
        }
    }

    /// Pairs `creators[i]` with `pages[i]`.
    ///
    /// # Errors
    ///
    /// Returns [`DevError::MismatchedLengths`] if the slices differ in length.
    pub fn from_parallel(
        creators: Vec<Identifier>,
        pages: Vec<PageRange>,
        posts: Vec<Identifier>,
    ) -> Result<Self, DevError> {
        if creators.len() != pages.len() {
            return Err(DevError::MismatchedLengths {
                creators: creators.len(),
                pages: pages.len(),
            });
        }
        let requests = creators
            .into_iter()
            .zip(pages)
            .map(|(creator, pages)| CreatorRequest::new(creator, pages))
            .collect();
        Ok(Self::new(requests, posts))
    }

    /// Creator requests, deduplicated.
    #[must_use]
    pub fn creators(&self) -> &[CreatorRequest] {
        &self.creators
    }

    /// Direct post requests, deduplicated.
    #[must_use]
    pub fn posts(&self) -> &[Identifier] {
        &self.posts
    }

    /// Returns true if nothing was requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.creators.is_empty() && self.posts.is_empty()
    }

    fn validate(&self, platform: Platform) -> Result<(), DevError> {
        for request in &self.creators {
            check_platform(&request.creator, platform)?;
            if request.creator.is_post() {
                return Err(DevError::ExpectedCreator(request.creator.to_string()));
            }
        }
        for post in &self.posts {
            check_platform(post, platform)?;
            if !post.is_post() {
                return Err(DevError::ExpectedPost(post.to_string()));
            }
        }
        Ok(())
    }
}

fn check_platform(identifier: &Identifier, expected: Platform) -> Result<(), DevError> {
    if identifier.platform() == expected {
        Ok(())
    } else {
        Err(DevError::PlatformMismatch {
            identifier: identifier.to_string(),
            expected,
        })
    }
}

/// Runs the list and detail stages for one connector.
#[derive(Clone)]
pub struct Harvester {
    connector: Arc<dyn Connector>,
    pool: WorkerPool,
    list_progress: Arc<dyn ProgressReporter>,
    detail_progress: Arc<dyn ProgressReporter>,
}

impl fmt::Debug for Harvester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harvester")
            .field("connector", &self.connector)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl Harvester {
    /// Creates a harvester with at most `max_concurrency` calls in flight.
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, max_concurrency: usize) -> Self {
        Self {
            connector,
            pool: WorkerPool::new(max_concurrency),
            list_progress: Arc::new(NoopProgress),
            detail_progress: Arc::new(NoopProgress),
        }
    }

    /// Creates a harvester using the connector platform's concurrency bound.
    #[must_use]
    pub fn for_platform(connector: Arc<dyn Connector>, registry: &PlatformRegistry) -> Self {
        let max_concurrency = registry.get(connector.platform()).max_concurrency;
        Self::new(connector, max_concurrency)
    }

    /// Sets the progress reporter for one stage.
    #[must_use]
    pub fn with_progress(mut self, stage: FetchStage, reporter: Arc<dyn ProgressReporter>) -> Self {
        match stage {
            FetchStage::List => self.list_progress = reporter,
            FetchStage::Detail => self.detail_progress = reporter,
        }
        self
    }

    /// Runs both stages and aggregates the result.
    ///
    /// Item failures are collected in [`RunResult::errors`]; the run itself
    /// only fails when the request does not fit the connector.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Dev`] when an identifier is for another
    /// platform or of the wrong kind.
    #[instrument(skip_all, fields(
        platform = %self.connector.platform(),
        creators = request.creators.len(),
        posts = request.posts.len(),
    ))]
    pub async fn run(&self, request: HarvestRequest) -> Result<RunResult, HarvestError> {
        request.validate(self.connector.platform())?;
        let mut state = RunState::Created;
        let mut aggregator = ResultAggregator::new();

        state.advance(RunState::ListsFetching)?;
        let listed = PaginatedListFetcher::new(Arc::clone(&self.connector), self.pool)
            .fetch(&request.creators, Arc::clone(&self.list_progress))
            .await;
        aggregator.add_errors(listed.errors);
        state.advance(RunState::ListsDone)?;

        let mut posts = listed.posts;
        posts.extend(request.posts);
        let posts = dedupe_identifiers(posts);
        info!(posts = posts.len(), "fetching post details");

        state.advance(RunState::DetailsFetching)?;
        let details = PostDetailFetcher::new(Arc::clone(&self.connector), self.pool)
            .fetch(&posts, Arc::clone(&self.detail_progress))
            .await;
        state.advance(RunState::DetailsDone)?;

        for outcome in details.results {
            aggregator.add_post(outcome);
        }
        aggregator.add_errors(details.errors);
        let result = aggregator.finish();
        state.advance(RunState::Aggregated)?;

        info!(
            direct = result.direct_targets.len(),
            external = result.external_targets.len(),
            errors = result.errors.len(),
            "run complete"
        );
        Ok(result)
    }
}
