//! Merging of per-post outputs into one run result.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::extract::ExternalHost;
use crate::fetch::{FetchError, PostOutcome};
use crate::input::Identifier;
use crate::target::{DownloadTarget, TargetKind};

/// Everything one run produced.
///
/// `direct_targets` and `external_targets` are disjoint, duplicate-free by
/// URL and in discovery order. `errors` are ordered by stage, then subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    /// Files hosted by the platform.
    pub direct_targets: Vec<DownloadTarget>,
    /// Links to third-party file hosts.
    pub external_targets: Vec<DownloadTarget>,
    /// Every recorded fetch failure.
    pub errors: Vec<FetchError>,
    /// Posts whose text hints at a password, in discovery order.
    pub password_protected_posts: Vec<Identifier>,
}

impl RunResult {
    /// Returns true if any item failed.
    #[must_use]
    pub fn had_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Number of direct and external targets.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.direct_targets.len() + self.external_targets.len()
    }

    /// External targets grouped by host, each group in discovery order.
    #[must_use]
    pub fn external_by_host(&self) -> BTreeMap<ExternalHost, Vec<&DownloadTarget>> {
        let mut groups: BTreeMap<ExternalHost, Vec<&DownloadTarget>> = BTreeMap::new();
        for target in &self.external_targets {
            if let Some(host) = target.external_host() {
                groups.entry(host).or_default().push(target);
            }
        }
        groups
    }

    /// External targets on Google Drive.
    #[must_use]
    pub fn google_drive_targets(&self) -> Vec<&DownloadTarget> {
        self.external_targets
            .iter()
            .filter(|target| target.kind == TargetKind::External(ExternalHost::GoogleDrive))
            .collect()
    }
}

/// Accumulates post outcomes and errors; read only after every task finished.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    seen_urls: HashSet<String>,
    flagged_posts: HashSet<Identifier>,
    result: RunResult,
}

impl ResultAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one target. Returns false if its URL was already collected.
    pub fn add_target(&mut self, target: DownloadTarget) -> bool {
        if !self.seen_urls.insert(target.url.clone()) {
            return false;
        }
        match target.kind {
            TargetKind::Direct => self.result.direct_targets.push(target),
            TargetKind::External(_) => self.result.external_targets.push(target),
        }
        true
    }

    /// Adds every target of a post and its password flag.
    pub fn add_post(&mut self, outcome: PostOutcome) {
        if outcome.password_protected && self.flagged_posts.insert(outcome.post.clone()) {
            self.result.password_protected_posts.push(outcome.post);
        }
        for target in outcome.direct.into_iter().chain(outcome.external) {
            self.add_target(target);
        }
    }

    /// Adds recorded errors.
    pub fn add_errors(&mut self, errors: impl IntoIterator<Item = FetchError>) {
        self.result.errors.extend(errors);
    }

    /// Orders the errors and returns the result.
    #[must_use]
    pub fn finish(mut self) -> RunResult {
        self.result
            .errors
            .sort_by(|a, b| (a.stage, &a.subject).cmp(&(b.stage, &b.subject)));
        debug!(
            direct = self.result.direct_targets.len(),
            external = self.result.external_targets.len(),
            errors = self.result.errors.len(),
            "aggregated run result"
        );
        self.result
    }
}
