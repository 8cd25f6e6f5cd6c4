//! Terminal progress bar for fetch stages.

use std::io::IsTerminal;
use std::sync::Arc;

use harvester_core::fetch::{FetchStage, LogProgress, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};

use crate::app::terminal::{is_dumb_terminal, should_use_bar};

/// Renders one stage as an indicatif progress bar on stderr.
pub(crate) struct BarProgress {
    bar: ProgressBar,
    label: &'static str,
}

impl BarProgress {
    pub(crate) fn new(stage: FetchStage) -> Self {
        let label = match stage {
            FetchStage::List => "Listing pages",
            FetchStage::Detail => "Fetching posts",
        };
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar, label }
    }
}

impl ProgressReporter for BarProgress {
    fn on_start(&self, total: usize) {
        self.bar.set_length(u64::try_from(total).unwrap_or(u64::MAX));
        self.bar.set_position(0);
        self.bar.set_message(self.label);
    }

    fn on_item_done(&self) {
        self.bar.inc(1);
    }

    fn on_finish(&self, had_errors: bool) {
        if had_errors {
            self.bar
                .abandon_with_message(format!("{} (with errors)", self.label));
        } else {
            self.bar.finish_and_clear();
        }
    }
}

/// Picks a bar when stderr is an interactive terminal, otherwise log lines.
pub(crate) fn reporter_for(stage: FetchStage, quiet: bool) -> Arc<dyn ProgressReporter> {
    if should_use_bar(std::io::stderr().is_terminal(), quiet, is_dumb_terminal()) {
        Arc::new(BarProgress::new(stage))
    } else {
        Arc::new(LogProgress::new(stage))
    }
}
