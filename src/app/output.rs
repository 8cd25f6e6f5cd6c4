//! JSON report written to stdout.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{Context, Result};
use harvester_core::fetch::{ErrorCategory, FetchError, FetchStage};
use harvester_core::{DownloadTarget, ExternalHost, Identifier, Platform, RunResult};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    platform: Platform,
    summary: Summary,
    direct_targets: &'a [DownloadTarget],
    external_targets: &'a [DownloadTarget],
    external_by_host: BTreeMap<ExternalHost, Vec<&'a str>>,
    password_protected_posts: &'a [Identifier],
    errors: Vec<ErrorReport<'a>>,
}

#[derive(Debug, Serialize)]
struct Summary {
    direct: usize,
    external: usize,
    google_drive: usize,
    password_protected_posts: usize,
    errors: usize,
}

#[derive(Debug, Serialize)]
struct ErrorReport<'a> {
    stage: FetchStage,
    subject: &'a str,
    category: ErrorCategory,
    message: String,
}

impl<'a> From<&'a FetchError> for ErrorReport<'a> {
    fn from(error: &'a FetchError) -> Self {
        Self {
            stage: error.stage,
            subject: &error.subject,
            category: error.category(),
            message: error.cause.to_string(),
        }
    }
}

fn build_report(platform: Platform, result: &RunResult) -> RunReport<'_> {
    let external_by_host = result
        .external_by_host()
        .into_iter()
        .map(|(host, targets)| (host, targets.into_iter().map(|t| t.url.as_str()).collect()))
        .collect();

    RunReport {
        platform,
        summary: Summary {
            direct: result.direct_targets.len(),
            external: result.external_targets.len(),
            google_drive: result.google_drive_targets().len(),
            password_protected_posts: result.password_protected_posts.len(),
            errors: result.errors.len(),
        },
        direct_targets: &result.direct_targets,
        external_targets: &result.external_targets,
        external_by_host,
        password_protected_posts: &result.password_protected_posts,
        errors: result.errors.iter().map(ErrorReport::from).collect(),
    }
}

/// Writes the run result as pretty JSON followed by a newline.
pub(crate) fn write_report(
    mut out: impl Write,
    platform: Platform,
    result: &RunResult,
) -> Result<()> {
    let report = build_report(platform, result);
    serde_json::to_writer_pretty(&mut out, &report).context("Failed to serialize run report")?;
    writeln!(out).context("Failed to write run report")?;
    Ok(())
}
