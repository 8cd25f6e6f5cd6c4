//! Turns command-line identifiers and page specs into a harvest request.

use anyhow::Result;
use harvester_core::input::{parse_creator, parse_post};
use harvester_core::{HarvestRequest, InputError, PageRange, Platform};

/// Validates every identifier and pairs page specs with creators by position.
///
/// Creators without a page spec get an unbounded range.
pub(crate) fn build_request(
    platform: Platform,
    creators: &[String],
    pages: &[String],
    posts: &[String],
) -> Result<HarvestRequest> {
    if pages.len() > creators.len() {
        return Err(InputError::PageCountMismatch {
            creators: creators.len(),
            pages: pages.len(),
        }
        .into());
    }

    let creators = creators
        .iter()
        .map(|input| parse_creator(platform, input))
        .collect::<Result<Vec<_>, _>>()?;
    let mut ranges = pages
        .iter()
        .map(|spec| PageRange::parse(spec))
        .collect::<Result<Vec<_>, _>>()?;
    ranges.resize(creators.len(), PageRange::unbounded());
    let posts = posts
        .iter()
        .map(|input| parse_post(platform, input))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(HarvestRequest::from_parallel(creators, ranges, posts)?)
}
