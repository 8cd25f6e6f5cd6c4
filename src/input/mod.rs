//! Input validation for creator/post identifiers and page ranges.
//!
//! Everything in this module runs before any request is made. Failures are
//! reported as [`InputError`] and are fatal for the run.

mod error;
mod identifier;
mod page_range;

pub use error::InputError;
pub use identifier::{
    Identifier, KemonoService, Service, dedupe_identifiers, parse_creator, parse_post,
};
pub use page_range::PageRange;
