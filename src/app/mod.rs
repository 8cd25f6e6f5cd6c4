//! Application runtime composition modules.

pub(crate) mod config;
pub(crate) mod credentials;
pub(crate) mod exit;
pub(crate) mod input_processor;
pub(crate) mod output;
pub(crate) mod progress;
pub(crate) mod runtime;
pub(crate) mod terminal;
