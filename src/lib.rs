//! Generate a Go multiplexer type that dispatches to one of several
//! implementations of the same API, selected at runtime by tag.

pub mod config;
pub mod errors;
pub mod extract;
pub mod merge;
pub mod output;
pub mod parse;
pub mod pipeline;
pub mod rewrite;
pub mod walk;

pub use config::MergeConfig;
pub use errors::{MergeError, Result};
pub use pipeline::{generate, generate_with, merge_packages};
