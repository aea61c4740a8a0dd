//! Semex CLI support
//!
//! The `semex` binary is a thin clap front end over these modules.

pub mod batch;
pub mod output;

pub use batch::{extract_all, extract_input, open_source, DocumentRun};
pub use output::{run_with_output, OutputOptions, OutputSummary, SharedBuffer};
