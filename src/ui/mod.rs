//! User interface module - formatting for terminal output.

pub mod formatter;

pub use formatter::{display_error, display_run_summary, display_status, display_success};
