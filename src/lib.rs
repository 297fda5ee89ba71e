//! smokehouse - smoke tests and timing summaries for the Lighthouse CLI
//!
//! Two independent utilities over the same tool boundary: a smoke runner
//! that checks results against stored expectations, and a timing
//! summarizer that aggregates the tool's internal timing log across runs.

pub mod cli;
pub mod commands;
pub mod common;
pub mod smoke;
pub mod timing;
pub mod tool;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use smoke::Tally;
