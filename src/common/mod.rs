//! Common utilities shared between the smoke runner and the timing summarizer

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};
