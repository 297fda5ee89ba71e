//! Timing summarizer
//!
//! Collects repeated tool runs per URL and summarizes the durations in
//! their timing logs.

pub mod collect;
pub mod summarize;

pub use collect::{collect, collection_dir, split_flags, CollectOptions};
pub use summarize::{
    build_filter, load_samples, render, summarize, OutputFormat, Samples, SummaryRow,
};
