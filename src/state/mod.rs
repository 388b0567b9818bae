//! State module for tracking pipeline progress
//!
//! # Components
//!
//! - `PipelineState`: The lifecycle of one run (idle, connected, scraping, persisting, exporting, done, failed)

mod pipeline_state;

pub use pipeline_state::PipelineState;
