//! Runtime orchestration layer for the sensor report pipeline.
//!
//! Owns the concurrent ingestion phase: one reader task feeding a bounded
//! record queue, a pool of parse/fold workers draining it, and the join
//! that quiesces the aggregate store before reporting starts.

pub mod pipeline;

pub use report_core as core;
pub use report_data as data;
