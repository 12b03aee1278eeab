//! Data layer for the sensor report pipeline.
//!
//! Responsible for parsing raw delimited records into readings, folding
//! readings into the shared aggregate store, serializing the summary
//! artifact, and rendering the grouped report view.

pub mod parser;
pub mod report;
pub mod store;
pub mod summary;

pub use report_core as core;
