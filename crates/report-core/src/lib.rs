//! Core domain types for the sensor report pipeline.
//!
//! Holds the data model shared by every other crate: sensors, readings,
//! aggregate keys/entries, the error type, value formatting, and the
//! CLI/settings layer.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
