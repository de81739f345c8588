//! snmp-reader-types: Shared data types for the snmp-reader polling engine.
//!
//! This crate contains pure data types (OIDs, sample values, reader
//! configuration) that are shared across all snmp-reader crates. Nothing
//! in here performs I/O, making it suitable as a foundation layer.

pub mod oid;
pub mod reader_config;
pub mod sample;

// Re-export commonly used types at the crate root for convenience
pub use oid::Oid;
pub use reader_config::{ChartConfig, ReaderConfig, SnmpVersion, TransportKind};
pub use sample::{Sample, SampleKind, SampleSet};
