//! snmp-reader: SNMP polling engine for panel monitors
//!
//! This library provides:
//! - Readers, one per configured monitor, with their derived-value rules
//! - The monitor context that polls every reader from a single host tick
//! - Label templates and tooltip rendering
//! - Settings and reader-file persistence

pub mod config;
pub mod core;
pub mod displayers;

// Re-export commonly used types
pub use self::config::AppSettings;
pub use self::core::{Monitor, Reader};
pub use snmp_reader_core::{DisplaySink, NullSink, ReaderId};
pub use snmp_reader_types::ReaderConfig;
