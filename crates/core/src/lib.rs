//! snmp-reader-core: Core traits and registry for the snmp-reader engine.
//!
//! This crate contains the display sink seam, the reader registry with its
//! opaque handles, and shared constants.

pub mod constants;
mod display_sink;
mod registry;

pub use constants::{
    CHART_CONFIG_KEYWORD, CONFIG_KEYWORD, DEFAULT_PORT, DEFAULT_TICK_INTERVAL, INFO_BUFFER_LEN,
    LABEL_BUFFER_LEN, MAX_CHART_SERIES, MAX_CONFIGURED_OIDS, MAX_OIDS, MIN_DELAY_TICKS,
    SYS_UPTIME_OID,
};
pub use display_sink::{DisplaySink, NullSink};
pub use registry::{LabelLookup, Labeled, ReaderId, Registry};

// Re-export types used in trait signatures for convenience
pub use snmp_reader_types::{Oid, ReaderConfig, SampleSet};
