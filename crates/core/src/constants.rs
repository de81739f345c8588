//! Shared constants for the engine

use std::time::Duration;

/// Maximum number of OIDs in one request, the implicit uptime OID included
pub const MAX_OIDS: usize = 10;

/// Maximum number of OIDs a reader may configure (uptime takes one slot)
pub const MAX_CONFIGURED_OIDS: usize = MAX_OIDS - 1;

/// Smallest send cadence in host ticks. Anything faster saturates the transport.
pub const MIN_DELAY_TICKS: u32 = 2;

/// Standard SNMP agent port
pub const DEFAULT_PORT: u16 = 161;

/// Host tick granularity used when nothing else is configured
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// sysUpTime.0, requested first in every GET
pub const SYS_UPTIME_OID: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 3, 0];

/// Chart series stored per reader
pub const MAX_CHART_SERIES: usize = 3;

/// Output budget for a rendered label, in characters
pub const LABEL_BUFFER_LEN: usize = 256;

/// Output budget for a rendered info/tooltip text, in characters
pub const INFO_BUFFER_LEN: usize = 2048;

/// Leading keyword of every persisted reader line
pub const CONFIG_KEYWORD: &str = "snmp_monitor";

/// Second token marking a chart block line
pub const CHART_CONFIG_KEYWORD: &str = "chart_config";
