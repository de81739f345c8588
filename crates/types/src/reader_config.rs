//! Reader configuration types.

use serde::{Deserialize, Serialize};

/// SNMP protocol version spoken by a reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SnmpVersion {
    #[default]
    V1,
    V2c,
}

impl SnmpVersion {
    /// URL scheme used in the persisted pseudo-URL
    pub fn scheme(&self) -> &'static str {
        match self {
            SnmpVersion::V1 => "snmp",
            SnmpVersion::V2c => "snmp-v2c",
        }
    }

    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "snmp" => Some(SnmpVersion::V1),
            "snmp-v2c" => Some(SnmpVersion::V2c),
            _ => None,
        }
    }
}

/// Transport selector that may follow the host name (`host:udp6`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportKind {
    Udp,
    Udp6,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Udp => "udp",
            TransportKind::Udp6 => "udp6",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "udp" => Some(TransportKind::Udp),
            "udp6" | "udpv6" => Some(TransportKind::Udp6),
            _ => None,
        }
    }
}

fn default_grids() -> u32 {
    5
}

/// Chart axis settings, persisted as a keyed block next to the reader line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Fixed chart maximum, used when `auto_max` is off
    #[serde(default)]
    pub fixed_max: u64,
    /// Follow the largest stored point instead of `fixed_max`
    #[serde(default)]
    pub auto_max: bool,
    /// Number of horizontal grid lines
    #[serde(default = "default_grids")]
    pub grids: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            fixed_max: 0,
            auto_max: true,
            grids: default_grids(),
        }
    }
}

fn default_port() -> u16 {
    161
}

fn default_delay() -> u32 {
    100
}

fn default_divisor() -> u32 {
    1
}

/// Configuration of one monitor row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Display name
    pub label: String,
    pub host: String,
    /// Optional transport selector written after the host
    #[serde(default)]
    pub transport: Option<TransportKind>,
    #[serde(default = "default_port")]
    pub port: u16,
    pub community: String,
    #[serde(default)]
    pub version: SnmpVersion,
    /// OID prefix every element is appended to
    pub oid_base: String,
    /// Elements appended to `oid_base`; empty means `oid_base` is the OID
    #[serde(default)]
    pub elements: Vec<String>,
    /// Host ticks between two requests
    #[serde(default = "default_delay")]
    pub delay: u32,
    /// Report rate of change instead of the absolute value
    #[serde(default)]
    pub delta: bool,
    /// 0 is treated as 1, except in delta mode where it disables time normalization
    #[serde(default = "default_divisor")]
    pub divisor: u32,
    #[serde(default)]
    pub auto_scale: bool,
    /// Publish the text label
    #[serde(default)]
    pub panel: bool,
    /// Suppress chart points
    #[serde(default)]
    pub hide: bool,
    /// Label template, see the presentation module
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub chart: ChartConfig,
}

impl ReaderConfig {
    /// The configured OID strings, in request order (uptime not included)
    pub fn oid_strings(&self) -> Vec<String> {
        if self.elements.is_empty() {
            return vec![self.oid_base.clone()];
        }
        let base = self.oid_base.trim_end_matches('.');
        self.elements
            .iter()
            .map(|element| {
                let element = element.trim_start_matches('.');
                if base.is_empty() {
                    element.to_string()
                } else {
                    format!("{}.{}", base, element)
                }
            })
            .collect()
    }

    /// `host[:transport]` as it appears in the pseudo-URL
    pub fn target(&self) -> String {
        match self.transport {
            Some(kind) => format!("{}:{}", self.host, kind.as_str()),
            None => self.host.clone(),
        }
    }

    /// The pseudo-URL identifying this reader's data source
    pub fn url(&self) -> String {
        format!(
            "{}://{}@{}:{}/{}",
            self.version.scheme(),
            self.community,
            self.target(),
            self.port,
            self.oid_base
        )
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            label: String::new(),
            host: "localhost".to_string(),
            transport: None,
            port: default_port(),
            community: "public".to_string(),
            version: SnmpVersion::V1,
            oid_base: String::new(),
            elements: Vec::new(),
            delay: default_delay(),
            delta: false,
            divisor: default_divisor(),
            auto_scale: false,
            panel: true,
            hide: false,
            template: String::new(),
            chart: ChartConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oid_strings_append_elements() {
        let config = ReaderConfig {
            oid_base: ".1.3.6.1.2.1.2.2.1.".to_string(),
            elements: vec!["10.2".to_string(), "16.2".to_string()],
            ..ReaderConfig::default()
        };
        assert_eq!(
            config.oid_strings(),
            vec![".1.3.6.1.2.1.2.2.1.10.2", ".1.3.6.1.2.1.2.2.1.16.2"]
        );
    }

    #[test]
    fn test_oid_strings_without_elements() {
        let config = ReaderConfig {
            oid_base: "system.sysDescr.0".to_string(),
            ..ReaderConfig::default()
        };
        assert_eq!(config.oid_strings(), vec!["system.sysDescr.0"]);
    }

    #[test]
    fn test_url() {
        let config = ReaderConfig {
            host: "router".to_string(),
            transport: Some(TransportKind::Udp6),
            version: SnmpVersion::V2c,
            oid_base: ".1.3.6.1.2.1.1".to_string(),
            ..ReaderConfig::default()
        };
        assert_eq!(config.url(), "snmp-v2c://public@router:udp6:161/.1.3.6.1.2.1.1");
    }

    #[test]
    fn test_reader_config_serialization() {
        let config = ReaderConfig {
            label: "load".to_string(),
            ..ReaderConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ReaderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, config);
    }
}
