//! Reader definitions in the line-oriented `readers.conf` format.
//!
//! ```text
//! snmp_monitor <label> <url> <delay> <delta> <divisor> <scale> <panel> <template> <hide> <elements> [<auto_scale>]
//! snmp_monitor chart_config <label> <fixed_max> <auto_max> <grids>
//! ```
//!
//! Fields are single words: `_` stands for an empty field and spaces inside
//! labels and templates are stored as `_`.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use snmp_reader_core::{CHART_CONFIG_KEYWORD, CONFIG_KEYWORD};
use snmp_reader_snmp::SessionTarget;
use snmp_reader_types::{ChartConfig, ReaderConfig, SnmpVersion};
use std::path::Path;
use thiserror::Error;

/// `scheme://community@target:port/oid_base`
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9-]+)://([^@]*)@(.+):(\d+)/(.*)$").expect("Invalid regex")
});

const EMPTY: &str = "_";

/// Fields after the keyword on a reader line, without the optional auto-scale flag
const READER_FIELDS: usize = 10;
const CHART_FIELDS: usize = 4;

/// A line that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigLineError {
    #[error("line does not start with snmp_monitor: {0}")]
    MissingKeyword(String),

    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("malformed url: {0}")]
    BadUrl(String),

    #[error("unknown url scheme: {0}")]
    BadScheme(String),

    #[error("bad {field}: {value}")]
    BadNumber { field: &'static str, value: String },

    #[error("chart block for unknown reader {0}")]
    UnknownLabel(String),
}

/// One parsed line
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigLine {
    Reader(ReaderConfig),
    Chart { label: String, chart: ChartConfig },
    /// Blank line or comment
    Skip,
}

fn encode_text(text: &str) -> String {
    if text.is_empty() {
        EMPTY.to_string()
    } else {
        text.replace(' ', "_")
    }
}

fn decode_text(field: &str) -> String {
    if field == EMPTY {
        String::new()
    } else {
        field.replace('_', " ")
    }
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

fn parse_number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, ConfigLineError> {
    value.parse().map_err(|_| ConfigLineError::BadNumber {
        field,
        value: value.to_string(),
    })
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, ConfigLineError> {
    parse_number::<i64>(field, value).map(|v| v != 0)
}

/// The two lines persisting one reader: its definition and its chart block
pub fn format_reader(config: &ReaderConfig) -> [String; 2] {
    let elements = if config.elements.is_empty() {
        EMPTY.to_string()
    } else {
        config.elements.join(",")
    };
    let reader = format!(
        "{} {} {} {} {} {} {} {} {} {} {} {}",
        CONFIG_KEYWORD,
        encode_text(&config.label),
        config.url(),
        config.delay,
        flag(config.delta),
        config.divisor,
        0,
        flag(config.panel),
        encode_text(&config.template),
        flag(config.hide),
        elements,
        flag(config.auto_scale),
    );
    let chart = format!(
        "{} {} {} {} {} {}",
        CONFIG_KEYWORD,
        CHART_CONFIG_KEYWORD,
        encode_text(&config.label),
        config.chart.fixed_max,
        flag(config.chart.auto_max),
        config.chart.grids,
    );
    [reader, chart]
}

fn parse_url(url: &str, config: &mut ReaderConfig) -> Result<(), ConfigLineError> {
    let caps = URL_RE
        .captures(url)
        .ok_or_else(|| ConfigLineError::BadUrl(url.to_string()))?;

    config.version = SnmpVersion::from_scheme(&caps[1])
        .ok_or_else(|| ConfigLineError::BadScheme(caps[1].to_string()))?;
    config.community = caps[2].to_string();
    let target = SessionTarget::parse(&caps[3]);
    config.host = target.host;
    config.transport = target.transport;
    config.port = parse_number("port", &caps[4])?;
    config.oid_base = caps[5].to_string();
    Ok(())
}

/// Parse one line of `readers.conf`
pub fn parse_line(line: &str) -> Result<ConfigLine, ConfigLineError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(ConfigLine::Skip);
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields[0] != CONFIG_KEYWORD {
        return Err(ConfigLineError::MissingKeyword(line.to_string()));
    }
    let fields = &fields[1..];

    if fields.first() == Some(&CHART_CONFIG_KEYWORD) {
        let fields = &fields[1..];
        if fields.len() != CHART_FIELDS {
            return Err(ConfigLineError::FieldCount {
                expected: CHART_FIELDS,
                found: fields.len(),
            });
        }
        return Ok(ConfigLine::Chart {
            label: decode_text(fields[0]),
            chart: ChartConfig {
                fixed_max: parse_number("fixed_max", fields[1])?,
                auto_max: parse_flag("auto_max", fields[2])?,
                grids: parse_number("grids", fields[3])?,
            },
        });
    }

    if fields.len() != READER_FIELDS && fields.len() != READER_FIELDS + 1 {
        return Err(ConfigLineError::FieldCount {
            expected: READER_FIELDS,
            found: fields.len(),
        });
    }

    let mut config = ReaderConfig {
        label: decode_text(fields[0]),
        ..ReaderConfig::default()
    };
    parse_url(fields[1], &mut config)?;
    config.delay = parse_number("delay", fields[2])?;
    config.delta = parse_flag("delta", fields[3])?;
    config.divisor = parse_number("divisor", fields[4])?;
    // fields[5]: scale flag, kept for file compatibility only
    parse_flag("scale", fields[5])?;
    config.panel = parse_flag("panel", fields[6])?;
    config.template = decode_text(fields[7]);
    config.hide = parse_flag("hide", fields[8])?;
    config.elements = match fields[9] {
        EMPTY => Vec::new(),
        list => list
            .split(',')
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect(),
    };
    if let Some(auto_scale) = fields.get(10) {
        config.auto_scale = parse_flag("auto_scale", auto_scale)?;
    }
    Ok(ConfigLine::Reader(config))
}

/// Read every line of a readers file. A missing file reads as empty.
pub fn load_file(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        log::info!("No readers file at {:?}", path);
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read readers file: {:?}", path))?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Write a readers file, creating its directory if needed
pub fn save_file(path: &Path, lines: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write readers file: {:?}", path))?;
    log::info!("Saved {} lines to {:?}", lines.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use snmp_reader_types::TransportKind;

    fn sample() -> ReaderConfig {
        ReaderConfig {
            label: "wan in".to_string(),
            host: "gw".to_string(),
            transport: Some(TransportKind::Udp6),
            port: 1161,
            community: "private".to_string(),
            version: SnmpVersion::V2c,
            oid_base: ".1.3.6.1.2.1.2.2.1".to_string(),
            elements: vec!["10.2".to_string(), "16.2".to_string()],
            delay: 50,
            delta: true,
            divisor: 1024,
            auto_scale: true,
            panel: true,
            hide: false,
            template: "$L $S0 $S1".to_string(),
            chart: ChartConfig {
                fixed_max: 5000,
                auto_max: false,
                grids: 4,
            },
        }
    }

    #[test]
    fn test_format_reader() {
        let [reader, chart] = format_reader(&sample());
        assert_eq!(
            reader,
            "snmp_monitor wan_in snmp-v2c://private@gw:udp6:1161/.1.3.6.1.2.1.2.2.1 50 1 1024 0 1 $L_$S0_$S1 0 10.2,16.2 1"
        );
        assert_eq!(chart, "snmp_monitor chart_config wan_in 5000 0 4");
    }

    #[test]
    fn test_round_trip() {
        let original = sample();
        let [reader, chart] = format_reader(&original);

        let ConfigLine::Reader(mut parsed) = parse_line(&reader).unwrap() else {
            panic!("expected a reader line");
        };
        let ConfigLine::Chart { label, chart } = parse_line(&chart).unwrap() else {
            panic!("expected a chart line");
        };
        assert_eq!(label, original.label);
        parsed.chart = chart;
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_empty_fields() {
        let config = ReaderConfig {
            label: "uptime".to_string(),
            host: "localhost".to_string(),
            oid_base: "system.sysUpTime.0".to_string(),
            ..ReaderConfig::default()
        };
        let [reader, _] = format_reader(&config);
        assert_eq!(
            reader,
            "snmp_monitor uptime snmp://public@localhost:161/system.sysUpTime.0 100 0 1 0 1 _ 0 _ 0"
        );
        let ConfigLine::Reader(parsed) = parse_line(&reader).unwrap() else {
            panic!("expected a reader line");
        };
        assert!(parsed.template.is_empty());
        assert!(parsed.elements.is_empty());
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_without_auto_scale_field() {
        let line = "snmp_monitor load snmp://public@host:161/.1.3.6.1.4.1.2021.10.1.5.1 100 0 1 1 1 _ 0 _";
        let ConfigLine::Reader(parsed) = parse_line(line).unwrap() else {
            panic!("expected a reader line");
        };
        assert!(!parsed.auto_scale);
        assert_eq!(parsed.oid_base, ".1.3.6.1.4.1.2021.10.1.5.1");
    }

    #[test]
    fn test_skips_blank_and_comments() {
        assert_eq!(parse_line("").unwrap(), ConfigLine::Skip);
        assert_eq!(parse_line("   # a comment").unwrap(), ConfigLine::Skip);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            parse_line("monitor x"),
            Err(ConfigLineError::MissingKeyword(_))
        ));
        assert!(matches!(
            parse_line("snmp_monitor x y"),
            Err(ConfigLineError::FieldCount { found: 2, .. })
        ));
        assert!(matches!(
            parse_line("snmp_monitor x nourl 100 0 1 0 1 _ 0 _"),
            Err(ConfigLineError::BadUrl(_))
        ));
        assert!(matches!(
            parse_line("snmp_monitor x snmp-v3://c@h:161/.1 100 0 1 0 1 _ 0 _"),
            Err(ConfigLineError::BadScheme(_))
        ));
        assert!(matches!(
            parse_line("snmp_monitor x snmp://c@h:161/.1 soon 0 1 0 1 _ 0 _"),
            Err(ConfigLineError::BadNumber { field: "delay", .. })
        ));
        assert!(matches!(
            parse_line("snmp_monitor chart_config x 1 1"),
            Err(ConfigLineError::FieldCount { expected: 4, found: 3 })
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("snmp-reader-persist-{}", std::process::id()));
        let path = dir.join("readers.conf");
        let lines = format_reader(&sample()).to_vec();
        save_file(&path, &lines).unwrap();
        assert_eq!(load_file(&path).unwrap(), lines);
        std::fs::remove_dir_all(&dir).unwrap();
        assert!(load_file(&path).unwrap().is_empty());
    }
}
