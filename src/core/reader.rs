//! One configured monitor: identity, cadence, staged samples and error state.

use super::derive::{derive_value, elapsed_seconds, is_uptime, render_sample, Derivation};
use crate::displayers::template::Template;
use snmp_reader_core::{Labeled, MAX_CHART_SERIES, MAX_CONFIGURED_OIDS, MIN_DELAY_TICKS};
use snmp_reader_snmp::{resolve, Decoded, OidError, SessionId};
use snmp_reader_types::{Oid, ReaderConfig, SampleSet};
use thiserror::Error;

/// Problems found while turning a configuration row into a reader
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{label}: cannot resolve OID {oid}: {source}")]
    BadOid {
        label: String,
        oid: String,
        source: OidError,
    },

    #[error("{label}: {count} OIDs configured, at most {max} allowed")]
    TooManyOids {
        label: String,
        count: usize,
        max: usize,
    },

    #[error("{label}: missing {field}")]
    MissingField { label: String, field: &'static str },
}

/// Where a reader stands in its session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Uninitialized,
    Opening,
    Polling,
    ErrorReported,
}

/// A configured monitor and its live state
#[derive(Debug)]
pub struct Reader {
    config: ReaderConfig,
    oids: Vec<Oid>,
    /// False when the configuration could not be fully resolved
    can_send: bool,
    template: Template,
    state: ReaderState,
    session: Option<SessionId>,
    /// Latest decoded values
    current: Option<SampleSet>,
    /// `current` has not been looked at by the display yet
    fresh: bool,
    /// Values last pushed to the display
    previous: Option<SampleSet>,
    /// Force the next fresh sample onto the display
    needs_render: bool,
    error: Option<String>,
    shown_error: Option<String>,
    chart_peak: i64,
}

impl Reader {
    /// Build a reader from its configuration. Any problems are returned
    /// next to it; such a reader exists but never opens a session.
    pub fn new(config: ReaderConfig) -> (Self, Vec<ConfigError>) {
        let mut errors = Vec::new();
        let label = config.label.clone();

        if config.label.is_empty() {
            errors.push(ConfigError::MissingField {
                label: label.clone(),
                field: "label",
            });
        }
        if config.host.is_empty() {
            errors.push(ConfigError::MissingField {
                label: label.clone(),
                field: "host",
            });
        }

        let mut oids = Vec::new();
        if config.oid_base.is_empty() && config.elements.is_empty() {
            errors.push(ConfigError::MissingField {
                label: label.clone(),
                field: "oid",
            });
        } else {
            let strings = config.oid_strings();
            if strings.len() > MAX_CONFIGURED_OIDS {
                errors.push(ConfigError::TooManyOids {
                    label: label.clone(),
                    count: strings.len(),
                    max: MAX_CONFIGURED_OIDS,
                });
            }
            for text in strings {
                match resolve(&text) {
                    Ok(oid) => oids.push(oid),
                    Err(source) => errors.push(ConfigError::BadOid {
                        label: label.clone(),
                        oid: text,
                        source,
                    }),
                }
            }
        }

        let reader = Self {
            template: Template::parse(&config.template),
            config,
            oids,
            can_send: errors.is_empty(),
            state: ReaderState::Uninitialized,
            session: None,
            current: None,
            fresh: false,
            previous: None,
            needs_render: false,
            error: None,
            shown_error: None,
            chart_peak: 0,
        };
        (reader, errors)
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Resolved OIDs in request order, uptime not included
    pub fn oids(&self) -> &[Oid] {
        &self.oids
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    pub fn can_send(&self) -> bool {
        self.can_send
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn current(&self) -> Option<&SampleSet> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&SampleSet> {
        self.previous.as_ref()
    }

    pub fn chart_peak(&self) -> i64 {
        self.chart_peak
    }

    /// Ticks between two requests, never below the transport-friendly minimum
    pub fn delay(&self) -> u64 {
        u64::from(self.config.delay.max(MIN_DELAY_TICKS))
    }

    pub fn derivation(&self) -> Derivation {
        Derivation {
            delta: self.config.delta,
            divisor: self.config.divisor,
        }
    }

    /// A session should be opened this tick
    pub fn needs_open(&self) -> bool {
        self.can_send && self.session.is_none() && self.error.is_none()
    }

    pub fn is_due(&self, ticks: u64) -> bool {
        self.session.is_some() && ticks % self.delay() == 0
    }

    pub fn begin_open(&mut self) {
        self.state = ReaderState::Opening;
    }

    pub fn opened(&mut self, session: SessionId) {
        self.session = Some(session);
        self.state = ReaderState::Polling;
    }

    pub fn open_failed(&mut self) {
        self.set_error("Unknown host");
    }

    /// Record a failure to transmit a request
    pub fn send_failed(&mut self, reason: &str) {
        self.set_error(reason);
    }

    /// Forget the session; the caller closes it
    pub fn detach(&mut self) -> Option<SessionId> {
        self.state = ReaderState::Uninitialized;
        self.session.take()
    }

    fn set_error(&mut self, reason: &str) {
        self.error = Some(format!("{} {} ({})", self.config.label, reason, self.config.url()));
        self.state = ReaderState::ErrorReported;
    }

    /// Take in a decoded response
    pub fn ingest(&mut self, outcome: Decoded) {
        match outcome {
            Decoded::Values(samples) => {
                if self.error.take().is_some() {
                    log::info!("{}: recovered", self.config.label);
                    self.shown_error = None;
                    self.needs_render = true;
                }
                self.state = ReaderState::Polling;
                self.current = Some(samples);
                self.fresh = true;
            }
            other => {
                if let Some(text) = other.error_text() {
                    self.set_error(&text);
                }
            }
        }
    }

    /// Error text not yet shown to the user, marking it as shown.
    /// The same text is never returned twice in a row.
    pub fn take_notification(&mut self) -> Option<String> {
        let error = self.error.as_ref()?;
        if self.shown_error.as_ref() == Some(error) {
            return None;
        }
        self.shown_error = Some(error.clone());
        Some(error.clone())
    }

    /// A fresh sample differs from what the display shows
    pub fn should_render(&self) -> bool {
        if !self.fresh || self.error.is_some() {
            return false;
        }
        match (&self.current, &self.previous) {
            (Some(_), None) => true,
            (Some(current), Some(previous)) => self.needs_render || !current.same_values(previous),
            (None, _) => false,
        }
    }

    /// The current sample has been displayed and becomes the rate baseline
    pub fn commit(&mut self) {
        self.fresh = false;
        self.needs_render = false;
        if let Some(current) = &self.current {
            self.previous = Some(current.clone());
        }
    }

    /// Seconds between the current sample and the displayed one
    pub fn elapsed(&self) -> i64 {
        match (&self.current, &self.previous) {
            (Some(current), Some(previous)) => elapsed_seconds(current, previous),
            _ => 1,
        }
    }

    /// Rendered text of the `index`-th configured value, if there is one
    pub fn value_text(&self, index: usize, scaled: bool) -> Option<String> {
        let sample = self.current.as_ref()?.value(index)?;
        let previous = self.previous.as_ref().and_then(|p| p.value(index));
        Some(render_sample(
            self.oids.get(index),
            sample,
            previous,
            self.elapsed(),
            self.derivation(),
            scaled,
        ))
    }

    /// Derived numbers for the chart series, at most one per series
    pub fn chart_values(&self) -> Vec<(usize, i64)> {
        let Some(current) = &self.current else {
            return Vec::new();
        };
        let elapsed = self.elapsed();
        (0..current.value_count().min(MAX_CHART_SERIES))
            .filter_map(|index| {
                let sample = current.value(index)?;
                if !sample.is_numeric() || is_uptime(self.oids.get(index), sample) {
                    return None;
                }
                let previous = self
                    .previous
                    .as_ref()
                    .and_then(|p| p.value(index))
                    .filter(|p| p.is_numeric())
                    .map(|p| p.numeric);
                Some((index, derive_value(sample.numeric, previous, elapsed, self.derivation())))
            })
            .collect()
    }

    pub fn note_chart_point(&mut self, value: i64) {
        self.chart_peak = self.chart_peak.max(value);
    }

    /// Value `$M` stands for
    pub fn chart_max(&self) -> i64 {
        if self.config.chart.auto_max {
            self.chart_peak
        } else {
            i64::try_from(self.config.chart.fixed_max).unwrap_or(i64::MAX)
        }
    }

    pub fn set_chart(&mut self, chart: snmp_reader_types::ChartConfig) {
        self.config.chart = chart;
    }
}

impl Labeled for Reader {
    fn label(&self) -> &str {
        &self.config.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snmp_reader_snmp::ErrorStatus;
    use snmp_reader_types::Sample;

    fn config() -> ReaderConfig {
        ReaderConfig {
            label: "eth0".to_string(),
            host: "router".to_string(),
            oid_base: ".1.3.6.1.2.1.2.2.1".to_string(),
            elements: vec!["10.2".to_string(), "16.2".to_string()],
            delta: true,
            ..ReaderConfig::default()
        }
    }

    fn values(ticks: u32, a: i64, b: i64) -> Decoded {
        Decoded::Values(SampleSet::new(vec![
            Sample::timeticks(ticks),
            Sample::integer(a),
            Sample::integer(b),
        ]))
    }

    fn session() -> SessionId {
        use snmp_reader_core::Registry;
        use snmp_reader_snmp::{MockNetwork, SessionManager, SessionSettings};
        let net = MockNetwork::new();
        let mut sessions = SessionManager::new(Box::new(net.connector()), SessionSettings::default());
        let token = Registry::new().insert(());
        // Only the handle's identity matters here
        sessions
            .open("router", 161, Default::default(), "public", token)
            .unwrap()
    }

    #[test]
    fn test_new_resolves_oids() {
        let (reader, errors) = Reader::new(config());
        assert!(errors.is_empty());
        assert!(reader.can_send());
        assert_eq!(reader.oids().len(), 2);
        assert_eq!(reader.state(), ReaderState::Uninitialized);
        assert_eq!(reader.label(), "eth0");
    }

    #[test]
    fn test_new_reports_bad_oid() {
        let (reader, errors) = Reader::new(ReaderConfig {
            oid_base: "noSuchThing.0".to_string(),
            elements: Vec::new(),
            ..config()
        });
        assert!(matches!(errors.as_slice(), [ConfigError::BadOid { .. }]));
        assert!(!reader.can_send());
        assert!(!reader.needs_open());
    }

    #[test]
    fn test_new_reports_missing_fields() {
        let (_, errors) = Reader::new(ReaderConfig {
            label: String::new(),
            oid_base: String::new(),
            elements: Vec::new(),
            ..config()
        });
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ConfigError::MissingField { .. })));
    }

    #[test]
    fn test_too_many_oids() {
        let (_, errors) = Reader::new(ReaderConfig {
            elements: (1..=10).map(|i| format!("10.{}", i)).collect(),
            ..config()
        });
        assert!(matches!(errors.as_slice(), [ConfigError::TooManyOids { count: 10, .. }]));
    }

    #[test]
    fn test_delay_floor() {
        let (reader, _) = Reader::new(ReaderConfig { delay: 0, ..config() });
        assert_eq!(reader.delay(), u64::from(MIN_DELAY_TICKS));
    }

    #[test]
    fn test_previous_only_moves_on_change() {
        let (mut reader, _) = Reader::new(config());
        reader.ingest(values(1000, 100, 7));
        assert!(reader.should_render());
        reader.commit();

        // Same values with a later uptime: nothing to show, baseline stays
        reader.ingest(values(1500, 100, 7));
        assert!(!reader.should_render());
        assert_eq!(reader.previous().unwrap().timestamp(), 1000);

        reader.ingest(values(2000, 150, 7));
        assert!(reader.should_render());
        assert_eq!(reader.elapsed(), 10);
        assert_eq!(reader.value_text(0, false).as_deref(), Some("5"));
        reader.commit();
        assert_eq!(reader.previous().unwrap().timestamp(), 2000);
    }

    #[test]
    fn test_error_notified_once() {
        let (mut reader, _) = Reader::new(config());
        reader.opened(session());
        reader.ingest(Decoded::Timeout);
        assert_eq!(reader.state(), ReaderState::ErrorReported);
        let text = reader.take_notification().unwrap();
        assert_eq!(
            text,
            "eth0 Error! SNMP Timeout. (snmp://public@router:161/.1.3.6.1.2.1.2.2.1)"
        );
        reader.ingest(Decoded::Timeout);
        assert_eq!(reader.take_notification(), None);

        // A different error is shown again
        reader.ingest(Decoded::Error {
            status: ErrorStatus::NO_SUCH_NAME,
            index: 2,
            no_such_name: true,
        });
        assert!(reader.take_notification().unwrap().contains("doesn't exist"));
    }

    #[test]
    fn test_recovery_forces_render() {
        let (mut reader, _) = Reader::new(config());
        reader.opened(session());
        reader.ingest(values(1000, 100, 7));
        reader.commit();
        reader.ingest(Decoded::Timeout);
        assert!(reader.take_notification().is_some());

        reader.ingest(values(1100, 100, 7));
        assert_eq!(reader.state(), ReaderState::Polling);
        assert!(reader.error().is_none());
        assert!(reader.should_render());
    }

    #[test]
    fn test_open_failure_blocks_reopen() {
        let (mut reader, _) = Reader::new(config());
        assert!(reader.needs_open());
        reader.begin_open();
        reader.open_failed();
        assert!(!reader.needs_open());
        assert!(reader.take_notification().unwrap().starts_with("eth0 Unknown host (snmp://"));
    }

    #[test]
    fn test_chart_values_skip_strings_and_uptime() {
        let (mut reader, _) = Reader::new(ReaderConfig {
            oid_base: String::new(),
            elements: vec![
                "system.sysDescr.0".to_string(),
                "system.sysUpTime.0".to_string(),
                "interfaces.ifNumber.0".to_string(),
            ],
            delta: false,
            ..config()
        });
        reader.ingest(Decoded::Values(SampleSet::new(vec![
            Sample::timeticks(100),
            Sample::octet_string(b"router"),
            Sample::timeticks(100),
            Sample::integer(4),
        ])));
        assert_eq!(reader.chart_values(), vec![(2, 4)]);
    }

    #[test]
    fn test_chart_max() {
        let (mut reader, _) = Reader::new(config());
        reader.note_chart_point(40);
        reader.note_chart_point(12);
        assert_eq!(reader.chart_max(), 40);
        reader.set_chart(snmp_reader_types::ChartConfig {
            fixed_max: 100,
            auto_max: false,
            grids: 5,
        });
        assert_eq!(reader.chart_max(), 100);
    }
}
