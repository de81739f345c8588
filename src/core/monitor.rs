//! The monitor context: every reader, their sessions and the shared poll.
//!
//! Driven from outside by [`Monitor::tick`]. Each tick first drains all
//! responses that have arrived, then lets every reader open, send and
//! publish in configuration order. Nothing here blocks.

use super::reader::{ConfigError, Reader};
use crate::config::persist::{self, ConfigLine, ConfigLineError};
use crate::displayers::{render_info, render_label};
use snmp_reader_core::{
    DisplaySink, LabelLookup, Labeled, ReaderId, Registry, INFO_BUFFER_LEN, LABEL_BUFFER_LEN,
};
use snmp_reader_snmp::{Connector, Delivery, PollStats, Scheduler, SessionManager, SessionSettings};
use snmp_reader_types::ReaderConfig;
use std::time::Instant;

/// Owner of all readers and the sessions they poll through
pub struct Monitor {
    readers: Registry<Reader>,
    sessions: SessionManager,
    scheduler: Scheduler,
    ticks: u64,
    label_budget: usize,
    info_budget: usize,
}

impl Monitor {
    pub fn new(connector: Box<dyn Connector>, settings: SessionSettings) -> Self {
        Self {
            readers: Registry::new(),
            sessions: SessionManager::new(connector, settings),
            scheduler: Scheduler::new(),
            ticks: 0,
            label_budget: LABEL_BUFFER_LEN,
            info_budget: INFO_BUFFER_LEN,
        }
    }

    /// Limit label and tooltip lengths
    pub fn with_budgets(mut self, label_budget: usize, info_budget: usize) -> Self {
        self.label_budget = label_budget;
        self.info_budget = info_budget;
        self
    }

    pub fn readers(&self) -> &Registry<Reader> {
        &self.readers
    }

    pub fn reader(&self, id: ReaderId) -> Option<&Reader> {
        self.readers.get(id)
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_poll(&self) -> PollStats {
        self.scheduler.last_stats()
    }

    /// One host tick
    pub fn tick(&mut self, sink: &mut dyn DisplaySink) {
        self.tick_at(Instant::now(), sink);
    }

    /// One host tick at a given time
    pub fn tick_at(&mut self, now: Instant, sink: &mut dyn DisplaySink) {
        // Everything that arrived is handed out before anything new is sent
        for delivery in self.scheduler.poll(&mut self.sessions, now) {
            self.route(delivery);
        }

        for id in self.readers.ids() {
            let Some(reader) = self.readers.get_mut(id) else {
                continue;
            };

            if reader.needs_open() {
                reader.begin_open();
                let config = reader.config();
                match self.sessions.open(
                    &config.target(),
                    config.port,
                    config.version,
                    &config.community,
                    id,
                ) {
                    Ok(session) => reader.opened(session),
                    Err(e) => {
                        log::warn!("{}: {}", reader.label(), e);
                        reader.open_failed();
                    }
                }
            }

            if reader.is_due(self.ticks) {
                if let Some(session) = reader.session() {
                    if let Err(e) = self.sessions.send(session, reader.oids(), now) {
                        log::warn!("{}: {}", reader.label(), e);
                        reader.send_failed(&e.to_string());
                    }
                }
            }

            if let Some(text) = reader.take_notification() {
                sink.set_tooltip(id, &text);
            } else if reader.should_render() {
                if reader.config().panel {
                    sink.set_label(id, &render_label(reader, self.label_budget));
                }
                sink.set_tooltip(id, &render_info(reader, self.info_budget));
                if !reader.config().hide {
                    for (series, value) in reader.chart_values() {
                        sink.store_chart_point(id, series, value);
                        reader.note_chart_point(value);
                    }
                }
                reader.commit();
            }
        }

        self.ticks = self.ticks.wrapping_add(1);
    }

    /// Hand a response to the reader that asked for it, if it still does
    fn route(&mut self, delivery: Delivery) {
        match self.readers.get_mut(delivery.token) {
            Some(reader) if reader.session() == Some(delivery.session) => {
                reader.ingest(delivery.outcome)
            }
            _ => log::warn!(
                "Dropping response {} for reader {} which is gone",
                delivery.request_id,
                delivery.token
            ),
        }
    }

    /// Replace every reader. Sessions are closed and reopened on the next
    /// tick; nothing is carried over. Returns the problems found.
    pub fn apply_config(&mut self, rows: Vec<ReaderConfig>) -> Vec<ConfigError> {
        self.clear();
        let mut report = Vec::new();
        for row in rows {
            report.extend(self.add(row));
        }
        log::info!(
            "Applied {} readers ({} configuration errors)",
            self.readers.len(),
            report.len()
        );
        report
    }

    /// Append one reader at the end of the order
    pub fn add(&mut self, config: ReaderConfig) -> Vec<ConfigError> {
        let (reader, errors) = Reader::new(config);
        for error in &errors {
            log::error!("{}", error);
        }
        let id = self.readers.insert(reader);
        log::debug!("Added reader {}", id);
        errors
    }

    /// Remove one reader, closing its session
    pub fn remove(&mut self, id: ReaderId) -> Option<ReaderConfig> {
        let mut reader = self.readers.remove(id)?;
        if let Some(session) = reader.detach() {
            self.sessions.close(session);
        }
        Some(reader.config().clone())
    }

    /// Remove every reader and close all sessions
    pub fn clear(&mut self) {
        for (_, mut reader) in self.readers.drain() {
            if let Some(session) = reader.detach() {
                self.sessions.close(session);
            }
        }
    }

    /// Current reader configurations in order
    pub fn configs(&self) -> Vec<ReaderConfig> {
        self.readers.iter().map(|(_, r)| r.config().clone()).collect()
    }

    /// Every reader as persisted lines, each followed by its chart block
    pub fn persist_config(&self) -> Vec<String> {
        self.readers
            .iter()
            .flat_map(|(_, r)| persist::format_reader(r.config()))
            .collect()
    }

    /// Take in one persisted line. Reader lines add a reader; chart blocks
    /// attach to the latest reader with the same label.
    pub fn load_config_line(&mut self, line: &str) -> Result<Vec<ConfigError>, ConfigLineError> {
        match persist::parse_line(line)? {
            ConfigLine::Reader(config) => Ok(self.add(config)),
            ConfigLine::Chart { label, chart } => {
                let id = self
                    .readers
                    .find_by_label(&label)
                    .ok_or(ConfigLineError::UnknownLabel(label))?;
                if let Some(reader) = self.readers.get_mut(id) {
                    reader.set_chart(chart);
                }
                Ok(Vec::new())
            }
            ConfigLine::Skip => Ok(Vec::new()),
        }
    }
}
