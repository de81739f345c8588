//! Display sink trait
//!
//! The engine never draws anything itself. Everything it wants the user to
//! see goes through this trait, which the host implements on top of its
//! widget toolkit.

use crate::registry::ReaderId;

/// Receiver for rendered reader output
pub trait DisplaySink {
    /// Replace the panel text of a reader
    fn set_label(&mut self, reader: ReaderId, text: &str);

    /// Replace the tooltip / detail text of a reader
    fn set_tooltip(&mut self, reader: ReaderId, text: &str);

    /// Store one data point for one chart series of a reader
    ///
    /// `series` is always below [`crate::MAX_CHART_SERIES`].
    fn store_chart_point(&mut self, reader: ReaderId, series: usize, value: i64);
}

/// Sink that drops everything, for headless operation
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn set_label(&mut self, _reader: ReaderId, _text: &str) {}

    fn set_tooltip(&mut self, _reader: ReaderId, _text: &str) {}

    fn store_chart_point(&mut self, _reader: ReaderId, _series: usize, _value: i64) {}
}
