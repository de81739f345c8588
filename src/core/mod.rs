//! Readers and the monitor context driving them

mod derive;
mod monitor;
mod reader;

pub use derive::{derive_value, elapsed_seconds, render_sample, scale, Derivation};
pub use monitor::Monitor;
pub use reader::{ConfigError, Reader, ReaderState};
