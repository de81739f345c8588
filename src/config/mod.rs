//! Configuration management

pub mod persist;
mod settings;

pub use persist::{ConfigLine, ConfigLineError};
pub use settings::{AppSettings, SnmpSettings};
