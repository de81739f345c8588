//! Error types for the SNMP engine.

use thiserror::Error;

/// An OID string that could not be turned into a numeric OID
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OidError {
    #[error("empty OID")]
    Empty,
    #[error("unknown object name '{0}'")]
    UnknownSymbol(String),
    #[error("ambiguous object name '{pattern}' ({candidates} matches)")]
    Ambiguous { pattern: String, candidates: usize },
    #[error("bad sub-identifier '{0}'")]
    BadSubIdentifier(String),
    #[error("OID must start with 0, 1 or 2 and have at least two components")]
    BadPrefix,
}

/// Bytes on the wire that are not a v1/v2c message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("malformed message: {0}")]
    Malformed(String),
    #[error("unsupported SNMP version {0}")]
    UnsupportedVersion(String),
}

/// Failure to bring up a session for a reader
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("cannot resolve {host}:{port}")]
    UnknownHost { host: String, port: u16 },
    #[error("no {transport} address for {host}")]
    NoAddress { host: String, transport: &'static str },
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to transmit a request
#[derive(Debug, Error)]
pub enum SendError {
    #[error("error parsing oid: {0}")]
    Oid(#[from] OidError),
    #[error("too many OIDs ({count}, at most {max})")]
    TooManyOids { count: usize, max: usize },
    #[error("session {0} is not open")]
    NoSession(String),
    #[error("send failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of the system-group probe
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Open(#[from] OpenError),
    #[error("probe failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error in packet, Reason: {0}")]
    Agent(String),
}
