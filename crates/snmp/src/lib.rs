//! snmp-reader-snmp: the SNMP side of snmp-reader.
//!
//! Leaf to root:
//! - [`resolver`] turns OID strings into numeric [`Oid`]s using the built-in [`mib`] table
//! - [`pdu`] builds GET requests and classifies responses on top of the
//!   `async-snmp` message codec
//! - [`transport`] abstracts the datagram endpoint a session talks through
//! - [`session`] owns one endpoint per reader and tracks requests in flight
//! - [`scheduler`] drains every session once per host tick
//! - [`probe`] is the one request a caller waits on, used for interactive
//!   diagnostics

pub mod error;
pub mod mib;
pub mod pdu;
pub mod probe;
pub mod resolver;
pub mod scheduler;
pub mod session;
pub mod transport;

pub use error::{CodecError, OidError, OpenError, ProbeError, SendError};
pub use pdu::{
    build_get_request, decode_response, format_value, to_sample, type_name, Decoded, ErrorStatus,
    Message,
};
pub use probe::{probe, PROBE_OIDS};
pub use resolver::{check_oid, resolve};
pub use scheduler::{Delivery, PollStats, Scheduler};
pub use session::{SessionId, SessionManager, SessionSettings, SessionTarget};
pub use transport::{Connector, Transport, UdpConnector, UdpTransport};

#[cfg(any(test, feature = "testing"))]
pub use transport::{MockConnector, MockNetwork, MockTransport};

pub use async_snmp::{PduType, Value};
pub use snmp_reader_types::Oid;
