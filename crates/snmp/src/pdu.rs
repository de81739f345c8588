//! SNMP v1/v2c messages: GET request building and response classification.
//!
//! The wire encoding belongs to `async-snmp`; this module only maps its
//! community messages onto the engine's view of a request or response.

use crate::error::CodecError;
use async_snmp::message::CommunityMessage;
use async_snmp::{Pdu, PduType, Value, VarBind, Version};
use bytes::Bytes;
use snmp_reader_core::SYS_UPTIME_OID;
use snmp_reader_types::{Oid, Sample, SampleSet, SnmpVersion};
use std::fmt;

/// Type name as printed by diagnostic output (`STRING`, `Timeticks`, ...)
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Integer(_) => "INTEGER",
        Value::OctetString(_) => "STRING",
        Value::Null => "NULL",
        Value::ObjectIdentifier(_) => "OID",
        Value::IpAddress(_) => "IpAddress",
        Value::Counter32(_) => "Counter32",
        Value::Gauge32(_) => "Gauge32",
        Value::TimeTicks(_) => "Timeticks",
        Value::Opaque(_) => "OPAQUE",
        Value::Counter64(_) => "Counter64",
        Value::NoSuchObject => "No Such Object",
        Value::NoSuchInstance => "No Such Instance",
        Value::EndOfMibView => "End of MIB View",
        _ => "Unknown",
    }
}

/// Convert to a sample, or `None` for types polling has no use for
pub fn to_sample(value: &Value) -> Option<Sample> {
    match value {
        Value::Integer(v) => Some(Sample::integer(i64::from(*v))),
        Value::Counter32(v) | Value::Gauge32(v) => Some(Sample::integer(i64::from(*v))),
        Value::TimeTicks(v) => Some(Sample::timeticks(*v)),
        Value::OctetString(bytes) => Some(Sample::octet_string(bytes)),
        Value::Counter64(v) => Some(Sample::counter64(*v)),
        _ => None,
    }
}

/// Value text as printed by diagnostic output
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Integer(v) => v.to_string(),
        Value::OctetString(b) => String::from_utf8_lossy(b).into_owned(),
        Value::ObjectIdentifier(oid) => crate::mib::name_for(&Oid::from_slice(oid.arcs())),
        Value::IpAddress([a, b, c, d]) => format!("{}.{}.{}.{}", a, b, c, d),
        Value::Counter32(v) | Value::Gauge32(v) => v.to_string(),
        Value::TimeTicks(v) => {
            format!("({}) {}", v, snmp_reader_types::sample::format_uptime(u64::from(*v)))
        }
        Value::Counter64(v) => v.to_string(),
        Value::Opaque(b) => b
            .iter()
            .map(|byte| format!("{:02X}", byte))
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

/// Error status carried in a response PDU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorStatus(pub i64);

impl ErrorStatus {
    pub const NO_ERROR: ErrorStatus = ErrorStatus(0);
    pub const NO_SUCH_NAME: ErrorStatus = ErrorStatus(2);

    /// Human readable reason, in the wording users know from the net-snmp tools
    pub fn reason(&self) -> &'static str {
        match self.0 {
            0 => "(noError) No Error",
            1 => "(tooBig) Response message would have been too large.",
            2 => "(noSuchName) There is no such variable name in this MIB.",
            3 => "(badValue) The value given has the wrong type or length.",
            4 => "(readOnly) The two parties used do not have access to use the specified SNMP PDU.",
            5 => "(genError) A general failure occured",
            6 => "noAccess",
            7 => "wrongType (The set datatype does not match the data type the agent expects)",
            8 => "wrongLength (The set value has an illegal length from what the agent expects)",
            9 => "wrongEncoding",
            10 => "wrongValue (The set value is illegal or unsupported in some way)",
            11 => "noCreation (That table does not support row creation or that object can not ever be created)",
            12 => "inconsistentValue (The set value is illegal or unsupported in some way)",
            13 => "resourceUnavailable (This is likely a out-of-memory failure within the agent)",
            14 => "commitFailed",
            15 => "undoFailed",
            16 => "authorizationError (access denied to that object)",
            17 => "notWritable (That object does not support modification)",
            18 => "inconsistentName (That object can not currently be created)",
            _ => "Unknown Error",
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// A v1/v2c message as the engine sees it
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub version: SnmpVersion,
    pub community: String,
    pub pdu_type: PduType,
    pub request_id: i32,
    pub error_status: ErrorStatus,
    pub error_index: u32,
    pub varbinds: Vec<(Oid, Value)>,
}

impl Message {
    /// Encode into one datagram
    pub fn encode(&self) -> Vec<u8> {
        let version = match self.version {
            SnmpVersion::V1 => Version::V1,
            SnmpVersion::V2c => Version::V2c,
        };
        let pdu = Pdu {
            pdu_type: self.pdu_type,
            request_id: self.request_id,
            error_status: i32::try_from(self.error_status.0).unwrap_or(i32::MAX),
            error_index: i32::try_from(self.error_index).unwrap_or(i32::MAX),
            varbinds: self
                .varbinds
                .iter()
                .map(|(oid, value)| {
                    VarBind::new(async_snmp::Oid::from_slice(oid.as_slice()), value.clone())
                })
                .collect(),
        };
        CommunityMessage::new(version, Bytes::from(self.community.clone()), pdu)
            .encode()
            .to_vec()
    }

    /// Decode one datagram
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let message = CommunityMessage::decode(Bytes::copy_from_slice(bytes))
            .map_err(|e| CodecError::Malformed(e.to_string()))?;

        let version = match message.version {
            Version::V1 => SnmpVersion::V1,
            Version::V2c => SnmpVersion::V2c,
            other => return Err(CodecError::UnsupportedVersion(format!("{:?}", other))),
        };
        let pdu = message.pdu;

        Ok(Message {
            version,
            community: String::from_utf8_lossy(&message.community).into_owned(),
            pdu_type: pdu.pdu_type,
            request_id: pdu.request_id,
            error_status: ErrorStatus(i64::from(pdu.error_status)),
            error_index: u32::try_from(pdu.error_index.max(0)).unwrap_or(u32::MAX),
            varbinds: pdu
                .varbinds
                .into_iter()
                .map(|vb| (Oid::from_slice(vb.oid.arcs()), vb.value))
                .collect(),
        })
    }
}

/// Build a GET for `oids`, with the device uptime always requested first
pub fn build_get_request(
    version: SnmpVersion,
    community: &str,
    request_id: i32,
    oids: &[Oid],
) -> Message {
    let mut varbinds = Vec::with_capacity(oids.len() + 1);
    varbinds.push((Oid::from_slice(SYS_UPTIME_OID), Value::Null));
    varbinds.extend(oids.iter().map(|oid| (oid.clone(), Value::Null)));
    Message {
        version,
        community: community.to_string(),
        pdu_type: PduType::GetRequest,
        request_id,
        error_status: ErrorStatus::NO_ERROR,
        error_index: 0,
        varbinds,
    }
}

/// What a reader gets told about one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// The agent answered with an error status
    Error {
        status: ErrorStatus,
        index: u32,
        no_such_name: bool,
    },
    /// Every retry went unanswered
    Timeout,
    /// One sample per variable of a supported type, in request order
    Values(SampleSet),
}

impl Decoded {
    /// Text shown to the user for error outcomes
    pub fn error_text(&self) -> Option<String> {
        match self {
            Decoded::Error {
                no_such_name: true, ..
            } => Some("Error! This name doesn't exist!".to_string()),
            Decoded::Error { status, .. } => Some(format!("Error in packet, Reason: {}", status)),
            Decoded::Timeout => Some("Error! SNMP Timeout.".to_string()),
            Decoded::Values(_) => None,
        }
    }
}

/// Classify a response message
pub fn decode_response(message: &Message) -> Decoded {
    if message.error_status != ErrorStatus::NO_ERROR {
        return Decoded::Error {
            status: message.error_status,
            index: message.error_index,
            no_such_name: message.error_status == ErrorStatus::NO_SUCH_NAME,
        };
    }

    let samples = message
        .varbinds
        .iter()
        .filter_map(|(oid, value)| {
            let sample = to_sample(value);
            if sample.is_none() {
                log::warn!("Dropping {} with unsupported type {}", oid, type_name(value));
            }
            sample
        })
        .collect();
    Decoded::Values(SampleSet::new(samples))
}
