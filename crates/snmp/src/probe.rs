//! System-group probe.
//!
//! This is the one request whose caller waits for the answer. It is meant
//! for an interactive "what is this device?" action, never for regular
//! polling.

use crate::error::ProbeError;
use crate::mib;
use crate::pdu::{format_value, type_name, ErrorStatus, Message};
use crate::resolver::resolve;
use crate::session::{SessionSettings, SessionTarget};
use crate::transport::{Connector, Transport};
use async_snmp::{PduType, Value};
use snmp_reader_types::{Oid, SnmpVersion};
use std::time::Instant;

/// Objects asked for by a probe, in display order
pub const PROBE_OIDS: &[&str] = &[
    "system.sysDescr.0",
    "system.sysObjectID.0",
    "system.sysUpTime.0",
    "system.sysContact.0",
    "system.sysName.0",
    "system.sysLocation.0",
];

/// Ask `target` for its system group and render one line per variable.
///
/// When the agent rejects a variable, that variable is removed and the
/// request sent again, until it succeeds or nothing is left. A silent
/// agent yields a `Timeout: ...` text rather than an error.
pub async fn probe(
    connector: &mut dyn Connector,
    target: &str,
    port: u16,
    version: SnmpVersion,
    community: &str,
    settings: SessionSettings,
) -> Result<String, ProbeError> {
    let mut oids: Vec<Oid> = PROBE_OIDS
        .iter()
        .filter_map(|text| match resolve(text) {
            Ok(oid) => Some(oid),
            Err(e) => {
                log::warn!("error parsing oid: {}: {}", text, e);
                None
            }
        })
        .collect();

    let parsed = SessionTarget::parse(target);
    let mut transport = connector.connect(&parsed.host, port, parsed.transport)?;
    let mut request_id = rand::random::<i32>() & 0x3fff_ffff;
    let mut last_error = None;

    // Each pass either succeeds or removes one variable
    for _ in 0..PROBE_OIDS.len() {
        if oids.is_empty() {
            break;
        }
        request_id = request_id.wrapping_add(1).max(1);
        let request = Message {
            version,
            community: community.to_string(),
            pdu_type: PduType::GetRequest,
            request_id,
            error_status: ErrorStatus::NO_ERROR,
            error_index: 0,
            varbinds: oids.iter().map(|o| (o.clone(), Value::Null)).collect(),
        };
        let packet = request.encode();

        let Some(response) = exchange(transport.as_mut(), &packet, request_id, settings).await?
        else {
            return Ok(format!("Timeout: No Response from {}.\n", parsed.host));
        };

        if response.error_status == ErrorStatus::NO_ERROR {
            return Ok(render(&response.varbinds));
        }

        log::warn!("Error in packet, Reason: {}", response.error_status);
        let index = response.error_index as usize;
        if index == 0 || index > oids.len() {
            return Err(ProbeError::Agent(response.error_status.to_string()));
        }
        let removed = oids.remove(index - 1);
        if response.error_status == ErrorStatus::NO_SUCH_NAME {
            log::warn!("This name doesn't exist: {}", removed);
        }
        last_error = Some(response.error_status);
    }

    Err(ProbeError::Agent(
        last_error.map_or_else(|| "no variables to ask for".to_string(), |e| e.to_string()),
    ))
}

/// Send and wait for the matching answer, resending on timeout
async fn exchange(
    transport: &mut dyn Transport,
    packet: &[u8],
    request_id: i32,
    settings: SessionSettings,
) -> Result<Option<Message>, ProbeError> {
    for attempt in 0..=settings.retries {
        if attempt > 0 {
            log::debug!("Probe retry {} of {}", attempt, settings.retries);
        }
        transport.send(packet)?;
        let deadline = Instant::now() + settings.timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            let readable = std::future::poll_fn(|cx| transport.poll_readable(cx));
            match tokio::time::timeout(left, readable).await {
                Ok(result) => result?,
                Err(_) => break,
            }
            while let Some(bytes) = transport.try_recv()? {
                match Message::decode(&bytes) {
                    Ok(m) if m.request_id == request_id => return Ok(Some(m)),
                    Ok(m) => log::debug!("Probe ignoring response {}", m.request_id),
                    Err(e) => log::debug!("Probe ignoring datagram: {}", e),
                }
            }
        }
    }
    Ok(None)
}

fn render(varbinds: &[(Oid, Value)]) -> String {
    let mut out = String::new();
    for (oid, value) in varbinds {
        out.push_str(&format!(
            "{} = {}: {}\n",
            mib::name_for(oid),
            type_name(value),
            format_value(value)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockNetwork;
    use bytes::Bytes;
    use std::time::Duration;

    fn settings() -> SessionSettings {
        SessionSettings {
            timeout: Duration::from_millis(10),
            retries: 1,
            max_outstanding: 1,
        }
    }

    fn system_value(oid: &Oid) -> Value {
        match oid.as_slice()[7] {
            1 => Value::OctetString(Bytes::from_static(b"Linux gateway 6.1")),
            2 => Value::ObjectIdentifier(async_snmp::Oid::from_slice(&[
                1, 3, 6, 1, 4, 1, 8072, 3, 2, 10,
            ])),
            3 => Value::TimeTicks(8_640_000),
            5 => Value::OctetString(Bytes::from_static(b"gateway")),
            _ => Value::OctetString(Bytes::new()),
        }
    }

    #[tokio::test]
    async fn test_probe_renders_system_group() {
        let net = MockNetwork::new();
        net.set_agent("gw", |request| {
            Some(Message {
                pdu_type: PduType::Response,
                varbinds: request
                    .varbinds
                    .iter()
                    .map(|(oid, _)| (oid.clone(), system_value(oid)))
                    .collect(),
                ..request.clone()
            })
        });

        let text = probe(&mut net.connector(), "gw", 161, SnmpVersion::V2c, "public", settings())
            .await
            .unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "SNMPv2-MIB::sysDescr.0 = STRING: Linux gateway 6.1");
        assert_eq!(lines[1], "SNMPv2-MIB::sysObjectID.0 = OID: SNMPv2-SMI::enterprises.8072.3.2.10");
        assert_eq!(lines[2], "SNMPv2-MIB::sysUpTime.0 = Timeticks: (8640000) 1d 0:0");
        assert_eq!(lines[4], "SNMPv2-MIB::sysName.0 = STRING: gateway");
    }

    #[tokio::test]
    async fn test_probe_strips_rejected_variables() {
        let net = MockNetwork::new();
        // An agent without sysContact or sysLocation, answering like SNMPv1
        net.set_agent("old", |request| {
            let missing = request
                .varbinds
                .iter()
                .position(|(oid, _)| matches!(oid.as_slice()[7], 4 | 6));
            let mut response = Message {
                pdu_type: PduType::Response,
                ..request.clone()
            };
            match missing {
                Some(i) => {
                    response.error_status = ErrorStatus::NO_SUCH_NAME;
                    response.error_index = i as u32 + 1;
                }
                None => {
                    response.varbinds = request
                        .varbinds
                        .iter()
                        .map(|(oid, _)| (oid.clone(), system_value(oid)))
                        .collect();
                }
            }
            Some(response)
        });

        let text = probe(&mut net.connector(), "old", 161, SnmpVersion::V1, "public", settings())
            .await
            .unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(!text.contains("sysContact"));
        assert!(!text.contains("sysLocation"));
        assert_eq!(net.requests("old").len(), 3);
    }

    #[tokio::test]
    async fn test_probe_timeout() {
        let net = MockNetwork::new();
        let text = probe(&mut net.connector(), "silent", 161, SnmpVersion::V1, "public", settings())
            .await
            .unwrap();
        assert_eq!(text, "Timeout: No Response from silent.\n");
        // One send plus one retry
        assert_eq!(net.requests("silent").len(), 2);
    }

    #[tokio::test]
    async fn test_probe_unknown_host() {
        let net = MockNetwork::new();
        net.set_unreachable("ghost", true);
        let err = probe(&mut net.connector(), "ghost", 161, SnmpVersion::V1, "public", settings())
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Open(_)));
    }
}
