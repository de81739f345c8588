//! Session management.
//!
//! One session per reader: a transport endpoint, the routing token of the
//! reader that owns it, and the table of requests still waiting for an
//! answer. Sending never blocks; answers are collected by the
//! [`Scheduler`](crate::scheduler::Scheduler).

use crate::error::{OpenError, SendError};
use crate::pdu::build_get_request;
use crate::transport::{Connector, Transport};
use snmp_reader_core::{ReaderId, MAX_OIDS};
use snmp_reader_types::{Oid, SnmpVersion, TransportKind};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::task::Poll;
use std::time::{Duration, Instant};

/// Retry and table limits applied to every session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Time to wait for an answer before resending
    pub timeout: Duration,
    /// Resends before a request is reported as timed out
    pub retries: u32,
    /// Requests a session keeps in flight; the oldest is forgotten beyond this
    pub max_outstanding: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            retries: 5,
            max_outstanding: 16,
        }
    }
}

/// `host[:transport]` as written in reader configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTarget {
    pub host: String,
    pub transport: Option<TransportKind>,
}

impl SessionTarget {
    /// Split a trailing transport selector off the host. IPv6 literals keep
    /// their colons since their last component is never a transport name.
    pub fn parse(target: &str) -> Self {
        if let Some((host, suffix)) = target.rsplit_once(':') {
            if let Some(kind) = TransportKind::from_name(suffix) {
                return Self {
                    host: host.to_string(),
                    transport: Some(kind),
                };
            }
        }
        Self {
            host: target.to_string(),
            transport: None,
        }
    }
}

/// Handle to an open session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// A request still waiting for its answer
pub(crate) struct Pending {
    pub(crate) request_id: i32,
    pub(crate) packet: Vec<u8>,
    pub(crate) deadline: Instant,
    pub(crate) retries_left: u32,
}

pub(crate) struct Session {
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) token: ReaderId,
    pub(crate) pending: VecDeque<Pending>,
    version: SnmpVersion,
    community: String,
    pub(crate) peer: String,
}

/// Owner of every open session
pub struct SessionManager {
    connector: Box<dyn Connector>,
    sessions: BTreeMap<SessionId, Session>,
    settings: SessionSettings,
    next_session: u64,
    next_request_id: i32,
}

impl SessionManager {
    pub fn new(connector: Box<dyn Connector>, settings: SessionSettings) -> Self {
        // Random start so ids do not repeat across restarts
        let seed = rand::random::<i32>() & 0x3fff_ffff;
        Self {
            connector,
            sessions: BTreeMap::new(),
            settings,
            next_session: 1,
            next_request_id: seed.max(1),
        }
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Open a session towards `target` whose answers are routed to `token`
    pub fn open(
        &mut self,
        target: &str,
        port: u16,
        version: SnmpVersion,
        community: &str,
        token: ReaderId,
    ) -> Result<SessionId, OpenError> {
        let target = SessionTarget::parse(target);
        let transport = self
            .connector
            .connect(&target.host, port, target.transport)?;

        let id = SessionId(self.next_session);
        self.next_session += 1;
        let peer = transport.peer();
        log::debug!("Opened session {} to {} for reader {}", id, peer, token);
        self.sessions.insert(
            id,
            Session {
                transport,
                token,
                pending: VecDeque::new(),
                version,
                community: community.to_string(),
                peer,
            },
        );
        Ok(id)
    }

    fn alloc_request_id(&mut self) -> i32 {
        let id = self.next_request_id;
        self.next_request_id = match self.next_request_id.wrapping_add(1) {
            n if n <= 0 => 1,
            n => n,
        };
        id
    }

    /// Transmit a GET for `oids` (uptime is added in front). Returns the
    /// request id without waiting for the answer.
    pub fn send(&mut self, id: SessionId, oids: &[Oid], now: Instant) -> Result<i32, SendError> {
        if oids.len() + 1 > MAX_OIDS {
            return Err(SendError::TooManyOids {
                count: oids.len(),
                max: MAX_OIDS - 1,
            });
        }
        if !self.sessions.contains_key(&id) {
            return Err(SendError::NoSession(id.to_string()));
        }

        let request_id = self.alloc_request_id();
        let settings = self.settings;
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| SendError::NoSession(id.to_string()))?;

        let packet =
            build_get_request(session.version, &session.community, request_id, oids).encode();
        session.transport.send(&packet)?;
        log::trace!(
            "Sent request {} ({} OIDs, {} bytes) to {}",
            request_id,
            oids.len() + 1,
            packet.len(),
            session.peer
        );

        if session.pending.len() >= settings.max_outstanding.max(1) {
            if let Some(old) = session.pending.pop_front() {
                log::debug!("{}: forgetting request {}", session.peer, old.request_id);
            }
        }
        session.pending.push_back(Pending {
            request_id,
            packet,
            deadline: now + settings.timeout,
            retries_left: settings.retries,
        });
        Ok(request_id)
    }

    /// Release the session. Answers still in flight are never delivered.
    pub fn close(&mut self, id: SessionId) -> bool {
        match self.sessions.remove(&id) {
            Some(session) => {
                log::debug!(
                    "Closed session {} to {} ({} requests abandoned)",
                    id,
                    session.peer,
                    session.pending.len()
                );
                true
            }
            None => false,
        }
    }

    /// Close every session
    pub fn close_all(&mut self) {
        let ids: Vec<SessionId> = self.sessions.keys().copied().collect();
        for id in ids {
            self.close(id);
        }
    }

    pub fn is_open(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Routing token of the reader owning the session
    pub fn token(&self, id: SessionId) -> Option<ReaderId> {
        self.sessions.get(&id).map(|s| s.token)
    }

    /// Requests in flight on one session
    pub fn outstanding(&self, id: SessionId) -> usize {
        self.sessions.get(&id).map_or(0, |s| s.pending.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Earliest retry deadline across all sessions
    pub fn next_deadline(&self) -> Option<Instant> {
        self.sessions
            .values()
            .flat_map(|s| s.pending.iter().map(|p| p.deadline))
            .min()
    }

    /// Wait until any session has a datagram to read, for at most `wait`.
    /// Returns false when the wait ran out.
    pub(crate) async fn wait_readable(&self, wait: Duration) -> bool {
        if self.sessions.is_empty() || wait.is_zero() {
            return false;
        }
        let ready = std::future::poll_fn(|cx| {
            // Every socket is polled so each one holds the waker
            let mut ready = false;
            for session in self.sessions.values() {
                ready |= session.transport.poll_readable(cx).is_ready();
            }
            if ready {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        });
        tokio::time::timeout(wait, ready).await.is_ok()
    }

    pub(crate) fn ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    pub(crate) fn session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.close_all();
    }
}
