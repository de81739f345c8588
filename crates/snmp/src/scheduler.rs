//! The shared polling step.
//!
//! Called once per host tick on the host's own thread. Each call looks at
//! every open session once and does exactly one of two things:
//! - if any datagram is waiting, drain and decode everything that is
//!   available across all sessions
//! - otherwise, run timeout processing: resend requests whose deadline
//!   passed while retries remain, and report the rest as timed out
//!
//! [`Scheduler::poll`] only checks the sockets and returns. A caller that
//! can afford to wait uses [`Scheduler::poll_wait`], which first waits on
//! readiness of every session socket at once, bounded by its budget and by
//! the nearest retry deadline.

use crate::pdu::{decode_response, Decoded, Message};
use crate::session::{SessionId, SessionManager};
use async_snmp::PduType;
use snmp_reader_core::ReaderId;
use std::time::{Duration, Instant};

/// One outcome routed back to a reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub session: SessionId,
    /// Routing token of the reader that owns the session
    pub token: ReaderId,
    pub request_id: i32,
    pub outcome: Decoded,
}

/// Counters from the last poll, for logging
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollStats {
    pub datagrams: usize,
    pub dropped: usize,
    pub resent: usize,
    pub timed_out: usize,
}

/// Drives all sessions of a [`SessionManager`]
#[derive(Debug, Default)]
pub struct Scheduler {
    /// Sessions checked during the current poll, rebuilt every call
    readiness: Vec<SessionId>,
    last: PollStats,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics of the most recent [`poll`](Self::poll)
    pub fn last_stats(&self) -> PollStats {
        self.last
    }

    /// When the next retry deadline falls, if any request is in flight
    pub fn next_wakeup(&self, sessions: &SessionManager) -> Option<Instant> {
        sessions.next_deadline()
    }

    /// Run one polling step without waiting; this is what a UI tick calls
    pub fn poll(&mut self, sessions: &mut SessionManager, now: Instant) -> Vec<Delivery> {
        self.readiness = sessions.ids();
        self.last = PollStats::default();
        if self.readiness.is_empty() {
            return Vec::new();
        }

        let mut deliveries = Vec::new();
        self.drain(sessions, &mut deliveries);
        if self.last.datagrams == 0 {
            self.expire(sessions, now, &mut deliveries);
        }

        if self.last != PollStats::default() {
            log::trace!("Poll over {} sessions: {:?}", self.readiness.len(), self.last);
        }
        deliveries
    }

    /// Wait up to `wait` for any session socket to become readable, then
    /// run one polling step. The wait ends early at the nearest retry
    /// deadline so timeouts are still processed on time.
    pub async fn poll_wait(
        &mut self,
        sessions: &mut SessionManager,
        wait: Duration,
    ) -> Vec<Delivery> {
        let start = Instant::now();
        let wait = match sessions.next_deadline() {
            Some(deadline) => wait.min(deadline.saturating_duration_since(start)),
            None => wait,
        };
        let ready = sessions.wait_readable(wait).await;
        log::trace!("Waited {:?} of {:?} (ready: {})", start.elapsed(), wait, ready);
        self.poll(sessions, Instant::now())
    }

    /// Read every datagram already waiting on any session
    fn drain(&mut self, sessions: &mut SessionManager, deliveries: &mut Vec<Delivery>) {
        for id in &self.readiness {
            let Some(session) = sessions.session_mut(*id) else {
                continue;
            };
            loop {
                let bytes = match session.transport.try_recv() {
                    Ok(Some(bytes)) => bytes,
                    Ok(None) => break,
                    Err(e) => {
                        log::error!("{}: receive failed: {}", session.peer, e);
                        break;
                    }
                };
                self.last.datagrams += 1;

                let message = match Message::decode(&bytes) {
                    Ok(m) if m.pdu_type == PduType::Response => m,
                    Ok(m) => {
                        log::warn!("{}: ignoring {:?} PDU", session.peer, m.pdu_type);
                        self.last.dropped += 1;
                        continue;
                    }
                    Err(e) => {
                        log::warn!("{}: undecodable datagram: {}", session.peer, e);
                        self.last.dropped += 1;
                        continue;
                    }
                };

                let position = session
                    .pending
                    .iter()
                    .position(|p| p.request_id == message.request_id);
                match position.and_then(|i| session.pending.remove(i)) {
                    Some(pending) => {
                        log::trace!(
                            "{}: response to request {} ({} bytes)",
                            session.peer,
                            pending.request_id,
                            bytes.len()
                        );
                        deliveries.push(Delivery {
                            session: *id,
                            token: session.token,
                            request_id: pending.request_id,
                            outcome: decode_response(&message),
                        });
                    }
                    None => {
                        log::warn!(
                            "{}: dropping late or unknown response {}",
                            session.peer,
                            message.request_id
                        );
                        self.last.dropped += 1;
                    }
                }
            }
        }
    }

    /// Resend or give up on requests whose deadline passed
    fn expire(&mut self, sessions: &mut SessionManager, now: Instant, deliveries: &mut Vec<Delivery>) {
        let timeout = sessions.settings().timeout;
        for id in &self.readiness {
            let Some(session) = sessions.session_mut(*id) else {
                continue;
            };

            let mut i = 0;
            while i < session.pending.len() {
                if session.pending[i].deadline > now {
                    i += 1;
                    continue;
                }

                if session.pending[i].retries_left > 0 {
                    let pending = &mut session.pending[i];
                    pending.retries_left -= 1;
                    pending.deadline = now + timeout;
                    match session.transport.send(&pending.packet) {
                        Ok(()) => {
                            log::debug!(
                                "{}: resent request {} ({} retries left)",
                                session.peer,
                                pending.request_id,
                                pending.retries_left
                            );
                            self.last.resent += 1;
                        }
                        Err(e) => log::error!("{}: resend failed: {}", session.peer, e),
                    }
                    i += 1;
                } else if let Some(pending) = session.pending.remove(i) {
                    log::debug!("{}: request {} timed out", session.peer, pending.request_id);
                    self.last.timed_out += 1;
                    deliveries.push(Delivery {
                        session: *id,
                        token: session.token,
                        request_id: pending.request_id,
                        outcome: Decoded::Timeout,
                    });
                }
            }
        }
    }
}
