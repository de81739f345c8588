//! In-memory transport for tests.
//!
//! A [`MockNetwork`] plays every agent at once. Tests inspect what was sent
//! to a host and push replies back; replies to a closed endpoint vanish the
//! way a datagram to a closed socket would.

use super::{Connector, Transport};
use crate::error::OpenError;
use crate::pdu::Message;
use snmp_reader_types::TransportKind;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

struct Endpoint {
    host: String,
    port: u16,
    open: bool,
    sent: Vec<Vec<u8>>,
    answered: usize,
    inbox: VecDeque<Vec<u8>>,
    waker: Option<Waker>,
}

impl Endpoint {
    fn push(&mut self, bytes: Vec<u8>) {
        self.inbox.push_back(bytes);
        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
    }
}

type Responder = Box<dyn FnMut(&Message) -> Option<Message>>;

#[derive(Default)]
struct Wire {
    endpoints: Vec<Endpoint>,
    unreachable: HashSet<String>,
    fail_sends: HashSet<String>,
    agents: HashMap<String, Responder>,
}

/// Shared handle to the simulated network
#[derive(Clone, Default)]
pub struct MockNetwork {
    wire: Rc<RefCell<Wire>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connector opening endpoints on this network
    pub fn connector(&self) -> MockConnector {
        MockConnector { net: self.clone() }
    }

    /// Make `host` fail name resolution
    pub fn set_unreachable(&self, host: &str, unreachable: bool) {
        let mut wire = self.wire.borrow_mut();
        if unreachable {
            wire.unreachable.insert(host.to_string());
        } else {
            wire.unreachable.remove(host);
        }
    }

    /// Make every send towards `host` fail
    pub fn set_send_failure(&self, host: &str, fail: bool) {
        let mut wire = self.wire.borrow_mut();
        if fail {
            wire.fail_sends.insert(host.to_string());
        } else {
            wire.fail_sends.remove(host);
        }
    }

    /// Answer requests to `host` as soon as they are sent, for callers that
    /// block waiting on the reply
    pub fn set_agent<F>(&self, host: &str, agent: F)
    where
        F: FnMut(&Message) -> Option<Message> + 'static,
    {
        self.wire
            .borrow_mut()
            .agents
            .insert(host.to_string(), Box::new(agent));
    }

    /// Number of endpoints currently open towards `host`
    pub fn open_endpoints(&self, host: &str) -> usize {
        self.wire
            .borrow()
            .endpoints
            .iter()
            .filter(|e| e.open && e.host == host)
            .count()
    }

    /// Every datagram sent to `host`, decoded, oldest first
    pub fn requests(&self, host: &str) -> Vec<Message> {
        self.wire
            .borrow()
            .endpoints
            .iter()
            .filter(|e| e.host == host)
            .flat_map(|e| e.sent.iter())
            .filter_map(|bytes| Message::decode(bytes).ok())
            .collect()
    }

    /// Port the most recent endpoint towards `host` was opened with
    pub fn port_of(&self, host: &str) -> Option<u16> {
        self.wire
            .borrow()
            .endpoints
            .iter()
            .rev()
            .find(|e| e.host == host)
            .map(|e| e.port)
    }

    /// Queue a raw datagram on every open endpoint towards `host`
    pub fn deliver(&self, host: &str, bytes: &[u8]) {
        for endpoint in self.wire.borrow_mut().endpoints.iter_mut() {
            if endpoint.open && endpoint.host == host {
                endpoint.push(bytes.to_vec());
            }
        }
    }

    /// Answer every request sent to `host` since the last call.
    ///
    /// `reply` maps a request to its response; returning `None` drops the
    /// request on the floor. Requests on closed endpoints are not answered.
    /// Returns the number of replies queued.
    pub fn respond<F>(&self, host: &str, mut reply: F) -> usize
    where
        F: FnMut(&Message) -> Option<Message>,
    {
        let mut wire = self.wire.borrow_mut();
        let mut queued = 0;
        for endpoint in wire.endpoints.iter_mut().filter(|e| e.host == host) {
            let pending: Vec<Vec<u8>> = endpoint.sent[endpoint.answered..].to_vec();
            endpoint.answered = endpoint.sent.len();
            if !endpoint.open {
                continue;
            }
            for bytes in pending {
                let Ok(request) = Message::decode(&bytes) else {
                    continue;
                };
                if let Some(response) = reply(&request) {
                    endpoint.push(response.encode());
                    queued += 1;
                }
            }
        }
        queued
    }
}

/// Opens [`MockTransport`]s on a [`MockNetwork`]
pub struct MockConnector {
    net: MockNetwork,
}

impl Connector for MockConnector {
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        _kind: Option<TransportKind>,
    ) -> Result<Box<dyn Transport>, OpenError> {
        let mut wire = self.net.wire.borrow_mut();
        if wire.unreachable.contains(host) {
            return Err(OpenError::UnknownHost {
                host: host.to_string(),
                port,
            });
        }
        wire.endpoints.push(Endpoint {
            host: host.to_string(),
            port,
            open: true,
            sent: Vec::new(),
            answered: 0,
            inbox: VecDeque::new(),
            waker: None,
        });
        Ok(Box::new(MockTransport {
            net: self.net.clone(),
            index: wire.endpoints.len() - 1,
        }))
    }
}

/// One endpoint on a [`MockNetwork`]
pub struct MockTransport {
    net: MockNetwork,
    index: usize,
}

impl Transport for MockTransport {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        let mut wire = self.net.wire.borrow_mut();
        let host = wire.endpoints[self.index].host.clone();
        if wire.fail_sends.contains(&host) {
            return Err(io::Error::new(io::ErrorKind::Other, "network unreachable"));
        }
        wire.endpoints[self.index].sent.push(data.to_vec());

        let reply = match (wire.agents.get_mut(&host), Message::decode(data)) {
            (Some(agent), Ok(request)) => agent(&request).map(|r| r.encode()),
            _ => None,
        };
        if let Some(reply) = reply {
            let endpoint = &mut wire.endpoints[self.index];
            endpoint.answered = endpoint.sent.len();
            endpoint.push(reply);
        }
        Ok(())
    }

    fn try_recv(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.net.wire.borrow_mut().endpoints[self.index].inbox.pop_front())
    }

    fn poll_readable(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let mut wire = self.net.wire.borrow_mut();
        let endpoint = &mut wire.endpoints[self.index];
        if endpoint.inbox.is_empty() {
            endpoint.waker = Some(cx.waker().clone());
            Poll::Pending
        } else {
            Poll::Ready(Ok(()))
        }
    }

    fn peer(&self) -> String {
        let wire = self.net.wire.borrow();
        let endpoint = &wire.endpoints[self.index];
        format!("{}:{}", endpoint.host, endpoint.port)
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        let mut wire = self.net.wire.borrow_mut();
        let endpoint = &mut wire.endpoints[self.index];
        endpoint.open = false;
        endpoint.inbox.clear();
        endpoint.waker = None;
    }
}
