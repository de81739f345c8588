//! Datagram endpoints sessions talk through.
//!
//! - [`UdpTransport`] / [`UdpConnector`]: connected UDP sockets registered
//!   with the tokio reactor
//! - [`MockNetwork`] / [`MockConnector`]: in-memory wire for tests, behind
//!   the `testing` feature
//!
//! A transport is owned by exactly one session. Nothing here is shared
//! between sessions, so no locking is involved.

use crate::error::OpenError;
use snmp_reader_types::TransportKind;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::task::{Context, Poll};

#[cfg(any(test, feature = "testing"))]
mod mock;

#[cfg(any(test, feature = "testing"))]
pub use mock::*;

/// Largest datagram accepted from an agent
pub const MAX_DATAGRAM: usize = 65_507;

/// One request/response channel to one agent
pub trait Transport {
    /// Transmit one datagram
    fn send(&mut self, data: &[u8]) -> io::Result<()>;

    /// The next datagram if one is already waiting. Never blocks.
    fn try_recv(&mut self) -> io::Result<Option<Vec<u8>>>;

    /// Ready once a datagram can be read. Registers `cx`'s waker otherwise.
    fn poll_readable(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>>;

    /// Printable peer address for logs and messages
    fn peer(&self) -> String;
}

/// Creates transports for sessions
pub trait Connector {
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        kind: Option<TransportKind>,
    ) -> Result<Box<dyn Transport>, OpenError>;
}

/// Connected UDP socket. Must be created inside a tokio runtime.
pub struct UdpTransport {
    /// Registered with the reactor; used for readiness and receiving
    socket: tokio::net::UdpSocket,
    /// The same socket, written directly so a fresh transport can send
    /// before the reactor has reported it writable
    sender: std::net::UdpSocket,
    peer: SocketAddr,
    buf: Vec<u8>,
}

impl UdpTransport {
    pub fn connect(peer: SocketAddr) -> io::Result<Self> {
        let local: SocketAddr = if peer.is_ipv6() {
            "[::]:0".parse().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?
        } else {
            "0.0.0.0:0".parse().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?
        };
        let socket = std::net::UdpSocket::bind(local)?;
        socket.connect(peer)?;
        socket.set_nonblocking(true)?;
        let sender = socket.try_clone()?;
        let socket = tokio::net::UdpSocket::from_std(socket)?;
        log::debug!("UDP socket {} -> {}", socket.local_addr()?, peer);
        Ok(Self {
            socket,
            sender,
            peer,
            buf: vec![0u8; MAX_DATAGRAM],
        })
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        let sent = self.sender.send(data)?;
        if sent != data.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short send: {} of {} bytes", sent, data.len()),
            ));
        }
        Ok(())
    }

    fn try_recv(&mut self) -> io::Result<Option<Vec<u8>>> {
        match self.socket.try_recv(&mut self.buf) {
            Ok(n) => Ok(Some(self.buf[..n].to_vec())),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            // ICMP port unreachable from an earlier send; the request will time out
            Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                log::debug!("{}: connection refused", self.peer);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn poll_readable(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.socket.poll_recv_ready(cx)
    }

    fn peer(&self) -> String {
        self.peer.to_string()
    }
}

/// Resolves host names and opens [`UdpTransport`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpConnector;

impl UdpConnector {
    pub fn new() -> Self {
        Self
    }
}

/// Pick the address matching the transport selector. Plain `udp` (or no
/// selector) prefers IPv4 but takes IPv6 when that is all there is.
fn pick_address(
    addrs: impl Iterator<Item = SocketAddr>,
    kind: Option<TransportKind>,
) -> Option<SocketAddr> {
    let addrs: Vec<SocketAddr> = addrs.collect();
    match kind {
        Some(TransportKind::Udp6) => addrs.iter().find(|a| a.is_ipv6()).copied(),
        Some(TransportKind::Udp) | None => addrs
            .iter()
            .find(|a| a.is_ipv4())
            .or_else(|| addrs.first())
            .copied(),
    }
}

impl Connector for UdpConnector {
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        kind: Option<TransportKind>,
    ) -> Result<Box<dyn Transport>, OpenError> {
        let addrs = (host, port).to_socket_addrs().map_err(|e| {
            log::debug!("Resolving {}:{} failed: {}", host, port, e);
            OpenError::UnknownHost {
                host: host.to_string(),
                port,
            }
        })?;
        let addr = pick_address(addrs, kind).ok_or_else(|| OpenError::NoAddress {
            host: host.to_string(),
            transport: kind.unwrap_or(TransportKind::Udp).as_str(),
        })?;
        Ok(Box::new(UdpTransport::connect(addr)?))
    }
}
