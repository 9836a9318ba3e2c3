//! GTP-C Path
//!
//! Datagram transport underneath the simulator. The simulator only needs to
//! send a buffer to a peer on a connection and to poll for inbound
//! datagrams without blocking; [`UdpTransport`] does that over
//! non-blocking UDP sockets.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};

use bytes::Bytes;
use thiserror::Error;

/// Index of a local socket
pub type ConnId = usize;

/// Inbound datagram: connection, source, payload
pub type Datagram = (ConnId, SocketAddr, Bytes);

/// Largest datagram accepted from the socket
const RECV_BUFFER_LEN: usize = 65535;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No socket for connection {0}")]
    InvalidSocketType(ConnId),

    #[error("Short send: {sent} of {len} bytes")]
    ShortSend { sent: usize, len: usize },
}

/// Datagram transport used by the simulator
pub trait Transport {
    /// Send `data` to `peer` from the socket of `conn`
    fn send_message(&mut self, conn: ConnId, peer: SocketAddr, data: &[u8]) -> Result<(), TransportError>;

    /// Next pending inbound datagram, `None` when nothing is waiting
    fn poll(&mut self) -> Result<Option<Datagram>, TransportError>;

    fn local_addr(&self, conn: ConnId) -> Result<SocketAddr, TransportError>;
}

// ============================================================================
// UDP
// ============================================================================

/// Non-blocking UDP sockets
pub struct UdpTransport {
    sockets: Vec<UdpSocket>,
    /// Socket polled first on the next call, for fairness
    next_poll: usize,
    buf: Vec<u8>,
}

impl UdpTransport {
    /// Bind one socket and return the transport with it as connection 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound or switched to
    /// non-blocking mode.
    pub fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let mut transport = Self {
            sockets: Vec::new(),
            next_poll: 0,
            buf: vec![0u8; RECV_BUFFER_LEN],
        };
        transport.add_socket(addr)?;
        Ok(transport)
    }

    /// Bind an additional socket, returning its connection id
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn add_socket(&mut self, addr: SocketAddr) -> Result<ConnId, TransportError> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        log::info!("GTP-C socket bound to {}", socket.local_addr()?);
        self.sockets.push(socket);
        Ok(self.sockets.len() - 1)
    }

    fn socket(&self, conn: ConnId) -> Result<&UdpSocket, TransportError> {
        self.sockets
            .get(conn)
            .ok_or(TransportError::InvalidSocketType(conn))
    }
}

impl Transport for UdpTransport {
    fn send_message(&mut self, conn: ConnId, peer: SocketAddr, data: &[u8]) -> Result<(), TransportError> {
        let sent = self.socket(conn)?.send_to(data, peer)?;
        if sent != data.len() {
            return Err(TransportError::ShortSend {
                sent,
                len: data.len(),
            });
        }
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<Datagram>, TransportError> {
        let count = self.sockets.len();
        for offset in 0..count {
            let conn = (self.next_poll + offset) % count;
            match self.sockets[conn].recv_from(&mut self.buf) {
                Ok((len, src)) => {
                    self.next_poll = (conn + 1) % count;
                    return Ok(Some((conn, src, Bytes::copy_from_slice(&self.buf[..len]))));
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => continue,
                // ICMP port unreachable from an earlier send surfaces here on some platforms
                Err(e) if e.kind() == ErrorKind::ConnectionReset => {
                    log::debug!("Ignoring connection reset on socket {conn}");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }

    fn local_addr(&self, conn: ConnId) -> Result<SocketAddr, TransportError> {
        Ok(self.socket(conn)?.local_addr()?)
    }
}

// ============================================================================
// Mock transport for tests
// ============================================================================

#[cfg(test)]
pub use mock::MockTransport;


// ============================================================================
// Tests
// ============================================================================
