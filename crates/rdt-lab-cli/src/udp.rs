//! UDP-backed [`Transport`] for running the roles on real sockets.

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use rdt_lab_engine::{Transport, TransportError};

/// Largest datagram we accept; covers a maximum-size wire packet
/// (14-bit length field) so nothing legitimate is truncated.
const RECV_BUF: usize = 0x4000;

/// One endpoint over a UDP socket.
///
/// A sender is constructed with its peer's address; a receiver starts
/// without one and replies to whichever address most recently sent it a
/// datagram.
pub struct UdpTransport {
    socket: UdpSocket,
    peer: Option<SocketAddr>,
}

impl UdpTransport {
    /// Bind a receiving endpoint with no peer yet.
    pub fn bind(addr: SocketAddr) -> std::io::Result<Self> {
        Ok(Self {
            socket: UdpSocket::bind(addr)?,
            peer: None,
        })
    }

    /// Bind a sending endpoint aimed at `peer`.
    pub fn bind_to_peer(addr: SocketAddr, peer: SocketAddr) -> std::io::Result<Self> {
        Ok(Self {
            socket: UdpSocket::bind(addr)?,
            peer: Some(peer),
        })
    }

    fn recv_inner(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut buf = [0u8; RECV_BUF];
        let (len, src) = self.socket.recv_from(&mut buf).map_err(map_io)?;
        self.peer = Some(src);
        Ok(buf[..len].to_vec())
    }
}

fn map_io(err: std::io::Error) -> TransportError {
    match err.kind() {
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => TransportError::TimedOut,
        _ => TransportError::Io(err),
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, datagram: &[u8]) -> Result<(), TransportError> {
        // A receiver with no peer yet has nothing to reply to.
        let peer = self.peer.ok_or(TransportError::Disconnected)?;
        self.socket.send_to(datagram, peer).map_err(map_io)?;
        Ok(())
    }

    fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        self.socket.set_read_timeout(None)?;
        self.recv_inner()
    }

    fn recv_timeout(&mut self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        self.socket.set_read_timeout(Some(timeout))?;
        self.recv_inner()
    }
}
