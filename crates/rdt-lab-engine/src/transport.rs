use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by a [`Transport`].
///
/// `TimedOut` is part of normal protocol operation: it is the sender's
/// retransmission trigger. `Disconnected` and `Io` mean the channel itself
/// is gone; no amount of protocol-level retry recovers from those, so the
/// engines propagate them to the caller.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no datagram arrived within the timeout")]
    TimedOut,
    #[error("transport channel closed")]
    Disconnected,
    #[error("transport I/O failure")]
    Io(#[from] std::io::Error),
}

/// An unreliable, unordered datagram channel between two fixed endpoints.
///
/// The engines own their transport exclusively and never inspect
/// addressing; implementations decide where datagrams go and who they
/// come from. Datagrams may be dropped or corrupted in flight — that is
/// the whole point.
pub trait Transport {
    /// Push one datagram toward the peer. An `Ok` return only means the
    /// local side accepted it; delivery is never guaranteed.
    fn send(&mut self, datagram: &[u8]) -> Result<(), TransportError>;

    /// Block until a datagram arrives.
    fn recv(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Block until a datagram arrives or `timeout` elapses.
    fn recv_timeout(&mut self, timeout: Duration) -> Result<Vec<u8>, TransportError>;
}
