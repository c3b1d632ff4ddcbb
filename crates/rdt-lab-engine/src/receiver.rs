//! Receiving side of the alternating-bit protocol.
//!
//! [`ReceiverEngine`] is the pure state machine: one inbound datagram in,
//! exactly one acknowledgment out, plus at most one in-order delivery.
//! [`Receiver`] wraps it around an owned [`Transport`] and runs the
//! blocking read-validate-respond loop.

use bytes::Bytes;
use tracing::{debug, info};

use rdt_lab_wire::{Packet, SeqBit};

use crate::transport::{Transport, TransportError};

/// Outcome of handling one inbound datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    /// The acknowledgment to send back. Always present: every received
    /// datagram is answered by exactly one ack.
    pub ack: Packet,
    /// In-order payload for the application, present only when an
    /// uncorrupted packet with the expected sequence bit arrived.
    pub delivered: Option<Bytes>,
}

/// Alternating-bit receiver state machine.
///
/// Two conceptual states, waiting-for-even and waiting-for-odd, tracked by
/// `expected`. `last_acked` remembers the previous good round so corrupted
/// arrivals can be re-acknowledged without touching state.
#[derive(Debug)]
pub struct ReceiverEngine {
    expected: SeqBit,
    last_acked: SeqBit,
}

impl Default for ReceiverEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiverEngine {
    pub fn new() -> Self {
        Self {
            expected: SeqBit::Zero,
            // Before the first good packet there is no previous round;
            // acking the complement of `expected` is what the sender will
            // treat as stale, which is exactly the intent.
            last_acked: SeqBit::One,
        }
    }

    pub fn expected_seq(&self) -> SeqBit {
        self.expected
    }

    /// Process one raw datagram and decide the response.
    ///
    /// Corrupted datagrams re-ack the last good round. A valid packet with
    /// the wrong sequence bit is acknowledged under its *own* bit — acking
    /// what arrived, not what was expected — so a sender retransmitting
    /// after a false timeout still converges. Only a valid, in-order
    /// packet delivers its payload and advances state.
    pub fn handle(&mut self, datagram: &[u8]) -> Inbound {
        let packet = match Packet::decode(datagram) {
            Ok(packet) => packet,
            Err(err) => {
                debug!(%err, "corrupted datagram, re-acking seq {}", self.last_acked);
                return Inbound {
                    ack: Packet::ack(self.last_acked),
                    delivered: None,
                };
            }
        };

        if packet.seq != self.expected {
            debug!(
                "out-of-order packet: got seq {}, expected {}",
                packet.seq, self.expected
            );
            return Inbound {
                ack: Packet::ack(packet.seq),
                delivered: None,
            };
        }

        info!(
            "in-order packet seq {} ({} bytes), delivering",
            packet.seq,
            packet.payload.len()
        );
        self.last_acked = packet.seq;
        self.expected = self.expected.flip();
        Inbound {
            ack: Packet::ack(packet.seq),
            delivered: Some(packet.payload),
        }
    }
}

/// Blocking receiver bound to an owned transport.
pub struct Receiver<T: Transport> {
    transport: T,
    engine: ReceiverEngine,
}

impl<T: Transport> Receiver<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            engine: ReceiverEngine::new(),
        }
    }

    /// Block until the next in-order payload arrives and return it.
    ///
    /// Out-of-order and corrupted datagrams are acknowledged internally
    /// and never surface here.
    pub fn recv_next(&mut self) -> Result<Bytes, TransportError> {
        loop {
            let datagram = self.transport.recv()?;
            let outcome = self.engine.handle(&datagram);
            self.transport.send(&outcome.ack.encode())?;
            if let Some(payload) = outcome.delivered {
                return Ok(payload);
            }
        }
    }

    /// Run until the transport closes, invoking `on_message` once per
    /// distinct in-order payload. A closed channel ends the session
    /// cleanly; real I/O failures propagate.
    pub fn run(&mut self, mut on_message: impl FnMut(Bytes)) -> Result<(), TransportError> {
        loop {
            match self.recv_next() {
                Ok(payload) => on_message(payload),
                Err(TransportError::Disconnected) => return Ok(()),
                Err(err) => return Err(err),
            }
        }
    }
}
