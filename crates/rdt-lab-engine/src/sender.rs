//! Sending side of the alternating-bit protocol: stop-and-wait with
//! timeout-driven retransmission.

use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info, warn};

use rdt_lab_wire::{DEFAULT_TIMEOUT_MS, MAX_PAYLOAD, Packet, SeqBit};

use crate::transport::{Transport, TransportError};

/// Errors out of [`Sender::send`].
#[derive(Debug, Error)]
pub enum SendError {
    /// The message does not fit the wire format's 14-bit length field.
    #[error("message of {len} bytes exceeds the {max}-byte payload cap")]
    MessageTooLarge { len: usize, max: usize },
    /// The optional retry cap was hit before the peer acknowledged.
    #[error("gave up after {attempts} transmissions without a matching ack")]
    RetriesExhausted { attempts: u64 },
    /// The channel itself failed; retrying cannot help.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Receipt for one confirmed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Sequence bit the message was sent under.
    pub seq: SeqBit,
    /// Retransmissions needed before the matching ack arrived.
    pub retransmits: u64,
}

/// How an inbound response relates to the outstanding packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AckOutcome {
    /// Valid ack for the outstanding sequence bit: the round is done.
    Confirmed,
    /// Corrupted, not an ack, or acknowledging the previous round.
    Stale,
}

/// Stop-and-wait sender. One packet is outstanding at a time; the
/// sequence bit advances only on a confirmed round trip.
pub struct Sender<T: Transport> {
    transport: T,
    seq: SeqBit,
    timeout: Duration,
    /// Optional hardening cap on transmissions per message; `None` retries
    /// forever, which is the protocol's default.
    max_retries: Option<u64>,
    datagrams_sent: u64,
    retransmits: u64,
}

impl<T: Transport> Sender<T> {
    pub fn new(transport: T) -> Self {
        Self::with_timeout(transport, Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }

    pub fn with_timeout(transport: T, timeout: Duration) -> Self {
        Self {
            transport,
            seq: SeqBit::Zero,
            timeout,
            max_retries: None,
            datagrams_sent: 0,
            retransmits: 0,
        }
    }

    /// Cap the number of retransmissions per message.
    pub fn max_retries(mut self, cap: u64) -> Self {
        self.max_retries = Some(cap);
        self
    }

    pub fn current_seq(&self) -> SeqBit {
        self.seq
    }

    /// Total datagrams pushed into the channel, retransmissions included.
    pub fn datagrams_sent(&self) -> u64 {
        self.datagrams_sent
    }

    /// Total retransmissions across all messages so far.
    pub fn retransmits(&self) -> u64 {
        self.retransmits
    }

    /// Reliably deliver one message, blocking until the peer acknowledges.
    ///
    /// The message is framed once and the exact same bytes are resent on
    /// every timeout. A response only confirms the round when it decodes
    /// cleanly, carries the ack flag, and matches the outstanding sequence
    /// bit; anything else gets one fresh wait (the receiver never re-acks
    /// a round on its own, so that wait ends in a timeout) followed by a
    /// retransmission.
    pub fn send(&mut self, message: &str) -> Result<Delivery, SendError> {
        // Reject before framing: an overlong payload would wrap the
        // packed length field and yield a datagram the receiver can
        // never accept, turning one bad message into a retransmit loop.
        if message.len() > MAX_PAYLOAD {
            return Err(SendError::MessageTooLarge {
                len: message.len(),
                max: MAX_PAYLOAD,
            });
        }

        let outstanding = Packet::data(self.seq, Bytes::copy_from_slice(message.as_bytes()));
        let wire = outstanding.encode();
        let mut retransmits_this_msg = 0u64;

        debug!("sending seq {} ({} bytes)", self.seq, wire.len());
        self.transmit(&wire)?;

        loop {
            match self.await_response()? {
                Some(AckOutcome::Confirmed) => {
                    info!(
                        "seq {} confirmed after {} retransmissions",
                        self.seq, retransmits_this_msg
                    );
                    let delivery = Delivery {
                        seq: self.seq,
                        retransmits: retransmits_this_msg,
                    };
                    self.seq = self.seq.flip();
                    return Ok(delivery);
                }
                Some(AckOutcome::Stale) => {
                    // The receiver acked a previous round. It will not ack
                    // again this round, so this fresh wait resolves by
                    // timing out, after which we retransmit.
                    debug!("stale or corrupt response for seq {}, waiting again", self.seq);
                    continue;
                }
                None => {
                    if let Some(cap) = self.max_retries
                        && retransmits_this_msg >= cap
                    {
                        return Err(SendError::RetriesExhausted {
                            attempts: retransmits_this_msg + 1,
                        });
                    }
                    retransmits_this_msg += 1;
                    self.retransmits += 1;
                    warn!(
                        "timeout waiting for ack {}, retransmission #{}",
                        self.seq, retransmits_this_msg
                    );
                    self.transmit(&wire)?;
                }
            }
        }
    }

    fn transmit(&mut self, wire: &[u8]) -> Result<(), TransportError> {
        self.transport.send(wire)?;
        self.datagrams_sent += 1;
        Ok(())
    }

    /// One timed wait for a response. `None` means the timer fired.
    fn await_response(&mut self) -> Result<Option<AckOutcome>, TransportError> {
        match self.transport.recv_timeout(self.timeout) {
            Ok(datagram) => Ok(Some(self.classify(&datagram))),
            Err(TransportError::TimedOut) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn classify(&self, datagram: &[u8]) -> AckOutcome {
        match Packet::decode(datagram) {
            Ok(packet) if packet.ack && packet.seq == self.seq => AckOutcome::Confirmed,
            Ok(packet) => {
                debug!(
                    "response ack={} seq={} does not match outstanding seq {}",
                    packet.ack, packet.seq, self.seq
                );
                AckOutcome::Stale
            }
            Err(err) => {
                debug!(%err, "corrupt response while awaiting ack {}", self.seq);
                AckOutcome::Stale
            }
        }
    }
}
