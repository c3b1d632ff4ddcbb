//! In-memory unreliable channel with deterministic fault injection.
//!
//! A [`SimLink`] connects two [`SimTransport`] endpoints over plain mpsc
//! queues. Faults are applied on the sending side: seeded random loss and
//! corruption, plus one-shot deterministic drops keyed on the outgoing
//! packet's header, so tests can force a specific retransmission path.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::prelude::*;
use serde::Serialize;
use tracing::debug;

use rdt_lab_engine::{Transport, TransportError};
use rdt_lab_wire::{PackedHeader, SeqBit, SimConfig};

/// One notable thing the channel did to a datagram.
#[derive(Debug, Clone, Serialize)]
pub struct LinkEvent {
    pub at_ms: u64,
    pub description: String,
}

struct Shared {
    started: Instant,
    events: Mutex<Vec<LinkEvent>>,
}

impl Shared {
    fn record(&self, description: String) {
        debug!("{description}");
        let at_ms = self.started.elapsed().as_millis() as u64;
        if let Ok(mut events) = self.events.lock() {
            events.push(LinkEvent { at_ms, description });
        }
    }
}

/// Handle on the channel's event log, kept by the harness while both
/// endpoints are moved into the engines.
pub struct SimLink {
    shared: Arc<Shared>,
}

impl SimLink {
    /// Build a connected endpoint pair sharing one fault configuration.
    ///
    /// Endpoint RNGs are seeded from `config.seed` (offset per direction)
    /// so a run replays identically for the same seed.
    pub fn pair(config: &SimConfig) -> (Self, SimTransport, SimTransport) {
        let shared = Arc::new(Shared {
            started: Instant::now(),
            events: Mutex::new(Vec::new()),
        });
        let (to_receiver, from_sender) = mpsc::channel();
        let (to_sender, from_receiver) = mpsc::channel();

        let sender_side = SimTransport {
            label: "Sender->Receiver",
            tx: to_receiver,
            rx: from_receiver,
            faults: FaultPlan::new(config, config.seed),
            shared: Arc::clone(&shared),
        };
        let receiver_side = SimTransport {
            label: "Receiver->Sender",
            tx: to_sender,
            rx: from_sender,
            faults: FaultPlan::new(config, config.seed.wrapping_add(1)),
            shared: Arc::clone(&shared),
        };
        (Self { shared }, sender_side, receiver_side)
    }

    pub fn events(&self) -> Vec<LinkEvent> {
        self.shared
            .events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

struct FaultPlan {
    loss_rate: f64,
    corrupt_rate: f64,
    rng: StdRng,
    drop_data_seq_once: Vec<SeqBit>,
    drop_ack_seq_once: Vec<SeqBit>,
}

impl FaultPlan {
    fn new(config: &SimConfig, seed: u64) -> Self {
        Self {
            loss_rate: config.loss_rate,
            corrupt_rate: config.corrupt_rate,
            rng: StdRng::seed_from_u64(seed),
            drop_data_seq_once: Vec::new(),
            drop_ack_seq_once: Vec::new(),
        }
    }

    /// Consume a matching one-shot drop registration, if any.
    fn take_deterministic_drop(&mut self, header: &PackedHeader) -> bool {
        let list = if header.ack {
            &mut self.drop_ack_seq_once
        } else {
            &mut self.drop_data_seq_once
        };
        if let Some(pos) = list.iter().position(|s| *s == header.seq) {
            list.remove(pos);
            return true;
        }
        false
    }
}

/// One endpoint of a simulated link. Implements [`Transport`] for the
/// engines; faults apply to outgoing datagrams only.
pub struct SimTransport {
    label: &'static str,
    tx: mpsc::Sender<Vec<u8>>,
    rx: mpsc::Receiver<Vec<u8>>,
    faults: FaultPlan,
    shared: Arc<Shared>,
}

impl SimTransport {
    /// Drop the next outgoing data packet carrying `seq`.
    pub fn drop_next_data_seq(&mut self, seq: SeqBit) {
        self.faults.drop_data_seq_once.push(seq);
    }

    /// Drop the next outgoing ack carrying `seq`.
    pub fn drop_next_ack_seq(&mut self, seq: SeqBit) {
        self.faults.drop_ack_seq_once.push(seq);
    }
}

impl Transport for SimTransport {
    fn send(&mut self, datagram: &[u8]) -> Result<(), TransportError> {
        if let Ok(header) = PackedHeader::parse(datagram)
            && self.faults.take_deterministic_drop(&header)
        {
            self.shared.record(format!(
                "[{}] DROP (deterministic) ack={} seq={}",
                self.label, header.ack, header.seq
            ));
            return Ok(());
        }

        if self.faults.rng.random::<f64>() < self.faults.loss_rate {
            self.shared
                .record(format!("[{}] DROP (random loss)", self.label));
            return Ok(());
        }

        let mut owned = datagram.to_vec();
        if self.faults.rng.random::<f64>() < self.faults.corrupt_rate && owned.len() > 8 {
            // Invert the checksum's high byte so verification must fail.
            owned[8] = !owned[8];
            self.shared.record(format!("[{}] CORRUPT", self.label));
        }

        self.tx.send(owned).map_err(|_| TransportError::Disconnected)
    }

    fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        self.rx.recv().map_err(|_| TransportError::Disconnected)
    }

    fn recv_timeout(&mut self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => TransportError::TimedOut,
            RecvTimeoutError::Disconnected => TransportError::Disconnected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdt_lab_wire::Packet;

    fn lossless() -> SimConfig {
        SimConfig::default()
    }

    #[test]
    fn datagrams_pass_through_unchanged_by_default() {
        let (_link, mut a, mut b) = SimLink::pair(&lossless());
        let wire = Packet::data(SeqBit::Zero, &b"hi"[..]).encode();
        a.send(&wire).unwrap();
        assert_eq!(b.recv().unwrap(), wire.to_vec());
    }

    #[test]
    fn deterministic_data_drop_fires_once() {
        let (link, mut a, mut b) = SimLink::pair(&lossless());
        a.drop_next_data_seq(SeqBit::Zero);
        let wire = Packet::data(SeqBit::Zero, &b"hi"[..]).encode();

        a.send(&wire).unwrap();
        a.send(&wire).unwrap();

        // First copy dropped, second delivered.
        assert_eq!(b.recv().unwrap(), wire.to_vec());
        assert!(b.recv_timeout(Duration::from_millis(10)).is_err());
        assert_eq!(link.events().len(), 1);
    }

    #[test]
    fn ack_drop_does_not_match_data_packets() {
        let (_link, mut a, mut b) = SimLink::pair(&lossless());
        a.drop_next_ack_seq(SeqBit::Zero);
        let wire = Packet::data(SeqBit::Zero, &b"hi"[..]).encode();
        a.send(&wire).unwrap();
        assert_eq!(b.recv().unwrap(), wire.to_vec());
    }

    #[test]
    fn corruption_breaks_checksum_verification() {
        let config = SimConfig {
            corrupt_rate: 1.0,
            ..SimConfig::default()
        };
        let (_link, mut a, mut b) = SimLink::pair(&config);
        let wire = Packet::data(SeqBit::Zero, &b"hi"[..]).encode();
        a.send(&wire).unwrap();
        let received = b.recv().unwrap();
        assert!(Packet::decode(&received).is_err());
    }

    #[test]
    fn full_loss_delivers_nothing() {
        let config = SimConfig {
            loss_rate: 1.0,
            ..SimConfig::default()
        };
        let (_link, mut a, mut b) = SimLink::pair(&config);
        a.send(&Packet::ack(SeqBit::One).encode()).unwrap();
        assert!(matches!(
            b.recv_timeout(Duration::from_millis(10)),
            Err(TransportError::TimedOut)
        ));
    }

    #[test]
    fn closed_peer_surfaces_disconnected() {
        let (_link, a, mut b) = SimLink::pair(&lossless());
        drop(a);
        assert!(matches!(b.recv(), Err(TransportError::Disconnected)));
    }
}
