//! Drives a sender/receiver pair over the simulated channel.
//!
//! The receiver loop runs on its own thread (each role is single-threaded
//! and blocking, as in a real deployment); the sender runs on the calling
//! thread. Closing the sender's endpoint ends the receiver's session.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::info;

use rdt_lab_engine::{Receiver, Sender};
use rdt_lab_wire::{SeqBit, SimConfig};

use crate::channel::SimLink;
use crate::report::SimulationReport;

/// A configured single-session simulation: a list of application messages
/// plus the faults to inject while they are delivered.
pub struct Simulation {
    config: SimConfig,
    messages: Vec<String>,
    drop_data_seq_once: Vec<SeqBit>,
    drop_ack_seq_once: Vec<SeqBit>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            messages: Vec::new(),
            drop_data_seq_once: Vec::new(),
            drop_ack_seq_once: Vec::new(),
        }
    }

    /// Queue one application message for reliable delivery.
    pub fn message(&mut self, message: impl Into<String>) -> &mut Self {
        self.messages.push(message.into());
        self
    }

    /// Drop the first data packet sent under `seq`.
    pub fn drop_next_data_seq(&mut self, seq: SeqBit) -> &mut Self {
        self.drop_data_seq_once.push(seq);
        self
    }

    /// Drop the first ack sent under `seq`.
    pub fn drop_next_ack_seq(&mut self, seq: SeqBit) -> &mut Self {
        self.drop_ack_seq_once.push(seq);
        self
    }

    /// Run the whole session to completion and summarize it.
    pub fn run(self) -> Result<SimulationReport> {
        let started = Instant::now();
        let (link, mut sender_side, mut receiver_side) = SimLink::pair(&self.config);

        for seq in self.drop_data_seq_once {
            sender_side.drop_next_data_seq(seq);
        }
        for seq in self.drop_ack_seq_once {
            receiver_side.drop_next_ack_seq(seq);
        }

        let receiver_thread = thread::spawn(move || {
            let mut receiver = Receiver::new(receiver_side);
            let mut delivered = Vec::new();
            let result = receiver.run(|payload| {
                delivered.push(String::from_utf8_lossy(&payload).into_owned());
            });
            (delivered, result)
        });

        let timeout = Duration::from_millis(self.config.timeout_ms);
        let mut sender = Sender::with_timeout(sender_side, timeout);
        for message in &self.messages {
            let delivery = sender
                .send(message)
                .with_context(|| format!("delivering {message:?}"))?;
            info!(
                "delivered {message:?} under seq {} ({} retransmissions)",
                delivery.seq, delivery.retransmits
            );
        }

        let sender_datagrams = sender.datagrams_sent();
        let retransmits = sender.retransmits();
        // Closing the sender's endpoint ends the receiver's session.
        drop(sender);

        let (delivered, recv_result) = receiver_thread
            .join()
            .map_err(|_| anyhow!("receiver thread panicked"))?;
        recv_result.context("receiver loop failed")?;

        Ok(SimulationReport {
            config: self.config,
            duration_ms: started.elapsed().as_millis() as u64,
            delivered,
            sender_datagrams,
            retransmits,
            link_events: link.events(),
        })
    }
}
