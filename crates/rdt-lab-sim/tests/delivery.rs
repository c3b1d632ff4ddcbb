//! End-to-end protocol behavior over the simulated channel.

use rdt_lab_sim::Simulation;
use rdt_lab_wire::{SeqBit, SimConfig};

fn fast_config() -> SimConfig {
    SimConfig {
        timeout_ms: 30,
        ..SimConfig::default()
    }
}

#[test]
fn lossless_session_delivers_in_order_without_retransmission() {
    let mut sim = Simulation::new(fast_config());
    sim.message("msg1").message("msg2");
    let report = sim.run().unwrap();

    assert_eq!(report.delivered, vec!["msg1", "msg2"]);
    assert_eq!(report.sender_datagrams, 2);
    assert_eq!(report.retransmits, 0);
    assert!(report.link_events.is_empty());
}

#[test]
fn dropped_first_transmission_recovers_with_one_retransmission() {
    let mut sim = Simulation::new(fast_config());
    sim.message("msg1").drop_next_data_seq(SeqBit::Zero);
    let report = sim.run().unwrap();

    assert_eq!(report.delivered, vec!["msg1"]);
    assert_eq!(report.retransmits, 1);
    assert_eq!(report.sender_datagrams, 2);
}

#[test]
fn dropped_ack_causes_duplicate_that_is_not_redelivered() {
    let mut sim = Simulation::new(fast_config());
    sim.message("msg1").drop_next_ack_seq(SeqBit::Zero);
    let report = sim.run().unwrap();

    // The receiver saw msg1 twice but the application saw it once.
    assert_eq!(report.delivered, vec!["msg1"]);
    assert_eq!(report.retransmits, 1);
}

#[test]
fn faults_on_both_rounds_still_converge() {
    let mut sim = Simulation::new(fast_config());
    sim.message("msg1")
        .message("msg2")
        .drop_next_data_seq(SeqBit::Zero)
        .drop_next_ack_seq(SeqBit::One);
    let report = sim.run().unwrap();

    assert_eq!(report.delivered, vec!["msg1", "msg2"]);
    assert_eq!(report.retransmits, 2);
}

#[test]
fn lossy_corrupting_channel_delivers_everything_in_order() {
    let config = SimConfig {
        loss_rate: 0.2,
        corrupt_rate: 0.2,
        seed: 42,
        timeout_ms: 20,
    };
    let mut sim = Simulation::new(config);
    let expected: Vec<String> = (1..=9).map(|i| format!("msg{i}")).collect();
    for message in &expected {
        sim.message(message.clone());
    }
    let report = sim.run().unwrap();

    assert_eq!(report.delivered, expected);
    // Something must have gone wrong in the channel at these rates.
    assert!(report.retransmits > 0);
    assert!(!report.link_events.is_empty());
}
