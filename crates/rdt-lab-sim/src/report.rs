use serde::Serialize;

use rdt_lab_wire::SimConfig;

use crate::channel::LinkEvent;

/// Serializable summary of one finished simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub config: SimConfig,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
    /// Payloads handed to the receiving application, in delivery order.
    pub delivered: Vec<String>,
    /// Datagrams the sender pushed into the channel, retransmissions included.
    pub sender_datagrams: u64,
    /// Retransmissions across all messages.
    pub retransmits: u64,
    /// Channel-side drop/corruption timeline.
    pub link_events: Vec<LinkEvent>,
}
