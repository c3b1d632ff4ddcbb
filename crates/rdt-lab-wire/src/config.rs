use serde::{Deserialize, Serialize};

/// Default retransmission timeout, matching the protocol's 3-unit timer.
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// Knobs for the simulated unreliable channel and the sender's timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Probability that a datagram is silently dropped in the channel.
    pub loss_rate: f64,
    /// Probability that a datagram has its checksum bytes mangled.
    pub corrupt_rate: f64,
    /// Seed for the channel's fault RNG; identical seeds replay identical runs.
    pub seed: u64,
    /// Sender retransmission timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            corrupt_rate: 0.0,
            seed: 0,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}
