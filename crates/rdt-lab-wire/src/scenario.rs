use crate::config::SimConfig;
use serde::Deserialize;

/// A declarative simulation test case, loaded from TOML.
#[derive(Deserialize, Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub description: String,
    pub config: SimConfigOverride,
    pub actions: Vec<TestAction>,
    pub assertions: Vec<TestAssertion>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SimConfigOverride {
    pub loss_rate: Option<f64>,
    pub corrupt_rate: Option<f64>,
    pub seed: Option<u64>,
    pub timeout_ms: Option<u64>,
}

impl SimConfigOverride {
    pub fn apply_to(&self, config: &mut SimConfig) {
        if let Some(v) = self.loss_rate {
            config.loss_rate = v;
        }
        if let Some(v) = self.corrupt_rate {
            config.corrupt_rate = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if let Some(v) = self.timeout_ms {
            config.timeout_ms = v;
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestAction {
    /// Application submits one message to the sender.
    AppSend { data: String },
    /// Deterministically drop the first data packet carrying this seq bit.
    DropNextDataSeq { seq: u16 },
    /// Deterministically drop the first ack carrying this seq bit.
    DropNextAckSeq { seq: u16 },
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestAssertion {
    /// Specific data reached the receiving application, in order.
    DataDelivered { data: String },
    /// Total datagrams the sender pushed into the channel is within range.
    SenderDatagramCount { min: u64, max: Option<u64> },
    /// Total retransmissions across the run is within range.
    RetransmitCount { min: u64, max: Option<u64> },
    /// Wall-clock bound on the whole run.
    MaxDurationMs { ms: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_applies_only_set_fields() {
        let mut config = SimConfig::default();
        let over = SimConfigOverride {
            loss_rate: Some(0.3),
            timeout_ms: Some(50),
            ..Default::default()
        };
        over.apply_to(&mut config);
        assert_eq!(config.loss_rate, 0.3);
        assert_eq!(config.timeout_ms, 50);
        assert_eq!(config.corrupt_rate, 0.0);
        assert_eq!(config.seed, 0);
    }
}
