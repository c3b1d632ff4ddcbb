//! Shared vocabulary for the RDT lab: wire format, checksum, simulation
//! config, and the scenario description consumed by the runner.

pub mod checksum;
pub mod config;
pub mod packet;
pub mod scenario;

pub use config::{DEFAULT_TIMEOUT_MS, SimConfig};
pub use packet::{HEADER_LEN, MAGIC, MAX_PAYLOAD, Packet, PackedHeader, SeqBit, WireError};
pub use scenario::{SimConfigOverride, TestAction, TestAssertion, TestScenario};
