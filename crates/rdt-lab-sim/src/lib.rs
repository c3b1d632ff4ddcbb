//! Deterministic simulation of the protocol over a fault-injected
//! in-memory channel, plus the scenario runner the CLI and tests share.

pub mod channel;
pub mod harness;
pub mod report;
pub mod scenario_runner;

pub use channel::{LinkEvent, SimLink, SimTransport};
pub use harness::Simulation;
pub use report::SimulationReport;
