//! Loads a TOML [`TestScenario`], runs it, and checks its assertions.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use rdt_lab_wire::{SeqBit, SimConfig, TestAction, TestAssertion, TestScenario};

use crate::harness::Simulation;
use crate::report::SimulationReport;

pub fn run_scenario_file(path: &Path) -> Result<SimulationReport> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario file {}", path.display()))?;
    let scenario: TestScenario = toml::from_str(&content)
        .with_context(|| format!("failed to parse scenario file {}", path.display()))?;
    run_scenario(&scenario)
}

pub fn run_scenario(scenario: &TestScenario) -> Result<SimulationReport> {
    info!("running scenario {:?}: {}", scenario.name, scenario.description);

    let mut config = SimConfig::default();
    scenario.config.apply_to(&mut config);

    let mut sim = Simulation::new(config);
    for action in &scenario.actions {
        match action {
            TestAction::AppSend { data } => {
                sim.message(data.clone());
            }
            TestAction::DropNextDataSeq { seq } => {
                sim.drop_next_data_seq(SeqBit::from_bit(*seq));
            }
            TestAction::DropNextAckSeq { seq } => {
                sim.drop_next_ack_seq(SeqBit::from_bit(*seq));
            }
        }
    }

    let report = sim.run()?;
    check_assertions(scenario, &report)?;
    info!("scenario {:?} passed", scenario.name);
    Ok(report)
}

fn check_assertions(scenario: &TestScenario, report: &SimulationReport) -> Result<()> {
    for assertion in &scenario.assertions {
        match assertion {
            TestAssertion::DataDelivered { data } => {
                if !report.delivered.iter().any(|d| d == data) {
                    bail!(
                        "assertion failed: {data:?} was not delivered (got {:?})",
                        report.delivered
                    );
                }
            }
            TestAssertion::SenderDatagramCount { min, max } => {
                check_range("sender datagram count", report.sender_datagrams, *min, *max)?;
            }
            TestAssertion::RetransmitCount { min, max } => {
                check_range("retransmit count", report.retransmits, *min, *max)?;
            }
            TestAssertion::MaxDurationMs { ms } => {
                if report.duration_ms > *ms {
                    bail!(
                        "assertion failed: run took {}ms, allowed {}ms",
                        report.duration_ms,
                        ms
                    );
                }
            }
        }
    }
    Ok(())
}

fn check_range(what: &str, actual: u64, min: u64, max: Option<u64>) -> Result<()> {
    if actual < min {
        bail!("assertion failed: {what} {actual} below minimum {min}");
    }
    if let Some(max) = max
        && actual > max
    {
        bail!("assertion failed: {what} {actual} above maximum {max}");
    }
    Ok(())
}
