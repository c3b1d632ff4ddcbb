//! Scenario files drive the same harness the CLI uses.

use std::fs;
use std::path::Path;

use rdt_lab_sim::scenario_runner;
use rdt_lab_wire::TestScenario;

const DROP_FIRST_DATA: &str = r#"
name = "drop-first-data"
description = "first copy of msg1 is dropped; one retransmission recovers"

[config]
timeout_ms = 30

[[actions]]
type = "drop_next_data_seq"
seq = 0

[[actions]]
type = "app_send"
data = "msg1"

[[assertions]]
type = "data_delivered"
data = "msg1"

[[assertions]]
type = "retransmit_count"
min = 1
max = 1

[[assertions]]
type = "sender_datagram_count"
min = 2
max = 2
"#;

#[test]
fn scenario_parses_and_passes() {
    let scenario: TestScenario = toml::from_str(DROP_FIRST_DATA).unwrap();
    assert_eq!(scenario.name, "drop-first-data");
    assert_eq!(scenario.actions.len(), 2);

    let report = scenario_runner::run_scenario(&scenario).unwrap();
    assert_eq!(report.delivered, vec!["msg1"]);
}

#[test]
fn scenario_file_round_trip() {
    let path = std::env::temp_dir().join(format!("rdt-lab-scenario-{}.toml", std::process::id()));
    fs::write(&path, DROP_FIRST_DATA).unwrap();
    let report = scenario_runner::run_scenario_file(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(report.retransmits, 1);
}

#[test]
fn shipped_scenario_files_parse_and_pass() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenarios");
    let mut ran = 0;
    for entry in fs::read_dir(&dir).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            scenario_runner::run_scenario_file(&path)
                .unwrap_or_else(|err| panic!("{} failed: {err:#}", path.display()));
            ran += 1;
        }
    }
    assert!(ran >= 2, "expected shipped scenarios in {}", dir.display());
}

#[test]
fn failing_assertion_is_reported() {
    let mut scenario: TestScenario = toml::from_str(DROP_FIRST_DATA).unwrap();
    scenario.assertions.push(
        toml::from_str::<rdt_lab_wire::TestAssertion>(
            "type = \"data_delivered\"\ndata = \"never sent\"",
        )
        .unwrap(),
    );
    let err = scenario_runner::run_scenario(&scenario).unwrap_err();
    assert!(err.to_string().contains("never sent"));
}
