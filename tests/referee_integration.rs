//! End-to-end tests that spawn the real `referee` binary against the bundled
//! demo punters, the way `examples/sandover-plasmite/tests/cli_integration.rs`
//! drives its CLI through `Command` + `CARGO_BIN_EXE_*`.

use std::io::Write;
use std::process::Command;

use serde_json::Value;

fn triangle_map() -> &'static str {
    r#"{
        "sites": [{"id": 0}, {"id": 1}, {"id": 2}],
        "mines": [0],
        "rivers": [
            {"source": 0, "target": 1},
            {"source": 1, "target": 2},
            {"source": 0, "target": 2}
        ]
    }"#
}

fn write_map(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("map.json");
    let mut file = std::fs::File::create(&path).expect("create map file");
    file.write_all(triangle_map().as_bytes()).expect("write map file");
    path
}

fn run_referee(map_path: &std::path::Path, commands_json: &str, extra_args: &[&str]) -> Value {
    let exe = env!("CARGO_BIN_EXE_referee");
    let output = Command::new(exe)
        .arg("--map")
        .arg(map_path)
        .arg("--commands")
        .arg(commands_json)
        .args(extra_args)
        .output()
        .expect("run referee");

    assert!(
        output.status.success(),
        "referee exited with {:?}, stderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    let line = stdout.lines().last().expect("a report line");
    serde_json::from_str(line).expect("report is valid json")
}

#[test]
fn two_pass_bots_score_nothing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let map_path = write_map(temp.path());

    let pass_bot = env!("CARGO_BIN_EXE_pass_bot");
    let commands = serde_json::to_string(&[[pass_bot], [pass_bot]]).unwrap();

    let report = run_referee(&map_path, &commands, &[]);
    assert_eq!(report["scores"], serde_json::json!([0, 0]));
    assert_eq!(report["moves"].as_array().unwrap().len(), 3);
    for mv in report["moves"].as_array().unwrap() {
        assert!(mv.get("pass").is_some(), "expected a pass, got {mv:?}");
    }
}

#[test]
fn greedy_bot_claims_a_path_from_its_mine() {
    let temp = tempfile::tempdir().expect("tempdir");
    let map_path = write_map(temp.path());

    let greedy_bot = env!("CARGO_BIN_EXE_greedy_bot");
    let pass_bot = env!("CARGO_BIN_EXE_pass_bot");
    let commands = serde_json::to_string(&[[greedy_bot], [pass_bot]]).unwrap();

    let report = run_referee(&map_path, &commands, &[]);

    assert_eq!(
        report["moves"],
        serde_json::json!([
            { "claim": { "punter": 0, "source": 0, "target": 1 } },
            { "pass": { "punter": 1 } },
            { "claim": { "punter": 0, "source": 1, "target": 2 } },
        ])
    );
    assert_eq!(report["scores"], serde_json::json!([2, 0]));
}

#[test]
fn persistent_mode_with_feature_negotiation_reaches_the_same_outcome() {
    let temp = tempfile::tempdir().expect("tempdir");
    let map_path = write_map(temp.path());

    let greedy_bot = env!("CARGO_BIN_EXE_greedy_bot");
    let pass_bot = env!("CARGO_BIN_EXE_pass_bot");
    let commands = serde_json::to_string(&[[greedy_bot], [pass_bot]]).unwrap();

    let report = run_referee(&map_path, &commands, &["--persistent", "--feature-negotiation"]);
    assert_eq!(report["scores"], serde_json::json!([2, 0]));
}

#[test]
fn colliding_claims_are_recorded_as_passes() {
    let temp = tempfile::tempdir().expect("tempdir");
    let map_path = write_map(temp.path());

    let claimer_bot = env!("CARGO_BIN_EXE_claimer_bot");
    let commands = serde_json::to_string(&[[claimer_bot], [claimer_bot]]).unwrap();

    let report = run_referee(&map_path, &commands, &[]);

    // Both punters always go for river (0, 1): punter 0 gets it on turn 0,
    // then punter 1's and punter 0's own repeat attempts both conflict.
    assert_eq!(
        report["moves"],
        serde_json::json!([
            { "claim": { "punter": 0, "source": 0, "target": 1 } },
            { "pass": { "punter": 1 } },
            { "pass": { "punter": 0 } },
        ])
    );
    assert_eq!(report["scores"], serde_json::json!([1, 0]));
}

#[test]
fn include_cause_attaches_the_rejected_claim_to_a_conflict() {
    let temp = tempfile::tempdir().expect("tempdir");
    let map_path = write_map(temp.path());

    let claimer_bot = env!("CARGO_BIN_EXE_claimer_bot");
    let commands = serde_json::to_string(&[[claimer_bot], [claimer_bot]]).unwrap();

    let report = run_referee(&map_path, &commands, &["--include-cause"]);
    let moves = report["moves"].as_array().unwrap();

    assert!(moves[0].get("cause").is_none(), "a successful claim has no cause");

    let rejected_claim = &moves[1]["cause"]["claim"];
    assert_eq!(rejected_claim["punter"], 1);
    assert_eq!(rejected_claim["source"], 0);
    assert_eq!(rejected_claim["target"], 1);

    let rejected_self_claim = &moves[2]["cause"]["claim"];
    assert_eq!(rejected_self_claim["punter"], 0);
    assert_eq!(rejected_self_claim["source"], 0);
    assert_eq!(rejected_self_claim["target"], 1);
}

#[test]
fn include_time_annotates_the_move_log_and_state_never_leaks() {
    let temp = tempfile::tempdir().expect("tempdir");
    let map_path = write_map(temp.path());

    let pass_bot = env!("CARGO_BIN_EXE_pass_bot");
    let commands = serde_json::to_string(&[[pass_bot], [pass_bot]]).unwrap();

    let report = run_referee(&map_path, &commands, &["--include-state", "--include-time"]);
    for mv in report["moves"].as_array().unwrap() {
        assert!(mv.get("time").is_some(), "expected a time annotation, got {mv:?}");
        assert!(mv.get("state").is_none(), "state must never reach the log, got {mv:?}");
    }
}
