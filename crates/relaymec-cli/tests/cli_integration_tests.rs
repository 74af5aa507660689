//! Integration tests for the `relaymec` binary.

#![cfg(test)]
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

fn relaymec() -> Command {
    let mut cmd = Command::cargo_bin("relaymec").expect("relaymec bin");
    cmd.env_remove("RELAYMEC_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn json_stdout(args: &[&str]) -> Value {
    let output = relaymec()
        .args(args)
        .args(["--output", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("valid json")
}

#[test]
fn place_json_lists_relays() {
    let json = json_stdout(&["place", "--tasks", "30", "--seed", "7"]);
    assert_eq!(json["devices"], 30);
    // 30 tasks at the default capacity of 10 need three relays.
    let relays = json["relays"].as_array().expect("relays array");
    assert_eq!(relays.len(), 3);
    assert_eq!(relays[0]["id"], "relay-0");
}

#[test]
fn place_is_deterministic_for_a_seed() {
    let a = json_stdout(&["place", "--tasks", "25", "--seed", "11"]);
    let b = json_stdout(&["place", "--tasks", "25", "--seed", "11"]);
    assert_eq!(a, b);
}

#[test]
fn match_json_respects_relay_capacity() {
    let json = json_stdout(&["match", "--tasks", "40", "--servers", "2", "--seed", "5"]);
    assert_eq!(json["tasks"], 40);
    let matched = json["matched"].as_u64().unwrap();
    assert_eq!(json["matches"].as_array().unwrap().len() as u64, matched);
    for load in json["relay_loads"].as_array().unwrap() {
        assert!(load["load"].as_u64().unwrap() <= load["capacity"].as_u64().unwrap());
    }
}

#[test]
fn match_table_prints_summary() {
    relaymec()
        .args(["match", "--tasks", "10", "--seed", "3"])
        .assert()
        .success()
        .stdout(contains("tasks, total profit"));
}

#[test]
fn dispatch_json_accounts_for_every_task() {
    let json = json_stdout(&["dispatch", "--tasks", "20", "--seed", "9"]);
    assert_eq!(json["policy"], "AdaptivePolicy");
    let offloaded = json["offloaded"].as_u64().unwrap();
    let unplaced = json["unplaced"].as_u64().unwrap();
    assert_eq!(offloaded + unplaced, 20);
    assert_eq!(json["decisions"].as_array().unwrap().len(), 20);
    assert!(json["final_aggression"].is_number());
    for d in json["decisions"].as_array().unwrap() {
        // Placed tasks report a number, unplaced ones an explicit null.
        assert_eq!(d["relay_id"].is_null(), d["latency"].is_null());
        assert_eq!(d["relay_id"].is_null(), d["cost"].is_null());
    }
}

#[test]
fn dispatch_static_policy() {
    let json = json_stdout(&["dispatch", "--tasks", "5", "--policy", "static"]);
    assert_eq!(json["policy"], "StaticPolicy");
    assert!(json.get("final_aggression").is_none());
}

#[test]
fn settings_file_overrides_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("offload.yaml");
    fs::write(&path, "placement:\n  max_relays: 2\n  relay_capacity: 5\n").unwrap();

    let output = relaymec()
        .args(["place", "--tasks", "40", "--output", "json", "--config"])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).unwrap();
    let relays = json["relays"].as_array().unwrap();
    assert_eq!(relays.len(), 2);
    assert_eq!(relays[0]["capacity"], 5);
}

#[test]
fn invalid_settings_fail_with_the_field_name() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[placement]\nrelay_capacity = 0\n").unwrap();

    relaymec()
        .args(["place", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("placement.relay_capacity"));
}

#[test]
fn missing_settings_file_fails() {
    relaymec()
        .args(["match", "--config", "/nonexistent/relaymec.yaml"])
        .assert()
        .failure();
}
