use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    let path = Path::new("tests/fixtures").join(name);
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

fn noteanchor() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("noteanchor"))
}

fn run_json(args: &[&str]) -> Value {
    let assert = noteanchor()
        .args(["--output", "json"])
        .args(args)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    serde_json::from_str(extract_json(&stdout)).expect("valid json")
}

fn capture_to(dir: &TempDir, target: &str, id: &str) -> PathBuf {
    let out = dir.path().join(format!("{id}.json"));
    let page = fixture("page.json");
    run_json(&[
        "capture",
        "--dom",
        page.to_str().unwrap(),
        "--target",
        target,
        "--id",
        id,
        "--out",
        out.to_str().unwrap(),
    ]);
    out
}

#[test]
fn capture_emits_descriptor_with_context() {
    let page = fixture("page.json");
    let value = run_json(&[
        "capture",
        "--dom",
        page.to_str().unwrap(),
        "--target",
        "#feed > div:nth-of-type(2)",
        "--id",
        "note-beta",
    ]);

    assert_eq!(value["id"].as_str(), Some("note-beta"));
    assert!(!value["selector"].as_str().unwrap().is_empty());
    assert_eq!(value["elementContext"]["tag"].as_str(), Some("div"));
    assert_eq!(value["elementContext"]["text"].as_str(), Some("Beta"));
    assert_eq!(value["elementContext"]["position"]["y"].as_f64(), Some(200.0));
    let chain = value["parentChain"].as_array().unwrap();
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0]["id"].as_str(), Some("feed"));
}

#[test]
fn locate_follows_reordered_cards_and_upgrades_descriptor() {
    let dir = TempDir::new().unwrap();
    let descriptor = capture_to(&dir, "#feed > div:nth-of-type(2)", "note-beta");
    let stored: Value = serde_json::from_str(&fs::read_to_string(&descriptor).unwrap()).unwrap();

    let reordered = fixture("page_reordered.json");
    let value = run_json(&[
        "locate",
        "--dom",
        reordered.to_str().unwrap(),
        "--descriptor",
        descriptor.to_str().unwrap(),
        "--upgrade",
    ]);

    assert_eq!(value["found"].as_bool(), Some(true));
    assert_eq!(value["element"]["text"].as_str(), Some("Beta"));
    assert_ne!(value["strategy"].as_str(), Some("selector"));

    let upgraded = value["upgradedSelector"].as_str().expect("upgraded selector");
    let rewritten: Value = serde_json::from_str(&fs::read_to_string(&descriptor).unwrap()).unwrap();
    assert_eq!(rewritten["selector"].as_str(), Some(upgraded));
    assert_ne!(rewritten["selector"], stored["selector"]);
}

#[test]
fn locate_reports_not_found_without_failing() {
    let dir = TempDir::new().unwrap();
    let descriptor = capture_to(&dir, "#feed > div:nth-of-type(1)", "note-alpha");
    let empty = dir.path().join("empty.json");
    fs::write(
        &empty,
        r#"{"viewport": {"width": 1280, "height": 800}, "root": {"tag": "html", "children": [{"tag": "body"}]}}"#,
    )
    .unwrap();

    let value = run_json(&[
        "locate",
        "--dom",
        empty.to_str().unwrap(),
        "--descriptor",
        descriptor.to_str().unwrap(),
    ]);
    assert_eq!(value["found"].as_bool(), Some(false));
    assert!(value["element"].is_null());
}

#[test]
fn signature_survives_mobile_resize() {
    let before = fixture("page.json");
    let after = fixture("page_mobile.json");
    let value = run_json(&[
        "signature",
        "--before",
        before.to_str().unwrap(),
        "--after",
        after.to_str().unwrap(),
        "--target",
        "#feed > div:nth-of-type(2)",
    ]);

    assert_eq!(value["found"].as_bool(), Some(true));
    assert_eq!(value["tier"].as_str(), Some("text-content"));
    assert_eq!(value["element"]["text"].as_str(), Some("Beta"));
    assert_eq!(value["signature"]["textContent"].as_str(), Some("Beta"));
}

#[test]
fn place_lays_out_visible_markers_and_hides_the_rest() {
    let dir = TempDir::new().unwrap();
    let files = [
        capture_to(&dir, "#feed > div:nth-of-type(1)", "note-alpha"),
        capture_to(&dir, "#feed > div:nth-of-type(2)", "note-beta"),
        capture_to(&dir, "footer p", "note-footer"),
    ];
    let descriptors: Vec<Value> = files
        .iter()
        .map(|path| serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap())
        .collect();
    let batch = dir.path().join("descriptors.json");
    fs::write(&batch, serde_json::to_string(&descriptors).unwrap()).unwrap();

    let page = fixture("page.json");
    let value = run_json(&[
        "place",
        "--dom",
        page.to_str().unwrap(),
        "--descriptors",
        batch.to_str().unwrap(),
    ]);

    let report = &value["report"];
    assert_eq!(report["aborted"].as_bool(), Some(false));
    assert_eq!(report["placed"].as_u64(), Some(2));
    assert_eq!(report["hidden"].as_u64(), Some(1));
    assert_eq!(report["notFound"].as_u64(), Some(0));
    assert_eq!(value["records"].as_array().unwrap().len(), 2);
    assert!(value["metrics"]["locate"]["total"].as_u64().unwrap() >= 3);
}

#[test]
fn config_get_reads_overrides_from_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("noteanchor.yaml");
    fs::write(&config, "locator:\n  position_tolerance: 12\n").unwrap();

    let assert = noteanchor()
        .args(["--output", "json", "--config", config.to_str().unwrap()])
        .args(["config", "get", "locator.position_tolerance"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(value.as_f64(), Some(12.0));

    noteanchor()
        .args(["--config", config.to_str().unwrap(), "config", "get", "locator.missing"])
        .assert()
        .failure();
}

#[test]
fn invalid_config_is_rejected_before_running_commands() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("noteanchor.yaml");
    fs::write(&config, "signature:\n  similarity_threshold: 2.5\n").unwrap();
    let page = fixture("page.json");

    noteanchor()
        .args(["--config", config.to_str().unwrap(), "config", "validate"])
        .assert()
        .failure();
    noteanchor()
        .args(["--config", config.to_str().unwrap()])
        .args(["capture", "--dom", page.to_str().unwrap(), "--target", "h1"])
        .assert()
        .failure();
}

fn extract_json(output: &str) -> &str {
    let start = output.find('{').expect("json start");
    let end = output.rfind('}').expect("json end");
    &output[start..=end]
}
