//! Integration tests for `agentmap classify`, `agentmap tree` and `agentmap path`.
#![allow(clippy::expect_used)]

use std::path::PathBuf;
use std::process::Command;

/// Path to the compiled `agentmap` binary.
fn agentmap_bin() -> PathBuf {
    let mut path = std::env::current_exe().expect("current exe");
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("agentmap");
    path
}

/// Path to a shared fixture file.
fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("../../tests/fixtures");
    path.push(name);
    path
}

fn run(args: &[&str]) -> std::process::Output {
    Command::new(agentmap_bin())
        .args(args)
        .output()
        .expect("run agentmap")
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

#[test]
fn classify_lists_back_edge_and_loop() {
    let f = fixture("delegation.json");
    let out = run(&["classify", f.to_str().expect("path")]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("forward edges: 6"), "stdout: {stdout}");
    assert!(
        stdout.contains("back edges: 1\n  writer -> orchestrator (1 call)"),
        "stdout: {stdout}"
    );
    assert!(
        stdout.contains("orchestrator -> writer -> orchestrator"),
        "stdout: {stdout}"
    );
}

#[test]
fn classify_json() {
    let f = fixture("delegation.json");
    let out = run(&["classify", "-f", "json", f.to_str().expect("path")]);
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("valid JSON");
    assert_eq!(v["backEdges"], serde_json::json!(["writer->orchestrator"]));
    assert_eq!(v["forwardEdges"].as_array().map(Vec::len), Some(6));
}

// ---------------------------------------------------------------------------
// tree
// ---------------------------------------------------------------------------

#[test]
fn tree_assigns_shared_callee_to_first_parent() {
    let f = fixture("delegation.json");
    let out = run(&["tree", f.to_str().expect("path")]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let expected = "\
user-1 [user] \"Operator\"
  orchestrator [agent] \"Orchestrator\"
    researcher [sub_agent] \"Researcher\"
      browser [tool]
      claude [llm]
    writer [sub_agent] \"Writer\"
";
    assert_eq!(stdout, expected);
}

#[test]
fn tree_json_has_parent_map() {
    let f = fixture("delegation.json");
    let out = run(&["tree", "--format", "json", f.to_str().expect("path")]);
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("valid JSON");
    assert_eq!(v["rootIds"], serde_json::json!(["user-1"]));
    assert_eq!(v["parentOf"]["claude"], "researcher");
    assert_eq!(v["parentOf"]["user-1"], serde_json::Value::Null);
}

// ---------------------------------------------------------------------------
// path
// ---------------------------------------------------------------------------

#[test]
fn path_prints_chain() {
    let f = fixture("delegation.json");
    let out = run(&["path", f.to_str().expect("path"), "claude"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout, "user-1 -> orchestrator -> researcher -> claude\n");
}

#[test]
fn path_unknown_node_exit_1() {
    let f = fixture("delegation.json");
    let out = run(&["path", f.to_str().expect("path"), "nobody"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("node not found"), "stderr: {stderr}");
}

#[test]
fn path_json() {
    let f = fixture("retry-loop.json");
    let out = run(&["path", "-f", "json", f.to_str().expect("path"), "gpt"]);
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("valid JSON");
    assert_eq!(v["chain"], serde_json::json!(["u", "planner", "gpt"]));
}

// ---------------------------------------------------------------------------
// fingerprint
// ---------------------------------------------------------------------------

#[test]
fn fingerprint_is_stable() {
    let f = fixture("delegation.json");
    let first = run(&["fingerprint", f.to_str().expect("path")]);
    let second = run(&["fingerprint", f.to_str().expect("path")]);
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    let digest = String::from_utf8_lossy(&first.stdout);
    assert_eq!(digest.trim_end().len(), 64);
}

#[test]
fn fingerprint_json_reports_both_digests() {
    let f = fixture("retry-loop.json");
    let out = run(&["fingerprint", "-f", "json", f.to_str().expect("path")]);
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("valid JSON");
    assert_ne!(v["fingerprint"], v["modelFingerprint"]);
}
