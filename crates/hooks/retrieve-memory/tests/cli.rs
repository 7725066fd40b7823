use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_record(root: &Path, session: &str, id: &str, intent: &str, experience: &str, utility: f64) {
    let dir = root.join(session);
    fs::create_dir_all(&dir).unwrap();
    let record = json!({
        "id": id,
        "intent": intent,
        "experience": experience,
        "utility": utility,
        "sessionId": session,
        "timestamp": "2026-10-01T12:00:00.000000",
        "embedding": null,
    });
    fs::write(dir.join(format!("{id}.json")), record.to_string()).unwrap();
}

fn seeded_root(dir: &Path) -> std::path::PathBuf {
    let root = dir.join("sessions");
    write_record(&root, "s1", "m1", "React state hook fix", "Use useState instead of this.setState", 0.9);
    write_record(&root, "s1", "m2", "Python list comprehension", "Use [x for x in list if condition]", 0.8);
    write_record(&root, "s2", "m3", "Database connection pool", "Use SQLAlchemy with pool_size", 0.85);
    root
}

fn retrieve(root: &Path, args: &[&str]) -> Value {
    let output = Command::cargo_bin("retrieve-memory")
        .unwrap()
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_retrieve_ranks_matching_memory() {
    let dir = tempdir().unwrap();
    let root = seeded_root(dir.path());

    let hits = retrieve(&root, &["react state fix"]);
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["id"], "m1");
    assert_eq!(hits[0]["session_id"], "s1");
    assert_eq!(hits[0]["project"], "unknown");
    assert_eq!(hits[0]["similarity"], 0.5774);
    assert_eq!(hits[0]["final_score"], 0.7387);
}

#[test]
fn test_lambda_zero_reports_similarity() {
    let dir = tempdir().unwrap();
    let root = seeded_root(dir.path());

    let hits = retrieve(&root, &["react state fix", "--lambda", "0"]);
    assert_eq!(hits[0]["final_score"], hits[0]["similarity"]);
}

#[test]
fn test_no_match_prints_empty_array() {
    let dir = tempdir().unwrap();
    let root = seeded_root(dir.path());
    assert_eq!(retrieve(&root, &["kubernetes ingress"]), json!([]));
}

#[test]
fn test_missing_root_prints_empty_array() {
    let dir = tempdir().unwrap();
    assert_eq!(retrieve(&dir.path().join("absent"), &["anything"]), json!([]));
}

#[test]
fn test_malformed_records_are_skipped() {
    let dir = tempdir().unwrap();
    let root = seeded_root(dir.path());
    fs::write(root.join("s1").join("broken.json"), "{not json").unwrap();
    write_record(&root, "s2", "bad-utility", "react state", "out of range", 1.7);

    let hits = retrieve(&root, &["react state fix"]);
    assert_eq!(hits.as_array().unwrap().len(), 1);
    assert_eq!(hits[0]["id"], "m1");
}

#[test]
fn test_invalid_lambda_fails() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("retrieve-memory")
        .unwrap()
        .arg("--root")
        .arg(dir.path())
        .args(["query", "--lambda", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lambda"));
}
