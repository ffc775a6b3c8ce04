//! Integration test: structured logging contract.
//!
//! Validates that:
//! 1. LogEmitter writes schema-valid JSONL to files.
//! 2. Appending emitters extend an existing log instead of truncating it.
//! 3. validate_log_file reports violations with line numbers.
//! 4. ArtifactIndex records SHA-256 digests that match the file contents.
//!
//! Run: cargo test -p causet-harness --test structured_log_test

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use causet_harness::structured_log::{
    ArtifactIndex, LogEmitter, LogEntry, LogLevel, Outcome, Stage, sha256_hex, validate_log_file,
    validate_log_line,
};
use sha2::Digest;

fn unique_tmp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time should be after UNIX_EPOCH")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("{prefix}-{}-{nanos}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[test]
fn emitter_writes_valid_jsonl() {
    let dir = unique_tmp_dir("causet-log-emit");
    let path = dir.join("nested/run.log.jsonl");

    let mut emitter = LogEmitter::to_file(&path, "causet", "emit-1").unwrap();
    emitter.emit(LogLevel::Info, "run_start").unwrap();
    emitter
        .emit_entry(
            LogEntry::new("", LogLevel::Info, "stage_complete")
                .with_fixture("diamond")
                .with_stage(Stage::Separation)
                .with_nodes(4)
                .with_estimator("twolink")
                .with_outcome(Outcome::Pass)
                .with_duration_us(31),
        )
        .unwrap();
    emitter
        .emit_entry(
            LogEntry::new("", LogLevel::Error, "stage_failed")
                .with_stage(Stage::Closure)
                .with_outcome(Outcome::Error)
                .with_error("input graph contains a directed cycle through node 0"),
        )
        .unwrap();
    emitter.flush().unwrap();
    drop(emitter);

    let (lines, errors) = validate_log_file(&path).unwrap();
    assert_eq!(lines, 3);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");

    let content = std::fs::read_to_string(&path).unwrap();
    let second: serde_json::Value = serde_json::from_str(content.lines().nth(1).unwrap()).unwrap();
    assert_eq!(second["trace_id"], "causet::emit-1::002");
    assert_eq!(second["run_id"], "emit-1");
    assert_eq!(second["stage"], "separation");
    assert_eq!(second["estimator"], "twolink");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn append_emitter_extends_log() {
    let dir = unique_tmp_dir("causet-log-append");
    let path = dir.join("cli.log.jsonl");

    for run in ["a", "b"] {
        let mut emitter = LogEmitter::append_to_file(&path, "causet", run).unwrap();
        emitter.emit(LogLevel::Info, "stage_complete").unwrap();
        emitter.flush().unwrap();
    }

    let (lines, errors) = validate_log_file(&path).unwrap();
    assert_eq!(lines, 2);
    assert!(errors.is_empty(), "{errors:?}");
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("causet::a::001"));
    assert!(content.contains("causet::b::001"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn validate_file_reports_line_numbers() {
    let dir = unique_tmp_dir("causet-log-bad");
    let path = dir.join("bad.log.jsonl");
    let good = LogEntry::new("causet::r::001", LogLevel::Info, "ok")
        .to_jsonl()
        .unwrap();
    let content = format!(
        "{good}\n\nnot json\n{}\n",
        r#"{"timestamp":"t","trace_id":"causet::r::003","level":"info","event":"x","outcome":"maybe"}"#
    );
    std::fs::write(&path, content).unwrap();

    let (lines, errors) = validate_log_file(&path).unwrap();
    assert_eq!(lines, 3);
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert_eq!(errors[0].line_number, 3);
    assert_eq!(errors[0].field, "<json>");
    assert_eq!(errors[1].line_number, 4);
    assert_eq!(errors[1].field, "outcome");
    assert!(errors[1].to_string().starts_with("line 4: field 'outcome'"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn skip_and_fail_outcomes_validate() {
    for (outcome, level) in [(Outcome::Skip, LogLevel::Debug), (Outcome::Fail, LogLevel::Warn)] {
        let line = LogEntry::new("causet::r::001", level, "verify")
            .with_stage(Stage::Verify)
            .with_outcome(outcome)
            .to_jsonl()
            .unwrap();
        assert!(validate_log_line(&line, 1).is_ok(), "{line}");
    }
}

#[test]
fn artifact_index_hashes_files() {
    let dir = unique_tmp_dir("causet-artifacts");
    let report = dir.join("diamond.report.json");
    std::fs::write(&report, b"{\"fixture\":\"diamond\"}").unwrap();

    let mut index = ArtifactIndex::new("artifact-run");
    index.add_file(&report, "pipeline_report").unwrap();
    index.add("external/ds2.json", "separations", sha256_hex(b"[]"));

    let json: serde_json::Value = serde_json::from_str(&index.to_json().unwrap()).unwrap();
    assert_eq!(json["index_version"], 1);
    assert_eq!(json["run_id"], "artifact-run");
    let artifacts = json["artifacts"].as_array().unwrap();
    assert_eq!(artifacts.len(), 2);

    let bytes = std::fs::read(&report).unwrap();
    let digest: String = sha2::Sha256::digest(&bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    assert_eq!(artifacts[0]["sha256"], digest);
    assert_eq!(artifacts[0]["size_bytes"], bytes.len() as u64);
    assert_eq!(artifacts[0]["kind"], "pipeline_report");
    assert!(artifacts[1].get("size_bytes").is_none());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_artifact_is_io_error() {
    let dir = unique_tmp_dir("causet-artifacts-missing");
    let mut index = ArtifactIndex::new("missing");
    assert!(index.add_file(&dir.join("nope.json"), "log").is_err());
    assert!(index.artifacts.is_empty());
    let _ = std::fs::remove_dir_all(&dir);
}
