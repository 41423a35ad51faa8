//! Tests for the report formats over a real detection run.

use std::path::PathBuf;

use lostfield::config::Config;
use lostfield::detect::{collect_files, DetectionResult, Runner};
use lostfield::report;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn run_readme() -> (PathBuf, DetectionResult) {
    lostfield::init();

    let root = testdata_path().join("readme");
    let config = Config::default();
    let files = collect_files(&root, &config).expect("should collect files");
    let result = Runner::new(&root)
        .run(&files, &config)
        .expect("detection should succeed");
    (root, result)
}

#[test]
fn test_default_format() {
    let (_, result) = run_readme();

    let mut out = Vec::new();
    report::write_default(&mut out, &result).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "convert.go:4:6: ConvertUserToDTO: incomplete converter with missing fields: user.Email, Email\n"
    );
}

#[test]
fn test_json_format() {
    let (_, result) = run_readme();

    let mut out = Vec::new();
    report::write_json(&mut out, "./readme", &result).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out).expect("should be valid JSON");

    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["path"], "./readme");
    assert_eq!(json["files_scanned"], 2);
    assert_eq!(json["converters_checked"], 2);
    assert_eq!(json["suppressed_count"], 0);
    assert!(json.get("suppressed").is_none());

    let findings = json["findings"].as_array().expect("findings array");
    assert_eq!(findings.len(), 1);
    let f = &findings[0];
    assert_eq!(f["file"], "convert.go");
    assert_eq!(f["line"], 4);
    assert_eq!(f["column"], 6);
    assert_eq!(f["function"], "ConvertUserToDTO");
    assert_eq!(f["valid"], false);
    assert_eq!(f["converter_kind"], "value converter");
    assert!(f.get("delegating").is_none());
    assert_eq!(f["missing_source_fields"], serde_json::json!(["user.Email"]));
    assert_eq!(f["missing_destination_fields"], serde_json::json!(["Email"]));
}

#[test]
fn test_pretty_format() {
    colored::control::set_override(false);
    let (root, result) = run_readme();

    let mut out = Vec::new();
    report::write_pretty(&mut out, &root, &result, false).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.starts_with(
        "convert.go:4:6: ConvertUserToDTO: incomplete converter with missing fields: user.Email, Email\n"
    ));
    assert!(text.contains("4 |      func ConvertUserToDTO(user User) UserDTO {"));
    assert!(text.contains("^^^^^^^^^^^^^^^^ detected as value converter"));
    assert!(text.contains("  = note: missing fields:\n"));
    assert!(text.contains("    user.Email → ??\n"));
    assert!(text.contains("    ??         → Email\n"));
    assert!(text.trim_end().ends_with("✗ 1 incomplete converter  2 files scanned, 2 converters checked"));
}

#[test]
fn test_pretty_format_clean_run() {
    colored::control::set_override(false);
    lostfield::init();

    let root = testdata_path().join("notconverters");
    let config = Config::default();
    let files = collect_files(&root, &config).unwrap();
    let result = Runner::new(&root).run(&files, &config).unwrap();

    let mut out = Vec::new();
    report::write_pretty(&mut out, &root, &result, false).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "✓ all converters complete  2 files scanned, 0 converters checked\n"
    );
}
