//! Instruction store and file export tests

use casegen::export::{write_md_file, write_txt_file};
use casegen::prompts::{
    load_system_instructions, save_system_instructions, validate_instructions,
    DEFAULT_SYSTEM_INSTRUCTIONS,
};
use casegen::schemas::PersistedResult;
use tempfile::tempdir;

#[test]
fn missing_file_falls_back_to_default_instructions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nonexistent.md");
    assert_eq!(load_system_instructions(&path), DEFAULT_SYSTEM_INSTRUCTIONS);
}

#[test]
fn saved_instructions_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("system_instructions.md");

    save_system_instructions(&path, "Focus on Modbus telemetry checks.").unwrap();
    assert_eq!(
        load_system_instructions(&path),
        "Focus on Modbus telemetry checks."
    );
}

#[test]
fn blank_instructions_rejected() {
    assert!(validate_instructions("   \n ").is_err());
    assert!(validate_instructions("ok").is_ok());
}

#[test]
fn txt_and_md_files_written_per_result() {
    let dir = tempdir().unwrap();
    let result = PersistedResult {
        requirement_id: "REQ-42".to_string(),
        status: "success".to_string(),
        test_case: Some("Objective: Verify LED".to_string()),
        error: None,
        timestamp: Some("2026-08-28T10:00:00Z".to_string()),
    };

    write_txt_file(&result, dir.path()).unwrap();
    write_md_file(&result, dir.path()).unwrap();

    let txt = std::fs::read_to_string(dir.path().join("REQ-42.txt")).unwrap();
    assert!(txt.contains("REQUIREMENT ID: REQ-42"));
    assert!(txt.contains("Objective: Verify LED"));

    let md = std::fs::read_to_string(dir.path().join("REQ-42.md")).unwrap();
    assert!(md.contains("# Test Case: REQ-42"));
    assert!(md.contains("- **Status**: success"));
}

#[test]
fn failed_result_renders_error_block() {
    let dir = tempdir().unwrap();
    let result = PersistedResult {
        requirement_id: "REQ-13".to_string(),
        status: "failed".to_string(),
        test_case: None,
        error: Some("Could not connect to generation backend".to_string()),
        timestamp: None,
    };

    write_txt_file(&result, dir.path()).unwrap();
    let txt = std::fs::read_to_string(dir.path().join("REQ-13.txt")).unwrap();
    assert!(txt.contains("ERROR"));
    assert!(txt.contains("Could not connect"));
}
