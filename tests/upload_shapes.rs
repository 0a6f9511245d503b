//! Upload normalization and size-cap tests

use casegen::error::CasegenError;
use casegen::upload::parse_upload;

const MAX_BYTES: usize = 1024;
const MAX_MB: usize = 10;

#[test]
fn array_shape_is_accepted_in_order() {
    let body = br#"[
        {"REQUIREMENTS_ID": "REQ-1", "DESCRIPTION": "a", "CATEGORY": "x"},
        {"REQUIREMENTS_ID": "REQ-2", "DESCRIPTION": "b", "CATEGORY": "y"}
    ]"#;
    let reqs = parse_upload(body, MAX_BYTES, MAX_MB).unwrap();
    assert_eq!(reqs.len(), 2);
    assert_eq!(reqs[0].id_or_index(0), "REQ-1");
    assert_eq!(reqs[1].id_or_index(1), "REQ-2");
}

#[test]
fn requirements_object_shape_is_accepted() {
    let body = br#"{"requirements": [{"REQUIREMENTS_ID": "REQ-1", "DESCRIPTION": "a", "CATEGORY": "x"}]}"#;
    let reqs = parse_upload(body, MAX_BYTES, MAX_MB).unwrap();
    assert_eq!(reqs.len(), 1);
}

#[test]
fn single_object_shape_is_accepted() {
    let body = br#"{"REQUIREMENTS_ID": "REQ-1", "DESCRIPTION": "a", "CATEGORY": "x"}"#;
    let reqs = parse_upload(body, MAX_BYTES, MAX_MB).unwrap();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].id_or_index(0), "REQ-1");
}

#[test]
fn oversize_upload_rejected_before_json_decoding() {
    // Valid JSON, but over the cap; must fail on size, not on parsing
    let mut body = String::from("[");
    for i in 0..200 {
        if i > 0 {
            body.push(',');
        }
        body.push_str(&format!(
            r#"{{"REQUIREMENTS_ID": "REQ-{}", "DESCRIPTION": "d", "CATEGORY": "c"}}"#,
            i
        ));
    }
    body.push(']');
    assert!(body.len() > MAX_BYTES);

    let err = parse_upload(body.as_bytes(), MAX_BYTES, MAX_MB).unwrap_err();
    match err {
        CasegenError::FileFormat { message } => {
            assert!(message.starts_with("File too large"), "got: {}", message)
        }
        other => panic!("expected FileFormat, got {:?}", other),
    }
}

#[test]
fn invalid_json_rejected() {
    let err = parse_upload(b"{ not json", MAX_BYTES, MAX_MB).unwrap_err();
    assert!(matches!(err, CasegenError::FileFormat { .. }));
}

#[test]
fn scalar_top_level_rejected() {
    let err = parse_upload(b"42", MAX_BYTES, MAX_MB).unwrap_err();
    match err {
        CasegenError::FileFormat { message } => {
            assert!(message.contains("object or array"))
        }
        other => panic!("expected FileFormat, got {:?}", other),
    }
}

#[test]
fn empty_array_rejected() {
    let err = parse_upload(b"[]", MAX_BYTES, MAX_MB).unwrap_err();
    match err {
        CasegenError::FileFormat { message } => {
            assert!(message.contains("No requirements"))
        }
        other => panic!("expected FileFormat, got {:?}", other),
    }
}

#[test]
fn requirements_key_must_hold_an_array() {
    let err = parse_upload(br#"{"requirements": "nope"}"#, MAX_BYTES, MAX_MB).unwrap_err();
    assert!(matches!(err, CasegenError::FileFormat { .. }));
}

#[test]
fn non_object_array_entry_rejected() {
    let err = parse_upload(br#"[{"REQUIREMENTS_ID": "R"}, 7]"#, MAX_BYTES, MAX_MB).unwrap_err();
    match err {
        CasegenError::FileFormat { message } => assert!(message.contains("index 1")),
        other => panic!("expected FileFormat, got {:?}", other),
    }
}

#[test]
fn field_order_survives_normalization() {
    let body = br#"[{"ZETA": "1", "ALPHA": "2", "REQUIREMENTS_ID": "R", "DESCRIPTION": "d", "CATEGORY": "c"}]"#;
    let reqs = parse_upload(body, MAX_BYTES, MAX_MB).unwrap();
    let keys: Vec<&String> = reqs[0].fields().keys().collect();
    assert_eq!(keys[0], "ZETA");
    assert_eq!(keys[1], "ALPHA");
}
