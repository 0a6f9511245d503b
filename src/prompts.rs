//! Prompt assembly for test case generation
//!
//! The system instruction lives in a caller-updatable file with a built-in
//! fallback; the generation prompt is rendered from a fixed product context
//! block, the requirement's fields in insertion order, and a directive block
//! naming the sections the backend must produce.

use std::path::Path;

use serde_json::Value;

use crate::error::{CasegenError, Result};
use crate::schemas::{Requirement, TEST_CASE_FIELD};

/// Fallback instructions when the instruction file is missing or unreadable
pub const DEFAULT_SYSTEM_INSTRUCTIONS: &str = "\
You are an expert QA engineer specializing in system-level integration and black-box testing.
Your task is to generate comprehensive, detailed test cases based on requirements.

Guidelines:
- Focus on system-level integration testing (black-box approach)
- Each test case should be independent and executable
- Include clear preconditions, steps, and expected results
- Test both normal operation and edge cases
- Use clear, unambiguous language
- Include data values and specific parameters
- Consider boundary conditions and error scenarios
- Test case should verify the requirement is met from end-user perspective";

/// Static description of the system under test, prepended to every prompt
const PRODUCT_CONTEXT: &str = "\
Based on the following requirement specification, generate a detailed system-level integration test case (black-box testing approach).

PRODUCT CONTEXT:
- SolaHD SDU DC UPS “B” Series (Models: SDU1024B-EIP, SDU2024B-EIP, SDU1024B-MBUS, SDU2024B-MBUS)
- Output: 24V DC, 10A or 20A (model dependent)
- Communications: EtherNet/IP, Modbus, GUI/webserver; telemetry includes input/output voltage/current, battery voltage, SoC, SoH, temperature, event logs, alarms; remote ON/OFF; LED indicators; PC safe shutdown/restart
- Battery Management: VRLA and LiFePO4 (auto-detect/user-select), hot-swappable, external battery modules; charging stops at 28V; auto-recharge; dead battery detection (<10V); auto/manual self-test
- Protections & Thresholds: Input undervoltage (<21.6V for 10ms), input overvoltage (>29V for 10ms), battery undervoltage (<21.6V for 100ms), battery overvoltage (>28.4V for 500ms), battery dead (<10V for 100ms), output overcurrent (>150% rated for 5ms), PowerBoost (140% rated for 6s), overtemperature (shutdown/auto-recovery)
- Environmental: –15°C to +50°C (ordinary), –15°C to +40°C (hazardous), 0–95% RH, altitude ≤3000m
- QA Alignment: Requirement-driven, traceable black-box validation per SQAV; entry/exit criteria, defect management, traceability
REQUIREMENT DETAILS:
";

/// Directive block enumerating the required output sections; the leading
/// blank line separates it from the last field line
const SECTION_DIRECTIVE: &str = "\n\nPlease generate a comprehensive test case that includes:
1. Test Case Title: A clear, concise title
2. Objective: What this test case verifies
3. References: Requirement ID/Title; related SRS/TRD/QA Manual sections
4. Preconditions: Any setup required before test execution (equipment, configuration, model, battery type, protocol, safety)
5. Test Steps: Detailed numbered steps with actions and expected results (use observable outputs, telemetry, indicators, logs)
6. Expected Result: The final expected state/output with specific pass/fail criteria
7. Postconditions: Any cleanup or state verification after test
8. Test Data: Specific values, ranges, or parameters used (cover both 10A/20A, VRLA/LiFePO4 if relevant)
9. Edge Cases: Any edge cases, boundary conditions, or negative scenarios tested (e.g., transient events, comms loss, hot-swap, self-test timing)
10. Observability: What to check via GUI/EtherNet/IP/Modbus, LED states, event logs, alarms, PC shutdown sequencing
11. Traceability: Requirement-to-Test mapping notes

Format the response as a clear, structured text that describes the test case in detail.
Do NOT use markdown formatting or code blocks.
Do NOT include any explanation or preamble - just the test case content.";

/// Load system instructions from the store, falling back to the default
pub fn load_system_instructions(path: &Path) -> String {
    if path.exists() {
        match std::fs::read_to_string(path) {
            Ok(content) => return content,
            Err(e) => {
                tracing::warn!("Failed to load system instructions from {:?}: {}", path, e);
            }
        }
    }
    DEFAULT_SYSTEM_INSTRUCTIONS.to_string()
}

/// Persist updated system instructions, creating the parent directory
pub fn save_system_instructions(path: &Path, instructions: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, instructions)?;
    tracing::info!("System instructions updated: {:?}", path);
    Ok(())
}

/// Build the system prompt from the instruction store
pub fn build_system_prompt(path: &Path) -> String {
    load_system_instructions(path)
}

/// True for values the prompt skips: null, false, zero, empty text/containers
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0).unwrap_or(false),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build the generation prompt for one requirement.
///
/// Fields render as `key: value` lines in insertion order, skipping the
/// reserved Test_Case field and any falsy value.
pub fn build_generation_prompt(requirement: &Requirement) -> String {
    let mut prompt = String::from(PRODUCT_CONTEXT);

    for (key, value) in requirement.fields() {
        if key == TEST_CASE_FIELD || is_falsy(value) {
            continue;
        }
        prompt.push('\n');
        prompt.push_str(key);
        prompt.push_str(": ");
        prompt.push_str(&render_value(value));
    }

    prompt.push_str(SECTION_DIRECTIVE);
    prompt
}

/// Validate an instructions update before persisting it
pub fn validate_instructions(instructions: &str) -> Result<()> {
    if instructions.trim().is_empty() {
        return Err(CasegenError::Validation {
            message: "Instructions cannot be empty".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falsy_values_skipped() {
        assert!(is_falsy(&json!(null)));
        assert!(is_falsy(&json!("")));
        assert!(is_falsy(&json!(0)));
        assert!(is_falsy(&json!(false)));
        assert!(!is_falsy(&json!("x")));
        assert!(!is_falsy(&json!(1)));
    }

    #[test]
    fn prompt_renders_fields_in_order_and_skips_test_case() {
        let req: Requirement = serde_json::from_value(json!({
            "REQUIREMENTS_ID": "REQ-7",
            "DESCRIPTION": "Overvoltage shutdown",
            "CATEGORY": "Protection",
            "Test_Case": "should not appear",
            "NOTES": ""
        }))
        .unwrap();
        let prompt = build_generation_prompt(&req);

        let id_pos = prompt.find("REQUIREMENTS_ID: REQ-7").unwrap();
        let desc_pos = prompt.find("DESCRIPTION: Overvoltage shutdown").unwrap();
        let cat_pos = prompt.find("CATEGORY: Protection").unwrap();
        assert!(id_pos < desc_pos && desc_pos < cat_pos);
        assert!(!prompt.contains("should not appear"));
        assert!(!prompt.contains("NOTES:"));
        assert!(prompt.contains("Do NOT use markdown formatting"));
    }

    #[test]
    fn directive_block_separated_from_field_lines() {
        let req: Requirement = serde_json::from_value(json!({
            "REQUIREMENTS_ID": "REQ-7",
            "DESCRIPTION": "Overvoltage shutdown",
            "CATEGORY": "Protection"
        }))
        .unwrap();
        let prompt = build_generation_prompt(&req);

        // The last field line and the directive block must stay distinct lines
        assert!(
            prompt.contains("CATEGORY: Protection\n\nPlease generate a comprehensive test case"),
            "directive glued to last field: {}",
            &prompt[prompt.len().saturating_sub(400)..]
        );
    }
}
