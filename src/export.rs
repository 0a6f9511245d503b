//! Tabular and per-requirement exports of generation results

use std::io::Write;
use std::path::Path;

use crate::error::{CasegenError, Result};
use crate::parser::parse_test_case;
use crate::schemas::{ParsedFields, PersistedResult};

/// Fixed CSV column set; order is part of the format
pub const CSV_COLUMNS: [&str; 13] = [
    "Requirement_ID",
    "Status",
    "Timestamp",
    "Test_Case_Title",
    "Objective",
    "Preconditions",
    "Test_Steps",
    "Expected_Result",
    "Postconditions",
    "Test_Data",
    "Edge_Cases",
    "Full_Test_Case",
    "Error",
];

/// Flatten multi-line text into a single CSV-safe cell.
///
/// Newlines become ` | ` so structure stays readable, runs of whitespace
/// collapse to single spaces, and consecutive delimiters left behind by
/// blank lines collapse to one.
pub fn sanitize_csv_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let replaced = text.replace('\r', "").replace('\n', " | ");
    let mut sanitized = replaced.split_whitespace().collect::<Vec<_>>().join(" ");

    while sanitized.contains(" | | ") {
        sanitized = sanitized.replace(" | | ", " | ");
    }

    sanitized.trim().to_string()
}

/// Load a persisted results file (JSON array of result rows)
pub fn load_results(path: &Path) -> Result<Vec<PersistedResult>> {
    let content = std::fs::read_to_string(path).map_err(|e| CasegenError::Io {
        message: format!("failed to read {:?}: {}", path, e),
    })?;
    serde_json::from_str(&content).map_err(|e| CasegenError::FileFormat {
        message: format!("invalid results JSON: {}", e),
    })
}

fn parsed_or_empty(result: &PersistedResult) -> Option<ParsedFields> {
    match result.test_case.as_deref() {
        Some(tc) if !tc.is_empty() => Some(parse_test_case(tc)),
        _ => None,
    }
}

/// Write all results as fully quoted CSV rows with the fixed 13-column header
pub fn write_csv<W: Write>(results: &[PersistedResult], writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);

    csv_writer
        .write_record(CSV_COLUMNS)
        .map_err(|e| CasegenError::Io {
            message: format!("CSV write failed: {}", e),
        })?;

    for result in results {
        let parsed = parsed_or_empty(result);
        let section = |get: fn(&ParsedFields) -> &str| -> String {
            parsed
                .as_ref()
                .map(|p| sanitize_csv_text(get(p)))
                .unwrap_or_default()
        };

        let row = [
            sanitize_csv_text(&result.requirement_id),
            sanitize_csv_text(&result.status),
            sanitize_csv_text(result.timestamp.as_deref().unwrap_or_default()),
            section(|p| &p.title),
            section(|p| &p.objective),
            section(|p| &p.preconditions),
            section(|p| &p.test_steps),
            section(|p| &p.expected_result),
            section(|p| &p.postconditions),
            section(|p| &p.test_data),
            section(|p| &p.edge_cases),
            sanitize_csv_text(result.test_case.as_deref().unwrap_or_default()),
            sanitize_csv_text(result.error.as_deref().unwrap_or_default()),
        ];
        csv_writer.write_record(&row).map_err(|e| CasegenError::Io {
            message: format!("CSV write failed: {}", e),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write one plain-text report per result
pub fn write_txt_file(result: &PersistedResult, output_dir: &Path) -> Result<()> {
    let rule = "=".repeat(80);
    let bar = "-".repeat(80);
    let mut content = String::new();

    content.push_str(&format!("{}\n", rule));
    content.push_str(&format!("REQUIREMENT ID: {}\n", result.requirement_id));
    content.push_str(&format!("{}\n\n", rule));
    content.push_str(&format!("Status: {}\n", result.status));
    if let Some(timestamp) = &result.timestamp {
        content.push_str(&format!("Generated: {}\n", timestamp));
    }
    content.push('\n');

    if result.status == "success" {
        if let Some(test_case) = &result.test_case {
            content.push_str(&format!("{}\nTEST CASE\n{}\n\n", bar, bar));
            content.push_str(test_case);
            content.push_str("\n\n");
        }
    } else if let Some(error) = &result.error {
        content.push_str(&format!("{}\nERROR\n{}\n\n", bar, bar));
        content.push_str(error);
        content.push_str("\n\n");
    }
    content.push_str(&format!("{}\n", rule));

    let path = output_dir.join(format!("{}.txt", result.requirement_id));
    std::fs::write(path, content)?;
    Ok(())
}

/// Write one Markdown report per result
pub fn write_md_file(result: &PersistedResult, output_dir: &Path) -> Result<()> {
    let mut content = String::new();

    content.push_str(&format!("# Test Case: {}\n\n", result.requirement_id));
    content.push_str("## Metadata\n\n");
    content.push_str(&format!("- **Requirement ID**: {}\n", result.requirement_id));
    content.push_str(&format!("- **Status**: {}\n", result.status));
    if let Some(timestamp) = &result.timestamp {
        content.push_str(&format!("- **Generated**: {}\n", timestamp));
    }
    content.push_str("\n---\n\n");

    if result.status == "success" {
        if let Some(test_case) = &result.test_case {
            content.push_str("## Test Case Details\n\n");
            content.push_str(test_case);
            content.push_str("\n\n");
        }
    } else if let Some(error) = &result.error {
        content.push_str(&format!("## Error\n\n```\n{}\n```\n\n", error));
    }

    content.push_str("---\n");
    content.push_str(&format!(
        "*Generated on {}*\n",
        result.timestamp.as_deref().unwrap_or("N/A")
    ));

    let path = output_dir.join(format!("{}.md", result.requirement_id));
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_collapses_newlines_and_whitespace() {
        assert_eq!(sanitize_csv_text("Line1\n\nLine2   end"), "Line1 | Line2 end");
    }

    #[test]
    fn sanitize_handles_carriage_returns() {
        assert_eq!(sanitize_csv_text("a\r\nb"), "a | b");
    }

    #[test]
    fn sanitize_empty_is_empty() {
        assert_eq!(sanitize_csv_text(""), "");
    }
}
