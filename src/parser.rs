//! Line-oriented extraction of structured sections from generated test cases
//!
//! The backend returns free-form text; this module recovers the eight known
//! sections with a single-pass state machine driven by a declarative header
//! table. Unrecognized formats degrade to the `N/A` sentinel rather than
//! failing.

use once_cell::sync::Lazy;

use crate::schemas::{ParsedFields, SENTINEL};

/// Target slot for an extracted section. `Skip` closes the active section
/// without opening a new one (references/observability/traceability).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Title,
    Objective,
    Preconditions,
    TestSteps,
    ExpectedResult,
    Postconditions,
    TestData,
    EdgeCases,
    Skip,
}

/// A section label and the ordinal prefixes under which it has been observed.
/// The two ordinals per label mirror the two known document templates; a new
/// template is supported by adding its numbers here, not by changing the
/// scanner.
struct HeaderSpec {
    label: &'static str,
    ordinals: &'static [u8],
    section: Section,
}

const HEADER_SPECS: &[HeaderSpec] = &[
    HeaderSpec {
        label: "test case title:",
        ordinals: &[],
        section: Section::Title,
    },
    HeaderSpec {
        label: "title:",
        ordinals: &[],
        section: Section::Title,
    },
    HeaderSpec {
        label: "objective:",
        ordinals: &[1],
        section: Section::Objective,
    },
    HeaderSpec {
        label: "preconditions:",
        ordinals: &[3, 4],
        section: Section::Preconditions,
    },
    HeaderSpec {
        label: "test steps:",
        ordinals: &[4, 5],
        section: Section::TestSteps,
    },
    HeaderSpec {
        label: "expected result:",
        ordinals: &[5, 6],
        section: Section::ExpectedResult,
    },
    HeaderSpec {
        label: "postconditions:",
        ordinals: &[6, 7],
        section: Section::Postconditions,
    },
    HeaderSpec {
        label: "test data:",
        ordinals: &[7, 8],
        section: Section::TestData,
    },
    HeaderSpec {
        label: "edge cases:",
        ordinals: &[8, 9],
        section: Section::EdgeCases,
    },
    HeaderSpec {
        label: "references:",
        ordinals: &[2],
        section: Section::Skip,
    },
    HeaderSpec {
        label: "observability:",
        ordinals: &[9, 10],
        section: Section::Skip,
    },
    HeaderSpec {
        label: "traceability:",
        ordinals: &[10, 11],
        section: Section::Skip,
    },
];

/// Flattened, ordered prefix table. First match wins, so bare labels come
/// before their numbered variants of the same spec.
static HEADER_PATTERNS: Lazy<Vec<(String, Section)>> = Lazy::new(|| {
    let mut patterns = Vec::new();
    for spec in HEADER_SPECS {
        patterns.push((spec.label.to_string(), spec.section));
        for ordinal in spec.ordinals {
            patterns.push((format!("{}. {}", ordinal, spec.label), spec.section));
            // The "1.Objective:" template omits the space after the period
            patterns.push((format!("{}.{}", ordinal, spec.label), spec.section));
        }
    }
    patterns
});

fn match_header(line_lower: &str) -> Option<Section> {
    HEADER_PATTERNS
        .iter()
        .find(|(pattern, _)| line_lower.starts_with(pattern.as_str()))
        .map(|(_, section)| *section)
}

fn slot<'a>(fields: &'a mut ParsedFields, section: Section) -> Option<&'a mut String> {
    match section {
        Section::Title => Some(&mut fields.title),
        Section::Objective => Some(&mut fields.objective),
        Section::Preconditions => Some(&mut fields.preconditions),
        Section::TestSteps => Some(&mut fields.test_steps),
        Section::ExpectedResult => Some(&mut fields.expected_result),
        Section::Postconditions => Some(&mut fields.postconditions),
        Section::TestData => Some(&mut fields.test_data),
        Section::EdgeCases => Some(&mut fields.edge_cases),
        Section::Skip => None,
    }
}

fn flush(fields: &mut ParsedFields, active: Option<Section>, buffer: &mut Vec<String>) {
    if let Some(section) = active {
        if let Some(target) = slot(fields, section) {
            *target = buffer.join("\n").trim().to_string();
        }
    }
    buffer.clear();
}

/// Extract the eight known sections from a generated test case.
///
/// Tolerates absent sections (sentinel), out-of-order sections, and repeated
/// headers (last occurrence wins). Lines outside any section are dropped,
/// except that a non-header first line is taken as a provisional title.
pub fn parse_test_case(text: &str) -> ParsedFields {
    let mut fields = ParsedFields::default();
    if text.is_empty() {
        return fields;
    }

    let lines: Vec<&str> = text.lines().collect();

    // Plenty of outputs open with a bare title line instead of a labeled one
    if let Some(first) = lines.first() {
        let first = first.trim();
        if !first.is_empty() && match_header(&first.to_lowercase()).is_none() {
            fields.title = first.to_string();
        }
    }

    let mut active: Option<Section> = None;
    let mut buffer: Vec<String> = Vec::new();

    for line in &lines {
        let stripped = line.trim();

        if stripped.is_empty() {
            // Keep paragraph breaks inside an open section only
            if active.is_some() {
                buffer.push(String::new());
            }
            continue;
        }

        let lower = stripped.to_lowercase();
        match match_header(&lower) {
            Some(Section::Skip) => {
                flush(&mut fields, active, &mut buffer);
                active = None;
            }
            Some(section) => {
                flush(&mut fields, active, &mut buffer);
                active = Some(section);
                // Text after the header's colon seeds the new buffer
                if let Some(colon) = stripped.find(':') {
                    let seed = stripped[colon + 1..].trim();
                    if !seed.is_empty() {
                        buffer.push(seed.to_string());
                    }
                }
            }
            None => {
                if active.is_some() {
                    buffer.push((*line).to_string());
                }
            }
        }
    }

    flush(&mut fields, active, &mut buffer);

    backfill_sentinels(&mut fields);
    fields
}

fn backfill_sentinels(fields: &mut ParsedFields) {
    for value in [
        &mut fields.title,
        &mut fields.objective,
        &mut fields.preconditions,
        &mut fields.test_steps,
        &mut fields.expected_result,
        &mut fields.postconditions,
        &mut fields.test_data,
        &mut fields.edge_cases,
    ] {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            *value = SENTINEL.to_string();
        } else if trimmed.len() != value.len() {
            *value = trimmed.to_string();
        }
    }
}
