//! Data model for requirements, generation outcomes, and stream events

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered string-keyed object; `serde_json` is built with `preserve_order`
/// so iteration follows insertion order.
pub type JsonMap = serde_json::Map<String, Value>;

/// Keys every requirement record must carry
pub const REQUIRED_FIELDS: [&str; 3] = ["REQUIREMENTS_ID", "DESCRIPTION", "CATEGORY"];

/// Field reserved for generated output; never echoed back into prompts
pub const TEST_CASE_FIELD: &str = "Test_Case";

/// Field recording when generation happened
pub const GENERATED_AT_FIELD: &str = "Generated_At";

/// One requirement record: an open mapping with a known required subset.
/// All fields are preserved and forwarded, in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Requirement(pub JsonMap);

impl Requirement {
    /// True iff all required keys are present as keys. Values may be empty;
    /// presence is the only criterion.
    pub fn has_required_fields(&self) -> bool {
        REQUIRED_FIELDS.iter().all(|field| self.0.contains_key(*field))
    }

    /// Requirement id, or a positional placeholder when absent
    pub fn id_or_index(&self, index: usize) -> String {
        self.0
            .get("REQUIREMENTS_ID")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("index_{}", index))
    }

    pub fn fields(&self) -> &JsonMap {
        &self.0
    }
}

/// A requirement plus its generated test case and timestamp.
/// Created once per successful generation call, immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationResult(JsonMap);

impl GenerationResult {
    pub fn new(requirement: &Requirement, test_case: String, generated_at: String) -> Self {
        let mut fields = requirement.0.clone();
        fields.insert(TEST_CASE_FIELD.to_string(), Value::String(test_case));
        fields.insert(GENERATED_AT_FIELD.to_string(), Value::String(generated_at));
        Self(fields)
    }

    pub fn requirement_id(&self) -> &str {
        self.0
            .get("REQUIREMENTS_ID")
            .and_then(|v| v.as_str())
            .unwrap_or("UNKNOWN")
    }

    pub fn test_case(&self) -> &str {
        self.0
            .get(TEST_CASE_FIELD)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }

    pub fn generated_at(&self) -> &str {
        self.0
            .get(GENERATED_AT_FIELD)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }
}

/// Per-item success or failure inside a batch
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Success { data: GenerationResult },
    Failed { error: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// One batch item's result, tagged with its position in the input sequence
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub index: usize,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Aggregate counts for a batch run; `successful + failed == total`
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn is_partial(&self) -> bool {
        self.failed > 0 && self.successful > 0
    }

    pub fn is_fully_failed(&self) -> bool {
        self.successful == 0 && self.total > 0
    }
}

/// One discrete, ordered unit of progress emitted during streamed generation
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Start {
        total: usize,
    },
    Progress {
        index: usize,
        requirement_id: String,
    },
    Result {
        index: usize,
        requirement_id: String,
        #[serde(flatten)]
        outcome: Outcome,
    },
    Complete {
        total: usize,
        successful: usize,
        failed: usize,
    },
    Error {
        error: String,
    },
}

/// Fixed-shape record of the eight extracted test-case sections.
/// Every slot is always populated; `Default` pre-fills the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFields {
    pub title: String,
    pub objective: String,
    pub preconditions: String,
    pub test_steps: String,
    pub expected_result: String,
    pub postconditions: String,
    pub test_data: String,
    pub edge_cases: String,
}

/// Placeholder for sections that could not be extracted
pub const SENTINEL: &str = "N/A";

impl Default for ParsedFields {
    fn default() -> Self {
        Self {
            title: SENTINEL.to_string(),
            objective: SENTINEL.to_string(),
            preconditions: SENTINEL.to_string(),
            test_steps: SENTINEL.to_string(),
            expected_result: SENTINEL.to_string(),
            postconditions: SENTINEL.to_string(),
            test_data: SENTINEL.to_string(),
            edge_cases: SENTINEL.to_string(),
        }
    }
}

/// Persisted result row, as written by batch runs and read by the exporter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedResult {
    pub requirement_id: String,
    pub status: String,
    #[serde(default)]
    pub test_case: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl PersistedResult {
    pub fn from_outcome(outcome: &BatchOutcome, requirement_id: String) -> Self {
        match &outcome.outcome {
            Outcome::Success { data } => Self {
                requirement_id: data.requirement_id().to_string(),
                status: "success".to_string(),
                test_case: Some(data.test_case().to_string()),
                error: None,
                timestamp: Some(data.generated_at().to_string()),
            },
            Outcome::Failed { error } => Self {
                requirement_id,
                status: "failed".to_string(),
                test_case: None,
                error: Some(error.clone()),
                timestamp: None,
            },
        }
    }
}
