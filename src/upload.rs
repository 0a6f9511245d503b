//! Upload validation and shape normalization for file-sourced batches

use serde_json::Value;

use crate::error::{CasegenError, Result};
use crate::schemas::Requirement;

/// Parse an uploaded JSON document into an ordered requirement sequence.
///
/// The size cap is enforced before any JSON decoding. Accepted shapes: a
/// JSON array of requirement objects, an object with a `requirements`
/// array, or a single requirement object.
pub fn parse_upload(bytes: &[u8], max_bytes: usize, max_mb: usize) -> Result<Vec<Requirement>> {
    if bytes.len() > max_bytes {
        return Err(CasegenError::FileFormat {
            message: format!("File too large (max {}MB)", max_mb),
        });
    }

    let content = std::str::from_utf8(bytes).map_err(|e| CasegenError::FileFormat {
        message: format!("File is not valid UTF-8: {}", e),
    })?;

    let value: Value = serde_json::from_str(content).map_err(|e| CasegenError::FileFormat {
        message: format!("Invalid JSON file: {}", e),
    })?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => {
            if let Some(requirements) = object.remove("requirements") {
                match requirements {
                    Value::Array(items) => items,
                    _ => {
                        return Err(CasegenError::FileFormat {
                            message: "'requirements' field must be an array".to_string(),
                        });
                    }
                }
            } else {
                vec![Value::Object(object)]
            }
        }
        _ => {
            return Err(CasegenError::FileFormat {
                message: "JSON must be an object or array".to_string(),
            });
        }
    };

    if items.is_empty() {
        return Err(CasegenError::FileFormat {
            message: "No requirements found in file".to_string(),
        });
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(Requirement(fields)),
            _ => Err(CasegenError::FileFormat {
                message: format!("requirement at index {} must be a JSON object", index),
            }),
        })
        .collect()
}
