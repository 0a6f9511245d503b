//! Generation orchestration: single, batch, and streamed runs
//!
//! Items are always processed strictly in input order, one at a time; a
//! failing item is recorded against its own index and never aborts or skips
//! its siblings.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::client::Generator;
use crate::config::Config;
use crate::error::{CasegenError, Result};
use crate::prompts;
use crate::schemas::{
    BatchOutcome, BatchSummary, GenerationResult, Outcome, Requirement, StreamEvent,
    REQUIRED_FIELDS,
};

/// Capacity of the stream event channel; the producer parks on a slow
/// consumer rather than buffering a whole run
const STREAM_CHANNEL_CAPACITY: usize = 16;

#[derive(Clone)]
pub struct Engine {
    config: Arc<Config>,
    generator: Arc<dyn Generator>,
}

impl Engine {
    pub fn new(config: Arc<Config>, generator: Arc<dyn Generator>) -> Self {
        Self { config, generator }
    }

    /// Reject requirements missing the required identifying fields.
    /// Runs before any backend call.
    pub fn validate_requirement(requirement: &Requirement) -> Result<()> {
        if requirement.has_required_fields() {
            Ok(())
        } else {
            Err(CasegenError::Validation {
                message: format!(
                    "Requirement missing required fields: {}",
                    REQUIRED_FIELDS.join(", ")
                ),
            })
        }
    }

    /// Generate a test case for a single requirement
    pub async fn generate_one(
        &self,
        requirement: &Requirement,
        model: Option<&str>,
    ) -> Result<GenerationResult> {
        Self::validate_requirement(requirement)?;

        let system_prompt = prompts::build_system_prompt(&self.config.instructions_path);
        let generation_prompt = prompts::build_generation_prompt(requirement);

        let test_case = self
            .generator
            .generate(&generation_prompt, &system_prompt, model)
            .await?;

        Ok(GenerationResult::new(
            requirement,
            test_case,
            chrono::Utc::now().to_rfc3339(),
        ))
    }

    /// Run a batch strictly in input order, isolating per-item failures
    pub async fn run_batch(
        &self,
        requirements: &[Requirement],
        model: Option<&str>,
    ) -> (Vec<BatchOutcome>, BatchSummary) {
        let mut outcomes = Vec::with_capacity(requirements.len());
        let mut successful = 0usize;
        let mut failed = 0usize;

        for (index, requirement) in requirements.iter().enumerate() {
            let req_id = requirement.id_or_index(index);
            tracing::info!("Processing requirement {}: {}", index, req_id);

            match self.generate_one(requirement, model).await {
                Ok(data) => {
                    successful += 1;
                    outcomes.push(BatchOutcome {
                        index,
                        outcome: Outcome::Success { data },
                    });
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!("Error processing requirement {} ({}): {}", index, req_id, e);
                    outcomes.push(BatchOutcome {
                        index,
                        outcome: Outcome::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        let summary = BatchSummary {
            total: requirements.len(),
            successful,
            failed,
        };
        tracing::info!(
            "Batch complete: {} total, {} successful, {} failed",
            summary.total,
            summary.successful,
            summary.failed
        );
        (outcomes, summary)
    }

    /// Run a batch, surfacing progress as an ordered event sequence.
    ///
    /// Emits Start, then Progress/Result per item, then one terminal
    /// Complete. Emission stops when the consumer drops the receiver; no
    /// event is reordered or retracted.
    pub fn stream(
        &self,
        requirements: Vec<Requirement>,
        model: Option<String>,
    ) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let engine = self.clone();

        tokio::spawn(async move {
            let total = requirements.len();
            if tx.send(StreamEvent::Start { total }).await.is_err() {
                return;
            }

            let mut successful = 0usize;
            let mut failed = 0usize;

            for (index, requirement) in requirements.iter().enumerate() {
                let requirement_id = requirement.id_or_index(index);

                if tx
                    .send(StreamEvent::Progress {
                        index,
                        requirement_id: requirement_id.clone(),
                    })
                    .await
                    .is_err()
                {
                    return;
                }

                let outcome = match engine.generate_one(requirement, model.as_deref()).await {
                    Ok(data) => {
                        successful += 1;
                        Outcome::Success { data }
                    }
                    Err(e) => {
                        failed += 1;
                        tracing::error!(
                            "Error processing requirement {} ({}): {}",
                            index,
                            requirement_id,
                            e
                        );
                        Outcome::Failed {
                            error: e.to_string(),
                        }
                    }
                };

                if tx
                    .send(StreamEvent::Result {
                        index,
                        requirement_id,
                        outcome,
                    })
                    .await
                    .is_err()
                {
                    return;
                }
            }

            let _ = tx
                .send(StreamEvent::Complete {
                    total,
                    successful,
                    failed,
                })
                .await;
        });

        rx
    }

    /// A finished sequence carrying a single Error event, for precondition
    /// failures detected before the loop starts
    pub fn error_stream(message: String) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.try_send(StreamEvent::Error { error: message });
        rx
    }
}
