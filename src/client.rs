//! Client for the Ollama-compatible generation backend

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{CasegenError, Result};

const TEMPERATURE: f64 = 0.7;
const TOP_K: u32 = 40;
const TOP_P: f64 = 0.9;

/// Timeout for the lightweight tag-listing endpoints
const TAGS_TIMEOUT: Duration = Duration::from_secs(10);
const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Seam between orchestration and the generation backend; mocked in tests
#[async_trait]
pub trait Generator: Send + Sync {
    /// One blocking (non-streaming) generation call. Returns the trimmed
    /// generated text, or a classified backend error with no partial text.
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: &str,
        model: Option<&str>,
    ) -> Result<String>;
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_k: u32,
    top_p: f64,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: GenerateOptions,
}

/// HTTP client for the backend's /api/generate and /api/tags endpoints.
/// Stateless across calls; retries are the caller's concern (none are done).
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    default_model: String,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.backend_timeout_secs))
            .build()
            .map_err(|e| CasegenError::Internal {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            http,
            base_url: config.backend_base_url.trim_end_matches('/').to_string(),
            default_model: config.default_model.clone(),
            timeout_secs: config.backend_timeout_secs,
        })
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn classify(&self, err: reqwest::Error) -> CasegenError {
        if err.is_timeout() {
            CasegenError::BackendTimeout {
                timeout_secs: self.timeout_secs,
            }
        } else if err.is_connect() {
            CasegenError::BackendUnreachable {
                url: self.base_url.clone(),
            }
        } else {
            CasegenError::BackendProtocol {
                message: err.to_string(),
            }
        }
    }

    /// List model names known to the backend
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self
            .http
            .get(url)
            .timeout(TAGS_TIMEOUT)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CasegenError::BackendProtocol {
                message: format!("tag listing returned HTTP {}", status.as_u16()),
            });
        }
        let body: Value = resp.json().await.map_err(|e| self.classify(e))?;
        let models = body
            .get("models")
            .and_then(|m| m.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();
        Ok(models)
    }

    /// Quick reachability probe used by the health endpoint
    pub async fn ping(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.http.get(url).timeout(PING_TIMEOUT).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: &str,
        model: Option<&str>,
    ) -> Result<String> {
        let model = model.unwrap_or(&self.default_model);
        let url = format!("{}/api/generate", self.base_url);
        let payload = GenerateRequest {
            model,
            prompt,
            system: system_prompt,
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                top_k: TOP_K,
                top_p: TOP_P,
            },
        };

        tracing::info!("Calling generation backend with model: {}", model);
        let resp = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(CasegenError::BackendProtocol {
                message: format!("backend returned HTTP {}: {}", status.as_u16(), body),
            });
        }

        let body: Value = resp.json().await.map_err(|e| self.classify(e))?;
        let text = body
            .get("response")
            .and_then(|r| r.as_str())
            .ok_or_else(|| CasegenError::BackendProtocol {
                message: "backend response missing 'response' field".to_string(),
            })?;

        tracing::info!("Test case generated successfully");
        Ok(text.trim().to_string())
    }
}
