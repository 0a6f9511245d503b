//! Env-first configuration for the casegen service

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{CasegenError, Result};

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Ollama-compatible generation backend
    pub backend_base_url: String,
    /// Model used when a request does not name one
    pub default_model: String,
    /// Per-request generation timeout in seconds
    pub backend_timeout_secs: u64,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
    /// File-backed system instruction store
    pub instructions_path: PathBuf,
    /// "development" or "production"; gates nothing in the core, only logging
    pub environment: String,
    pub http_bind: SocketAddr,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_base_url: "http://localhost:11434".to_string(),
            default_model: "llama3:latest".to_string(),
            backend_timeout_secs: 180,
            max_upload_bytes: 10 * 1024 * 1024,
            instructions_path: PathBuf::from("instructions/system_instructions.md"),
            environment: "development".to_string(),
            http_bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            log_level: "casegen=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Reads `.env` from the current directory first (CASEGEN_ENV_FILE
    /// overrides the path), then applies env vars over the defaults.
    pub fn load() -> Result<Self> {
        if let Ok(env_path) = std::env::var("CASEGEN_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
        }

        let mut config = Self::default();

        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            config.backend_base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            config.default_model = model;
        }
        if let Some(timeout) = std::env::var("OLLAMA_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.backend_timeout_secs = timeout;
        }
        if let Some(mb) = std::env::var("MAX_FILE_SIZE_MB")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            config.max_upload_bytes = mb * 1024 * 1024;
        }
        if let Ok(path) = std::env::var("CASEGEN_INSTRUCTIONS_FILE") {
            config.instructions_path = PathBuf::from(path);
        }
        if let Ok(env) = std::env::var("ENVIRONMENT") {
            config.environment = env;
        }
        if let Ok(bind) = std::env::var("CASEGEN_HTTP_BIND") {
            config.http_bind = bind.parse().map_err(|e| CasegenError::Config {
                message: format!("invalid CASEGEN_HTTP_BIND '{}': {}", bind, e),
            })?;
        } else {
            // HOST/PORT kept for parity with earlier deployments
            let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
            let port = std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(5000);
            config.http_bind = format!("{}:{}", host, port).parse().map_err(|e| {
                CasegenError::Config {
                    message: format!("invalid HOST/PORT: {}", e),
                }
            })?;
        }
        if let Ok(level) = std::env::var("CASEGEN_LOG") {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.backend_base_url.starts_with("http://")
            && !self.backend_base_url.starts_with("https://")
        {
            return Err(CasegenError::Config {
                message: format!(
                    "OLLAMA_BASE_URL '{}' must start with http:// or https://",
                    self.backend_base_url
                ),
            });
        }
        if self.backend_timeout_secs == 0 {
            return Err(CasegenError::Config {
                message: "OLLAMA_TIMEOUT must be > 0".to_string(),
            });
        }
        if self.max_upload_bytes == 0 {
            return Err(CasegenError::Config {
                message: "MAX_FILE_SIZE_MB must be > 0".to_string(),
            });
        }
        match self.environment.as_str() {
            "development" | "production" => {}
            other => {
                tracing::warn!("unknown ENVIRONMENT '{}', treating as production", other);
            }
        }
        Ok(())
    }

    /// Max upload size in whole megabytes, for error messages
    pub fn max_upload_mb(&self) -> usize {
        self.max_upload_bytes / (1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn bad_backend_url_rejected_as_config_error() {
        let config = Config {
            backend_base_url: "localhost:11434".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CasegenError::Config { .. })
        ));
    }

    #[test]
    fn zero_timeout_rejected_as_config_error() {
        let config = Config {
            backend_timeout_secs: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CasegenError::Config { .. })
        ));
    }
}
