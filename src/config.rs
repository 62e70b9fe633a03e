//! Application configuration: defaults, an optional JSON file and
//! environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::{EventError, EventsConfig};
use crate::rag::{RagConfig, RetrievalError};
use crate::server::DEFAULT_PORT;

/// Path of the JSON configuration file.
pub const CONFIG_ENV: &str = "GOUT_CONFIG";
/// Server port override.
pub const PORT_ENV: &str = "GOUT_PORT";
/// Ollama endpoint override, applied to both embedding and completion.
pub const OLLAMA_URL_ENV: &str = "GOUT_OLLAMA_URL";
/// Completion model override.
pub const MODEL_ENV: &str = "GOUT_MODEL";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The configuration file is not valid JSON for [`AppConfig`].
    #[error("cannot parse {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// An environment override has an invalid value.
    #[error("invalid value for {name}: {value}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
    /// Invalid event finder settings.
    #[error(transparent)]
    Events(#[from] EventError),
    /// Invalid retrieval settings.
    #[error(transparent)]
    Rag(#[from] RetrievalError),
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Event finder settings.
    pub events: EventsConfig,
    /// Question answering settings.
    pub rag: RagConfig,
    /// Whether the server opens the RAG engine.
    pub rag_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            events: EventsConfig::default(),
            rag: RagConfig::default(),
            rag_enabled: true,
        }
    }
}

impl AppConfig {
    /// Load from `GOUT_CONFIG` when set, then apply environment overrides.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an override is
    /// invalid, or the result fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `GOUT_PORT`, `GOUT_OLLAMA_URL` and `GOUT_MODEL` from `lookup`.
    ///
    /// # Errors
    /// Returns an error if the port does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: PORT_ENV,
                value: port.clone(),
            })?;
        }

        if let Some(url) = lookup(OLLAMA_URL_ENV) {
            self.rag.embedding.base_url = Some(url.clone());
            self.rag.llm.base_url = Some(url);
        }

        if let Some(model) = lookup(MODEL_ENV) {
            self.rag.llm.model = model;
        }

        Ok(())
    }

    /// Validate every section.
    ///
    /// # Errors
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.events.validate()?;
        self.rag.validate()?;
        Ok(())
    }
}
