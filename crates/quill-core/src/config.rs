//! Configuration management for Quill
//!
//! Loaded from `.quill/config.toml` in the working directory. Every field has a
//! default, so a missing file or a partial file is always valid. Credentials are
//! never stored here, only the name of the environment variable holding them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::DEFAULT_PASS_THRESHOLD;
use crate::{QuillError, Result};

/// Top-level Quill configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuillConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub revision: RevisionConfig,

    #[serde(default)]
    pub consistency: ConsistencyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chat model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// `anthropic` or `openai`
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model_name")]
    pub name: String,

    /// Environment variable containing the API key
    #[serde(default = "default_model_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Upper bound for a single request attempt
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Embedding model used by the consistency lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embedding_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

/// Backoff policy for transient provider failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
}

/// Revision loop limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: u8,
}

/// Consistency lookup tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyConfig {
    /// Matches at or below this similarity are ignored
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    #[serde(default = "default_limit")]
    pub limit: usize,

    /// JSON snapshot of the local consistency store
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,

    /// `development`, `staging` or `production`; production implies JSON
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl LoggingConfig {
    pub fn wants_json(&self) -> bool {
        self.json || self.environment.eq_ignore_ascii_case("production")
    }
}

// Default value providers
fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_model_name() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

fn default_model_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_max_tokens() -> usize {
    4096
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_dimensions() -> usize {
    1536
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    2_000
}

fn default_max_backoff_ms() -> u64 {
    120_000
}

fn default_multiplier() -> u32 {
    2
}

fn default_max_iterations() -> usize {
    3
}

fn default_pass_threshold() -> u8 {
    DEFAULT_PASS_THRESHOLD
}

fn default_similarity_threshold() -> f64 {
    0.70
}

fn default_limit() -> usize {
    3
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".quill/store.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

impl QuillConfig {
    /// Load configuration from `.quill/config.toml` or use defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = root.join(".quill/config.toml");

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&content)
                .map_err(|e| QuillError::Config(format!("Failed to parse config file: {}", e)))?;
            config.validate()?;
            debug!("Loaded config from {:?}", config_path);
            Ok(config)
        } else {
            debug!("No config at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Write default configuration to `.quill/config.toml`
    pub fn write_default(root: &Path) -> Result<PathBuf> {
        let config_dir = root.join(".quill");
        std::fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| QuillError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&config_path, content)?;
        Ok(config_path)
    }

    /// Reject values that would make the pipeline meaningless
    pub fn validate(&self) -> Result<()> {
        if self.revision.pass_threshold > 100 {
            return Err(QuillError::Config(format!(
                "pass_threshold must be 0-100, got {}",
                self.revision.pass_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.consistency.similarity_threshold) {
            return Err(QuillError::Config(format!(
                "similarity_threshold must be within 0.0-1.0, got {}",
                self.consistency.similarity_threshold
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(QuillError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            name: default_model_name(),
            api_key_env: default_model_key_env(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            api_key_env: default_embedding_key_env(),
            dimensions: default_dimensions(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            pass_threshold: default_pass_threshold(),
        }
    }
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            limit: default_limit(),
            store_path: default_store_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            environment: default_environment(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = QuillConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.revision.max_iterations, 3);
        assert_eq!(config.revision.pass_threshold, 80);
        assert_eq!(config.embedding.dimensions, 1536);
        assert_eq!(config.consistency.limit, 3);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".quill")).unwrap();
        std::fs::write(
            dir.path().join(".quill/config.toml"),
            "[revision]\nmax_iterations = 5\n\n[model]\nprovider = \"openai\"\nname = \"gpt-4.1-mini\"\n",
        )
        .unwrap();

        let config = QuillConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.revision.max_iterations, 5);
        assert_eq!(config.revision.pass_threshold, 80);
        assert_eq!(config.model.provider, "openai");
        assert_eq!(config.model.api_key_env, "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_write_default_roundtrips() {
        let dir = TempDir::new().unwrap();
        let path = QuillConfig::write_default(dir.path()).unwrap();
        assert!(path.exists());

        let config = QuillConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.consistency.store_path, PathBuf::from(".quill/store.json"));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".quill")).unwrap();
        std::fs::write(
            dir.path().join(".quill/config.toml"),
            "[consistency]\nsimilarity_threshold = 1.5\n",
        )
        .unwrap();

        let result = QuillConfig::load_or_default(dir.path());
        assert!(matches!(result, Err(QuillError::Config(_))));
    }

    #[test]
    fn test_production_implies_json() {
        let logging = LoggingConfig {
            environment: "Production".to_string(),
            ..LoggingConfig::default()
        };
        assert!(logging.wants_json());
        assert!(!LoggingConfig::default().wants_json());
    }
}
