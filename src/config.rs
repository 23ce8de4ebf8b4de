/// Configuration module.
///
/// Handles loading, validating, and providing default configuration values.
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ── Default value functions ──────────────────────────────────────────

fn default_pdf_path() -> String {
    "data/fundamental-rights-european-union.pdf".to_string()
}

fn default_skip_pages() -> usize {
    4
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_search_top_k() -> usize {
    3
}

fn default_embed_timeout_secs() -> u64 {
    30
}

fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_model_dir() -> String {
    "models/all-MiniLM-L6-v2".to_string()
}

fn default_max_tokens() -> usize {
    256
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_generation_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_generation_timeout_secs() -> u64 {
    60
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_pdf_path")]
    pub pdf_path: String,

    /// Leading pages without article text (cover, contents).
    #[serde(default = "default_skip_pages")]
    pub skip_pages: usize,

    /// Where to write the cleaned-section dump, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_dump_path: Option<String>,

    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    #[serde(default = "default_embed_timeout_secs")]
    pub embed_timeout_secs: u64,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default = "default_model_dir")]
    pub dir: String,

    /// Token cap per embedded text.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenerationConfig {
    /// OpenAI-compatible API root; `/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            pdf_path: default_pdf_path(),
            skip_pages: default_skip_pages(),
            section_dump_path: None,
            bind: default_bind(),
            search_top_k: default_search_top_k(),
            embed_timeout_secs: default_embed_timeout_secs(),
            model: ModelConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            dimensions: default_dimensions(),
            dir: default_model_dir(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_generation_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"config.json"`.
    /// If the file does not exist, returns a default config and, for the
    /// default path only, writes a template next to the binary's cwd.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            if path == "config.json" {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.search_top_k > 0, "search_top_k must be positive");
        anyhow::ensure!(
            self.embed_timeout_secs > 0,
            "embed_timeout_secs must be positive"
        );
        anyhow::ensure!(
            self.model.dimensions > 0,
            "model.dimensions must be positive"
        );
        anyhow::ensure!(self.model.max_tokens > 0, "model.max_tokens must be positive");
        anyhow::ensure!(
            self.generation.timeout_secs > 0,
            "generation.timeout_secs must be positive"
        );
        anyhow::ensure!(!self.pdf_path.is_empty(), "pdf_path must be set");
        self.bind
            .parse::<std::net::SocketAddr>()
            .with_context(|| format!("invalid bind address: {}", self.bind))?;
        Ok(())
    }

    #[must_use]
    pub fn model_dir(&self) -> PathBuf {
        PathBuf::from(&self.model.dir)
    }

    #[must_use]
    pub fn embed_timeout(&self) -> Duration {
        Duration::from_secs(self.embed_timeout_secs)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.skip_pages, 4);
        assert_eq!(config.search_top_k, 3);
        assert_eq!(config.model.dimensions, 384);
        assert_eq!(config.model.name, "all-MiniLM-L6-v2");
        assert_eq!(config.generation.model, "llama-3.3-70b-versatile");
        assert_eq!(config.generation.api_key_env, "GROQ_API_KEY");
        assert!(config.section_dump_path.is_none());
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{"skip_pages": 0, "pdf_path": "./charter.pdf", "generation": {"model": "other"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.skip_pages, 0);
        assert_eq!(config.pdf_path, "./charter.pdf");
        assert_eq!(config.generation.model, "other");
        // Other fields should have defaults
        assert_eq!(config.search_top_k, 3);
        assert_eq!(config.generation.base_url, "https://api.groq.com/openai/v1");
    }

    #[test]
    fn test_validate_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_top_k() {
        let mut config = Config::default();
        config.search_top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_bind() {
        let mut config = Config::default();
        config.bind = "localhost".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_custom_path_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.search_top_k, 3);
        // Templates are only generated for the default path
        assert!(!path.exists());
    }

    #[test]
    fn test_load_invalid_json_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.skip_pages, 4);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rag.json");
        let path = path.to_str().unwrap();

        let mut config = Config::default();
        config.section_dump_path = Some("clean_pdf.txt".to_string());
        config.save(path).unwrap();

        let loaded = Config::load(path).unwrap();
        assert_eq!(loaded.section_dump_path.as_deref(), Some("clean_pdf.txt"));
        assert_eq!(loaded.model.dir, config.model.dir);
    }
}
