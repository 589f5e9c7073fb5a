//! Configuration for the judge engine.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values;
//! CLI flags are applied on top by the binary.

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Judge model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    /// Base URL for the judge API (e.g., "https://api.openai.com")
    pub api_base: String,

    /// API key for authentication
    pub api_key: String,

    /// Primary judge model name
    pub model: String,

    /// Models tried in order when the primary model is not found (HTTP 404)
    #[serde(default)]
    pub fallback_models: Vec<String>,

    /// Maximum tokens for the judge response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            fallback_models: vec!["gpt-4.1-mini".to_string()],
            max_tokens: default_max_tokens(),
        }
    }
}

impl JudgeConfig {
    /// Ordered, de-duplicated list of models to try, primary first.
    pub fn fallback_chain(&self) -> Vec<String> {
        let mut chain: Vec<String> = Vec::new();
        for model in std::iter::once(&self.model).chain(self.fallback_models.iter()) {
            let model = model.trim();
            if !model.is_empty() && !chain.iter().any(|m| m == model) {
                chain.push(model.to_string());
            }
        }
        chain
    }
}

/// Settings for a single evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of cases scored per judge call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Number of batches allowed in flight at once.
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,

    /// Input file with cases to evaluate.
    #[serde(default)]
    pub responses_file: Option<PathBuf>,

    /// Where the run summary is written.
    #[serde(default)]
    pub output_file: Option<PathBuf>,

    /// Value of the `source` metadata tag attached to every result.
    #[serde(default = "default_source_tag")]
    pub source_tag: String,
}

fn default_batch_size() -> usize {
    10
}

fn default_max_concurrent_batches() -> usize {
    1
}

fn default_source_tag() -> String {
    "llm_judge".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent_batches: default_max_concurrent_batches(),
            responses_file: None,
            output_file: None,
            source_tag: default_source_tag(),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Judge settings
    pub judge: JudgeConfig,
    /// Run settings
    #[serde(default)]
    pub run: RunConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    judge: Option<JudgeFileSection>,
    run: Option<RunFileSection>,
}

#[derive(Debug, Deserialize)]
struct JudgeFileSection {
    api_base: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    fallback_models: Option<Vec<String>>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RunFileSection {
    batch_size: Option<usize>,
    max_concurrent_batches: Option<usize>,
    responses_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    source_tag: Option<String>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JUDGE_API_BASE, JUDGE_API_KEY, JUDGE_MODEL_NAME, ...)
    /// 2. Config file (~/.config/answer-judge/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(api_base) = lookup("JUDGE_API_BASE") {
            self.judge.api_base = api_base;
        }

        if let Some(api_key) = lookup("JUDGE_API_KEY") {
            self.judge.api_key = api_key;
        }

        if let Some(model) = lookup("JUDGE_MODEL_NAME") {
            self.judge.model = model;
        }

        if let Some(fallbacks) = lookup("JUDGE_FALLBACK_MODELS") {
            self.judge.fallback_models = fallbacks
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
        }

        if let Some(tokens) = lookup("JUDGE_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.judge.max_tokens = tokens;
        }

        if let Some(size) = lookup("EVAL_BATCH_SIZE").and_then(|v| v.parse().ok()) {
            self.run.batch_size = size;
        }

        if let Some(n) = lookup("EVAL_MAX_CONCURRENT_BATCHES").and_then(|v| v.parse().ok()) {
            self.run.max_concurrent_batches = n;
        }

        if let Some(path) = lookup("RESPONSES_FILE") {
            self.run.responses_file = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup("EVAL_OUTPUT_FILE") {
            self.run.output_file = Some(PathBuf::from(path));
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;

        let file_config: ConfigFile = serde_yaml::from_str(&content)
            .map_err(|e| EvalError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(judge) = file_config.judge {
            if let Some(api_base) = judge.api_base {
                config.judge.api_base = api_base;
            }
            if let Some(api_key) = judge.api_key {
                config.judge.api_key = api_key;
            }
            if let Some(model) = judge.model {
                config.judge.model = model;
            }
            if let Some(fallback_models) = judge.fallback_models {
                config.judge.fallback_models = fallback_models;
            }
            if let Some(max_tokens) = judge.max_tokens {
                config.judge.max_tokens = max_tokens;
            }
        }

        if let Some(run) = file_config.run {
            if let Some(batch_size) = run.batch_size {
                config.run.batch_size = batch_size;
            }
            if let Some(n) = run.max_concurrent_batches {
                config.run.max_concurrent_batches = n;
            }
            if run.responses_file.is_some() {
                config.run.responses_file = run.responses_file;
            }
            if run.output_file.is_some() {
                config.run.output_file = run.output_file;
            }
            if let Some(source_tag) = run.source_tag {
                config.run.source_tag = source_tag;
            }
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "answer-judge")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate that required configuration is present.
    pub fn validate(&self) -> Result<()> {
        if self.judge.api_base.is_empty() {
            return Err(EvalError::InvalidConfig(
                "Judge API base URL is required. Set JUDGE_API_BASE environment variable or add to config file.".to_string()
            ));
        }

        if self.judge.api_key.is_empty() {
            return Err(EvalError::InvalidConfig(
                "Judge API key is required. Set JUDGE_API_KEY environment variable or add to config file.".to_string()
            ));
        }

        if self.judge.fallback_chain().is_empty() {
            return Err(EvalError::InvalidConfig(
                "Judge model is required. Set JUDGE_MODEL_NAME environment variable or add to config file."
                    .to_string(),
            ));
        }

        if self.run.batch_size == 0 {
            return Err(EvalError::InvalidConfig(
                "Batch size must be at least 1".to_string(),
            ));
        }

        if self.run.max_concurrent_batches == 0 {
            return Err(EvalError::InvalidConfig(
                "Concurrent batch limit must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Create a config from explicit values (useful for testing).
    pub fn with_judge(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            judge: JudgeConfig {
                api_base: api_base.into(),
                api_key: api_key.into(),
                model: model.into(),
                ..Default::default()
            },
            run: RunConfig::default(),
        }
    }
}
