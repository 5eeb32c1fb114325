//! # Configuration
//!
//! `AssessorConfig` is read once at startup and passed explicitly to the
//! generation factory and the runner. Sources, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config`, or `samd-launch.toml` in the working directory)
//! 3. Environment variables
//! 4. CLI flags (applied by the command layer)
//!
//! ```toml
//! [generation]
//! provider = "openai-compatible"
//! base_url = "https://api.openai.com"
//! model = "gpt-3.5-turbo"
//! temperature = 0.7
//! timeout_secs = 60
//!
//! [runner]
//! max_attempts = 3
//! backoff_base_ms = 500
//! backoff_cap_ms = 8000
//! max_concurrent_calls = 4
//! calls_per_second = 0
//! decision_policy = "permissive"
//! ```
//!
//! The API key is only ever read from `SAMD_API_KEY` (or `OPENAI_API_KEY`),
//! never from the file.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "samd-launch.toml";

/// Upper bound on `runner.max_concurrent_calls`.
pub const MAX_CONCURRENT_CALLS: usize = 64;

// =============================================================================
// ENUMS
// =============================================================================

/// Which text-generation backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Any `/v1/chat/completions` endpoint.
    #[default]
    OpenAiCompatible,
    /// Deterministic canned narratives, no network.
    Offline,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai-compatible" | "openai" => Ok(ProviderKind::OpenAiCompatible),
            "offline" => Ok(ProviderKind::Offline),
            other => Err(ConfigError::InvalidValue {
                key: "provider".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// How a decision narrative without a readable token is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionPolicy {
    /// Keep the text, record a warning.
    #[default]
    Permissive,
    /// Treat it as a retryable generation failure.
    Strict,
}

impl FromStr for DecisionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(DecisionPolicy::Permissive),
            "strict" => Ok(DecisionPolicy::Strict),
            other => Err(ConfigError::InvalidValue {
                key: "decision_policy".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

/// `[generation]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationSettings {
    pub provider: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Bearer token; environment only.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAiCompatible,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            timeout_secs: 60,
            api_key: None,
        }
    }
}

impl GenerationSettings {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[runner]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerSettings {
    /// Attempts per generation call, including the first.
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    /// Generation calls in flight across all records.
    pub max_concurrent_calls: usize,
    /// Calls per second across all records; `0` disables the limiter.
    pub calls_per_second: u32,
    pub decision_policy: DecisionPolicy,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 500,
            backoff_cap_ms: 8000,
            max_concurrent_calls: 4,
            calls_per_second: 0,
            decision_policy: DecisionPolicy::Permissive,
        }
    }
}

// =============================================================================
// ASSESSOR CONFIG
// =============================================================================

/// Full application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssessorConfig {
    pub generation: GenerationSettings,
    pub runner: RunnerSettings,
}

impl AssessorConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from `path`, or from `samd-launch.toml` if it exists, or defaults.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file is not.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&text)
    }

    /// Apply `SAMD_*` overrides from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    ///
    /// Recognised variables: `SAMD_PROVIDER`, `SAMD_BASE_URL`, `SAMD_MODEL`,
    /// `SAMD_MAX_CONCURRENCY`, `SAMD_CALLS_PER_SECOND`,
    /// `SAMD_DECISION_POLICY`, and `SAMD_API_KEY` / `OPENAI_API_KEY`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SAMD_PROVIDER") {
            self.generation.provider = v.parse()?;
        }
        if let Some(v) = get("SAMD_BASE_URL") {
            self.generation.base_url = v;
        }
        if let Some(v) = get("SAMD_MODEL") {
            self.generation.model = v;
        }
        if let Some(v) = get("SAMD_MAX_CONCURRENCY") {
            self.runner.max_concurrent_calls = parse_number("SAMD_MAX_CONCURRENCY", &v)?;
        }
        if let Some(v) = get("SAMD_CALLS_PER_SECOND") {
            self.runner.calls_per_second = parse_number("SAMD_CALLS_PER_SECOND", &v)?;
        }
        if let Some(v) = get("SAMD_DECISION_POLICY") {
            self.runner.decision_policy = v.parse()?;
        }
        if let Some(key) = get("SAMD_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
            self.generation.api_key = Some(key);
        }

        Ok(self)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runner.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "runner.max_attempts must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_CONCURRENT_CALLS).contains(&self.runner.max_concurrent_calls) {
            return Err(ConfigError::Invalid(format!(
                "runner.max_concurrent_calls must be between 1 and {MAX_CONCURRENT_CALLS}"
            )));
        }
        if self.runner.backoff_base_ms > self.runner.backoff_cap_ms {
            return Err(ConfigError::Invalid(
                "runner.backoff_base_ms exceeds runner.backoff_cap_ms".to_string(),
            ));
        }
        if self.generation.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "generation.timeout_secs must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::Invalid(format!(
                "generation.temperature {} is outside 0.0-2.0",
                self.generation.temperature
            )));
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

// =============================================================================
// TESTS
// =============================================================================
