//! Assistant configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/finbot/config/finbot.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Keys missing from an override keep their default values.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/finbot.toml");

/// Tunables for the assistant pipeline
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Classifier confidence needed to accept a keyword-less message
    pub min_confidence: f64,
    /// Conversation entries kept per user
    pub history_limit: usize,
    pub anomaly_z_threshold: f64,
    pub forecast_min_points: usize,
    pub forecast_horizon: usize,
    pub recent_transaction_limit: usize,
    /// Conversion rates to USD keyed by ISO code
    pub currency_rates: HashMap<String, f64>,
    pub llm: LlmConfig,
}

/// Gemini generation parameters and response cache settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.7,
            top_k: 20,
            top_p: 0.8,
            max_output_tokens: 1000,
            timeout_secs: 30,
            cache_ttl_secs: 300,
            cache_capacity: 100,
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        let currency_rates = [
            ("USD", 1.0),
            ("SAR", 0.267),
            ("EUR", 1.18),
            ("GBP", 1.39),
            ("AED", 0.2725),
        ]
        .into_iter()
        .map(|(code, rate)| (code.to_string(), rate))
        .collect();

        Self {
            min_confidence: 0.3,
            history_limit: 20,
            anomaly_z_threshold: 2.0,
            forecast_min_points: 6,
            forecast_horizon: 3,
            recent_transaction_limit: 100,
            currency_rates,
            llm: LlmConfig::default(),
        }
    }
}

impl AssistantConfig {
    /// Load from the override location, falling back to embedded defaults
    pub fn load() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Self::parse(DEFAULT_CONFIG),
        }
    }

    /// Load from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::InvalidData(format!("Failed to read config: {}", e)))?;
        debug!(path = %path.display(), "Loaded config override");
        Self::parse(&content)
    }

    /// Parse config from TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.currency_rates = config
            .currency_rates
            .into_iter()
            .map(|(code, rate)| (code.to_uppercase(), rate))
            .collect();
        // An override table adds to the built-in rates rather than replacing them
        for (code, rate) in Self::default().currency_rates {
            config.currency_rates.entry(code).or_insert(rate);
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(Error::InvalidData(format!(
                "min_confidence must be within 0..1, got {}",
                self.min_confidence
            )));
        }
        if self.forecast_min_points < 2 {
            return Err(Error::InvalidData(
                "forecast_min_points must be at least 2".to_string(),
            ));
        }
        if let Some((code, rate)) = self.currency_rates.iter().find(|(_, r)| **r <= 0.0) {
            return Err(Error::InvalidData(format!(
                "Currency rate for {} must be positive, got {}",
                code, rate
            )));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("finbot").join("config").join("finbot.toml"))
}
