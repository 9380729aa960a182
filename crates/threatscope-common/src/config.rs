//! Configuration management for ThreatScope components
//!
//! All scoring constants are documented policy values, not derived
//! necessities; every one of them is tunable here.

use serde::{Deserialize, Serialize};
use std::path::Path;
use threatscope_core::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Result cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Correlation engine settings
    #[serde(default)]
    pub correlation: CorrelationConfig,

    /// Risk scorer settings
    #[serde(default)]
    pub risk: RiskConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))
    }

    /// Create a configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Merge with environment variables (THREATSCOPE_ prefix)
    pub fn merge_env(mut self) -> Self {
        if let Ok(val) = std::env::var("THREATSCOPE_CACHE_ENABLED") {
            if let Ok(b) = val.parse() {
                self.cache.enabled = b;
            }
        }
        if let Ok(val) = std::env::var("THREATSCOPE_CACHE_TTL") {
            if let Ok(n) = val.parse() {
                self.cache.ttl_seconds = n;
            }
        }
        if let Ok(val) = std::env::var("THREATSCOPE_MIN_CORRELATION_SCORE") {
            if let Ok(f) = val.parse() {
                self.correlation.min_score = f;
            }
        }
        if let Ok(val) = std::env::var("THREATSCOPE_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("THREATSCOPE_LOG_FORMAT") {
            self.logging.format = val;
        }
        self
    }
}

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable the result cache entirely; disabled callers always recompute
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds before a cached entry is considered stale
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

fn default_true() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
        }
    }
}

/// Correlation engine configuration
///
/// Signal weights combine as a capped weighted average; the two bonus
/// weights are added afterwards, each clamped to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Filtering hint for callers; never enforced inside the engine
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    /// Weight of a direct external-reference match on the CVE id
    #[serde(default = "default_reference_weight")]
    pub reference_weight: f64,

    /// Weight of a CVE id mention in description or labels
    #[serde(default = "default_mention_weight")]
    pub mention_weight: f64,

    /// Weight of exploitation-type labels on a matched object
    #[serde(default = "default_exploit_label_weight")]
    pub exploit_label_weight: f64,

    /// Weight of the "active-exploitation" label on a matched object
    #[serde(default = "default_active_label_weight")]
    pub active_label_weight: f64,

    /// Bonus when the CVE itself reports an available exploit
    #[serde(default = "default_exploit_weight")]
    pub exploit_weight: f64,

    /// Bonus when active exploitation was observed
    #[serde(default = "default_active_exploitation_weight")]
    pub active_exploitation_weight: f64,

    /// Multiplier applied when more than two signal types matched
    #[serde(default = "default_multi_factor_boost")]
    pub multi_factor_boost: f64,
}

fn default_min_score() -> f64 {
    0.5
}

fn default_reference_weight() -> f64 {
    0.9
}

fn default_mention_weight() -> f64 {
    0.7
}

fn default_exploit_label_weight() -> f64 {
    0.8
}

fn default_active_label_weight() -> f64 {
    1.0
}

fn default_exploit_weight() -> f64 {
    0.3
}

fn default_active_exploitation_weight() -> f64 {
    0.5
}

fn default_multi_factor_boost() -> f64 {
    1.1
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            min_score: 0.5,
            reference_weight: 0.9,
            mention_weight: 0.7,
            exploit_label_weight: 0.8,
            active_label_weight: 1.0,
            exploit_weight: 0.3,
            active_exploitation_weight: 0.5,
            multi_factor_boost: 1.1,
        }
    }
}

/// Risk scorer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Likelihood weight of the matched-count factor
    #[serde(default = "default_count_weight")]
    pub count_weight: f64,

    /// Likelihood weight of the mean-severity factor
    #[serde(default = "default_severity_weight")]
    pub severity_weight: f64,

    /// Risk score at which isolation is recommended
    #[serde(default = "default_isolation_threshold")]
    pub isolation_threshold: f64,
}

fn default_count_weight() -> f64 {
    0.4
}

fn default_severity_weight() -> f64 {
    0.6
}

fn default_isolation_threshold() -> f64 {
    80.0
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            count_weight: 0.4,
            severity_weight: 0.6,
            isolation_threshold: 80.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("pretty")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("pretty"),
        }
    }
}

/// Builder for constructing Config
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.config.cache.enabled = enabled;
        self
    }

    pub fn cache_ttl(mut self, seconds: u64) -> Self {
        self.config.cache.ttl_seconds = seconds;
        self
    }

    pub fn min_correlation_score(mut self, score: f64) -> Self {
        self.config.correlation.min_score = score;
        self
    }

    pub fn exploit_weight(mut self, weight: f64) -> Self {
        self.config.correlation.exploit_weight = weight;
        self
    }

    pub fn active_exploitation_weight(mut self, weight: f64) -> Self {
        self.config.correlation.active_exploitation_weight = weight;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
