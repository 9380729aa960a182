//! ThreatScope Common - shared configuration and logging setup

pub mod config;
pub mod logging;

pub use config::{CacheConfig, Config, ConfigBuilder, CorrelationConfig, LoggingConfig, RiskConfig};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogFormat};
