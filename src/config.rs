use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::BatchOptions;
use crate::models::EstimatorParams;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub valuation: ValuationSettings,
    #[serde(default)]
    pub batch: BatchSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValuationSettings {
    #[serde(default = "default_outlier_fraction")]
    pub outlier_fraction: f64,
    #[serde(default = "default_top_fraction")]
    pub top_fraction: f64,
    #[serde(default = "default_band_fraction")]
    pub band_fraction: f64,
}

impl Default for ValuationSettings {
    fn default() -> Self {
        Self {
            outlier_fraction: default_outlier_fraction(),
            top_fraction: default_top_fraction(),
            band_fraction: default_band_fraction(),
        }
    }
}

fn default_outlier_fraction() -> f64 { 0.15 }
fn default_top_fraction() -> f64 { 0.30 }
fn default_band_fraction() -> f64 { 0.10 }

#[derive(Debug, Clone, Deserialize)]
pub struct BatchSettings {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    pub subject_timeout_ms: Option<u64>,
    #[serde(default = "default_max_subjects")]
    pub max_subjects: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            subject_timeout_ms: None,
            max_subjects: default_max_subjects(),
        }
    }
}

fn default_max_concurrency() -> usize { 4 }
fn default_max_subjects() -> usize { 1000 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with ARV__)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., ARV__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Estimator parameters resolved from the valuation section
    pub fn estimator_params(&self) -> EstimatorParams {
        EstimatorParams {
            outlier_fraction: self.valuation.outlier_fraction,
            top_fraction: self.valuation.top_fraction,
            band_fraction: self.valuation.band_fraction,
        }
    }

    /// Batch options resolved from the valuation and batch sections
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            params: self.estimator_params(),
            max_concurrency: self.batch.max_concurrency.max(1),
            subject_timeout: self.batch.subject_timeout_ms.map(Duration::from_millis),
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix("ARV")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
