use crate::core::kmer::MAX_KMER_LENGTH;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Prefix for environment overrides, e.g. `CONTIG_FORGE__ASSEMBLY__KMER_LENGTH=21`
pub const ENV_PREFIX: &str = "CONTIG_FORGE";

/// Complete assembler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AssemblerConfig {
    pub assembly: AssemblyConfig,
    pub alignment: AlignmentConfig,
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Estimated from read lengths when unset
    pub kmer_length: Option<usize>,
    /// Mean depth below which a simple path is discarded
    pub coverage_threshold: Option<f64>,
    pub remove_low_coverage: bool,
    /// Derive the threshold from the depth distribution when none is given
    pub estimate_coverage_threshold: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub enabled: bool,
    /// Falls back to the assembly k-mer length
    pub kmer_length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Worker threads; all cores when unset
    pub threads: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub level: String,
    pub show_targets: bool,
}

/// Errors raised while loading, saving or validating configuration
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Configuration error: {message}")]
    Load { message: String },

    #[error("Validation error: {field} is invalid: {reason}")]
    Validation { field: String, reason: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Input/Output error: {message}")]
    Io { message: String },
}

impl From<ConfigError> for ConfigurationError {
    fn from(err: ConfigError) -> Self {
        ConfigurationError::Load {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ConfigurationError {
    fn from(err: std::io::Error) -> Self {
        ConfigurationError::Io {
            message: err.to_string(),
        }
    }
}

impl AssemblerConfig {
    /// Load a TOML file, apply `CONTIG_FORGE__*` environment overrides and
    /// validate the result
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let parsed: AssemblerConfig = config.try_deserialize()?;
        parsed.validate()?;
        info!("📋 Loaded configuration from {}", path.as_ref().display());
        Ok(parsed)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigurationError> {
        toml::to_string_pretty(self).map_err(|e| ConfigurationError::Serialization {
            message: format!("Failed to serialize configuration: {e}"),
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigurationError> {
        let toml_string = self.to_toml_string()?;
        std::fs::write(path.as_ref(), toml_string).map_err(|e| ConfigurationError::Io {
            message: format!("Failed to write configuration file: {e}"),
        })?;
        info!("💾 Configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if let Some(k) = self.assembly.kmer_length {
            if k == 0 || k > MAX_KMER_LENGTH {
                return Err(invalid(
                    "assembly.kmer_length",
                    format!("must be between 1 and {MAX_KMER_LENGTH}"),
                ));
            }
        }

        if let Some(threshold) = self.assembly.coverage_threshold {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(invalid(
                    "assembly.coverage_threshold",
                    "must be a positive number",
                ));
            }
        }

        if self.alignment.kmer_length == Some(0) {
            return Err(invalid("alignment.kmer_length", "must be greater than 0"));
        }

        if let Some(threads) = self.performance.threads {
            if threads == 0 {
                return Err(invalid("performance.threads", "must be greater than 0"));
            }
            let available = num_cpus::get();
            if threads > available * 2 {
                warn!(
                    "Configured threads ({}) exceeds available cores ({})",
                    threads, available
                );
            }
        }

        Ok(())
    }

    pub fn thread_count(&self) -> usize {
        self.performance.threads.unwrap_or_else(num_cpus::get)
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::Validation {
        field: field.to_string(),
        reason: reason.into(),
    }
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            kmer_length: None,
            coverage_threshold: None,
            remove_low_coverage: true,
            estimate_coverage_threshold: true,
        }
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            kmer_length: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_targets: false,
        }
    }
}
