//! TOML Configuration File Support
//!
//! Layered defaults for the parallel operators, read from
//! `~/.config/seqflow/seqflow.toml`.
//!
//! # Configuration Priority
//!
//! Highest first:
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables (`SEQFLOW_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! Zero sizes are ignored at every layer, exactly as the
//! [`ParallelOption`](crate::parallel::ParallelOption) list ignores them.
//!
//! # Example Configuration
//!
//! ```toml
//! [parallel]
//! concurrency = 8
//! ordered = true
//! buffer_size = 32
//! chunk_size = 0
//!
//! [rate_limit]
//! per_period = 100
//! period_ms = 1000
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parallel::{ParallelConfig, ParallelOption};

/// Environment variable overriding the worker count
pub const ENV_CONCURRENCY: &str = "SEQFLOW_CONCURRENCY";
/// Environment variable selecting ordered (`1`/`true`) or unordered output
pub const ENV_ORDERED: &str = "SEQFLOW_ORDERED";
/// Environment variable overriding the queue capacity
pub const ENV_BUFFER_SIZE: &str = "SEQFLOW_BUFFER_SIZE";
/// Environment variable overriding the ordered-mode chunk size
pub const ENV_CHUNK_SIZE: &str = "SEQFLOW_CHUNK_SIZE";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where the effective configuration came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[parallel]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelToml {
    /// Number of concurrent workers
    pub concurrency: Option<usize>,

    /// Whether output keeps input order
    pub ordered: Option<bool>,

    /// Capacity of the work and result queues
    pub buffer_size: Option<usize>,

    /// Ordered-mode chunk size (0 = streaming reordering)
    pub chunk_size: Option<usize>,
}

/// `[rate_limit]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitToml {
    /// Emissions allowed per period
    pub per_period: Option<u32>,

    /// Period length in milliseconds
    pub period_ms: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowToml {
    /// Parallel operator defaults
    pub parallel: ParallelToml,

    /// Optional default rate limit
    pub rate_limit: RateLimitToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Default rate limit: `per_period` emissions every `period`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitSettings {
    /// Emissions allowed per period
    pub per_period: u32,
    /// Period length
    pub period: Duration,
}

/// Effective configuration assembled from every layer
#[derive(Clone, Debug)]
pub struct FlowConfigFile {
    /// Parallel operator configuration
    pub parallel: ParallelConfig,

    /// Default rate limit, if any layer set one
    pub rate_limit: Option<RateLimitSettings>,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for FlowConfigFile {
    fn default() -> Self {
        Self {
            parallel: ParallelConfig::default(),
            rate_limit: None,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl FlowConfigFile {
    /// Create a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The highest-priority layer that changed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/seqflow/seqflow.toml` or
/// `~/.config/seqflow/seqflow.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("seqflow").join("seqflow.toml"))
}

/// Load configuration from the default path and the process environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<FlowConfigFile, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path and the process environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<FlowConfigFile, ConfigError> {
    let mut config = load_file_layer(path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn load_file_layer(path: Option<PathBuf>) -> Result<FlowConfigFile, ConfigError> {
    let mut config = FlowConfigFile::default();

    let Some(config_path) = path else {
        return Ok(config);
    };
    if !config_path.exists() {
        tracing::debug!(
            path = %config_path.display(),
            "Config file not found, using defaults"
        );
        return Ok(config);
    }

    let toml_content =
        std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
            path: config_path.clone(),
            source: e,
        })?;
    let toml_config: FlowToml = toml::from_str(&toml_content)?;
    apply_toml_config(&mut config, &toml_config);
    config.source = ConfigSource::File;

    tracing::info!(
        path = %config_path.display(),
        "Loaded configuration from file"
    );
    config.config_file_path = Some(config_path);

    Ok(config)
}

fn apply_toml_config(config: &mut FlowConfigFile, toml: &FlowToml) {
    let parallel = &toml.parallel;
    let options = [
        parallel.concurrency.map(ParallelOption::Concurrency),
        parallel.ordered.map(ParallelOption::Ordered),
        parallel.buffer_size.map(ParallelOption::BufferSize),
        parallel.chunk_size.map(ParallelOption::ChunkSize),
    ];
    config.parallel = config.parallel.clone().with_options(options.into_iter().flatten());

    if let Some(per_period) = toml.rate_limit.per_period {
        config.rate_limit = Some(RateLimitSettings {
            per_period,
            period: Duration::from_millis(toml.rate_limit.period_ms.unwrap_or(1000)),
        });
    }
}

/// Apply `SEQFLOW_*` overrides read through `lookup`
///
/// Unparseable values are skipped with a warning.
pub fn apply_env_overrides<F>(config: &mut FlowConfigFile, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let mut options = Vec::new();

    if let Some(n) = parse_env::<usize>(&lookup, ENV_CONCURRENCY) {
        options.push(ParallelOption::Concurrency(n));
    }
    if let Some(raw) = lookup(ENV_ORDERED) {
        let ordered = raw != "0" && !raw.eq_ignore_ascii_case("false");
        options.push(ParallelOption::Ordered(ordered));
    }
    if let Some(n) = parse_env::<usize>(&lookup, ENV_BUFFER_SIZE) {
        options.push(ParallelOption::BufferSize(n));
    }
    if let Some(n) = parse_env::<usize>(&lookup, ENV_CHUNK_SIZE) {
        options.push(ParallelOption::ChunkSize(n));
    }

    if !options.is_empty() {
        config.parallel = config.parallel.clone().with_options(options);
        config.source = ConfigSource::Env;
    }
}

fn parse_env<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Command-line overrides applied on top of [`load_config`]
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Worker count override
    pub concurrency: Option<usize>,

    /// Ordering override
    pub ordered: Option<bool>,

    /// Queue capacity override
    pub buffer_size: Option<usize>,

    /// Chunk size override
    pub chunk_size: Option<usize>,
}

impl ConfigOverrides {
    /// Create an empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count override
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Set the ordering override
    #[must_use]
    pub fn with_ordered(mut self, ordered: bool) -> Self {
        self.ordered = Some(ordered);
        self
    }

    /// Set the queue capacity override
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = Some(buffer_size);
        self
    }

    /// Set the chunk size override
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// Apply the overrides to a configuration
    pub fn apply(&self, config: &mut FlowConfigFile) {
        let options: Vec<ParallelOption> = [
            self.concurrency.map(ParallelOption::Concurrency),
            self.ordered.map(ParallelOption::Ordered),
            self.buffer_size.map(ParallelOption::BufferSize),
            self.chunk_size.map(ParallelOption::ChunkSize),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !options.is_empty() {
            config.parallel = config.parallel.clone().with_options(options);
            config.source = ConfigSource::Cli;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
