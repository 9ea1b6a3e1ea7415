//! Resolver settings schema.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use modpipe_core::{ConfigError, ConfigResult};

/// Default prefix of process-wide override properties.
pub const DEFAULT_PROPERTY_PREFIX: &str = "modularpipelines.";

/// Default separator between controller, component and parameter names in override keys.
pub const DEFAULT_SEPARATOR: &str = ".";

/// Settings of the configuration engine itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Prefix that marks a process property as a configuration override.
    #[serde(default = "default_property_prefix")]
    pub property_prefix: String,

    /// Separator splitting override keys into their name parts.
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Configuration file that replaces every requested source.
    #[serde(default)]
    pub config_file: Option<PathBuf>,

    /// Whether `propset` settings are layered onto the property store before
    /// process overrides are scanned.
    #[serde(default = "default_true")]
    pub apply_property_sets: bool,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            property_prefix: default_property_prefix(),
            separator: default_separator(),
            config_file: None,
            apply_property_sets: true,
            logging: LoggingSettings::default(),
        }
    }
}

impl ResolverSettings {
    /// Checks the settings for values the resolver cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.property_prefix.is_empty() {
            return Err(ConfigError::Settings("property_prefix must not be empty".into()));
        }
        if self.separator.is_empty() {
            return Err(ConfigError::Settings("separator must not be empty".into()));
        }
        Ok(())
    }
}

fn default_property_prefix() -> String {
    DEFAULT_PROPERTY_PREFIX.to_string()
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lowercase name as used in filter directives.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to the `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `compact` without it.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stderr,
    Stdout,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpanEventSettings {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LoggingSettings {
    /// Base level when `RUST_LOG` is not set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, used when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub span_events: SpanEventSettings,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module levels, e.g. `modpipe_runtime = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}
