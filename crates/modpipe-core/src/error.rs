//! Unified error types for the modpipe engine.
//!
//! Every error here aborts the resolve or apply operation that raised it and is
//! surfaced to the caller unchanged. Nothing is retried: configuration and
//! parameter errors are operator mistakes, not transient faults.

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised while reading, parsing or merging a configuration source.
///
/// A resolution that fails with any of these never yields a partial
/// configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The configuration file could not be read or canonicalized.
    #[error("failed to read configuration file {}: {reason}", .path.display())]
    Io {
        /// The offending path.
        path: PathBuf,
        /// Underlying I/O failure.
        reason: String,
    },

    /// The file extension does not select a supported format.
    #[error("not a supported config file type (.yaml, .yml or .properties): {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The source is not well-formed YAML or properties text.
    #[error("malformed configuration source {source_name}: {reason}")]
    Syntax {
        /// Human-readable name of the source.
        source_name: String,
        /// Parser message.
        reason: String,
    },

    /// A YAML source whose top level is not a list of settings.
    #[error("could not read config source {0}, not a list of settings")]
    NotAList(String),

    /// A setting record lacks a field its kind requires.
    #[error("config setting {kind}: required field '{field}' not given in {record}")]
    MissingField {
        /// Setting discriminator (`prparm`, `docfeature`, ...).
        kind: String,
        /// The missing field.
        field: String,
        /// Rendering of the offending record.
        record: String,
    },

    /// An unrecognized discriminator or flat-key prefix.
    #[error("unknown setting '{kind}' in {source_name}")]
    UnknownSetting {
        /// The unrecognized discriminator or key.
        kind: String,
        /// Human-readable name of the source.
        source_name: String,
    },

    /// A field that must be boolean holds something else.
    #[error("config setting {kind}: field '{field}' must be true or false, got {value}")]
    NotBoolean {
        /// Setting discriminator.
        kind: String,
        /// The field that must be boolean.
        field: String,
        /// The value that was found.
        value: String,
    },

    /// A flat `prparm.<id>.*` group is missing one of its four properties.
    #[error("no property {property} for pr parameter setting '{setting_id}'")]
    IncompleteGroup {
        /// The shared `<id>` fragment.
        setting_id: String,
        /// The full name of the missing property.
        property: String,
    },

    /// A process property carries the override prefix but no known second-level literal.
    #[error("odd property with the modular pipelines prefix encountered: {key}")]
    UnknownOverride {
        /// The offending property key.
        key: String,
    },

    /// A process override key could not be split into its name parts.
    #[error("malformed override property {key}: {reason}")]
    MalformedOverride {
        /// The offending property key.
        key: String,
        /// What part was missing.
        reason: String,
    },

    /// The engine's own settings are invalid or could not be extracted.
    #[error("invalid resolver settings: {0}")]
    Settings(String),
}

impl ConfigError {
    /// Creates a syntax error for the named source.
    pub fn syntax(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Syntax {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(
        kind: impl Into<String>,
        field: impl Into<String>,
        record: impl Into<String>,
    ) -> Self {
        Self::MissingField {
            kind: kind.into(),
            field: field.into(),
            record: record.into(),
        }
    }

    /// Creates a malformed override error.
    pub fn malformed_override(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedOverride {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

// =============================================================================
// Application Errors
// =============================================================================

/// The reason a host component gives for refusing a parameter value.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ParameterRejection(pub String);

impl ParameterRejection {
    /// Creates a rejection with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Errors raised while pushing a configuration onto a live controller.
#[derive(Debug, Clone, Error)]
pub enum ApplyError {
    /// A setting names a component that is not in the live controller.
    #[error("cannot set parameter, no component found with id '{id}'")]
    TargetNotFound {
        /// Rendering of the unresolved `(controller, component)` key.
        id: String,
    },

    /// Two components in the same controller share a name.
    #[error("cannot set parameters, the component name appears twice: '{id}'")]
    AmbiguousTarget {
        /// Rendering of the duplicated `(controller, component)` key.
        id: String,
    },

    /// The component refused the value.
    #[error("could not set parameter '{parameter}' for component '{id}' to value {value}: {reason}")]
    ParameterRejected {
        /// Parameter name.
        parameter: String,
        /// Rendering of the target `(controller, component)` key.
        id: String,
        /// Rendering of the attempted value.
        value: String,
        /// Reason given by the component.
        reason: ParameterRejection,
    },
}

// =============================================================================
// Pipeline Errors
// =============================================================================

/// Errors surfaced by a parametrized controller or pipeline wrapper run.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// Configuration could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration could not be applied.
    #[error(transparent)]
    Apply(#[from] ApplyError),

    /// The delegated run failed.
    #[error("execution failed: {0}")]
    Execution(String),
}

impl PipelineError {
    /// Creates an execution error.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration resolution.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for configuration application.
pub type ApplyResult<T> = Result<T, ApplyError>;

/// Result type for pipeline execution.
pub type PipelineResult<T> = Result<T, PipelineError>;
