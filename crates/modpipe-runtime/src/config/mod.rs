//! Settings of the configuration engine itself.
//!
//! These are not pipeline configurations: they control how pipeline
//! configurations are resolved (override prefix and separator, the
//! config-file override, property-set layering) and how logging is set up.

pub mod loader;
pub mod schema;

pub use loader::{ENV_PREFIX, SettingsLoader};
pub use schema::{
    DEFAULT_PROPERTY_PREFIX, DEFAULT_SEPARATOR, LogFormat, LogLevel, LogOutput, LoggingSettings,
    ResolverSettings, SpanEventSettings,
};
