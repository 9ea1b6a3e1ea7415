//! Modpipe Runtime - configuration resolution and parametrized pipelines.
//!
//! This crate provides:
//! - Source parsers for YAML setting records and flat property files (`parser`)
//! - The process property store and its override convention (`store`, `overrides`)
//! - [`ConfigResolver`], which turns a source into a `ResolvedConfiguration`
//! - [`ConfigBinding`], a source bound to its current resolution with atomic replacement
//! - [`ParametrizedController`] and [`PipelineWrapper`], the host-facing participants
//! - Engine settings loading (`config`) and logging setup (`logging`)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use modpipe_core::{ConfigSource, FeatureMap};
//! use modpipe_framework::SerialController;
//! use modpipe_runtime::{ConfigResolver, ParametrizedController};
//!
//! let resolver = Arc::new(ConfigResolver::from_env()?);
//! let mut pipeline = ParametrizedController::new(SerialController::new("Main"), resolver)
//!     .with_source(ConfigSource::file("pipeline.yaml")?);
//! pipeline.initialise()?;
//!
//! let mut document = FeatureMap::new();
//! pipeline.execute_with(Some(&mut document), |controller, document| {
//!     // run the host controller here
//!     Ok(())
//! })?;
//! ```

pub mod binding;
pub mod config;
pub mod controller;
pub mod logging;
pub mod overrides;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod store;

#[cfg(test)]
mod test_support;

// Re-exports
pub use binding::ConfigBinding;
pub use config::{LoggingSettings, ResolverSettings, SettingsLoader};
pub use controller::{CONFIG_FILE_PARAM, ParametrizedController};
pub use logging::{LoggingBuilder, SpanEvents};
pub use overrides::{OverrideKeys, merge_process_overrides, scan_overrides};
pub use parser::{parse_properties, parse_source, parse_text, parse_yaml};
pub use pipeline::{PIPELINE_PARAM_SEPARATOR, PipelineWrapper};
pub use resolver::ConfigResolver;
pub use store::PropertyStore;
