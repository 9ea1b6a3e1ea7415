//! # Modpipe
//!
//! Configuration-driven parametrization of modular document-processing pipelines.
//!
//! ## Overview
//!
//! A pipeline is a tree of controllers and components owned by the host. Modpipe
//! configures that tree from external files instead of hard-wired values: it
//! resolves a configuration source together with process-wide overrides into a
//! single read-only configuration, pushes runtime parameters and run modes onto
//! a controller before each execution, merges document features, and hands an
//! inherited configuration down to nested pipelines.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌───────────────────────┐
//! │ ConfigSource │──▶│  ConfigResolver  │──▶│ ResolvedConfiguration │
//! │ yaml / props │   │ + PropertyStore  │   │     (Arc snapshot)    │
//! └──────────────┘   └──────────────────┘   └───────────┬───────────┘
//!                                                       │
//!               ┌───────────────────┬───────────────────┼──────────────────────┐
//!               ▼                   ▼                   ▼                      ▼
//!        apply_params      merge_doc_features   propagate_inheritance   init_overrides
//!        (Controller)        (FeatureMap)       (nested pipelines)      (host loader)
//! ```
//!
//! - **Core**: data model, host-tree traits, errors
//! - **Framework**: the operations on a live tree
//! - **Runtime**: parsing, resolution, bindings, the parametrized controller and
//!   pipeline wrapper, settings and logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use modpipe::prelude::*;
//!
//! fn main() -> Result<(), PipelineError> {
//!     let settings = SettingsLoader::new().load()?;
//!     init_from_settings(&settings.logging);
//!
//!     let resolver = Arc::new(ConfigResolver::new(settings)?.with_properties(PropertyStore::from_env()));
//!     let controller = SerialController::new("Main").with_component(MyTokenizer::default());
//!     let mut pipeline = ParametrizedController::new(controller, resolver)
//!         .with_source(ConfigSource::file("pipeline.yaml")?);
//!     pipeline.initialise()?;
//!
//!     let mut document = FeatureMap::new();
//!     pipeline.execute_with(Some(&mut document), |controller, document| {
//!         run_host_controller(controller, document)
//!     })
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML engine settings files (default)
//! - `yaml-config`: YAML engine settings files
//! - `json-log`: JSON log output

pub use modpipe_core as core;
pub use modpipe_framework as framework;
pub use modpipe_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use modpipe::prelude::*;
/// ```
pub mod prelude {
    // Data model
    pub use modpipe_core::{
        ComponentKey, ConfigSource, FeatureMap, ParamMap, ParamValue, ResolvedConfiguration,
        SourceFormat, SourceIdentity,
    };

    // Host tree contracts
    pub use modpipe_core::{
        BoxedComponent, Component, ConfigInheritor, Controller, ParameterRejection, RunMode,
    };

    // Errors
    pub use modpipe_core::{
        ApplyError, ApplyResult, ConfigError, ConfigResult, PipelineError, PipelineResult,
    };

    // Engine operations
    pub use modpipe_framework::{
        SerialController, apply_init_params, apply_params, init_overrides, merge_doc_features,
        propagate_inheritance,
    };

    // Resolution and pipelines
    pub use modpipe_runtime::logging::init_from_settings;
    pub use modpipe_runtime::{
        ConfigBinding, ConfigResolver, LoggingBuilder, ParametrizedController, PipelineWrapper,
        PropertyStore, ResolverSettings, SettingsLoader,
    };
}
