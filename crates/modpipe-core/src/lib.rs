//! # Modpipe Core
//!
//! Data model and host contracts for the modular pipeline configuration engine.
//!
//! This crate holds everything the other layers share:
//! - **Values**: [`ParamValue`], [`FeatureMap`], [`ParamMap`]
//! - **Settings**: the normalized [`Setting`] directive and its [`ComponentKey`]
//! - **Sources**: [`ConfigSource`] with a canonical [`SourceIdentity`]
//! - **Configuration**: the immutable [`ResolvedConfiguration`] and its [`ConfigAssembler`]
//! - **Host tree**: the [`Component`], [`Controller`] and [`ConfigInheritor`] traits
//! - **Errors**: [`ConfigError`], [`ApplyError`], [`PipelineError`]
//!
//! ## Data Flow
//!
//! ```text
//! ConfigSource ──parse──▶ [Setting] ──fold──▶ ResolvedConfiguration
//!                                                  │
//!                         ┌────────────────────────┼────────────────────┐
//!                         ▼                        ▼                    ▼
//!                  apply to Controller    merge into FeatureMap   hand down to children
//! ```

pub mod config;
pub mod error;
pub mod setting;
pub mod source;
pub mod tree;
pub mod value;

pub use config::{ConfigAssembler, ResolvedConfiguration};
pub use error::{
    ApplyError, ApplyResult, ConfigError, ConfigResult, ParameterRejection, PipelineError,
    PipelineResult,
};
pub use setting::{ComponentKey, KEY_SEPARATOR, ParamScope, RUN_FLAG, Setting};
pub use source::{ConfigSource, SourceFormat, SourceIdentity};
pub use tree::{BoxedComponent, Component, ConfigInheritor, Controller, RunMode};
pub use value::{FeatureMap, OpaqueRef, ParamMap, ParamValue};
