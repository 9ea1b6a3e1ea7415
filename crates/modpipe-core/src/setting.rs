//! Normalized configuration directives.
//!
//! Both source formats and the process-override scan produce the same
//! [`Setting`] records, which are then folded into a
//! [`ResolvedConfiguration`](crate::ResolvedConfiguration) in order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::ParamValue;

/// Reserved parameter name under which run-mode flags are stored.
///
/// Must never collide with a real component parameter name. This is a
/// documented constraint and is not checked.
pub const RUN_FLAG: &str = "$$RUNFLAG$$";

/// Separator used when a `(controller, component)` key is rendered as one id.
///
/// Controller and component names must not contain it.
pub const KEY_SEPARATOR: char = '\t';

/// Identifies a component by the controller that holds it and its own name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentKey {
    /// Name of the owning controller.
    pub controller: String,
    /// Name of the component within that controller.
    pub component: String,
}

impl ComponentKey {
    /// Creates a key.
    pub fn new(controller: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            component: component.into(),
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.controller, KEY_SEPARATOR, self.component)
    }
}

/// Whether a parameter override applies at instantiation or at every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamScope {
    /// Applied once, when the host creates the component.
    Init,
    /// Applied before every execution pass.
    Runtime,
}

/// One directive extracted from a configuration source.
#[derive(Debug, Clone, PartialEq)]
pub enum Setting {
    /// Set a named parameter on a component.
    Param {
        scope: ParamScope,
        key: ComponentKey,
        name: String,
        value: ParamValue,
    },
    /// Force a component to always or never run under a conditional controller.
    RunMode { key: ComponentKey, enabled: bool },
    /// Set a document feature.
    DocFeature {
        name: String,
        value: ParamValue,
        overridable: bool,
    },
    /// Set a process-wide property.
    PropertySet { name: String, value: String },
    /// Push this configuration's source down to nested sub-pipelines.
    InheritConfig,
}

impl Setting {
    /// Short discriminator name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Param {
                scope: ParamScope::Init,
                ..
            } => "prinit",
            Self::Param {
                scope: ParamScope::Runtime,
                ..
            } => "prparm",
            Self::RunMode { .. } => "prrun",
            Self::DocFeature { .. } => "docfeature",
            Self::PropertySet { .. } => "propset",
            Self::InheritConfig => "inheritconfig",
        }
    }
}
