//! Host component tree boundary.
//!
//! The engine never owns components; it sees the host's pipeline through the
//! traits below. A controller exposes its live, ordered components and, if it
//! runs conditionally, a mutable run mode per position. Components that can
//! host a configuration of their own (nested parametrized controllers and
//! sub-pipeline wrappers) advertise it through [`Component::as_inheritor_mut`].

use serde::{Deserialize, Serialize};

use crate::error::{ConfigResult, ParameterRejection};
use crate::source::{ConfigSource, SourceIdentity};
use crate::value::ParamValue;

// =============================================================================
// Run Mode
// =============================================================================

/// Whether a component under a conditional controller executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Always run.
    #[default]
    Always,
    /// Never run.
    Never,
    /// Run only if the host's condition holds.
    Conditional,
}

impl RunMode {
    /// Maps a run flag onto a fixed mode.
    pub fn from_flag(enabled: bool) -> Self {
        if enabled { Self::Always } else { Self::Never }
    }
}

// =============================================================================
// Components
// =============================================================================

/// An individual processing unit with settable named parameters.
pub trait Component: Send {
    /// Name of the component, unique within its controller.
    fn name(&self) -> &str;

    /// Sets a named parameter.
    ///
    /// Returns a rejection if the name is unknown or the value has the wrong type.
    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> Result<(), ParameterRejection>;

    /// Reads a named parameter, if the component exposes it.
    fn parameter(&self, _name: &str) -> Option<ParamValue> {
        None
    }

    /// Returns this component as a configuration inheritor, if it is one.
    fn as_inheritor_mut(&mut self) -> Option<&mut dyn ConfigInheritor> {
        None
    }
}

/// Boxed component.
pub type BoxedComponent = Box<dyn Component>;

// =============================================================================
// Controllers
// =============================================================================

/// A named, ordered grouping of components.
pub trait Controller: Send {
    /// Name of the controller.
    fn name(&self) -> &str;

    /// Live components in execution order.
    fn components(&self) -> &[BoxedComponent];

    /// Live components in execution order, mutably.
    fn components_mut(&mut self) -> &mut [BoxedComponent];

    /// Run mode for the component at `index`.
    ///
    /// Returns `None` if the controller does not run conditionally.
    fn run_mode_mut(&mut self, _index: usize) -> Option<&mut RunMode> {
        None
    }

    /// Returns this controller as a configuration inheritor, if it carries a configuration.
    fn as_inheritor(&self) -> Option<&dyn ConfigInheritor> {
        None
    }

    /// Mutable form of [`Controller::as_inheritor`].
    fn as_inheritor_mut(&mut self) -> Option<&mut dyn ConfigInheritor> {
        None
    }
}

// =============================================================================
// Configuration Inheritance
// =============================================================================

/// Capability of a component that can adopt a configuration source.
pub trait ConfigInheritor {
    /// Identity of the currently bound configuration source, if any.
    fn config_identity(&self) -> Option<SourceIdentity>;

    /// Adopts `source` as this component's configuration source.
    ///
    /// Implementations skip re-resolution when `source` has the identity that
    /// is already loaded. Returns `true` if the configuration was re-resolved.
    fn adopt_config_source(&mut self, source: &ConfigSource) -> ConfigResult<bool>;
}
