//! A host controller carrying its own configuration.

use std::sync::Arc;

use modpipe_core::{
    BoxedComponent, Component, ConfigInheritor, ConfigResult, ConfigSource, Controller, FeatureMap,
    ParamValue, ParameterRejection, PipelineResult, ResolvedConfiguration, RunMode, SourceIdentity,
};
use modpipe_framework::{apply_params, merge_doc_features, propagate_inheritance};
use tracing::debug;

use crate::binding::ConfigBinding;
use crate::resolver::ConfigResolver;

/// Name of the parameter through which a parent sets the configuration file.
pub const CONFIG_FILE_PARAM: &str = "configFile";

/// Wraps a host [`Controller`] and applies its bound configuration on every execution.
pub struct ParametrizedController<C> {
    inner: C,
    binding: ConfigBinding,
}

impl<C: Controller> ParametrizedController<C> {
    pub fn new(inner: C, resolver: Arc<ConfigResolver>) -> Self {
        Self {
            inner,
            binding: ConfigBinding::new(resolver, None),
        }
    }

    /// Binds `source` before [`initialise`](Self::initialise) is called.
    pub fn with_source(self, source: ConfigSource) -> Self {
        let resolver = self.binding.resolver().clone();
        Self {
            inner: self.inner,
            binding: ConfigBinding::new(resolver, Some(source)),
        }
    }

    /// Loads the configuration and hands an inherited source to the direct children.
    ///
    /// Returns the number of children that re-resolved.
    pub fn initialise(&mut self) -> ConfigResult<usize> {
        let config = self.binding.load()?;
        self.propagate(&config)
    }

    /// Re-resolves the bound source, then propagates as in [`initialise`](Self::initialise).
    pub fn reload(&mut self) -> ConfigResult<usize> {
        let config = self.binding.reload()?;
        self.propagate(&config)
    }

    /// Binds a new source, re-resolving if the owner is initialised and the identity changed.
    ///
    /// Returns `true` if the configuration was replaced.
    pub fn set_config_source(&mut self, source: Option<ConfigSource>) -> ConfigResult<bool> {
        if !self.binding.set_source(source)? {
            return Ok(false);
        }
        let config = self.binding.snapshot();
        self.propagate(&config)?;
        Ok(true)
    }

    /// Applies the current configuration and runs the inner controller.
    ///
    /// Runtime parameters and run modes are written first. Document features
    /// are merged into `document` when one is supplied. `run` is the host's
    /// own execution of the inner controller.
    pub fn execute_with<R>(
        &mut self,
        document: Option<&mut FeatureMap>,
        run: impl FnOnce(&mut C, Option<&mut FeatureMap>) -> PipelineResult<R>,
    ) -> PipelineResult<R> {
        let config = self.binding.snapshot();
        debug!(controller = %self.inner.name(), "Applying configuration before execution");
        apply_params(&config, &mut self.inner)?;
        let document = document.map(|features| {
            merge_doc_features(&config, features);
            features
        });
        run(&mut self.inner, document)
    }

    /// The current configuration.
    pub fn config(&self) -> Arc<ResolvedConfiguration> {
        self.binding.snapshot()
    }

    pub fn binding(&self) -> &ConfigBinding {
        &self.binding
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn propagate(&mut self, config: &ResolvedConfiguration) -> ConfigResult<usize> {
        propagate_inheritance(config, self.inner.components_mut())
    }
}

impl<C: Controller> Component for ParametrizedController<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> Result<(), ParameterRejection> {
        if name != CONFIG_FILE_PARAM {
            return Err(ParameterRejection::new(format!("no parameter named {name}")));
        }
        let source = match value {
            ParamValue::Null => None,
            ParamValue::Str(path) => {
                Some(ConfigSource::file(path).map_err(|e| ParameterRejection::new(e.to_string()))?)
            }
            other => {
                return Err(ParameterRejection::new(format!("expected a path, got {other}")));
            }
        };
        self.set_config_source(source)
            .map(|_| ())
            .map_err(|e| ParameterRejection::new(e.to_string()))
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        if name != CONFIG_FILE_PARAM {
            return None;
        }
        let value = self
            .binding
            .source()
            .and_then(|s| s.path().map(|p| ParamValue::Str(p.display().to_string())))
            .unwrap_or(ParamValue::Null);
        Some(value)
    }

    fn as_inheritor_mut(&mut self) -> Option<&mut dyn ConfigInheritor> {
        Some(self)
    }
}

impl<C: Controller> Controller for ParametrizedController<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn components(&self) -> &[BoxedComponent] {
        self.inner.components()
    }

    fn components_mut(&mut self) -> &mut [BoxedComponent] {
        self.inner.components_mut()
    }

    fn run_mode_mut(&mut self, index: usize) -> Option<&mut RunMode> {
        self.inner.run_mode_mut(index)
    }

    fn as_inheritor(&self) -> Option<&dyn ConfigInheritor> {
        Some(self)
    }

    fn as_inheritor_mut(&mut self) -> Option<&mut dyn ConfigInheritor> {
        Some(self)
    }
}

impl<C: Controller> ConfigInheritor for ParametrizedController<C> {
    fn config_identity(&self) -> Option<SourceIdentity> {
        self.binding.identity()
    }

    fn adopt_config_source(&mut self, source: &ConfigSource) -> ConfigResult<bool> {
        self.set_config_source(Some(source.clone()))
    }
}

impl<C: Controller> std::fmt::Debug for ParametrizedController<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParametrizedController")
            .field("controller", &self.inner.name())
            .field("binding", &self.binding)
            .finish()
    }
}
