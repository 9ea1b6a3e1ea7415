//! Nested-pipeline wrapper.
//!
//! A [`PipelineWrapper`] makes an already constructed controller usable as a
//! single component of an outer pipeline. Besides its own bound configuration
//! it carries pipeline parameters: `component->parameter` keyed values that
//! are written before each run and restored afterwards.

use std::sync::Arc;

use modpipe_core::{
    ApplyError, BoxedComponent, Component, ComponentKey, ConfigError, ConfigInheritor,
    ConfigResult, ConfigSource, Controller, FeatureMap, ParamValue, ParameterRejection,
    PipelineResult, ResolvedConfiguration, SourceIdentity,
};
use modpipe_framework::{apply_params, merge_doc_features, propagate_inheritance};
use tracing::{debug, info, warn};

use crate::binding::ConfigBinding;
use crate::controller::CONFIG_FILE_PARAM;
use crate::resolver::ConfigResolver;

/// Separator between component and parameter in a pipeline parameter key.
pub const PIPELINE_PARAM_SEPARATOR: &str = "->";

#[derive(Debug, Clone, PartialEq)]
struct PipelineParam {
    component: String,
    parameter: String,
    value: ParamValue,
}

/// Parameter value saved before an override, restored after the run.
struct Saved {
    position: usize,
    parameter: String,
    value: ParamValue,
}

/// Wraps an inner controller as a component of an outer pipeline.
pub struct PipelineWrapper<C> {
    name: String,
    inner: C,
    binding: ConfigBinding,
    features: FeatureMap,
    params: Vec<PipelineParam>,
}

impl<C: Controller> PipelineWrapper<C> {
    pub fn new(name: impl Into<String>, inner: C, resolver: Arc<ConfigResolver>) -> Self {
        Self {
            name: name.into(),
            inner,
            binding: ConfigBinding::new(resolver, None),
            features: FeatureMap::new(),
            params: Vec::new(),
        }
    }

    /// Binds `source` before [`initialise`](Self::initialise) is called.
    pub fn with_source(self, source: ConfigSource) -> Self {
        let resolver = self.binding.resolver().clone();
        Self {
            binding: ConfigBinding::new(resolver, Some(source)),
            ..self
        }
    }

    /// Replaces the pipeline parameters.
    ///
    /// Keys have the form `component->parameter`; the parameter part may
    /// itself contain `->`. On a malformed key nothing is replaced.
    pub fn set_pipeline_parameters<K, I>(&mut self, params: I) -> ConfigResult<()>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, ParamValue)>,
    {
        let mut parsed = Vec::new();
        for (key, value) in params {
            let key = key.as_ref();
            let Some((component, parameter)) = key.split_once(PIPELINE_PARAM_SEPARATOR) else {
                return Err(ConfigError::syntax(
                    &self.name,
                    format!("not a pipeline parameter key (must be component->parameter): {key}"),
                ));
            };
            parsed.push(PipelineParam {
                component: component.to_string(),
                parameter: parameter.to_string(),
                value,
            });
        }
        self.params = parsed;
        Ok(())
    }

    /// The wrapper's own features, consulted last for `${name}` substitution.
    pub fn features(&self) -> &FeatureMap {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut FeatureMap {
        &mut self.features
    }

    /// Loads the configuration and forwards an inherited source.
    ///
    /// Returns the number of inner inheritors that re-resolved.
    pub fn initialise(&mut self) -> ConfigResult<usize> {
        let config = self.binding.load()?;
        self.forward_inheritance(&config)
    }

    /// Re-resolves the bound source.
    pub fn reload(&mut self) -> ConfigResult<usize> {
        let config = self.binding.reload()?;
        self.forward_inheritance(&config)
    }

    /// Binds a new source, re-resolving if the identity changed.
    pub fn set_config_source(&mut self, source: Option<ConfigSource>) -> ConfigResult<bool> {
        if !self.binding.set_source(source)? {
            return Ok(false);
        }
        let config = self.binding.snapshot();
        self.forward_inheritance(&config)?;
        Ok(true)
    }

    /// Runs the inner controller with pipeline parameters and configuration applied.
    ///
    /// String pipeline parameter values have `${name}` references replaced
    /// from `variables`, searched in order, then from the wrapper's own
    /// features. Every overridden parameter is restored once `run` returns,
    /// whether it succeeded or not.
    pub fn execute_with<R>(
        &mut self,
        document: Option<&mut FeatureMap>,
        variables: &[&FeatureMap],
        run: impl FnOnce(&mut C, Option<&mut FeatureMap>) -> PipelineResult<R>,
    ) -> PipelineResult<R> {
        debug!(pipeline = %self.name, controller = %self.inner.name(), "Running pipeline");
        let saved = self.apply_pipeline_params(variables)?;
        let result = self.apply_config_and_run(document, run);
        restore(self.inner.components_mut(), saved);
        result
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

    fn apply_config_and_run<R>(
        &mut self,
        document: Option<&mut FeatureMap>,
        run: impl FnOnce(&mut C, Option<&mut FeatureMap>) -> PipelineResult<R>,
    ) -> PipelineResult<R> {
        let own = self.binding.identity();
        let same_config = matches!(
            self.inner.as_inheritor(),
            Some(inner) if inner.config_identity() == own
        );
        if same_config {
            debug!(pipeline = %self.name, "Inner controller carries the same configuration, not applying");
            return run(&mut self.inner, document);
        }

        let config = self.binding.snapshot();
        apply_params(&config, &mut self.inner)?;
        let document = document.map(|features| {
            merge_doc_features(&config, features);
            features
        });
        run(&mut self.inner, document)
    }

    fn apply_pipeline_params(&mut self, variables: &[&FeatureMap]) -> PipelineResult<Vec<Saved>> {
        let mut saved = Vec::with_capacity(self.params.len());
        for param in &self.params {
            let Some(position) = self
                .inner
                .components()
                .iter()
                .position(|c| c.name() == param.component)
            else {
                warn!(
                    pipeline = %self.name,
                    component = %param.component,
                    parameter = %param.parameter,
                    "No such component, pipeline parameter ignored"
                );
                continue;
            };
            let component = &mut self.inner.components_mut()[position];
            let Some(old) = component.parameter(&param.parameter) else {
                warn!(
                    component = %param.component,
                    parameter = %param.parameter,
                    "Current value cannot be saved, pipeline parameter ignored"
                );
                continue;
            };

            let value = match &param.value {
                ParamValue::Str(text) => {
                    let mut maps = variables.to_vec();
                    maps.push(&self.features);
                    ParamValue::Str(substitute(text, &maps))
                }
                other => other.clone(),
            };
            debug!(
                component = %param.component,
                parameter = %param.parameter,
                value = %value,
                "Setting pipeline parameter"
            );
            if let Err(reason) = component.set_parameter(&param.parameter, &value) {
                let err = ApplyError::ParameterRejected {
                    parameter: param.parameter.clone(),
                    id: ComponentKey::new(self.inner.name(), &param.component).to_string(),
                    value: value.to_string(),
                    reason,
                };
                restore(self.inner.components_mut(), saved);
                return Err(err.into());
            }
            saved.push(Saved {
                position,
                parameter: param.parameter.clone(),
                value: old,
            });
        }
        Ok(saved)
    }

    fn forward_inheritance(&mut self, config: &ResolvedConfiguration) -> ConfigResult<usize> {
        let Some(source) = config.inherited_source() else {
            return Ok(0);
        };
        match self.inner.as_inheritor_mut() {
            Some(inner) => {
                let adopted = inner.adopt_config_source(source)?;
                if adopted {
                    info!(pipeline = %self.name, source = %source.identity(), "Inner controller adopted configuration");
                }
                Ok(usize::from(adopted))
            }
            None => propagate_inheritance(config, self.inner.components_mut()),
        }
    }
}

/// Writes saved values back, most recent first.
fn restore(components: &mut [BoxedComponent], saved: Vec<Saved>) {
    for entry in saved.into_iter().rev() {
        let Some(component) = components.get_mut(entry.position) else {
            continue;
        };
        if let Err(reason) = component.set_parameter(&entry.parameter, &entry.value) {
            warn!(
                component = %component.name(),
                parameter = %entry.parameter,
                reason = %reason,
                "Could not restore parameter"
            );
        }
    }
}

/// Replaces `${name}` references with the first value found in `maps`.
///
/// Unknown references and an unterminated `${` are kept as written.
fn substitute(text: &str, maps: &[&FeatureMap]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match maps.iter().find_map(|m| m.get(name)) {
            Some(value) => out.push_str(&value.to_string()),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

impl<C: Controller> Component for PipelineWrapper<C> {
    fn name(&self) -> &str {
        &self.name
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
        (name == CONFIG_FILE_PARAM).then(|| {
            self.binding
                .source()
                .and_then(|s| s.path().map(|p| ParamValue::Str(p.display().to_string())))
                .unwrap_or(ParamValue::Null)
        })
    }

    fn as_inheritor_mut(&mut self) -> Option<&mut dyn ConfigInheritor> {
        Some(self)
    }
}

impl<C: Controller> ConfigInheritor for PipelineWrapper<C> {
    fn config_identity(&self) -> Option<SourceIdentity> {
        self.binding.identity()
    }

    fn adopt_config_source(&mut self, source: &ConfigSource) -> ConfigResult<bool> {
        self.set_config_source(Some(source.clone()))
    }
}

impl<C: Controller> std::fmt::Debug for PipelineWrapper<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineWrapper")
            .field("name", &self.name)
            .field("controller", &self.inner.name())
            .field("binding", &self.binding)
            .field("params", &self.params.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use modpipe_core::{PipelineError, SourceFormat};
    use modpipe_framework::SerialController;

    use super::*;
    use crate::config::ResolverSettings;
    use crate::controller::ParametrizedController;
    use crate::test_support::Probe;

    fn resolver() -> Arc<ConfigResolver> {
        Arc::new(ConfigResolver::new(ResolverSettings::default()).unwrap())
    }

    fn yaml(text: &str) -> ConfigSource {
        ConfigSource::inline("test", SourceFormat::Yaml, text)
    }

    fn features(pairs: &[(&str, &str)]) -> FeatureMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), ParamValue::from(*v)))
            .collect()
    }

    #[test]
    fn test_substitute() {
        let corpus = features(&[("dir", "/data"), ("lang", "en")]);
        let own = features(&[("lang", "de"), ("suffix", "txt")]);
        let maps = [&corpus, &own];

        assert_eq!(substitute("${dir}/in.${suffix}", &maps), "/data/in.txt");
        assert_eq!(substitute("${lang}", &maps), "en");
        assert_eq!(substitute("${unknown}-x", &maps), "${unknown}-x");
        assert_eq!(substitute("open ${dir", &maps), "open ${dir");
        assert_eq!(substitute("plain", &maps), "plain");
    }

    #[test]
    fn test_pipeline_params_restored_after_run() {
        let tok = Probe::new("Tok").with("encoding", "latin1");
        let inner = SerialController::new("Inner").with_component(tok.clone());
        let mut wrapper = PipelineWrapper::new("sub", inner, resolver());
        wrapper.features_mut().insert("enc".into(), ParamValue::from("UTF-8"));
        wrapper
            .set_pipeline_parameters([
                ("Tok->encoding", ParamValue::from("${enc}")),
                ("Missing->x", ParamValue::from("1")),
                ("Tok->unset", ParamValue::from("1")),
            ])
            .unwrap();
        wrapper.initialise().unwrap();

        let during = wrapper
            .execute_with(None, &[], |_, _| Ok(tok.get("encoding")))
            .unwrap();
        assert_eq!(during, Some(ParamValue::from("UTF-8")));
        assert_eq!(tok.get("encoding"), Some(ParamValue::from("latin1")));
        assert_eq!(tok.get("unset"), None);

        let err = wrapper
            .execute_with(None, &[], |_, _| -> PipelineResult<()> {
                Err(PipelineError::execution("boom"))
            })
            .unwrap_err();
        assert!(matches!(err, PipelineError::Execution(_)));
        assert_eq!(tok.get("encoding"), Some(ParamValue::from("latin1")));
    }

    #[test]
    fn test_rejected_param_restores_earlier_ones() {
        let tok = Probe::new("Tok").with("a", "old").with("readonly", "fixed");
        let inner = SerialController::new("Inner").with_component(tok.clone());
        let mut wrapper = PipelineWrapper::new("sub", inner, resolver());
        wrapper
            .set_pipeline_parameters([
                ("Tok->a", ParamValue::from("new")),
                ("Tok->readonly", ParamValue::from("x")),
            ])
            .unwrap();
        wrapper.initialise().unwrap();

        let err = wrapper.execute_with(None, &[], |_, _| Ok(())).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Apply(ApplyError::ParameterRejected { ref parameter, .. }) if parameter == "readonly"
        ));
        assert_eq!(tok.get("a"), Some(ParamValue::from("old")));
    }

    #[test]
    fn test_malformed_key_rejected() {
        let mut wrapper = PipelineWrapper::new("sub", SerialController::new("Inner"), resolver());
        wrapper
            .set_pipeline_parameters([("Tok->a", ParamValue::from("1"))])
            .unwrap();
        let err = wrapper
            .set_pipeline_parameters([("Tok.a", ParamValue::from("1"))])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { .. }));
        assert_eq!(wrapper.params.len(), 1);
    }

    #[test]
    fn test_config_applied_unless_inner_shares_it() {
        let text = "- set: prparm\n  controller: Inner\n  prname: Tok\n  name: mode\n  value: fast\n\
                    - set: docfeature\n  name: seen\n  value: yes\n";
        let shared = yaml(text);

        let tok = Probe::new("Tok");
        let mut inner = ParametrizedController::new(
            SerialController::new("Inner").with_component(tok.clone()),
            resolver(),
        )
        .with_source(shared.clone());
        inner.initialise().unwrap();
        let mut wrapper = PipelineWrapper::new("sub", inner, resolver()).with_source(shared);
        wrapper.initialise().unwrap();

        let mut document = FeatureMap::new();
        wrapper
            .execute_with(Some(&mut document), &[], |_, _| Ok(()))
            .unwrap();
        assert_eq!(tok.get("mode"), None);
        assert!(document.is_empty());

        let tok = Probe::new("Tok");
        let inner = SerialController::new("Inner").with_component(tok.clone());
        let mut wrapper = PipelineWrapper::new("sub", inner, resolver()).with_source(yaml(text));
        wrapper.initialise().unwrap();
        wrapper
            .execute_with(Some(&mut document), &[], |_, _| Ok(()))
            .unwrap();
        assert_eq!(tok.get("mode"), Some(ParamValue::from("fast")));
        assert_eq!(document["seen"], ParamValue::from("yes"));
    }

    #[test]
    fn test_adoption_forwarded_to_inner() {
        let mut inner = ParametrizedController::new(SerialController::new("Inner"), resolver());
        inner.initialise().unwrap();
        let mut wrapper = PipelineWrapper::new("sub", inner, resolver());
        wrapper.initialise().unwrap();

        let parent = yaml("- set: inheritconfig\n");
        assert!(wrapper.adopt_config_source(&parent).unwrap());
        assert_eq!(wrapper.config_identity().as_ref(), Some(parent.identity()));
        assert_eq!(wrapper.inner().config_identity().as_ref(), Some(parent.identity()));

        assert!(!wrapper.adopt_config_source(&parent).unwrap());
        assert_eq!(wrapper.binding().reload_count(), 2);
        assert_eq!(wrapper.inner().binding().reload_count(), 2);
    }
}
