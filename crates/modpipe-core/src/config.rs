//! The resolved configuration and its assembler.
//!
//! A [`ResolvedConfiguration`] is built once by folding [`Setting`]s into a
//! [`ConfigAssembler`] in source order, then published behind an `Arc`. It is
//! never patched afterwards: a reload produces a new value that replaces the
//! old one wholesale.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::setting::{ComponentKey, ParamScope, RUN_FLAG, Setting};
use crate::source::{ConfigSource, SourceIdentity};
use crate::value::{FeatureMap, ParamMap, ParamValue};

/// Authoritative configuration for one controller and its nested pipelines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfiguration {
    source_identity: Option<SourceIdentity>,
    doc_features: FeatureMap,
    doc_feature_overridable: HashMap<String, bool>,
    runtime_params: HashMap<ComponentKey, ParamMap>,
    init_params: HashMap<ComponentKey, ParamMap>,
    inherited_source: Option<ConfigSource>,
    property_sets: Vec<(String, String)>,
}

impl ResolvedConfiguration {
    /// An empty configuration with no source.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Starts assembling a configuration for the given source.
    pub fn assemble(source: Option<&ConfigSource>) -> ConfigAssembler {
        ConfigAssembler::new(source)
    }

    /// Identity of the source this configuration was resolved from.
    pub fn source_identity(&self) -> Option<&SourceIdentity> {
        self.source_identity.as_ref()
    }

    /// Document feature values.
    pub fn doc_features(&self) -> &FeatureMap {
        &self.doc_features
    }

    /// Whether an existing document value for `name` may be replaced.
    ///
    /// Defaults to `true` when no policy was configured.
    pub fn is_overridable(&self, name: &str) -> bool {
        self.doc_feature_overridable
            .get(name)
            .copied()
            .unwrap_or(true)
    }

    /// Runtime parameter overrides, including run-mode flags under [`RUN_FLAG`].
    pub fn runtime_params(&self) -> &HashMap<ComponentKey, ParamMap> {
        &self.runtime_params
    }

    /// Init-time parameter overrides.
    pub fn init_params(&self) -> &HashMap<ComponentKey, ParamMap> {
        &self.init_params
    }

    /// Source to hand down to nested sub-pipelines, if inheritance was requested.
    pub fn inherited_source(&self) -> Option<&ConfigSource> {
        self.inherited_source.as_ref()
    }

    /// Property sets declared by the source, in source order.
    pub fn property_sets(&self) -> &[(String, String)] {
        &self.property_sets
    }

    /// Returns `true` if the configuration carries no settings at all.
    pub fn is_empty(&self) -> bool {
        self.doc_features.is_empty()
            && self.runtime_params.is_empty()
            && self.init_params.is_empty()
            && self.inherited_source.is_none()
            && self.property_sets.is_empty()
    }
}

impl fmt::Display for ResolvedConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source_identity {
            Some(id) => write!(f, "source={id}")?,
            None => f.write_str("source=(none)")?,
        }
        let mut features: Vec<_> = self.doc_features.keys().map(String::as_str).collect();
        features.sort_unstable();
        write!(
            f,
            "; docFeatures=[{}]; runtimeParms={} component(s); initParms={} component(s)",
            features.join(", "),
            self.runtime_params.len(),
            self.init_params.len()
        )?;
        if let Some(inherited) = &self.inherited_source {
            write!(f, "; inherit={}", inherited.identity())?;
        }
        Ok(())
    }
}

/// Folds settings into a [`ResolvedConfiguration`].
///
/// Later settings for the same key overwrite earlier ones; settings for the
/// same `(controller, component)` pair merge into one parameter map.
#[derive(Debug)]
pub struct ConfigAssembler {
    source: Option<ConfigSource>,
    config: ResolvedConfiguration,
}

impl ConfigAssembler {
    fn new(source: Option<&ConfigSource>) -> Self {
        Self {
            source: source.cloned(),
            config: ResolvedConfiguration {
                source_identity: source.map(|s| s.identity().clone()),
                ..ResolvedConfiguration::default()
            },
        }
    }

    /// Folds one setting.
    pub fn apply(&mut self, setting: Setting) -> &mut Self {
        trace!(kind = setting.kind(), "Folding setting");
        match setting {
            Setting::Param {
                scope,
                key,
                name,
                value,
            } => {
                let map = match scope {
                    ParamScope::Runtime => &mut self.config.runtime_params,
                    ParamScope::Init => &mut self.config.init_params,
                };
                map.entry(key).or_default().insert(name, value);
            }
            Setting::RunMode { key, enabled } => {
                self.config
                    .runtime_params
                    .entry(key)
                    .or_default()
                    .insert(RUN_FLAG.to_string(), ParamValue::Bool(enabled));
            }
            Setting::DocFeature {
                name,
                value,
                overridable,
            } => {
                self.config
                    .doc_feature_overridable
                    .insert(name.clone(), overridable);
                self.config.doc_features.insert(name, value);
            }
            Setting::PropertySet { name, value } => {
                self.config.property_sets.push((name, value));
            }
            Setting::InheritConfig => {
                self.config.inherited_source = self.source.clone();
            }
        }
        self
    }

    /// Folds every setting in order.
    pub fn extend(&mut self, settings: impl IntoIterator<Item = Setting>) -> &mut Self {
        for setting in settings {
            self.apply(setting);
        }
        self
    }

    /// Finishes assembly.
    pub fn build(self) -> ResolvedConfiguration {
        self.config
    }
}
