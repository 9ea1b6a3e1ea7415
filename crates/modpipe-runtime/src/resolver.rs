//! Resolution of a configuration source into a [`ResolvedConfiguration`].
//!
//! Order of application:
//!
//! 1. If the settings name a `config_file`, it replaces the requested source.
//! 2. The source is parsed and its settings folded in source order.
//! 3. `propset` values are layered over a copy of the property store.
//! 4. Process overrides from that store are folded in last.
//!
//! Any failure aborts the resolution; no partial configuration is returned.

use std::borrow::Cow;

use modpipe_core::{ConfigResult, ConfigSource, ResolvedConfiguration, Setting};
use tracing::{debug, info};

use crate::config::{ResolverSettings, SettingsLoader};
use crate::overrides::{OverrideKeys, merge_process_overrides};
use crate::parser::parse_source;
use crate::store::PropertyStore;

/// Resolves configuration sources against a property store.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    settings: ResolverSettings,
    properties: PropertyStore,
}

impl ConfigResolver {
    /// Creates a resolver with an empty property store.
    pub fn new(settings: ResolverSettings) -> ConfigResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            properties: PropertyStore::new(),
        })
    }

    /// Creates a resolver from loaded settings and the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        let settings = SettingsLoader::new().load()?;
        Ok(Self {
            settings,
            properties: PropertyStore::from_env(),
        })
    }

    /// Replaces the property store.
    pub fn with_properties(mut self, properties: PropertyStore) -> Self {
        self.properties = properties;
        self
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    /// The source that would actually be read for `requested`.
    pub fn effective_source(&self, requested: Option<&ConfigSource>) -> ConfigResult<Option<ConfigSource>> {
        match &self.settings.config_file {
            Some(path) => {
                let source = ConfigSource::file(path)?;
                debug!(path = %path.display(), "Config file override replaces requested source");
                Ok(Some(source))
            }
            None => Ok(requested.cloned()),
        }
    }

    /// Resolves `source`. `None` yields a configuration holding only process overrides.
    pub fn resolve(&self, source: Option<&ConfigSource>) -> ConfigResult<ResolvedConfiguration> {
        let source = self.effective_source(source)?;
        let settings = match &source {
            Some(source) => parse_source(source)?,
            None => Vec::new(),
        };

        let properties = self.layer_property_sets(&settings);
        let mut assembler = ResolvedConfiguration::assemble(source.as_ref());
        assembler.extend(settings);
        merge_process_overrides(
            &mut assembler,
            &properties,
            OverrideKeys {
                prefix: &self.settings.property_prefix,
                separator: &self.settings.separator,
            },
        )?;
        let config = assembler.build();

        info!(config = %config, "Configuration resolved");
        Ok(config)
    }

    fn layer_property_sets(&self, settings: &[Setting]) -> Cow<'_, PropertyStore> {
        if !self.settings.apply_property_sets {
            return Cow::Borrowed(&self.properties);
        }
        let mut sets = settings
            .iter()
            .filter_map(|s| match s {
                Setting::PropertySet { name, value } => Some((name.clone(), value.clone())),
                _ => None,
            })
            .peekable();
        if sets.peek().is_none() {
            return Cow::Borrowed(&self.properties);
        }
        let mut layered = self.properties.clone();
        layered.extend(sets);
        Cow::Owned(layered)
    }
}
