//! Binding between a configuration source and its resolved configuration.
//!
//! Readers take an `Arc` snapshot and keep using it for as long as they need;
//! a reload builds a complete new configuration first and then replaces the
//! shared pointer in one step, so no reader ever sees a partial update.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, info};

use modpipe_core::{ConfigResult, ConfigSource, ResolvedConfiguration, SourceIdentity};

use crate::resolver::ConfigResolver;

/// A configuration source, its current resolution and the resolver that produced it.
pub struct ConfigBinding {
    resolver: Arc<ConfigResolver>,
    source: Mutex<Option<ConfigSource>>,
    current: ArcSwap<ResolvedConfiguration>,
    /// Serialises resolutions; `source` is only locked for reads and writes of the field.
    update: Mutex<()>,
    initialised: AtomicBool,
    reloads: AtomicUsize,
}

impl ConfigBinding {
    /// Creates an unloaded binding.
    pub fn new(resolver: Arc<ConfigResolver>, source: Option<ConfigSource>) -> Self {
        Self {
            resolver,
            source: Mutex::new(source),
            current: ArcSwap::from_pointee(ResolvedConfiguration::empty()),
            update: Mutex::new(()),
            initialised: AtomicBool::new(false),
            reloads: AtomicUsize::new(0),
        }
    }

    /// Resolves the bound source and marks the binding initialised.
    pub fn load(&self) -> ConfigResult<Arc<ResolvedConfiguration>> {
        let _update = self.update.lock();
        let config = self.resolve_and_swap(self.source().as_ref())?;
        self.initialised.store(true, Ordering::Release);
        Ok(config)
    }

    /// Re-resolves the bound source unconditionally.
    pub fn reload(&self) -> ConfigResult<Arc<ResolvedConfiguration>> {
        let _update = self.update.lock();
        self.resolve_and_swap(self.source().as_ref())
    }

    /// Binds a new source.
    ///
    /// Before [`load`](Self::load) the source is only recorded. Afterwards a
    /// source with the identity already bound is ignored, and any other source
    /// is resolved and replaces the current configuration. Clearing the
    /// source resets to an empty configuration. If resolution fails the old
    /// source and configuration stay in place.
    ///
    /// Returns `true` if the configuration was replaced.
    pub fn set_source(&self, source: Option<ConfigSource>) -> ConfigResult<bool> {
        let _update = self.update.lock();
        {
            let mut bound = self.source.lock();
            if *bound == source {
                debug!(source = ?source.as_ref().map(ConfigSource::identity), "Source unchanged, not reloading");
                return Ok(false);
            }
            if !self.is_initialised() {
                *bound = source;
                return Ok(false);
            }
        }
        self.resolve_and_swap(source.as_ref())?;
        *self.source.lock() = source;
        Ok(true)
    }

    /// The current configuration.
    pub fn snapshot(&self) -> Arc<ResolvedConfiguration> {
        self.current.load_full()
    }

    /// The bound source.
    pub fn source(&self) -> Option<ConfigSource> {
        self.source.lock().clone()
    }

    /// Identity of the bound source.
    pub fn identity(&self) -> Option<SourceIdentity> {
        self.source.lock().as_ref().map(|s| s.identity().clone())
    }

    pub fn resolver(&self) -> &Arc<ConfigResolver> {
        &self.resolver
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised.load(Ordering::Acquire)
    }

    /// Number of completed resolutions.
    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::Relaxed)
    }

    fn resolve_and_swap(&self, source: Option<&ConfigSource>) -> ConfigResult<Arc<ResolvedConfiguration>> {
        let config = Arc::new(self.resolver.resolve(source)?);
        self.current.store(config.clone());
        let count = self.reloads.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            source = ?source.map(ConfigSource::identity),
            reloads = count,
            "Configuration replaced"
        );
        Ok(config)
    }
}

impl std::fmt::Debug for ConfigBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigBinding")
            .field("source", &self.identity())
            .field("initialised", &self.is_initialised())
            .field("reloads", &self.reload_count())
            .finish()
    }
}
