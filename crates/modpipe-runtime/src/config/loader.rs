//! Resolver settings loader using figment.
//!
//! # Settings Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Settings file (`modpipe.toml` / `modpipe.yaml`, or an explicit path)
//! 3. Environment variables (`MODPIPE_*`)
//! 4. Programmatic overrides
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: enables TOML settings files
//! - `yaml-config`: enables YAML settings files
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `MODPIPE_` prefix with `__` as the nesting separator:
//!
//! - `MODPIPE_PROPERTY_PREFIX=myprefix.` → `property_prefix = "myprefix."`
//! - `MODPIPE_SEPARATOR=/` → `separator = "/"`
//! - `MODPIPE_CONFIG_FILE=/etc/pipeline.yaml` → `config_file = "/etc/pipeline.yaml"`
//! - `MODPIPE_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//!
//! # Example
//!
//! ```rust,ignore
//! use modpipe_runtime::config::SettingsLoader;
//!
//! let settings = SettingsLoader::new()
//!     .file("./modpipe.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace};

use super::schema::ResolverSettings;
use modpipe_core::{ConfigError, ConfigResult};

/// Prefix of environment variables read by [`SettingsLoader`].
pub const ENV_PREFIX: &str = "MODPIPE_";

/// Settings file names searched in the current directory when no file is given.
const DEFAULT_FILES: &[&str] = &["modpipe.toml", "modpipe.yaml", "modpipe.yml"];

/// Loader for [`ResolverSettings`] with figment-based multi-source support.
pub struct SettingsLoader {
    /// Programmatic overrides.
    figment: Figment,
    /// Whether to load environment variables.
    load_env: bool,
    /// Specific settings file (overrides search).
    settings_file: Option<PathBuf>,
    /// Directory searched for default file names.
    search_dir: Option<PathBuf>,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    /// Creates a loader that reads the current directory and the environment.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            load_env: true,
            settings_file: None,
            search_dir: None,
        }
    }

    /// Sets a specific settings file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.settings_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Searches `dir` instead of the current directory for default file names.
    pub fn search_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.search_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges settings programmatically, above every other source.
    pub fn merge(mut self, settings: ResolverSettings) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(settings));
        self
    }

    /// Loads, validates and returns the settings.
    pub fn load(self) -> ConfigResult<ResolverSettings> {
        let figment = self.build_figment()?;

        let settings: ResolverSettings = figment
            .extract()
            .map_err(|e| ConfigError::Settings(format!("failed to extract settings: {e}")))?;
        settings.validate()?;

        debug!(
            property_prefix = %settings.property_prefix,
            separator = %settings.separator,
            logging_level = %settings.logging.level,
            "Resolver settings loaded"
        );
        Ok(settings)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(ResolverSettings::default()));

        if let Some(path) = self.settings_file.take() {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading settings file");
            figment = Self::merge_settings_file(figment, &path)?;
        } else {
            figment = self.search_settings_files(figment)?;
        }

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        let overrides = std::mem::take(&mut self.figment);
        Ok(figment.merge(overrides))
    }

    /// Merges one settings file, dispatching on its extension.
    ///
    /// Only extensions enabled via feature flags are accepted.
    fn merge_settings_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(ConfigError::Settings(format!(
                "unsupported or disabled settings file format: .{ext}"
            ))),
        }
    }

    fn search_settings_files(&self, mut figment: Figment) -> ConfigResult<Figment> {
        let dir = match &self.search_dir {
            Some(dir) => dir.clone(),
            None => match std::env::current_dir() {
                Ok(dir) => dir,
                Err(_) => return Ok(figment),
            },
        };
        for name in DEFAULT_FILES {
            let path = dir.join(name);
            if !path.exists() {
                continue;
            }
            match Self::merge_settings_file(figment.clone(), &path) {
                Ok(merged) => {
                    info!(path = %path.display(), "Loading settings file");
                    figment = merged;
                }
                Err(_) => trace!(path = %path.display(), "Settings format disabled, skipped"),
            }
        }
        Ok(figment)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_defaults_without_env() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsLoader::new()
            .search_dir(dir.path())
            .without_env()
            .load()
            .unwrap();
        assert_eq!(settings, ResolverSettings::default());
    }

    #[test]
    fn test_env_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("MODPIPE_PROPERTY_PREFIX", "pipes.");
            jail.set_env("MODPIPE_SEPARATOR", "/");
            jail.set_env("MODPIPE_LOGGING__LEVEL", "debug");
            jail.set_env("MODPIPE_CONFIG_FILE", "/etc/pipeline.yaml");

            let settings = SettingsLoader::new().load().map_err(|e| e.to_string())?;
            assert_eq!(settings.property_prefix, "pipes.");
            assert_eq!(settings.separator, "/");
            assert_eq!(settings.logging.level, LogLevel::Debug);
            assert_eq!(settings.config_file, Some(PathBuf::from("/etc/pipeline.yaml")));
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_file_then_env_then_merge() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "modpipe.toml",
                r#"
                property_prefix = "fromfile."
                separator = ":"
                apply_property_sets = false
                "#,
            )?;
            jail.set_env("MODPIPE_SEPARATOR", "/");

            let settings = SettingsLoader::new().load().map_err(|e| e.to_string())?;
            assert_eq!(settings.property_prefix, "fromfile.");
            assert_eq!(settings.separator, "/");
            assert!(!settings.apply_property_sets);

            let merged = SettingsLoader::new()
                .merge(ResolverSettings {
                    separator: "#".into(),
                    ..ResolverSettings::default()
                })
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(merged.separator, "#");
            Ok(())
        });
    }

    #[test]
    fn test_empty_prefix_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("MODPIPE_PROPERTY_PREFIX", "");
            let err = SettingsLoader::new().load().unwrap_err();
            assert!(matches!(err, ConfigError::Settings(_)));
            Ok(())
        });
    }

    #[test]
    fn test_missing_settings_file() {
        let err = SettingsLoader::new()
            .file("/nonexistent/modpipe.toml")
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
