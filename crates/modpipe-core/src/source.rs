//! Configuration sources and their canonical identities.
//!
//! A [`SourceIdentity`] is computed once, when the [`ConfigSource`] is
//! created, and is the only thing compared when deciding whether a
//! configuration needs to be re-resolved. File sources are identified by
//! their canonical path, so relative paths and symbolic links to the same
//! file compare equal. Inline sources are identified by a SHA-256 digest of
//! their format and text.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::error::{ConfigError, ConfigResult};

/// Syntax of a configuration source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// A YAML list of setting records.
    Yaml,
    /// Flat `key=value` property lines.
    Properties,
}

impl SourceFormat {
    /// Selects the format from a file extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("properties") => Ok(Self::Properties),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Properties => "properties",
        }
    }
}

/// Canonical token identifying where a configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceIdentity {
    /// Canonicalized absolute path of a configuration file.
    File(PathBuf),
    /// Hex SHA-256 digest of an inline source.
    Digest(String),
}

impl fmt::Display for SourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Digest(hex) => write!(f, "sha256:{hex}"),
        }
    }
}

#[derive(Debug, Clone)]
enum Origin {
    File(PathBuf),
    Inline { name: String, text: Arc<str> },
}

/// A readable configuration source with a precomputed identity.
///
/// Equality compares identities only.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    identity: SourceIdentity,
    format: SourceFormat,
    origin: Origin,
}

impl ConfigSource {
    /// Creates a source for a file, canonicalizing its path.
    ///
    /// Fails if the extension is unsupported or the file does not exist.
    pub fn file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let format = SourceFormat::from_path(path)?;
        let canonical = std::fs::canonicalize(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.to_path_buf())
            } else {
                ConfigError::io(path, &e)
            }
        })?;

        Ok(Self {
            identity: SourceIdentity::File(canonical.clone()),
            format,
            origin: Origin::File(canonical),
        })
    }

    /// Creates a source from in-memory text.
    pub fn inline(name: impl Into<String>, format: SourceFormat, text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let mut hasher = Sha256::new();
        hasher.update(format.tag().as_bytes());
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        let digest = hex::encode(hasher.finalize());

        Self {
            identity: SourceIdentity::Digest(digest),
            format,
            origin: Origin::Inline {
                name: name.into(),
                text,
            },
        }
    }

    /// Returns the canonical identity.
    pub fn identity(&self) -> &SourceIdentity {
        &self.identity
    }

    /// Returns the source syntax.
    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// Returns the canonical path for file sources.
    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            Origin::File(path) => Some(path),
            Origin::Inline { .. } => None,
        }
    }

    /// Human-readable name used in error messages.
    pub fn name(&self) -> String {
        match &self.origin {
            Origin::File(path) => path.display().to_string(),
            Origin::Inline { name, .. } => name.clone(),
        }
    }

    /// Reads the full source text.
    pub fn read_text(&self) -> ConfigResult<Cow<'_, str>> {
        match &self.origin {
            Origin::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|e| ConfigError::io(path, &e)),
            Origin::Inline { text, .. } => Ok(Cow::Borrowed(text)),
        }
    }
}

impl PartialEq for ConfigSource {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for ConfigSource {}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
