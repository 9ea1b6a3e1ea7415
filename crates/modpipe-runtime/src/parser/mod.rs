//! Configuration source parsers.
//!
//! Both formats produce the same ordered list of [`Setting`]s.

pub mod properties;
pub mod yaml;

use modpipe_core::{ConfigResult, ConfigSource, Setting, SourceFormat};
use tracing::debug;

pub use properties::{parse_properties, read_properties};
pub use yaml::parse_yaml;

/// Parses raw text in the given format.
pub fn parse_text(text: &str, format: SourceFormat, source_name: &str) -> ConfigResult<Vec<Setting>> {
    match format {
        SourceFormat::Yaml => parse_yaml(text, source_name),
        SourceFormat::Properties => parse_properties(text, source_name),
    }
}

/// Reads and parses a configuration source.
pub fn parse_source(source: &ConfigSource) -> ConfigResult<Vec<Setting>> {
    let name = source.name();
    let text = source.read_text()?;
    let settings = parse_text(&text, source.format(), &name)?;
    debug!(source = %name, count = settings.len(), "Parsed configuration source");
    Ok(settings)
}
