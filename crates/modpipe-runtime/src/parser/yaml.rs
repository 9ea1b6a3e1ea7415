//! YAML list-of-records parser.
//!
//! ```yaml
//! - set: prparm
//!   controller: Main
//!   prname: Tokenizer
//!   name: encoding
//!   value: UTF-8
//! - set: prrun
//!   controller: Main
//!   prname: Tagger
//!   value: false
//! - set: docfeature
//!   name: lang
//!   value: en
//!   override: false
//! - set: inheritconfig
//! ```
//!
//! A list element that is not a mapping, or a mapping without `set`, is
//! logged and skipped. Every other malformation fails the whole parse.

use serde_yaml::{Mapping, Value};
use tracing::warn;

use modpipe_core::{ComponentKey, ConfigError, ConfigResult, ParamScope, ParamValue, Setting};

/// Parses a YAML settings list.
///
/// An empty document yields no settings.
pub fn parse_yaml(text: &str, source_name: &str) -> ConfigResult<Vec<Setting>> {
    let document: Value =
        serde_yaml::from_str(text).map_err(|e| ConfigError::syntax(source_name, e))?;

    let records = match document {
        Value::Sequence(records) => records,
        Value::Null => return Ok(Vec::new()),
        _ => return Err(ConfigError::NotAList(source_name.to_string())),
    };

    let mut settings = Vec::with_capacity(records.len());
    for element in &records {
        let Value::Mapping(record) = element else {
            warn!(source = %source_name, element = %render(element), "Config element not a map, ignored");
            continue;
        };
        if let Some(setting) = parse_record(record, source_name)? {
            settings.push(setting);
        }
    }
    Ok(settings)
}

fn parse_record(record: &Mapping, source_name: &str) -> ConfigResult<Option<Setting>> {
    let kind = match record.get("set") {
        None | Some(Value::Null) => {
            warn!(source = %source_name, record = %render_mapping(record), "No 'set' key in setting, ignored");
            return Ok(None);
        }
        Some(value) => scalar_text(value).ok_or_else(|| {
            ConfigError::syntax(source_name, format!("'set' must be a string in {}", render_mapping(record)))
        })?,
    };

    let setting = match kind.as_str() {
        "prparm" | "prinit" => {
            let scope = if kind == "prparm" {
                ParamScope::Runtime
            } else {
                ParamScope::Init
            };
            Setting::Param {
                scope,
                key: component_key(record, &kind)?,
                name: required_text(record, &kind, "name")?,
                value: optional_value(record, "value", source_name)?,
            }
        }
        "prrun" => {
            let key = component_key(record, &kind)?;
            let enabled = match record.get("value") {
                None => return Err(ConfigError::missing_field(&kind, "value", render_mapping(record))),
                Some(Value::Bool(b)) => *b,
                Some(other) => {
                    return Err(ConfigError::NotBoolean {
                        kind: kind.clone(),
                        field: "value".into(),
                        value: render(other),
                    });
                }
            };
            Setting::RunMode { key, enabled }
        }
        "docfeature" => Setting::DocFeature {
            name: required_text(record, &kind, "name")?,
            value: required_value(record, &kind, "value", source_name)?,
            overridable: override_flag(record)?,
        },
        "propset" => {
            let name = required_text(record, &kind, "name")?;
            let value = required_value(record, &kind, "value", source_name)?;
            Setting::PropertySet {
                name,
                value: value.to_string(),
            }
        }
        other if other.eq_ignore_ascii_case("inheritconfig") => Setting::InheritConfig,
        _ => {
            return Err(ConfigError::UnknownSetting {
                kind: kind.clone(),
                source_name: source_name.to_string(),
            });
        }
    };
    Ok(Some(setting))
}

fn component_key(record: &Mapping, kind: &str) -> ConfigResult<ComponentKey> {
    Ok(ComponentKey::new(
        required_text(record, kind, "controller")?,
        required_text(record, kind, "prname")?,
    ))
}

fn required_text(record: &Mapping, kind: &str, field: &str) -> ConfigResult<String> {
    record
        .get(field)
        .and_then(scalar_text)
        .ok_or_else(|| ConfigError::missing_field(kind, field, render_mapping(record)))
}

fn required_value(
    record: &Mapping,
    kind: &str,
    field: &str,
    source_name: &str,
) -> ConfigResult<ParamValue> {
    match record.get(field) {
        None | Some(Value::Null) => Err(ConfigError::missing_field(kind, field, render_mapping(record))),
        Some(value) => ParamValue::from_yaml(value, source_name),
    }
}

fn optional_value(record: &Mapping, field: &str, source_name: &str) -> ConfigResult<ParamValue> {
    match record.get(field) {
        None => Ok(ParamValue::Null),
        Some(value) => ParamValue::from_yaml(value, source_name),
    }
}

fn override_flag(record: &Mapping) -> ConfigResult<bool> {
    match record.get("override") {
        None | Some(Value::Null) => Ok(true),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(true),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(false),
        Some(other) => Err(ConfigError::NotBoolean {
            kind: "docfeature".into(),
            field: "override".into(),
            value: render(other),
        }),
    }
}

/// Text of a scalar; numbers and booleans are rendered.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        _ => None,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Sequence(items) => {
            let items: Vec<String> = items.iter().map(render).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Mapping(map) => render_mapping(map),
        other => scalar_text(other).unwrap_or_default(),
    }
}

fn render_mapping(map: &Mapping) -> String {
    let entries: Vec<String> = map
        .iter()
        .map(|(k, v)| format!("{}: {}", render(k), render(v)))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_record_kinds() {
        let text = r#"
- set: prparm
  controller: Main
  prname: Tokenizer
  name: encoding
  value: UTF-8
- set: prinit
  controller: Main
  prname: Gazetteer
  name: listsURL
- set: prrun
  controller: Main
  prname: Tagger
  value: false
- set: docfeature
  name: lang
  value: en
  override: "false"
- set: propset
  name: some.property
  value: 42
- set: InheritConfig
"#;
        let settings = parse_yaml(text, "inline").unwrap();
        assert_eq!(settings.len(), 6);
        assert_eq!(
            settings[0],
            Setting::Param {
                scope: ParamScope::Runtime,
                key: ComponentKey::new("Main", "Tokenizer"),
                name: "encoding".into(),
                value: ParamValue::from("UTF-8"),
            }
        );
        assert!(matches!(
            &settings[1],
            Setting::Param { scope: ParamScope::Init, value: ParamValue::Null, .. }
        ));
        assert_eq!(
            settings[2],
            Setting::RunMode {
                key: ComponentKey::new("Main", "Tagger"),
                enabled: false,
            }
        );
        assert!(matches!(&settings[3], Setting::DocFeature { overridable: false, .. }));
        assert_eq!(
            settings[4],
            Setting::PropertySet {
                name: "some.property".into(),
                value: "42".into(),
            }
        );
        assert_eq!(settings[5], Setting::InheritConfig);
    }

    #[test]
    fn test_ignored_elements() {
        let text = "- just a string\n- name: no set key\n- set: docfeature\n  name: a\n  value: 1\n";
        let settings = parse_yaml(text, "inline").unwrap();
        assert_eq!(settings.len(), 1);
    }

    #[test]
    fn test_missing_field_names_record_and_field() {
        let text = "- set: prparm\n  controller: Main\n  name: encoding\n";
        match parse_yaml(text, "inline").unwrap_err() {
            ConfigError::MissingField { kind, field, record } => {
                assert_eq!(kind, "prparm");
                assert_eq!(field, "prname");
                assert!(record.contains("controller: Main"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let text = "- set: docfeature\n  name: lang\n";
        assert!(matches!(
            parse_yaml(text, "inline").unwrap_err(),
            ConfigError::MissingField { ref field, .. } if field == "value"
        ));
    }

    #[test]
    fn test_prrun_requires_boolean() {
        let text = "- set: prrun\n  controller: Main\n  prname: Tagger\n  value: \"yes\"\n";
        assert!(matches!(
            parse_yaml(text, "inline").unwrap_err(),
            ConfigError::NotBoolean { .. }
        ));
    }

    #[test]
    fn test_bad_override_flag() {
        let text = "- set: docfeature\n  name: a\n  value: 1\n  override: maybe\n";
        assert!(matches!(
            parse_yaml(text, "inline").unwrap_err(),
            ConfigError::NotBoolean { ref field, .. } if field == "override"
        ));
    }

    #[test]
    fn test_override_flag_ignores_case() {
        let text = "- set: docfeature\n  name: a\n  value: 1\n  override: \"TRUE\"\n\
                    - set: docfeature\n  name: b\n  value: 2\n  override: False\n";
        let settings = parse_yaml(text, "inline").unwrap();
        let flags: Vec<bool> = settings
            .iter()
            .map(|s| match s {
                Setting::DocFeature { overridable, .. } => *overridable,
                other => panic!("unexpected setting {other:?}"),
            })
            .collect();
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn test_unknown_kind_and_top_level() {
        let text = "- set: prparam\n  controller: Main\n";
        assert!(matches!(
            parse_yaml(text, "inline").unwrap_err(),
            ConfigError::UnknownSetting { ref kind, .. } if kind == "prparam"
        ));
        assert!(matches!(
            parse_yaml("set: prparm", "inline").unwrap_err(),
            ConfigError::NotAList(_)
        ));
        assert!(matches!(
            parse_yaml("- [unclosed", "inline").unwrap_err(),
            ConfigError::Syntax { .. }
        ));
        assert!(parse_yaml("", "inline").unwrap().is_empty());
    }
}
