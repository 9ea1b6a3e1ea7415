//! Flat `.properties` parser.
//!
//! ```properties
//! docfeature.title = Hello
//! prparm.s1.controller = Main
//! prparm.s1.prname = Tokenizer
//! prparm.s1.name = encoding
//! prparm.s1.value = UTF-8
//! propset.some.property = 42
//! ```
//!
//! All values are text. A `prparm.<id>.*` group must define all four of
//! `prname`, `name`, `value` and `controller`; the `<id>` is the key minus its
//! last dotted segment.

use std::collections::{BTreeMap, BTreeSet};

use modpipe_core::{ComponentKey, ConfigError, ConfigResult, ParamScope, ParamValue, Setting};

const DOC_FEATURE: &str = "docfeature.";
const PR_PARM: &str = "prparm.";
const PROP_SET: &str = "propset.";

/// Parses flat property text into settings.
///
/// Keys are processed in sorted order.
pub fn parse_properties(text: &str, source_name: &str) -> ConfigResult<Vec<Setting>> {
    let properties = read_properties(text, source_name)?;
    let mut settings = Vec::new();
    let mut groups = BTreeSet::new();

    for (key, value) in &properties {
        if let Some(name) = key.strip_prefix(DOC_FEATURE) {
            settings.push(Setting::DocFeature {
                name: name.to_string(),
                value: ParamValue::from(value.as_str()),
                overridable: true,
            });
        } else if let Some(rest) = key.strip_prefix(PR_PARM) {
            let setting_id = match rest.rfind('.') {
                Some(dot) => &rest[..dot],
                None => rest,
            };
            if groups.insert(setting_id) {
                settings.push(parse_group(&properties, setting_id)?);
            }
        } else if let Some(name) = key.strip_prefix(PROP_SET) {
            settings.push(Setting::PropertySet {
                name: name.to_string(),
                value: value.clone(),
            });
        } else {
            return Err(ConfigError::UnknownSetting {
                kind: key.clone(),
                source_name: source_name.to_string(),
            });
        }
    }
    Ok(settings)
}

fn parse_group(properties: &BTreeMap<String, String>, setting_id: &str) -> ConfigResult<Setting> {
    let get = |suffix: &str| {
        let property = format!("{PR_PARM}{setting_id}.{suffix}");
        match properties.get(&property) {
            Some(value) => Ok(value.clone()),
            None => Err(ConfigError::IncompleteGroup {
                setting_id: setting_id.to_string(),
                property,
            }),
        }
    };

    let component = get("prname")?;
    let name = get("name")?;
    let value = get("value")?;
    let controller = get("controller")?;
    Ok(Setting::Param {
        scope: ParamScope::Runtime,
        key: ComponentKey::new(controller, component),
        name,
        value: ParamValue::Str(value),
    })
}

/// Reads `key=value` lines with the usual properties-file conventions.
///
/// Supports `#`/`!` comments, `=`, `:` or whitespace separators, backslash line
/// continuations and `\t`, `\n`, `\r`, `\f`, `\uXXXX` escapes. A repeated key
/// keeps its last value.
pub fn read_properties(text: &str, source_name: &str) -> ConfigResult<BTreeMap<String, String>> {
    let mut properties = BTreeMap::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let mut logical = line.trim_start().to_string();
        if logical.is_empty() || logical.starts_with('#') || logical.starts_with('!') {
            continue;
        }
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = split_entry(&logical);
        properties.insert(unescape(key, source_name)?, unescape(value, source_name)?);
    }
    Ok(properties)
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\x0c' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches([' ', '\t', '\x0c']);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches([' ', '\t', '\x0c']);
    }
    (key, rest)
}

fn unescape(raw: &str, source_name: &str) -> ConfigResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        ConfigError::syntax(source_name, format!("malformed \\u escape: \\u{hex}"))
                    })?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}
