//! Process-wide override properties.
//!
//! With the default prefix `modularpipelines.` and separator `.`:
//!
//! | Key | Effect |
//! |-----|--------|
//! | `modularpipelines.prparm.<controller>.<component>.<param>` | runtime parameter |
//! | `modularpipelines.prinit.<controller>.<component>.<param>` | init parameter |
//! | `modularpipelines.prrun.<controller>.<component>` | run flag (`true` enables, anything else disables) |
//! | `modularpipelines.docfeature.<name>` | overridable document feature |
//! | `modularpipelines.udocfeature.<name>` | non-overridable document feature |
//!
//! The controller name ends at the first separator. For parameter keys the
//! component name ends at the next one and the rest is the parameter name, so
//! only the parameter name may itself contain the separator.

use modpipe_core::{
    ComponentKey, ConfigAssembler, ConfigError, ConfigResult, ParamScope, ParamValue, Setting,
};
use tracing::debug;

use crate::store::PropertyStore;

/// Key prefix and separator of the override convention.
#[derive(Debug, Clone, Copy)]
pub struct OverrideKeys<'a> {
    pub prefix: &'a str,
    pub separator: &'a str,
}

/// Collects the override settings found in `properties`, in key order.
///
/// Fails on the first key that carries the prefix but cannot be interpreted;
/// nothing is returned in that case.
pub fn scan_overrides(properties: &PropertyStore, keys: OverrideKeys<'_>) -> ConfigResult<Vec<Setting>> {
    let mut settings = Vec::new();
    for (key, value) in properties.with_prefix(keys.prefix) {
        let rest = &key[keys.prefix.len()..];
        let setting = if let Some(tail) = rest.strip_prefix("prparm.") {
            param(key, tail, keys.separator, ParamScope::Runtime, value)?
        } else if let Some(tail) = rest.strip_prefix("prinit.") {
            param(key, tail, keys.separator, ParamScope::Init, value)?
        } else if let Some(tail) = rest.strip_prefix("prrun.") {
            let (controller, component) = controller_and_rest(key, tail, keys.separator)?;
            Setting::RunMode {
                key: ComponentKey::new(controller, component),
                enabled: value.eq_ignore_ascii_case("true"),
            }
        } else if let Some(name) = rest.strip_prefix("docfeature.") {
            doc_feature(name, value, true)
        } else if let Some(name) = rest.strip_prefix("udocfeature.") {
            doc_feature(name, value, false)
        } else {
            return Err(ConfigError::UnknownOverride {
                key: key.to_string(),
            });
        };
        debug!(key = %key, kind = setting.kind(), "Process override");
        settings.push(setting);
    }
    Ok(settings)
}

/// Folds process overrides into `assembler` after every file setting.
///
/// Overrides for a key that the file already set replace the file value.
pub fn merge_process_overrides(
    assembler: &mut ConfigAssembler,
    properties: &PropertyStore,
    keys: OverrideKeys<'_>,
) -> ConfigResult<()> {
    let overrides = scan_overrides(properties, keys)?;
    assembler.extend(overrides);
    Ok(())
}

fn doc_feature(name: &str, value: &str, overridable: bool) -> Setting {
    Setting::DocFeature {
        name: name.to_string(),
        value: ParamValue::from(value),
        overridable,
    }
}

fn param(key: &str, tail: &str, separator: &str, scope: ParamScope, value: &str) -> ConfigResult<Setting> {
    let (controller, rest) = controller_and_rest(key, tail, separator)?;
    let (component, name) = match rest.find(separator) {
        Some(idx) if idx >= 1 && idx + separator.len() < rest.len() => {
            (&rest[..idx], &rest[idx + separator.len()..])
        }
        _ => return Err(ConfigError::malformed_override(key, "no parameter name")),
    };
    Ok(Setting::Param {
        scope,
        key: ComponentKey::new(controller, component),
        name: name.to_string(),
        value: ParamValue::from(value),
    })
}

fn controller_and_rest<'a>(key: &str, tail: &'a str, separator: &str) -> ConfigResult<(&'a str, &'a str)> {
    let idx = match tail.find(separator) {
        Some(idx) if idx >= 1 => idx,
        _ => return Err(ConfigError::malformed_override(key, "no proper controller name")),
    };
    let rest = &tail[idx + separator.len()..];
    if rest.is_empty() {
        return Err(ConfigError::malformed_override(key, "no component name"));
    }
    Ok((&tail[..idx], rest))
}

#[cfg(test)]
mod tests {
    use modpipe_core::{ResolvedConfiguration, RUN_FLAG};

    use super::*;

    const KEYS: OverrideKeys<'static> = OverrideKeys {
        prefix: "modularpipelines.",
        separator: ".",
    };

    #[test]
    fn test_all_override_kinds() {
        let store = PropertyStore::new()
            .with("modularpipelines.prparm.Main.Tokenizer.encoding", "UTF-8")
            .with("modularpipelines.prinit.Main.Gazetteer.lists.url", "lists.def")
            .with("modularpipelines.prrun.Main.Tagger", "TRUE")
            .with("modularpipelines.docfeature.a", "1")
            .with("modularpipelines.udocfeature.b", "2")
            .with("unrelated", "x");

        let mut assembler = ResolvedConfiguration::assemble(None);
        merge_process_overrides(&mut assembler, &store, KEYS).unwrap();
        let config = assembler.build();

        let tokenizer = &config.runtime_params()[&ComponentKey::new("Main", "Tokenizer")];
        assert_eq!(tokenizer["encoding"], ParamValue::from("UTF-8"));
        let gazetteer = &config.init_params()[&ComponentKey::new("Main", "Gazetteer")];
        assert_eq!(gazetteer["lists.url"], ParamValue::from("lists.def"));
        let tagger = &config.runtime_params()[&ComponentKey::new("Main", "Tagger")];
        assert_eq!(tagger[RUN_FLAG], ParamValue::Bool(true));

        assert!(config.is_overridable("a"));
        assert!(!config.is_overridable("b"));
        assert_eq!(config.doc_features()["b"], ParamValue::from("2"));
    }

    #[test]
    fn test_udocfeature_beats_file_setting() {
        let mut assembler = ResolvedConfiguration::assemble(None);
        assembler.apply(Setting::DocFeature {
            name: "X".into(),
            value: ParamValue::from("1"),
            overridable: false,
        });
        let store = PropertyStore::new().with("modularpipelines.udocfeature.X", "2");
        merge_process_overrides(&mut assembler, &store, KEYS).unwrap();
        let config = assembler.build();

        assert_eq!(config.doc_features()["X"], ParamValue::from("2"));
        assert!(!config.is_overridable("X"));
    }

    #[test]
    fn test_custom_separator() {
        let store = PropertyStore::new().with("pp/prparm/Main/Tok.v2/enc", "x");
        let keys = OverrideKeys {
            prefix: "pp/",
            separator: "/",
        };
        let settings = scan_overrides(&store, keys);
        // the second-level literal always uses a dot
        assert!(matches!(settings, Err(ConfigError::UnknownOverride { .. })));

        let store = PropertyStore::new().with("pp/prparm.Main/Tok.v2/enc", "x");
        let settings = scan_overrides(&store, keys).unwrap();
        assert_eq!(
            settings,
            vec![Setting::Param {
                scope: ParamScope::Runtime,
                key: ComponentKey::new("Main", "Tok.v2"),
                name: "enc".into(),
                value: ParamValue::from("x"),
            }]
        );
    }

    #[test]
    fn test_malformed_keys() {
        for key in [
            "modularpipelines.prparm..Tok.enc",
            "modularpipelines.prparm.Main.",
            "modularpipelines.prparm.Main.Tok",
            "modularpipelines.prparm.Main.Tok.",
            "modularpipelines.prrun.Main",
        ] {
            let store = PropertyStore::new().with(key, "x");
            let err = scan_overrides(&store, KEYS).unwrap_err();
            assert!(
                matches!(err, ConfigError::MalformedOverride { .. }),
                "{key} gave {err}"
            );
        }

        let store = PropertyStore::new().with("modularpipelines.prparam.Main.Tok.enc", "x");
        assert!(matches!(
            scan_overrides(&store, KEYS).unwrap_err(),
            ConfigError::UnknownOverride { .. }
        ));
    }

    #[test]
    fn test_prrun_non_true_disables() {
        let store = PropertyStore::new().with("modularpipelines.prrun.Main.Tagger", "yes");
        let settings = scan_overrides(&store, KEYS).unwrap();
        assert_eq!(
            settings,
            vec![Setting::RunMode {
                key: ComponentKey::new("Main", "Tagger"),
                enabled: false,
            }]
        );
    }
}
