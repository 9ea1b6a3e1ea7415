//! Document feature merging.

use modpipe_core::{FeatureMap, ResolvedConfiguration};
use tracing::trace;

/// Merges the configured document features into `target`.
///
/// A feature absent from `target`, or present with a null value, is always
/// set. A feature with a non-null value is
/// replaced only if the configuration marks it overridable, which is the
/// default. Merging the same configuration twice leaves `target` unchanged the
/// second time.
///
/// Returns the number of features written.
pub fn merge_doc_features(config: &ResolvedConfiguration, target: &mut FeatureMap) -> usize {
    let mut written = 0;
    for (name, value) in config.doc_features() {
        let existing = matches!(target.get(name), Some(v) if !v.is_null());
        if existing && !config.is_overridable(name) {
            trace!(feature = %name, "Keeping existing value of non-overridable feature");
            continue;
        }
        target.insert(name.clone(), value.clone());
        written += 1;
    }
    written
}

#[cfg(test)]
mod tests {
    use modpipe_core::{ParamValue, Setting};

    use super::*;

    fn feature(name: &str, value: &str, overridable: bool) -> Setting {
        Setting::DocFeature {
            name: name.into(),
            value: ParamValue::from(value),
            overridable,
        }
    }

    fn config(settings: Vec<Setting>) -> ResolvedConfiguration {
        let mut assembler = ResolvedConfiguration::assemble(None);
        assembler.extend(settings);
        assembler.build()
    }

    #[test]
    fn test_override_policy() {
        let config = config(vec![
            feature("title", "Hello", true),
            feature("lang", "de", false),
            feature("fresh", "yes", false),
        ]);
        let mut target = FeatureMap::new();
        target.insert("title".into(), ParamValue::from("Old"));
        target.insert("lang".into(), ParamValue::from("en"));

        assert_eq!(merge_doc_features(&config, &mut target), 2);
        assert_eq!(target["title"], ParamValue::from("Hello"));
        assert_eq!(target["lang"], ParamValue::from("en"));
        assert_eq!(target["fresh"], ParamValue::from("yes"));
    }

    #[test]
    fn test_null_feature_counts_as_absent() {
        let config = config(vec![feature("lang", "de", false)]);
        let mut target = FeatureMap::new();
        target.insert("lang".into(), ParamValue::Null);

        assert_eq!(merge_doc_features(&config, &mut target), 1);
        assert_eq!(target["lang"], ParamValue::from("de"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let config = config(vec![
            feature("title", "Hello", true),
            feature("lang", "de", false),
        ]);
        let mut once = FeatureMap::new();
        once.insert("lang".into(), ParamValue::from("en"));
        once.insert("untouched".into(), ParamValue::Int(7));
        merge_doc_features(&config, &mut once);

        let mut twice = once.clone();
        merge_doc_features(&config, &mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_config_writes_nothing() {
        let mut target = FeatureMap::new();
        target.insert("a".into(), ParamValue::Null);
        assert_eq!(merge_doc_features(&ResolvedConfiguration::empty(), &mut target), 0);
        assert_eq!(target.len(), 1);
    }
}
