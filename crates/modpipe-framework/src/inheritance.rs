//! Hands an inherited configuration source down to nested pipelines.
//!
//! Only direct children are visited. A child that adopts the source resolves
//! it and, if that configuration declares inheritance too, repeats the walk
//! over its own children.

use modpipe_core::{BoxedComponent, ConfigResult, ResolvedConfiguration};
use tracing::{debug, info};

/// Offers the inherited source of `config` to every child that can take it.
///
/// Does nothing if `config` declares no inheritance. Returns the number of
/// children that re-resolved; children already bound to the same source are
/// not counted.
pub fn propagate_inheritance(
    config: &ResolvedConfiguration,
    children: &mut [BoxedComponent],
) -> ConfigResult<usize> {
    let Some(source) = config.inherited_source() else {
        return Ok(0);
    };

    let mut adopted = 0;
    for child in children.iter_mut() {
        let name = child.name().to_string();
        let Some(inheritor) = child.as_inheritor_mut() else {
            continue;
        };
        if inheritor.adopt_config_source(source)? {
            info!(component = %name, source = %source.identity(), "Inherited configuration adopted");
            adopted += 1;
        } else {
            debug!(component = %name, "Inherited configuration already loaded");
        }
    }
    Ok(adopted)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use modpipe_core::{
        Component, ConfigInheritor, ConfigSource, ParamValue, ParameterRejection, Setting,
        SourceFormat, SourceIdentity,
    };

    use super::*;
    use crate::test_support::{Recorder, new_log};

    struct Nested {
        name: String,
        identity: Option<SourceIdentity>,
        resolutions: Arc<AtomicUsize>,
    }

    impl Component for Nested {
        fn name(&self) -> &str {
            &self.name
        }

        fn set_parameter(&mut self, _: &str, _: &ParamValue) -> Result<(), ParameterRejection> {
            Ok(())
        }

        fn as_inheritor_mut(&mut self) -> Option<&mut dyn ConfigInheritor> {
            Some(self)
        }
    }

    impl ConfigInheritor for Nested {
        fn config_identity(&self) -> Option<SourceIdentity> {
            self.identity.clone()
        }

        fn adopt_config_source(&mut self, source: &ConfigSource) -> ConfigResult<bool> {
            if self.identity.as_ref() == Some(source.identity()) {
                return Ok(false);
            }
            self.identity = Some(source.identity().clone());
            self.resolutions.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    fn inheriting(text: &str) -> ResolvedConfiguration {
        let source = ConfigSource::inline("parent", SourceFormat::Yaml, text);
        let mut assembler = ResolvedConfiguration::assemble(Some(&source));
        assembler.apply(Setting::InheritConfig);
        assembler.build()
    }

    #[test]
    fn test_second_propagation_is_noop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let log = new_log();
        let mut children: Vec<BoxedComponent> = vec![
            Box::new(Recorder::new("plain", &log)),
            Box::new(Nested {
                name: "sub".into(),
                identity: None,
                resolutions: counter.clone(),
            }),
        ];
        let config = inheriting("- set: inheritconfig");

        assert_eq!(propagate_inheritance(&config, &mut children).unwrap(), 1);
        assert_eq!(propagate_inheritance(&config, &mut children).unwrap(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_changed_source_re_resolves() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut children: Vec<BoxedComponent> = vec![Box::new(Nested {
            name: "sub".into(),
            identity: None,
            resolutions: counter.clone(),
        })];

        propagate_inheritance(&inheriting("- set: inheritconfig"), &mut children).unwrap();
        propagate_inheritance(&inheriting("- set: InheritConfig"), &mut children).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_no_inheritance_is_noop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut children: Vec<BoxedComponent> = vec![Box::new(Nested {
            name: "sub".into(),
            identity: None,
            resolutions: counter.clone(),
        })];

        let adopted = propagate_inheritance(&ResolvedConfiguration::empty(), &mut children).unwrap();
        assert_eq!(adopted, 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
