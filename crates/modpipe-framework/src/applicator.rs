//! Pushes runtime parameters and run modes onto a live controller.
//!
//! Lookup is built from the components the controller holds at call time,
//! so components added or removed after the configuration was resolved are
//! seen correctly. All targets are resolved before the first parameter is
//! written: a duplicated name or a missing target leaves every component
//! untouched.
//!
//! The function reads the [`ResolvedConfiguration`] only, so sibling pipelines
//! may apply one shared configuration concurrently to their own controllers.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use modpipe_core::{
    ApplyError, ApplyResult, BoxedComponent, ComponentKey, Controller, ParamMap, ParamValue,
    ParameterRejection, RUN_FLAG, ResolvedConfiguration, RunMode,
};
use tracing::{debug, trace};

/// Applies every runtime parameter of `config` that targets `controller`.
///
/// # Errors
///
/// - [`ApplyError::AmbiguousTarget`] if two live components share a name.
/// - [`ApplyError::TargetNotFound`] if a setting names a component that is not present.
/// - [`ApplyError::ParameterRejected`] if a component refuses a value.
pub fn apply_params(config: &ResolvedConfiguration, controller: &mut dyn Controller) -> ApplyResult<()> {
    let controller_name = controller.name().to_string();
    let index = component_index(&controller_name, controller.components())?;

    let mut targets: Vec<(usize, &ComponentKey, &ParamMap)> = Vec::new();
    for (key, params) in config.runtime_params() {
        if key.controller != controller_name {
            continue;
        }
        let position = index
            .get(key.component.as_str())
            .copied()
            .ok_or_else(|| ApplyError::TargetNotFound { id: key.to_string() })?;
        targets.push((position, key, params));
    }
    targets.sort_by_key(|(position, ..)| *position);

    for (position, key, params) in targets {
        for (name, value) in params {
            if name == RUN_FLAG {
                apply_run_flag(controller, position, key, value)?;
                continue;
            }
            debug!(
                controller = %key.controller,
                component = %key.component,
                parameter = %name,
                value = %value,
                "Setting parameter"
            );
            controller.components_mut()[position]
                .set_parameter(name, value)
                .map_err(|reason| rejected(name, key, value, reason))?;
        }
    }
    Ok(())
}

fn component_index<'a>(
    controller: &str,
    components: &'a [BoxedComponent],
) -> ApplyResult<HashMap<&'a str, usize>> {
    let mut index = HashMap::with_capacity(components.len());
    for (position, component) in components.iter().enumerate() {
        match index.entry(component.name()) {
            Entry::Occupied(_) => {
                return Err(ApplyError::AmbiguousTarget {
                    id: ComponentKey::new(controller, component.name()).to_string(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(position);
            }
        }
    }
    Ok(index)
}

fn apply_run_flag(
    controller: &mut dyn Controller,
    position: usize,
    key: &ComponentKey,
    value: &ParamValue,
) -> ApplyResult<()> {
    let Some(slot) = controller.run_mode_mut(position) else {
        trace!(component = %key.component, "Controller is not conditional, run flag ignored");
        return Ok(());
    };
    let enabled = value.as_bool().ok_or_else(|| {
        rejected(
            RUN_FLAG,
            key,
            value,
            ParameterRejection::new("run flag must be a boolean"),
        )
    })?;
    let mode = RunMode::from_flag(enabled);
    *slot = mode;
    debug!(
        controller = %key.controller,
        component = %key.component,
        run_mode = ?mode,
        "Setting run mode"
    );
    Ok(())
}

fn rejected(
    name: &str,
    key: &ComponentKey,
    value: &ParamValue,
    reason: ParameterRejection,
) -> ApplyError {
    ApplyError::ParameterRejected {
        parameter: name.to_string(),
        id: key.to_string(),
        value: value.to_string(),
        reason,
    }
}
