//! Init-time parameter hand-off.
//!
//! Init parameters are never applied by the engine's execution pass. A host
//! loader asks for them while it instantiates a controller's components and
//! writes them before the component is first used.

use modpipe_core::{
    ApplyError, ApplyResult, Component, ComponentKey, ParamMap, ResolvedConfiguration,
};
use tracing::debug;

/// Init parameters configured for components of `controller`.
pub fn init_overrides<'a>(
    config: &'a ResolvedConfiguration,
    controller: &'a str,
) -> impl Iterator<Item = (&'a str, &'a ParamMap)> + 'a {
    config
        .init_params()
        .iter()
        .filter(move |(key, _)| key.controller == controller)
        .map(|(key, params)| (key.component.as_str(), params))
}

/// Writes the init parameters configured for `component` under `controller`.
///
/// Returns the number of parameters written.
pub fn apply_init_params(
    config: &ResolvedConfiguration,
    controller: &str,
    component: &mut dyn Component,
) -> ApplyResult<usize> {
    let key = ComponentKey::new(controller, component.name());
    let Some(params) = config.init_params().get(&key) else {
        return Ok(0);
    };
    for (name, value) in params {
        debug!(component = %key.component, parameter = %name, value = %value, "Setting init parameter");
        component
            .set_parameter(name, value)
            .map_err(|reason| ApplyError::ParameterRejected {
                parameter: name.clone(),
                id: key.to_string(),
                value: value.to_string(),
                reason,
            })?;
    }
    Ok(params.len())
}
