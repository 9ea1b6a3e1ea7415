//! A stock in-memory controller.
//!
//! [`SerialController`] keeps its components in a `Vec` and, when created
//! with [`SerialController::conditional`], a parallel list of run modes. Hosts
//! with their own controller types implement [`Controller`] directly instead.

use modpipe_core::{BoxedComponent, Component, Controller, RunMode};

/// An ordered list of components executed one after another.
pub struct SerialController {
    name: String,
    components: Vec<BoxedComponent>,
    run_modes: Option<Vec<RunMode>>,
}

impl SerialController {
    /// Creates an unconditional controller.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
            run_modes: None,
        }
    }

    /// Creates a controller with a run mode per component.
    pub fn conditional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
            run_modes: Some(Vec::new()),
        }
    }

    /// Adds a component and returns `self` for chaining.
    pub fn with_component(mut self, component: impl Component + 'static) -> Self {
        self.push(Box::new(component));
        self
    }

    /// Appends a component. Under a conditional controller it starts as [`RunMode::Always`].
    pub fn push(&mut self, component: BoxedComponent) {
        self.components.push(component);
        if let Some(modes) = &mut self.run_modes {
            modes.push(RunMode::Always);
        }
    }

    /// Removes and returns the component at `index` together with its run mode slot.
    pub fn remove(&mut self, index: usize) -> Option<BoxedComponent> {
        if index >= self.components.len() {
            return None;
        }
        if let Some(modes) = &mut self.run_modes {
            modes.remove(index);
        }
        Some(self.components.remove(index))
    }

    /// Returns `true` if the controller keeps run modes.
    pub fn is_conditional(&self) -> bool {
        self.run_modes.is_some()
    }

    /// Run mode of the component at `index`.
    pub fn run_mode(&self, index: usize) -> Option<RunMode> {
        self.run_modes.as_ref()?.get(index).copied()
    }

    /// Sets the run mode of the component at `index`.
    ///
    /// Returns `false` if the controller is unconditional or `index` is out of range.
    pub fn set_run_mode(&mut self, index: usize, mode: RunMode) -> bool {
        match self.run_mode_mut(index) {
            Some(slot) => {
                *slot = mode;
                true
            }
            None => false,
        }
    }

    /// Position of the component named `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c.name() == name)
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if the controller holds no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Indices of the components that would run on this invocation.
    ///
    /// `condition` is consulted only for components in [`RunMode::Conditional`].
    pub fn runnable_indices(&self, condition: impl Fn(&dyn Component) -> bool) -> Vec<usize> {
        (0..self.components.len())
            .filter(|&i| match self.run_mode(i).unwrap_or(RunMode::Always) {
                RunMode::Always => true,
                RunMode::Never => false,
                RunMode::Conditional => condition(self.components[i].as_ref()),
            })
            .collect()
    }
}

impl Controller for SerialController {
    fn name(&self) -> &str {
        &self.name
    }

    fn components(&self) -> &[BoxedComponent] {
        &self.components
    }

    fn components_mut(&mut self) -> &mut [BoxedComponent] {
        &mut self.components
    }

    fn run_mode_mut(&mut self, index: usize) -> Option<&mut RunMode> {
        self.run_modes.as_mut()?.get_mut(index)
    }
}

impl std::fmt::Debug for SerialController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.components.iter().map(|c| c.name()).collect();
        f.debug_struct("SerialController")
            .field("name", &self.name)
            .field("components", &names)
            .field("run_modes", &self.run_modes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modpipe_core::{ParamValue, ParameterRejection};

    struct Stub(&'static str);

    impl Component for Stub {
        fn name(&self) -> &str {
            self.0
        }

        fn set_parameter(&mut self, _: &str, _: &ParamValue) -> Result<(), ParameterRejection> {
            Ok(())
        }
    }

    #[test]
    fn test_run_modes_follow_components() {
        let mut controller = SerialController::conditional("Main")
            .with_component(Stub("a"))
            .with_component(Stub("b"))
            .with_component(Stub("c"));
        assert!(controller.set_run_mode(1, RunMode::Never));
        assert!(controller.set_run_mode(2, RunMode::Conditional));

        assert_eq!(controller.runnable_indices(|_| false), vec![0]);
        assert_eq!(controller.runnable_indices(|c| c.name() == "c"), vec![0, 2]);

        controller.remove(0);
        assert_eq!(controller.run_mode(0), Some(RunMode::Never));
        assert_eq!(controller.position("c"), Some(1));
        assert!(controller.remove(5).is_none());
    }

    #[test]
    fn test_unconditional_has_no_run_modes() {
        let mut controller = SerialController::new("Main").with_component(Stub("a"));
        assert!(!controller.is_conditional());
        assert!(!controller.set_run_mode(0, RunMode::Never));
        assert!(controller.run_mode_mut(0).is_none());
        assert_eq!(controller.runnable_indices(|_| false), vec![0]);
    }
}
