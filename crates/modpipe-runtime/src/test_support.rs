//! Mock host components for the runtime tests.

use std::collections::HashMap;
use std::sync::Arc;

use modpipe_core::{Component, ParamValue, ParameterRejection};
use parking_lot::Mutex;

/// A component that keeps every parameter written to it.
///
/// Clones share their parameter table, so a test can keep a handle after the
/// component has been moved into a controller.
#[derive(Clone)]
pub struct Probe {
    name: String,
    params: Arc<Mutex<HashMap<String, ParamValue>>>,
}

impl Probe {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: Arc::default(),
        }
    }

    pub fn with(self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params.lock().insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.params.lock().get(name).cloned()
    }
}

impl Component for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> Result<(), ParameterRejection> {
        if name == "readonly" {
            return Err(ParameterRejection::new("parameter is read-only"));
        }
        self.params.lock().insert(name.to_string(), value.clone());
        Ok(())
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        self.get(name)
    }
}
