//! Mock host components shared by the unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use modpipe_core::{Component, ParamValue, ParameterRejection};
use parking_lot::Mutex;

/// Log of `(component, parameter, value)` writes shared across mocks.
pub type SetLog = Arc<Mutex<Vec<(String, String, ParamValue)>>>;

/// A component that records every parameter write.
pub struct Recorder {
    name: String,
    params: HashMap<String, ParamValue>,
    accepts: Option<Vec<&'static str>>,
    log: SetLog,
}

impl Recorder {
    pub fn new(name: &str, log: &SetLog) -> Self {
        Self {
            name: name.to_string(),
            params: HashMap::new(),
            accepts: None,
            log: log.clone(),
        }
    }

    /// Restricts the accepted parameter names.
    pub fn accepting(mut self, names: &[&'static str]) -> Self {
        self.accepts = Some(names.to_vec());
        self
    }
}

impl Component for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> Result<(), ParameterRejection> {
        if let Some(accepts) = &self.accepts {
            if !accepts.contains(&name) {
                return Err(ParameterRejection::new(format!("no parameter named {name}")));
            }
        }
        self.params.insert(name.to_string(), value.clone());
        self.log
            .lock()
            .push((self.name.clone(), name.to_string(), value.clone()));
        Ok(())
    }

    fn parameter(&self, name: &str) -> Option<ParamValue> {
        self.params.get(name).cloned()
    }
}

pub fn new_log() -> SetLog {
    Arc::new(Mutex::new(Vec::new()))
}
