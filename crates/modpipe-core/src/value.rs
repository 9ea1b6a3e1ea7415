//! Parameter and feature values.
//!
//! Values set on components and documents form a closed variant. The engine
//! never introspects them beyond the boolean check for run-mode flags; the
//! host decides how a [`ParamValue`] maps onto a concrete parameter type.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult};

/// A mapping from feature name to value, as held by a document.
pub type FeatureMap = HashMap<String, ParamValue>;

/// A mapping from parameter name to value for a single component.
pub type ParamMap = HashMap<String, ParamValue>;

/// Host-supplied reference carried through the engine untouched.
///
/// Two references are equal only if they point at the same allocation.
#[derive(Clone)]
pub struct OpaqueRef(Arc<dyn Any + Send + Sync>);

impl OpaqueRef {
    /// Wraps a host object.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Attempts to view the referenced object as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl PartialEq for OpaqueRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for OpaqueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueRef({:p})", Arc::as_ptr(&self.0))
    }
}

/// A value for a component parameter or document feature.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParamValue {
    /// Explicit absence of a value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integral number.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Str(String),
    /// Ordered list of values.
    List(Vec<ParamValue>),
    /// Host object reference.
    Opaque(OpaqueRef),
}

impl ParamValue {
    /// Returns the boolean if this is a [`ParamValue::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the text if this is a [`ParamValue::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` for [`ParamValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Converts a YAML scalar or sequence into a value.
    ///
    /// Mappings have no counterpart and are rejected.
    pub fn from_yaml(value: &serde_yaml::Value, source_name: &str) -> ConfigResult<Self> {
        use serde_yaml::Value;

        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::Str(s.clone()),
            Value::Sequence(items) => Self::List(
                items
                    .iter()
                    .map(|item| Self::from_yaml(item, source_name))
                    .collect::<ConfigResult<_>>()?,
            ),
            Value::Tagged(tagged) => Self::from_yaml(&tagged.value, source_name)?,
            Value::Mapping(_) => {
                return Err(ConfigError::syntax(
                    source_name,
                    "a mapping cannot be used as a parameter or feature value",
                ));
            }
        })
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Opaque(r) => write!(f, "{r:?}"),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<OpaqueRef> for ParamValue {
    fn from(r: OpaqueRef) -> Self {
        Self::Opaque(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_yaml_scalars_and_lists() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("[1, 2.5, true, text, ~]").unwrap();
        let value = ParamValue::from_yaml(&yaml, "inline").unwrap();
        assert_eq!(
            value,
            ParamValue::List(vec![
                ParamValue::Int(1),
                ParamValue::Float(2.5),
                ParamValue::Bool(true),
                ParamValue::from("text"),
                ParamValue::Null,
            ])
        );
        assert_eq!(value.to_string(), "[1, 2.5, true, text, null]");
    }

    #[test]
    fn test_from_yaml_rejects_mapping() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("{a: 1}").unwrap();
        let err = ParamValue::from_yaml(&yaml, "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { .. }));
    }

    #[test]
    fn test_opaque_identity_equality() {
        let a = OpaqueRef::new(String::from("gazetteer"));
        let b = OpaqueRef::new(String::from("gazetteer"));
        assert_eq!(ParamValue::from(a.clone()), ParamValue::from(a.clone()));
        assert_ne!(ParamValue::from(a.clone()), ParamValue::from(b));
        assert_eq!(a.downcast_ref::<String>().map(String::as_str), Some("gazetteer"));
    }
}
