//! Values produced by hydration.
//!
//! `Live` mirrors the JSON data model and adds two host-only variants: live
//! capability handles (reference-mode results) and opaque instances built by
//! constructors. Host-only variants compare by identity.

use crate::capability::Callable;
use serde_json::{Map, Number, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub enum Live {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Live>),
    Object(BTreeMap<String, Live>),
    Callable(Callable),
    Opaque(Opaque),
}

/// Host value returned by a constructor that has no JSON form.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &Opaque) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Opaque").field(&self.type_name).finish()
    }
}

impl Live {
    /// Numeric value from an `f64`.
    ///
    /// Integral values in `i64` range are stored as integers so results
    /// compare equal to the equivalent JSON literal; NaN and infinities have no
    /// JSON form and become `Null`.
    pub fn number(value: f64) -> Live {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            return Live::Number(Number::from(value as i64));
        }
        Number::from_f64(value).map_or(Live::Null, Live::Number)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Live::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Live::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Live::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Live::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Live::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Live]> {
        match self {
            Live::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Live>> {
        match self {
            Live::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Live::Callable(callable) => Some(callable),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self {
            Live::Opaque(opaque) => Some(opaque),
            _ => None,
        }
    }

    /// Short type label for diagnostics.
    pub fn type_label(&self) -> &'static str {
        match self {
            Live::Null => "null",
            Live::Bool(_) => "bool",
            Live::Number(_) => "number",
            Live::String(_) => "string",
            Live::Array(_) => "array",
            Live::Object(_) => "object",
            Live::Callable(_) => "callable",
            Live::Opaque(_) => "opaque",
        }
    }

    /// JSON form of the value, or `None` when it holds a callable or an
    /// opaque instance anywhere inside.
    pub fn to_json(&self) -> Option<Value> {
        Some(match self {
            Live::Null => Value::Null,
            Live::Bool(b) => Value::Bool(*b),
            Live::Number(n) => Value::Number(n.clone()),
            Live::String(s) => Value::String(s.clone()),
            Live::Array(items) => Value::Array(
                items
                    .iter()
                    .map(Live::to_json)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Live::Object(map) => {
                let mut out = Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), value.to_json()?);
                }
                Value::Object(out)
            }
            Live::Callable(_) | Live::Opaque(_) => return None,
        })
    }
}

impl PartialEq for Live {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Live::Null, Live::Null) => true,
            (Live::Bool(a), Live::Bool(b)) => a == b,
            (Live::Number(a), Live::Number(b)) => a == b,
            (Live::String(a), Live::String(b)) => a == b,
            (Live::Array(a), Live::Array(b)) => a == b,
            (Live::Object(a), Live::Object(b)) => a == b,
            (Live::Callable(a), Live::Callable(b)) => a.ptr_eq(b),
            (Live::Opaque(a), Live::Opaque(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<Value> for Live {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Live::Null,
            Value::Bool(b) => Live::Bool(b),
            Value::Number(n) => Live::Number(n),
            Value::String(s) => Live::String(s),
            Value::Array(items) => Live::Array(items.into_iter().map(Live::from).collect()),
            Value::Object(map) => {
                Live::Object(map.into_iter().map(|(k, v)| (k, Live::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Live {
    fn from(value: bool) -> Self {
        Live::Bool(value)
    }
}

impl From<i32> for Live {
    fn from(value: i32) -> Self {
        Live::Number(Number::from(value))
    }
}

impl From<i64> for Live {
    fn from(value: i64) -> Self {
        Live::Number(Number::from(value))
    }
}

impl From<u64> for Live {
    fn from(value: u64) -> Self {
        Live::Number(Number::from(value))
    }
}

impl From<f64> for Live {
    fn from(value: f64) -> Self {
        Live::number(value)
    }
}

impl From<&str> for Live {
    fn from(value: &str) -> Self {
        Live::String(value.to_string())
    }
}

impl From<String> for Live {
    fn from(value: String) -> Self {
        Live::String(value)
    }
}

impl From<Vec<Live>> for Live {
    fn from(value: Vec<Live>) -> Self {
        Live::Array(value)
    }
}

impl From<Callable> for Live {
    fn from(value: Callable) -> Self {
        Live::Callable(value)
    }
}

impl From<Opaque> for Live {
    fn from(value: Opaque) -> Self {
        Live::Opaque(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integral_floats_collapse_to_integers() {
        assert_eq!(Live::number(4.0), Live::from(json!(4)));
        assert_eq!(Live::number(2.5).as_f64(), Some(2.5));
        assert!(Live::number(f64::NAN).is_null());
    }

    #[test]
    fn json_values_survive_conversion() {
        let payload = json!({"a": [1, "two", null, {"b": true}], "c": 1.5});
        let live = Live::from(payload.clone());
        assert_eq!(live.to_json(), Some(payload));
    }

    #[test]
    fn host_values_have_no_json_form() {
        let callable = Callable::plain(|_| Ok(Live::Null));
        let live = Live::Array(vec![Live::from(1), Live::Callable(callable)]);
        assert_eq!(live.to_json(), None);
        assert_eq!(Live::Opaque(Opaque::new(3u8)).to_json(), None);
    }

    #[test]
    fn host_values_compare_by_identity() {
        let f = Callable::plain(|_| Ok(Live::Null));
        assert_eq!(Live::Callable(f.clone()), Live::Callable(f));

        let a = Opaque::new(String::from("x"));
        let b = Opaque::new(String::from("x"));
        assert_eq!(Live::Opaque(a.clone()), Live::Opaque(a.clone()));
        assert_ne!(Live::Opaque(a.clone()), Live::Opaque(b));
        assert_eq!(a.downcast_ref::<String>().map(String::as_str), Some("x"));
    }
}
