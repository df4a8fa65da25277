//! Call descriptors: the wire record describing one capability invocation.
//!
//! On the wire a descriptor is a JSON object with `path` (non-empty array of
//! strings), optional `args` (array) and optional `isConstructor` (boolean).
//! An absent `args` means "reference to the capability" rather than "call it
//! with no arguments". Any JSON object carrying a `path` key is treated as a
//! descriptor; there is no other discriminator.

use crate::error::{ProtocolError, dotted};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PATH_KEY: &str = "path";
pub const ARGS_KEY: &str = "args";
pub const CONSTRUCTOR_KEY: &str = "isConstructor";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallDescriptor {
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,
    #[serde(
        rename = "isConstructor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_constructor: Option<bool>,
}

impl CallDescriptor {
    /// Plain invocation of `path` with `args`.
    pub fn call<S: Into<String>>(path: impl IntoIterator<Item = S>, args: Vec<Value>) -> Self {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            args: Some(args),
            is_constructor: None,
        }
    }

    /// Construction of `path` with `args`.
    pub fn construct<S: Into<String>>(
        path: impl IntoIterator<Item = S>,
        args: Vec<Value>,
    ) -> Self {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            args: Some(args),
            is_constructor: Some(true),
        }
    }

    /// Reference to the capability at `path`; resolves to the callable itself.
    pub fn reference<S: Into<String>>(path: impl IntoIterator<Item = S>) -> Self {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            args: None,
            is_constructor: None,
        }
    }

    pub fn is_reference(&self) -> bool {
        self.args.is_none()
    }

    pub fn is_construction(&self) -> bool {
        self.is_constructor == Some(true)
    }

    pub fn dotted_path(&self) -> String {
        dotted(&self.path)
    }

    /// Wire form of the descriptor.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            PATH_KEY.to_string(),
            Value::Array(self.path.iter().cloned().map(Value::String).collect()),
        );
        if let Some(args) = &self.args {
            map.insert(ARGS_KEY.to_string(), Value::Array(args.clone()));
        }
        if let Some(flag) = self.is_constructor {
            map.insert(CONSTRUCTOR_KEY.to_string(), Value::Bool(flag));
        }
        Value::Object(map)
    }

    /// Parse and validate a single descriptor from its wire form.
    pub fn from_value(value: &Value) -> Result<Self, ProtocolError> {
        let Some(map) = value.as_object() else {
            return Err(malformed("", "descriptor must be a JSON object"));
        };
        let view = DescriptorView::parse(map, String::new)?
            .ok_or_else(|| malformed("", "descriptor is missing 'path'"))?;
        Ok(view.to_descriptor())
    }

    pub(crate) fn view(&self) -> Result<DescriptorView<'_>, ProtocolError> {
        let view = DescriptorView {
            path: self.path.iter().map(String::as_str).collect(),
            args: self.args.as_deref(),
            construct: self.is_construction(),
        };
        view.check().map_err(|reason| malformed("", &reason))?;
        Ok(view)
    }
}

impl From<CallDescriptor> for Value {
    fn from(descriptor: CallDescriptor) -> Self {
        descriptor.to_value()
    }
}

/// True when `value` is an object carrying the `path` discriminator.
pub fn is_descriptor(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key(PATH_KEY))
}

/// Borrowed, validated view of a descriptor embedded in a payload.
#[derive(Debug, Clone)]
pub(crate) struct DescriptorView<'a> {
    pub path: Vec<&'a str>,
    pub args: Option<&'a [Value]>,
    pub construct: bool,
}

impl<'a> DescriptorView<'a> {
    /// Returns `Ok(None)` for objects that are not descriptors at all.
    ///
    /// `location` yields the JSON pointer of `map` inside the payload. It is
    /// only called when the descriptor is malformed.
    pub fn parse(
        map: &'a Map<String, Value>,
        location: impl FnOnce() -> String,
    ) -> Result<Option<Self>, ProtocolError> {
        Self::parse_shape(map).map_err(|reason| malformed(&location(), &reason))
    }

    fn parse_shape(map: &'a Map<String, Value>) -> Result<Option<Self>, String> {
        let Some(raw_path) = map.get(PATH_KEY) else {
            return Ok(None);
        };
        let Some(segments) = raw_path.as_array() else {
            return Err("'path' must be an array of strings".to_string());
        };
        let mut path = Vec::with_capacity(segments.len());
        for (idx, segment) in segments.iter().enumerate() {
            match segment.as_str() {
                Some(name) => path.push(name),
                None => return Err(format!("'path' element {idx} is not a string")),
            }
        }

        let args = match map.get(ARGS_KEY) {
            None => None,
            Some(Value::Array(items)) => Some(items.as_slice()),
            Some(_) => return Err("'args' must be an array".to_string()),
        };

        let construct = match map.get(CONSTRUCTOR_KEY) {
            None => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => return Err("'isConstructor' must be a boolean".to_string()),
        };

        let view = DescriptorView {
            path,
            args,
            construct,
        };
        view.check()?;
        Ok(Some(view))
    }

    fn check(&self) -> Result<(), String> {
        if self.path.is_empty() {
            return Err("'path' must not be empty".to_string());
        }
        if self.construct && self.args.is_none() {
            return Err(format!(
                "reference to '{}' cannot carry isConstructor: true",
                self.dotted_path()
            ));
        }
        Ok(())
    }

    pub fn dotted_path(&self) -> String {
        dotted(&self.path)
    }

    pub fn to_descriptor(&self) -> CallDescriptor {
        CallDescriptor {
            path: self.path.iter().map(|s| s.to_string()).collect(),
            args: self.args.map(<[Value]>::to_vec),
            is_constructor: self.construct.then_some(true),
        }
    }
}

/// Label for the payload root in diagnostics, where the JSON pointer is empty.
pub const ROOT_LOCATION: &str = "payload root";

/// Human-readable form of a JSON pointer for error messages.
pub fn location_label(pointer: &str) -> &str {
    if pointer.is_empty() {
        ROOT_LOCATION
    } else {
        pointer
    }
}

fn malformed(location: &str, reason: &str) -> ProtocolError {
    ProtocolError::MalformedDescriptor {
        location: location_label(location).to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_form_omits_absent_fields() {
        let reference = CallDescriptor::reference(["Math", "sqrt"]);
        assert_eq!(reference.to_value(), json!({"path": ["Math", "sqrt"]}));
        assert_eq!(
            serde_json::to_value(&reference).unwrap(),
            reference.to_value()
        );

        let call = CallDescriptor::call(["max"], vec![]);
        assert_eq!(call.to_value(), json!({"path": ["max"], "args": []}));

        let construct = CallDescriptor::construct(["Point"], vec![json!(1), json!(2)]);
        assert_eq!(
            serde_json::to_value(&construct).unwrap(),
            json!({"path": ["Point"], "args": [1, 2], "isConstructor": true})
        );
    }

    #[test]
    fn parses_nested_wire_form() {
        let value = json!({
            "path": ["max"],
            "args": [{"path": ["sqrt"], "args": [16]}, 3]
        });
        let descriptor = CallDescriptor::from_value(&value).unwrap();
        assert_eq!(descriptor.path, vec!["max"]);
        assert_eq!(descriptor.args.as_ref().map(Vec::len), Some(2));
        assert!(is_descriptor(&descriptor.args.unwrap()[0]));
    }

    #[test]
    fn rejects_malformed_shapes() {
        let cases = [
            json!({"path": "Math.sqrt"}),
            json!({"path": []}),
            json!({"path": ["Math", 1]}),
            json!({"path": ["f"], "args": {"0": 1}}),
            json!({"path": ["f"], "args": [], "isConstructor": "yes"}),
            json!({"path": ["Point"], "isConstructor": true}),
        ];
        for case in cases {
            let err = CallDescriptor::from_value(&case).expect_err("should be rejected");
            assert!(
                matches!(err, ProtocolError::MalformedDescriptor { .. }),
                "{case} produced {err:?}"
            );
        }
    }

    #[test]
    fn only_path_discriminates() {
        assert!(is_descriptor(&json!({"path": ["x"], "other": 1})));
        assert!(!is_descriptor(&json!({"args": [1]})));
        assert!(!is_descriptor(&json!(["path"])));
        assert!(!is_descriptor(&json!("path")));
    }

    #[test]
    fn explicit_false_constructor_flag_is_accepted_on_references() {
        let value = json!({"path": ["f"], "isConstructor": false});
        let descriptor = CallDescriptor::from_value(&value).unwrap();
        assert!(descriptor.is_reference());
        assert!(!descriptor.is_construction());
    }

    #[test]
    fn location_is_only_built_for_malformed_descriptors() {
        let plain = json!({"a": 1});
        let valid = json!({"path": ["f"], "args": []});
        for value in [&plain, &valid] {
            let map = value.as_object().unwrap();
            let parsed = DescriptorView::parse(map, || panic!("location built for {value}"));
            assert!(parsed.is_ok());
        }

        let bad = json!({"path": "f"});
        match DescriptorView::parse(bad.as_object().unwrap(), || "/items/3".to_string()) {
            Err(ProtocolError::MalformedDescriptor { location, .. }) => {
                assert_eq!(location, "/items/3");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn root_errors_use_the_root_label() {
        match CallDescriptor::from_value(&json!({"path": []})) {
            Err(ProtocolError::MalformedDescriptor { location, .. }) => {
                assert_eq!(location, ROOT_LOCATION);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(location_label("/0/args"), "/0/args");
    }
}
