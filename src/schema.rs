//! JSON Schema for the descriptor wire format.
//!
//! Hydration already rejects malformed descriptors, but it stops at the first
//! one. The schema check here walks a whole payload up front and reports every
//! descriptor that violates `schema/call_descriptor.schema.json`, which is what
//! a receiving service wants before it starts executing anything.

use anyhow::{Context, Result, anyhow};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::descriptor::{ARGS_KEY, is_descriptor, location_label};

const EMBEDDED_SCHEMA: &str = include_str!("../schema/call_descriptor.schema.json");
const DEFAULT_SCHEMA_VERSION: &str = "call_descriptor_v1";

/// Compiled descriptor schema.
pub struct DescriptorSchema {
    schema_version: String,
    compiled: JSONSchema,
}

impl DescriptorSchema {
    /// Compile the schema shipped with the crate.
    pub fn embedded() -> Result<Self> {
        let raw: Value =
            serde_json::from_str(EMBEDDED_SCHEMA).context("parsing embedded descriptor schema")?;
        Self::from_value(&raw)
    }

    /// Compile a schema read from disk, e.g. a stricter copy kept by the
    /// embedding service.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening schema {}", path.display()))?;
        let raw: Value = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing schema {}", path.display()))?;
        Self::from_value(&raw).with_context(|| format!("loading schema {}", path.display()))
    }

    pub fn from_value(raw: &Value) -> Result<Self> {
        let schema_version = raw
            .get("schema_version")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_SCHEMA_VERSION)
            .to_string();
        let compiled = JSONSchema::compile(raw)
            .map_err(|err| anyhow!("compiling descriptor schema: {err}"))?;
        Ok(Self {
            schema_version,
            compiled,
        })
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// Validate one descriptor-shaped value. Returns every violation.
    pub fn validate_descriptor(&self, value: &Value) -> Vec<String> {
        match self.compiled.validate(value) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.map(|err| err.to_string()).collect(),
        }
    }
}

/// Check every descriptor in `payload`, including those nested in `args`.
///
/// Errors are collected rather than short-circuited and each one is prefixed
/// with the JSON pointer of the offending descriptor.
pub fn validate_payload(schema: &DescriptorSchema, payload: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    collect_errors(schema, payload, &mut String::new(), &mut errors);
    errors
}

fn collect_errors(
    schema: &DescriptorSchema,
    value: &Value,
    pointer: &mut String,
    errors: &mut Vec<String>,
) {
    match value {
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                with_segment(pointer, &idx.to_string(), |pointer| {
                    collect_errors(schema, item, pointer, errors)
                });
            }
        }
        Value::Object(map) if is_descriptor(value) => {
            let location = location_label(pointer);
            for message in schema.validate_descriptor(value) {
                errors.push(format!("{location}: {message}"));
            }
            if let Some(Value::Array(args)) = map.get(ARGS_KEY) {
                with_segment(pointer, ARGS_KEY, |pointer| {
                    for (idx, arg) in args.iter().enumerate() {
                        with_segment(pointer, &idx.to_string(), |pointer| {
                            collect_errors(schema, arg, pointer, errors)
                        });
                    }
                });
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                with_segment(pointer, key, |pointer| {
                    collect_errors(schema, item, pointer, errors)
                });
            }
        }
        _ => {}
    }
}

fn with_segment(pointer: &mut String, segment: &str, f: impl FnOnce(&mut String)) {
    let len = pointer.len();
    pointer.push('/');
    pointer.push_str(&segment.replace('~', "~0").replace('/', "~1"));
    f(pointer);
    pointer.truncate(len);
}
