//! Standard capability tree served by the helper binaries.
//!
//! Small on purpose: enough arithmetic, text and list helpers to express
//! nested calls, references passed as arguments and constructions from the
//! command line. Embedding applications build their own trees.

use crate::capability::{CapabilityTree, Namespace};
use crate::live::Live;
use anyhow::{Context, Result, anyhow, bail};
use serde_json::json;
use std::collections::BTreeMap;

pub fn standard_capabilities() -> CapabilityTree {
    CapabilityTree::new()
        .with_namespace("Math", math())
        .with_namespace("Text", text())
        .with_namespace("List", list())
        .with_constructor("Point", |args| {
            let x = number_arg(&args, 0, "Point")?;
            let y = number_arg(&args, 1, "Point")?;
            let mut fields = BTreeMap::new();
            fields.insert("x".to_string(), Live::number(x));
            fields.insert("y".to_string(), Live::number(y));
            Ok(Live::Object(fields))
        })
}

fn math() -> Namespace {
    Namespace::new()
        .with_function("sqrt", |args| {
            let n = number_arg(&args, 0, "Math.sqrt")?;
            if n < 0.0 {
                bail!("Math.sqrt: {n} is negative");
            }
            Ok(Live::number(n.sqrt()))
        })
        .with_function("max", |args| fold_numbers(&args, "Math.max", f64::max))
        .with_function("min", |args| fold_numbers(&args, "Math.min", f64::min))
        .with_function("abs", |args| {
            Ok(Live::number(number_arg(&args, 0, "Math.abs")?.abs()))
        })
        .with_function("pow", |args| {
            let base = number_arg(&args, 0, "Math.pow")?;
            let exp = number_arg(&args, 1, "Math.pow")?;
            Ok(Live::number(base.powf(exp)))
        })
        .with_function("floor", |args| {
            Ok(Live::number(number_arg(&args, 0, "Math.floor")?.floor()))
        })
        .with_constant("PI", json!(std::f64::consts::PI))
}

fn text() -> Namespace {
    Namespace::new()
        .with_function("concat", |args| {
            let mut out = String::new();
            for (idx, arg) in args.iter().enumerate() {
                match arg {
                    Live::String(s) => out.push_str(s),
                    Live::Number(n) => out.push_str(&n.to_string()),
                    Live::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
                    Live::Null => out.push_str("null"),
                    other => bail!(
                        "Text.concat: argument {idx} is a {}, not text",
                        other.type_label()
                    ),
                }
            }
            Ok(Live::String(out))
        })
        .with_function("upper", |args| {
            Ok(Live::String(string_arg(&args, 0, "Text.upper")?.to_uppercase()))
        })
        .with_function("lower", |args| {
            Ok(Live::String(string_arg(&args, 0, "Text.lower")?.to_lowercase()))
        })
        .with_function("length", |args| {
            let len = string_arg(&args, 0, "Text.length")?.chars().count();
            Ok(Live::from(len as u64))
        })
}

fn list() -> Namespace {
    Namespace::new()
        .with_function("map", |args| {
            let func = args
                .first()
                .and_then(Live::as_callable)
                .ok_or_else(|| anyhow!("List.map: argument 0 must be a capability reference"))?;
            let items = array_arg(&args, 1, "List.map")?;
            let mapped = items
                .iter()
                .enumerate()
                .map(|(idx, item)| {
                    func.call(vec![item.clone()])
                        .with_context(|| format!("List.map: element {idx}"))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Live::Array(mapped))
        })
        .with_function("sum", |args| {
            let items = array_arg(&args, 0, "List.sum")?;
            let mut total = 0.0;
            for (idx, item) in items.iter().enumerate() {
                total += item
                    .as_f64()
                    .ok_or_else(|| anyhow!("List.sum: element {idx} is not a number"))?;
            }
            Ok(Live::number(total))
        })
        .with_function("range", |args| {
            let end = args
                .first()
                .and_then(Live::as_i64)
                .ok_or_else(|| anyhow!("List.range: argument 0 must be an integer"))?;
            Ok(Live::Array((0..end.max(0)).map(Live::from).collect()))
        })
}

fn number_arg(args: &[Live], idx: usize, name: &str) -> Result<f64> {
    let arg = args
        .get(idx)
        .ok_or_else(|| anyhow!("{name}: missing argument {idx}"))?;
    arg.as_f64()
        .ok_or_else(|| anyhow!("{name}: argument {idx} is a {}, not a number", arg.type_label()))
}

fn string_arg<'a>(args: &'a [Live], idx: usize, name: &str) -> Result<&'a str> {
    let arg = args
        .get(idx)
        .ok_or_else(|| anyhow!("{name}: missing argument {idx}"))?;
    arg.as_str()
        .ok_or_else(|| anyhow!("{name}: argument {idx} is a {}, not a string", arg.type_label()))
}

fn array_arg<'a>(args: &'a [Live], idx: usize, name: &str) -> Result<&'a [Live]> {
    let arg = args
        .get(idx)
        .ok_or_else(|| anyhow!("{name}: missing argument {idx}"))?;
    arg.as_array()
        .ok_or_else(|| anyhow!("{name}: argument {idx} is a {}, not an array", arg.type_label()))
}

fn fold_numbers(args: &[Live], name: &str, pick: fn(f64, f64) -> f64) -> Result<Live> {
    if args.is_empty() {
        bail!("{name}: needs at least one argument");
    }
    let mut acc = number_arg(args, 0, name)?;
    for idx in 1..args.len() {
        acc = pick(acc, number_arg(args, idx, name)?);
    }
    Ok(Live::number(acc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CallKind, ProtocolError, hydrate};
    use serde_json::json;

    #[test]
    fn lists_expected_capabilities() {
        let listed = standard_capabilities().callables();
        assert!(listed.contains(&("Math.sqrt".to_string(), CallKind::Plain)));
        assert!(listed.contains(&("Point".to_string(), CallKind::Constructor)));
        assert!(!listed.iter().any(|(path, _)| path == "Math.PI"));
    }

    #[test]
    fn map_accepts_capability_references() {
        let tree = standard_capabilities();
        let payload = json!({
            "path": ["List", "map"],
            "args": [{"path": ["Math", "sqrt"]}, [1, 4, 9]]
        });
        let live = hydrate(&payload, &tree).unwrap();
        assert_eq!(live.to_json(), Some(json!([1, 2, 3])));
    }

    #[test]
    fn map_refuses_constructor_references() {
        let tree = standard_capabilities();
        let payload = json!({
            "path": ["List", "map"],
            "args": [{"path": ["Point"]}, [1]]
        });
        match hydrate(&payload, &tree).unwrap_err() {
            ProtocolError::Capability { path, source } => {
                assert_eq!(path, "List.map");
                let chain = format!("{source:#}");
                assert!(chain.contains("element 0"), "{chain}");
                assert!(chain.contains("constructor invoked as a plain call"), "{chain}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn text_helpers_compose() {
        let tree = standard_capabilities();
        let payload = json!({
            "path": ["Text", "concat"],
            "args": [{"path": ["Text", "upper"], "args": ["ab"]}, "-", {"path": ["List", "sum"], "args": [[1, 2]]}]
        });
        let live = hydrate(&payload, &tree).unwrap();
        assert_eq!(live.as_str(), Some("AB-3"));
    }

    #[test]
    fn argument_errors_surface_as_capability_failures() {
        let tree = standard_capabilities();
        let err = hydrate(&json!({"path": ["Math", "sqrt"], "args": ["x"]}), &tree).unwrap_err();
        match err {
            ProtocolError::Capability { path, source } => {
                assert_eq!(path, "Math.sqrt");
                assert!(source.to_string().contains("not a number"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn point_is_a_constructor() {
        let tree = standard_capabilities();
        let point = hydrate(
            &json!({"path": ["Point"], "args": [1.5, 2], "isConstructor": true}),
            &tree,
        )
        .unwrap();
        assert_eq!(point.to_json(), Some(json!({"x": 1.5, "y": 2})));
    }
}
