//! Named tree of namespaces and callables exposed to hydration.
//!
//! The embedding application builds the tree once and hands out shared
//! references; neither the capturer nor the resolver mutates it. Children are
//! kept in a `BTreeMap` so listings are deterministic.

use crate::capability::callable::{CallKind, Callable};
use crate::live::Live;
use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeMap;

/// One entry in a capability tree.
#[derive(Clone, Debug)]
pub enum CapabilityNode {
    Namespace(Namespace),
    Callable(Callable),
    /// Plain data parked in the tree. It can be neither captured nor resolved.
    Constant(Value),
}

impl CapabilityNode {
    /// Human-readable label used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            CapabilityNode::Namespace(_) => "a namespace",
            CapabilityNode::Callable(callable) => match callable.kind() {
                CallKind::Plain => "a function",
                CallKind::Constructor => "a constructor",
            },
            CapabilityNode::Constant(_) => "a non-callable value",
        }
    }
}

/// Result of walking a path through a tree.
#[derive(Debug)]
pub enum Lookup<'t> {
    Found(&'t CapabilityNode),
    /// `segment` was not present at `depth` (0-based) along the path.
    Missing { segment: String, depth: usize },
}

/// Mapping from names to child nodes. The root of a capability tree is a
/// namespace.
#[derive(Clone, Debug, Default)]
pub struct Namespace {
    children: BTreeMap<String, CapabilityNode>,
}

/// The root namespace handed to the capturer and the resolver.
pub type CapabilityTree = Namespace;

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        node: CapabilityNode,
    ) -> Option<CapabilityNode> {
        self.children.insert(name.into(), node)
    }

    pub fn with_node(mut self, name: impl Into<String>, node: CapabilityNode) -> Self {
        self.insert(name, node);
        self
    }

    /// Register a plain function.
    pub fn with_function<F>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Vec<Live>) -> Result<Live> + Send + Sync + 'static,
    {
        self.with_node(name, CapabilityNode::Callable(Callable::plain(func)))
    }

    /// Register a constructor-style callable.
    pub fn with_constructor<F>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Vec<Live>) -> Result<Live> + Send + Sync + 'static,
    {
        self.with_node(name, CapabilityNode::Callable(Callable::constructor(func)))
    }

    /// Register an existing callable handle, preserving its identity.
    pub fn with_callable(self, name: impl Into<String>, callable: Callable) -> Self {
        self.with_node(name, CapabilityNode::Callable(callable))
    }

    pub fn with_namespace(self, name: impl Into<String>, namespace: Namespace) -> Self {
        self.with_node(name, CapabilityNode::Namespace(namespace))
    }

    pub fn with_constant(self, name: impl Into<String>, value: Value) -> Self {
        self.with_node(name, CapabilityNode::Constant(value))
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityNode> {
        self.children.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Iterates direct children in name order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &CapabilityNode)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Walk `path` from this namespace.
    ///
    /// Stepping into anything other than a namespace counts as missing, so
    /// `["sqrt", "x"]` against a tree where `sqrt` is a function reports `x`.
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Lookup<'_> {
        let Some((last, parents)) = path.split_last() else {
            return Lookup::Missing {
                segment: String::new(),
                depth: 0,
            };
        };
        let mut current = self;
        for (depth, segment) in parents.iter().enumerate() {
            match current.get(segment.as_ref()) {
                Some(CapabilityNode::Namespace(ns)) => current = ns,
                Some(_) => {
                    return Lookup::Missing {
                        segment: path[depth + 1].as_ref().to_string(),
                        depth: depth + 1,
                    };
                }
                None => {
                    return Lookup::Missing {
                        segment: segment.as_ref().to_string(),
                        depth,
                    };
                }
            }
        }
        match current.get(last.as_ref()) {
            Some(node) => Lookup::Found(node),
            None => Lookup::Missing {
                segment: last.as_ref().to_string(),
                depth: parents.len(),
            },
        }
    }

    /// Every callable reachable from this namespace as `(dotted path, kind)`,
    /// depth first in name order.
    pub fn callables(&self) -> Vec<(String, CallKind)> {
        let mut out = Vec::new();
        collect_callables(self, &mut Vec::new(), &mut out);
        out
    }
}

fn collect_callables(
    ns: &Namespace,
    prefix: &mut Vec<String>,
    out: &mut Vec<(String, CallKind)>,
) {
    for (name, node) in ns.entries() {
        prefix.push(name.to_string());
        match node {
            CapabilityNode::Namespace(child) => collect_callables(child, prefix, out),
            CapabilityNode::Callable(callable) => out.push((prefix.join("."), callable.kind())),
            CapabilityNode::Constant(_) => {}
        }
        prefix.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> CapabilityTree {
        CapabilityTree::new()
            .with_function("sqrt", |_| Ok(Live::Null))
            .with_namespace(
                "Geo",
                Namespace::new()
                    .with_constructor("Point", |_| Ok(Live::Null))
                    .with_constant("ORIGIN", json!([0, 0])),
            )
    }

    #[test]
    fn lookup_walks_namespaces() {
        let tree = sample();
        match tree.lookup(&["Geo", "Point"]) {
            Lookup::Found(CapabilityNode::Callable(c)) => assert!(c.is_constructor()),
            other => panic!("expected constructor, got {other:?}"),
        }
        assert!(matches!(
            tree.lookup(&["Geo", "ORIGIN"]),
            Lookup::Found(CapabilityNode::Constant(_))
        ));
    }

    #[test]
    fn lookup_reports_first_missing_segment() {
        let tree = sample();
        match tree.lookup(&["Missing", "fn"]) {
            Lookup::Missing { segment, depth } => {
                assert_eq!(segment, "Missing");
                assert_eq!(depth, 0);
            }
            other => panic!("expected missing, got {other:?}"),
        }
        match tree.lookup(&["sqrt", "inner"]) {
            Lookup::Missing { segment, depth } => {
                assert_eq!(segment, "inner");
                assert_eq!(depth, 1);
            }
            other => panic!("expected missing, got {other:?}"),
        }
    }

    #[test]
    fn callables_lists_dotted_paths_in_order() {
        let listed = sample().callables();
        assert_eq!(
            listed,
            vec![
                ("Geo.Point".to_string(), CallKind::Constructor),
                ("sqrt".to_string(), CallKind::Plain),
            ]
        );
    }
}
