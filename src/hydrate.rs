//! Hydration: turn a dehydrated payload back into live values.
//!
//! The walk is a structural rewrite. Arrays keep order and length, objects
//! keep every key, primitives pass through, and any object with a `path` key
//! is resolved against the capability tree. Descriptor arguments are hydrated
//! before the outer call runs, so resolution and hydration recurse into each
//! other. The recursion runs on a heap-allocated `reblessive` stack, so payload
//! depth is not limited by the thread's native stack. The first failure
//! aborts the whole payload.

use crate::capability::{CapabilityNode, CapabilityTree, Lookup};
use crate::descriptor::{ARGS_KEY, CallDescriptor, DescriptorView};
use crate::error::ProtocolError;
use crate::live::Live;
use reblessive::{Stack, Stk};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Knobs for a [`Hydrator`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HydrateOptions {
    /// Maximum nesting depth of the payload, counting arrays, objects and
    /// descriptor argument lists. `None` leaves depth bounded only by the
    /// payload itself.
    pub max_depth: Option<usize>,
}

/// Hydrates payloads against one capability tree.
#[derive(Clone, Debug)]
pub struct Hydrator<'t> {
    tree: &'t CapabilityTree,
    options: HydrateOptions,
}

/// Position of the walk inside the payload, kept for diagnostics.
struct Walk {
    depth: usize,
    pointer: Vec<String>,
}

impl Walk {
    fn root() -> Self {
        Self {
            depth: 0,
            pointer: Vec::new(),
        }
    }

    fn location(&self) -> String {
        self.pointer
            .iter()
            .map(|segment| format!("/{}", segment.replace('~', "~0").replace('/', "~1")))
            .collect()
    }
}

impl<'t> Hydrator<'t> {
    pub fn new(tree: &'t CapabilityTree) -> Self {
        Self::with_options(tree, HydrateOptions::default())
    }

    pub fn with_options(tree: &'t CapabilityTree, options: HydrateOptions) -> Self {
        Self { tree, options }
    }

    pub fn options(&self) -> &HydrateOptions {
        &self.options
    }

    /// Hydrate a whole payload.
    pub fn hydrate(&self, payload: &Value) -> Result<Live, ProtocolError> {
        let mut walk = Walk::root();
        let mut stack = Stack::new();
        stack
            .enter(|stk| self.hydrate_value(stk, payload, &mut walk))
            .finish()
    }

    /// Resolve a single descriptor without walking a surrounding payload.
    pub fn resolve(&self, descriptor: &CallDescriptor) -> Result<Live, ProtocolError> {
        let view = descriptor.view()?;
        let mut walk = Walk::root();
        let mut stack = Stack::new();
        stack
            .enter(|stk| self.resolve_view(stk, &view, &mut walk))
            .finish()
    }

    async fn hydrate_value(
        &self,
        stk: &mut Stk,
        value: &Value,
        walk: &mut Walk,
    ) -> Result<Live, ProtocolError> {
        match value {
            Value::Array(items) => {
                self.descend(walk)?;
                let mut out = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    walk.pointer.push(idx.to_string());
                    let hydrated = stk.run(|stk| self.hydrate_value(stk, item, walk)).await;
                    walk.pointer.pop();
                    out.push(hydrated?);
                }
                walk.depth -= 1;
                Ok(Live::Array(out))
            }
            Value::Object(map) => {
                if let Some(view) = DescriptorView::parse(map, || walk.location())? {
                    return stk.run(|stk| self.resolve_view(stk, &view, walk)).await;
                }
                self.descend(walk)?;
                let mut out = BTreeMap::new();
                for (key, item) in map {
                    walk.pointer.push(key.clone());
                    let hydrated = stk.run(|stk| self.hydrate_value(stk, item, walk)).await;
                    walk.pointer.pop();
                    out.insert(key.clone(), hydrated?);
                }
                walk.depth -= 1;
                Ok(Live::Object(out))
            }
            Value::Null => Ok(Live::Null),
            Value::Bool(b) => Ok(Live::Bool(*b)),
            Value::Number(n) => Ok(Live::Number(n.clone())),
            Value::String(s) => Ok(Live::String(s.clone())),
        }
    }

    async fn resolve_view(
        &self,
        stk: &mut Stk,
        view: &DescriptorView<'_>,
        walk: &mut Walk,
    ) -> Result<Live, ProtocolError> {
        let path = view.dotted_path();
        let callable = match self.tree.lookup(&view.path) {
            Lookup::Found(CapabilityNode::Callable(callable)) => callable,
            Lookup::Found(_) => {
                return Err(ProtocolError::UnresolvedPath {
                    path,
                    missing: None,
                });
            }
            Lookup::Missing { segment, .. } => {
                return Err(ProtocolError::UnresolvedPath {
                    path,
                    missing: Some(segment),
                });
            }
        };

        let Some(raw_args) = view.args else {
            debug!(path = %path, "resolved capability reference");
            return Ok(Live::Callable(callable.clone()));
        };

        self.descend(walk)?;
        walk.pointer.push(ARGS_KEY.to_string());
        let mut args = Vec::with_capacity(raw_args.len());
        for (idx, raw) in raw_args.iter().enumerate() {
            walk.pointer.push(idx.to_string());
            let hydrated = stk.run(|stk| self.hydrate_value(stk, raw, walk)).await;
            walk.pointer.pop();
            args.push(hydrated?);
        }
        walk.pointer.pop();
        walk.depth -= 1;

        // Arguments are fully hydrated before the invocation mode is checked.
        if view.construct && !callable.is_constructor() {
            return Err(ProtocolError::NotAConstructor { path });
        }
        if !view.construct && callable.is_constructor() {
            return Err(ProtocolError::InvocationMode { path });
        }

        debug!(
            path = %path,
            args = args.len(),
            construct = view.construct,
            "invoking capability"
        );
        let result = if view.construct {
            callable.construct(args)
        } else {
            callable.call(args)
        };
        result.map_err(|source| ProtocolError::Capability { path, source })
    }

    fn descend(&self, walk: &mut Walk) -> Result<(), ProtocolError> {
        walk.depth += 1;
        if let Some(limit) = self.options.max_depth {
            if walk.depth > limit {
                return Err(ProtocolError::DepthExceeded { limit });
            }
        }
        Ok(())
    }
}

/// Hydrate `payload` against `tree` with default options.
pub fn hydrate(payload: &Value, tree: &CapabilityTree) -> Result<Live, ProtocolError> {
    Hydrator::new(tree).hydrate(payload)
}

/// Resolve one descriptor against `tree`.
pub fn resolve_descriptor(
    tree: &CapabilityTree,
    descriptor: &CallDescriptor,
) -> Result<Live, ProtocolError> {
    Hydrator::new(tree).resolve(descriptor)
}
