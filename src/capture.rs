//! Call capturing: navigate a capability tree and get descriptors back
//! instead of results.
//!
//! A [`CaptureProxy`] wraps one namespace plus the path taken to reach it.
//! Navigating to a child namespace yields another proxy; navigating to a
//! callable yields a [`CaptureFn`] that can be turned into a plain call, a
//! construction or a bare reference. Nothing here invokes a capability.

use crate::capability::{CallKind, CapabilityNode, CapabilityTree, Namespace};
use crate::descriptor::CallDescriptor;
use crate::error::{ProtocolError, dotted};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::trace;

/// Capturing view of a namespace.
#[derive(Clone, Debug)]
pub struct CaptureProxy<'t> {
    node: &'t Namespace,
    path: Vec<String>,
}

/// What navigating one step from a proxy produced.
#[derive(Clone, Debug)]
pub enum Captured<'t> {
    Namespace(CaptureProxy<'t>),
    Function(CaptureFn),
}

impl<'t> CaptureProxy<'t> {
    pub fn new(tree: &'t CapabilityTree) -> Self {
        Self {
            node: tree,
            path: Vec::new(),
        }
    }

    /// Path from the tree root to this namespace.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Step to child `name`.
    ///
    /// Fails with [`ProtocolError::Path`] when the child is a constant. A
    /// missing child is reported the same way: the capturer can only describe
    /// names the local tree actually exposes.
    pub fn get(&self, name: &str) -> Result<Captured<'t>, ProtocolError> {
        let mut path = self.path.clone();
        path.push(name.to_string());
        match self.node.get(name) {
            Some(CapabilityNode::Namespace(child)) => Ok(Captured::Namespace(CaptureProxy {
                node: child,
                path,
            })),
            Some(CapabilityNode::Callable(callable)) => Ok(Captured::Function(CaptureFn {
                path,
                kind: callable.kind(),
            })),
            Some(other) => Err(ProtocolError::Path {
                path: dotted(&path),
                found: other.describe(),
            }),
            None => Err(ProtocolError::Path {
                path: dotted(&path),
                found: "nothing",
            }),
        }
    }

    /// Step to child namespace `name`.
    pub fn namespace(&self, name: &str) -> Result<CaptureProxy<'t>, ProtocolError> {
        match self.get(name)? {
            Captured::Namespace(proxy) => Ok(proxy),
            Captured::Function(func) => Err(ProtocolError::Path {
                path: func.dotted_path(),
                found: "a callable where a namespace was expected",
            }),
        }
    }

    /// Step to child callable `name`.
    pub fn function(&self, name: &str) -> Result<CaptureFn, ProtocolError> {
        match self.get(name)? {
            Captured::Function(func) => Ok(func),
            Captured::Namespace(proxy) => Err(ProtocolError::Path {
                path: dotted(&proxy.path),
                found: "a namespace where a callable was expected",
            }),
        }
    }

    /// Walk several steps at once, e.g. `["Math", "sqrt"]`.
    pub fn at<S: AsRef<str>>(&self, path: &[S]) -> Result<Captured<'t>, ProtocolError> {
        let mut current = Captured::Namespace(self.clone());
        for segment in path {
            current = match current {
                Captured::Namespace(proxy) => proxy.get(segment.as_ref())?,
                Captured::Function(func) => {
                    let mut path = func.path;
                    path.push(segment.as_ref().to_string());
                    return Err(ProtocolError::Path {
                        path: dotted(&path),
                        found: "a member of a callable",
                    });
                }
            };
        }
        Ok(current)
    }

    /// Walk a dotted path such as `Math.sqrt` down to a callable.
    pub fn function_at(&self, dotted_path: &str) -> Result<CaptureFn, ProtocolError> {
        let segments: Vec<&str> = dotted_path.split('.').collect();
        match self.at(&segments)? {
            Captured::Function(func) => Ok(func),
            Captured::Namespace(proxy) => Err(ProtocolError::Path {
                path: dotted(&proxy.path),
                found: "a namespace where a callable was expected",
            }),
        }
    }
}

/// A captured callable, not yet invoked.
///
/// Serializing it directly produces the reference form `{"path": [...]}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureFn {
    path: Vec<String>,
    kind: CallKind,
}

impl CaptureFn {
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn kind(&self) -> CallKind {
        self.kind
    }

    pub fn dotted_path(&self) -> String {
        dotted(&self.path)
    }

    /// Capture a plain call. Constructors refuse with
    /// [`ProtocolError::InvocationMode`].
    pub fn call(&self, args: Vec<Value>) -> Result<CallDescriptor, ProtocolError> {
        if self.kind == CallKind::Constructor {
            return Err(ProtocolError::InvocationMode {
                path: self.dotted_path(),
            });
        }
        trace!(path = %self.dotted_path(), args = args.len(), "captured call");
        Ok(CallDescriptor::call(self.path.clone(), args))
    }

    /// Capture a construction.
    ///
    /// Plain functions are not rejected here; the hydrating side reports
    /// [`ProtocolError::NotAConstructor`] against its own tree.
    pub fn construct(&self, args: Vec<Value>) -> CallDescriptor {
        trace!(path = %self.dotted_path(), args = args.len(), "captured construction");
        CallDescriptor::construct(self.path.clone(), args)
    }

    /// Reference to the capability itself; hydrates to the live callable.
    pub fn reference(&self) -> CallDescriptor {
        CallDescriptor::reference(self.path.clone())
    }

    /// Wire form of [`CaptureFn::reference`].
    pub fn to_value(&self) -> Value {
        self.reference().to_value()
    }
}

impl Serialize for CaptureFn {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.reference().serialize(serializer)
    }
}

impl From<CaptureFn> for Value {
    fn from(func: CaptureFn) -> Self {
        func.to_value()
    }
}
