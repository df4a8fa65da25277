use crate::live::Live;
use anyhow::{Result, bail};
use std::fmt;
use std::sync::Arc;

/// Signature every capability implements.
///
/// Arguments arrive already hydrated; capabilities report their own failures
/// through `anyhow` and the resolver wraps them with the capability path.
pub type CapabilityFn = dyn Fn(Vec<Live>) -> Result<Live> + Send + Sync;

/// How a callable must be invoked.
///
/// The tag is fixed at registration; nothing is inferred from the call site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
    Plain,
    Constructor,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::Plain => "function",
            CallKind::Constructor => "constructor",
        }
    }
}

/// Shared handle to a registered capability.
///
/// Cloning is cheap and keeps identity: two clones compare equal under
/// [`Callable::ptr_eq`], which is how hydrated references are checked against
/// the tree they came from.
#[derive(Clone)]
pub struct Callable {
    inner: Arc<CallableInner>,
}

struct CallableInner {
    kind: CallKind,
    func: Box<CapabilityFn>,
}

impl Callable {
    pub fn new<F>(kind: CallKind, func: F) -> Self
    where
        F: Fn(Vec<Live>) -> Result<Live> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(CallableInner {
                kind,
                func: Box::new(func),
            }),
        }
    }

    pub fn plain<F>(func: F) -> Self
    where
        F: Fn(Vec<Live>) -> Result<Live> + Send + Sync + 'static,
    {
        Self::new(CallKind::Plain, func)
    }

    pub fn constructor<F>(func: F) -> Self
    where
        F: Fn(Vec<Live>) -> Result<Live> + Send + Sync + 'static,
    {
        Self::new(CallKind::Constructor, func)
    }

    pub fn kind(&self) -> CallKind {
        self.inner.kind
    }

    pub fn is_constructor(&self) -> bool {
        self.inner.kind == CallKind::Constructor
    }

    /// Plain invocation. Refuses constructor-style callables.
    pub fn call(&self, args: Vec<Live>) -> Result<Live> {
        if self.is_constructor() {
            bail!("constructor invoked as a plain call");
        }
        (self.inner.func)(args)
    }

    /// Construction. Refuses plain callables.
    pub fn construct(&self, args: Vec<Live>) -> Result<Live> {
        if !self.is_constructor() {
            bail!("plain function invoked as a construction");
        }
        (self.inner.func)(args)
    }

    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("kind", &self.inner.kind)
            .field("id", &Arc::as_ptr(&self.inner))
            .finish()
    }
}
