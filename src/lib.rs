//! Dehydrate capability invocations into JSON and hydrate them back.
//!
//! A caller describes "compute this value with these whitelisted operations"
//! by navigating a [`CaptureProxy`] over a [`CapabilityTree`]; every call it
//! makes comes back as a [`CallDescriptor`] instead of a result. The payload
//! that embeds those descriptors is plain JSON. The receiving side calls
//! [`hydrate`] with its own tree, which resolves each descriptor (arguments
//! first), runs it and splices the result in place.
//!
//! The capability tree is the trust boundary: hydration executes exactly the
//! callables reachable through it and nothing else.

pub mod builtins;
pub mod capability;
pub mod capture;
pub mod descriptor;
pub mod error;
pub mod hydrate;
pub mod live;
pub mod runtime;
pub mod schema;

pub use capability::{
    CallKind, Callable, CapabilityFn, CapabilityNode, CapabilityTree, Lookup, Namespace,
};
pub use capture::{CaptureFn, CaptureProxy, Captured};
pub use descriptor::{CallDescriptor, is_descriptor};
pub use error::ProtocolError;
pub use hydrate::{HydrateOptions, Hydrator, hydrate, resolve_descriptor};
pub use live::{Live, Opaque};
pub use schema::{DescriptorSchema, validate_payload};

/// Wrap `tree` so navigation yields descriptors rather than results.
pub fn create_capture_proxy(tree: &CapabilityTree) -> CaptureProxy<'_> {
    CaptureProxy::new(tree)
}

/// Run `builder` against a capturing view of `tree` and return whatever it
/// builds, untouched.
///
/// No validation happens here; a malformed descriptor surfaces when the
/// payload is hydrated.
pub fn dehydrate<'t, F, T>(tree: &'t CapabilityTree, builder: F) -> T
where
    F: FnOnce(CaptureProxy<'t>) -> T,
{
    builder(CaptureProxy::new(tree))
}
