//! Capability trees: the whitelist descriptors are resolved against.
//!
//! A tree is a [`Namespace`] of named children. Leaves are [`Callable`]s
//! tagged at registration as plain functions or constructors; constants may
//! be parked in the tree but are never invocable.

pub mod callable;
pub mod tree;

pub use callable::{CallKind, Callable, CapabilityFn};
pub use tree::{CapabilityNode, CapabilityTree, Lookup, Namespace};
