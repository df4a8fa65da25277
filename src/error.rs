//! Error taxonomy shared by capture and hydration.
//!
//! Capture-time failures (`Path`, `InvocationMode`) surface while a builder
//! navigates a [`CaptureProxy`](crate::CaptureProxy); everything else is raised
//! while resolving descriptors. Every variant carries the dotted capability
//! path so mismatched trees on either side of the wire are easy to spot.

use std::fmt;

/// Failure raised by the capturer or the hydration engine.
#[derive(Debug)]
pub enum ProtocolError {
    /// Capturer navigation reached a leaf that is neither a namespace nor a
    /// callable (or the wrong one of the two was requested).
    Path { path: String, found: &'static str },
    /// A constructor-style capability was invoked as a plain call.
    InvocationMode { path: String },
    /// The descriptor path does not lead to a callable in the hydrating tree.
    UnresolvedPath {
        path: String,
        missing: Option<String>,
    },
    /// The descriptor asked for construction but the target is a plain
    /// function.
    NotAConstructor { path: String },
    /// An object carrying a `path` key does not have the descriptor shape.
    MalformedDescriptor { location: String, reason: String },
    /// Payload nesting went past the configured `max_depth`.
    DepthExceeded { limit: usize },
    /// The capability ran and returned an error of its own.
    Capability {
        path: String,
        source: anyhow::Error,
    },
}

impl ProtocolError {
    /// Dotted capability path involved in the failure, when there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            ProtocolError::Path { path, .. }
            | ProtocolError::InvocationMode { path }
            | ProtocolError::UnresolvedPath { path, .. }
            | ProtocolError::NotAConstructor { path }
            | ProtocolError::Capability { path, .. } => Some(path.as_str()),
            ProtocolError::MalformedDescriptor { .. } | ProtocolError::DepthExceeded { .. } => {
                None
            }
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Path { path, found } => {
                write!(
                    f,
                    "capability path '{path}' reached {found}; only namespaces and callables can be captured"
                )
            }
            ProtocolError::InvocationMode { path } => {
                write!(f, "capability '{path}' must be invoked as a construction")
            }
            ProtocolError::UnresolvedPath { path, missing } => match missing {
                Some(segment) => write!(
                    f,
                    "capability path '{path}' does not resolve: no entry named '{segment}'"
                ),
                None => write!(f, "capability path '{path}' does not resolve to a callable"),
            },
            ProtocolError::NotAConstructor { path } => {
                write!(f, "capability '{path}' is not a constructor")
            }
            ProtocolError::MalformedDescriptor { location, reason } => {
                write!(f, "malformed call descriptor at {location}: {reason}")
            }
            ProtocolError::DepthExceeded { limit } => {
                write!(f, "payload nesting exceeds the configured limit of {limit}")
            }
            ProtocolError::Capability { path, source } => {
                write!(f, "capability '{path}' failed: {source}")
            }
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Capability { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

/// Join path segments the way error messages and logs display them.
pub fn dotted<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::error::Error as _;

    #[test]
    fn messages_name_the_dotted_path() {
        let err = ProtocolError::UnresolvedPath {
            path: dotted(&["Missing", "fn"]),
            missing: Some("Missing".to_string()),
        };
        let text = err.to_string();
        assert!(text.contains("Missing.fn"), "got {text}");
        assert_eq!(err.path(), Some("Missing.fn"));

        let err = ProtocolError::NotAConstructor {
            path: "Math.max".to_string(),
        };
        assert!(err.to_string().contains("Math.max"));
    }

    #[test]
    fn capability_failures_keep_their_source() {
        let err = ProtocolError::Capability {
            path: "Math.sqrt".to_string(),
            source: anyhow!("negative input"),
        };
        let source = err.source().expect("source present");
        assert_eq!(source.to_string(), "negative input");
    }

    #[test]
    fn dotted_joins_segments() {
        assert_eq!(dotted::<&str>(&[]), "");
        assert_eq!(dotted(&["a"]), "a");
        assert_eq!(dotted(&["a".to_string(), "b".to_string()]), "a.b");
    }
}
