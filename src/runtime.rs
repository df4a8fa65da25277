//! Runtime helpers shared across binaries.
//!
//! Centralizes logging setup and environment-driven hydration settings so the
//! CLIs behave the same way instead of each re-implementing them.

use crate::hydrate::HydrateOptions;
use anyhow::{Context, Result};
use std::env;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the default payload depth limit.
pub const MAX_DEPTH_ENV: &str = "CALLWIRE_MAX_DEPTH";

/// Install a stderr `tracing` subscriber filtered by `RUST_LOG`.
///
/// Defaults to `warn` so stdout stays a clean JSON channel. Safe to call more
/// than once; later calls are ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Hydration options from the environment.
///
/// An unset or empty `CALLWIRE_MAX_DEPTH`, or `0`, means unbounded.
pub fn hydrate_options_from_env() -> Result<HydrateOptions> {
    let raw = env::var(MAX_DEPTH_ENV).ok();
    Ok(HydrateOptions {
        max_depth: parse_max_depth(raw.as_deref())
            .with_context(|| format!("invalid {MAX_DEPTH_ENV}"))?,
    })
}

/// Parse a depth limit as given on the command line or in the environment.
pub fn parse_max_depth(raw: Option<&str>) -> Result<Option<usize>> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let depth: usize = raw
        .parse()
        .with_context(|| format!("expected a non-negative integer, got '{raw}'"))?;
    Ok((depth > 0).then_some(depth))
}
