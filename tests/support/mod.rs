use anyhow::{Context, Result, bail};
use callwire::{CapabilityTree, Live, Namespace, Opaque};
use std::process::{Command, Output};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn helper_binary(name: &str) -> Command {
    let path = match name {
        "hydrate-payload" => env!("CARGO_BIN_EXE_hydrate-payload"),
        "capture-call" => env!("CARGO_BIN_EXE_capture-call"),
        other => panic!("unknown helper binary {other}"),
    };
    let mut cmd = Command::new(path);
    cmd.env_remove("CALLWIRE_MAX_DEPTH");
    cmd.env_remove("RUST_LOG");
    cmd
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

/// Runs a command that is expected to fail and returns its stderr.
pub fn run_failing(mut cmd: Command) -> Result<String> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        bail!(
            "command {:?} unexpectedly succeeded\nstdout: {}",
            cmd,
            String::from_utf8_lossy(&output.stdout)
        );
    }
    Ok(String::from_utf8_lossy(&output.stderr).into_owned())
}

/// Host type built by the `Clock.Instant` constructor in [`clock_tree`].
#[derive(Debug, PartialEq)]
pub struct Instant {
    pub millis: i64,
}

/// Tree with an opaque-producing constructor and an invocation counter, for
/// checks that depend on identity and side effects.
pub fn clock_tree(calls: Arc<AtomicUsize>) -> CapabilityTree {
    CapabilityTree::new()
        .with_function("sqrt", |args| {
            let n = args.first().and_then(Live::as_f64).unwrap_or_default();
            Ok(Live::number(n.sqrt()))
        })
        .with_function("max", |args| {
            let best = args
                .iter()
                .filter_map(Live::as_f64)
                .fold(f64::NEG_INFINITY, f64::max);
            Ok(Live::number(best))
        })
        .with_namespace(
            "Clock",
            Namespace::new()
                .with_constructor("Instant", |args| {
                    let millis = args.first().and_then(Live::as_i64).unwrap_or_default();
                    Ok(Live::Opaque(Opaque::new(Instant { millis })))
                })
                .with_function("tick", move |_| {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok(Live::from(n as u64))
                }),
        )
}
