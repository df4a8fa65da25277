//! Capture a call descriptor from the command line.
//!
//! Navigates the standard capability tree through the capturer, so unknown
//! paths, constants and constructors invoked as plain calls are rejected the
//! same way a dehydrating client would reject them. Prints the descriptor as
//! compact JSON; `--list` prints every capability path instead.

use anyhow::{Context, Result, anyhow, bail};
use callwire::builtins::standard_capabilities;
use callwire::runtime::init_logging;
use callwire::{CallDescriptor, CaptureFn, dehydrate};
use serde_json::Value;
use std::env;
use std::ffi::OsString;

fn main() {
    init_logging();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse()?;
    let tree = standard_capabilities();

    if args.list {
        for (path, kind) in tree.callables() {
            println!("{path}\t{}", kind.as_str());
        }
        return Ok(());
    }

    let path = args
        .path
        .ok_or_else(|| anyhow!("--path is required\n{}", usage()))?;
    let descriptor = dehydrate(&tree, |caps| -> Result<CallDescriptor> {
        let target = caps
            .function_at(&path)
            .with_context(|| format!("capturing {path}"))?;
        build(&target, args.mode, args.call_args)
    })?;
    println!("{}", serde_json::to_string(&descriptor.to_value())?);
    Ok(())
}

fn build(target: &CaptureFn, mode: Mode, call_args: Vec<Value>) -> Result<CallDescriptor> {
    match mode {
        Mode::Call => Ok(target.call(call_args)?),
        Mode::Construct => Ok(target.construct(call_args)),
        Mode::Reference => {
            if !call_args.is_empty() {
                bail!("--reference cannot be combined with --arg");
            }
            Ok(target.reference())
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Call,
    Construct,
    Reference,
}

/// Parsed command-line arguments for a single capture.
struct CliArgs {
    list: bool,
    path: Option<String>,
    call_args: Vec<Value>,
    mode: Mode,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1);
        let mut list = false;
        let mut path: Option<String> = None;
        let mut call_args = Vec::new();
        let mut mode: Option<Mode> = None;

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--list" => list = true,
                "--path" => {
                    if path.is_some() {
                        bail!("--path may only be provided once");
                    }
                    path = Some(next_value(&mut args, "--path")?);
                }
                "--arg" => {
                    let raw = next_value(&mut args, "--arg")?;
                    let value: Value = serde_json::from_str(&raw)
                        .with_context(|| format!("invalid JSON for --arg: {raw}"))?;
                    call_args.push(value);
                }
                "--construct" => set_mode(&mut mode, Mode::Construct)?,
                "--reference" => set_mode(&mut mode, Mode::Reference)?,
                "--help" | "-h" => {
                    print!("{}", usage());
                    std::process::exit(0);
                }
                other => bail!("unknown flag: {other}\n{}", usage()),
            }
        }

        Ok(CliArgs {
            list,
            path,
            call_args,
            mode: mode.unwrap_or(Mode::Call),
        })
    }
}

fn set_mode(slot: &mut Option<Mode>, mode: Mode) -> Result<()> {
    if slot.is_some() {
        bail!("--construct and --reference are mutually exclusive");
    }
    *slot = Some(mode);
    Ok(())
}

fn next_value(args: &mut impl Iterator<Item = OsString>, flag: &str) -> Result<String> {
    args.next()
        .map(|os| {
            os.into_string()
                .map_err(|_| anyhow!("value for {flag} is not valid UTF-8"))
        })
        .transpose()?
        .ok_or_else(|| anyhow!("missing value for {flag}"))
}

fn usage() -> &'static str {
    "Usage: capture-call --path Dotted.Name [--arg JSON]... [--construct|--reference]\n\
       capture-call --list\n\
Prints the call descriptor the capturer produces for the given capability of the standard tree.\n"
}
