//! Hydrate a dehydrated payload against the standard capability tree.
//!
//! Reads JSON from a file or stdin, optionally checks every embedded descriptor
//! against the wire schema, hydrates the payload and prints the result as
//! compact JSON. Results that still hold a live capability or an opaque
//! instance cannot be printed and are reported as errors.

use anyhow::{Context, Result, anyhow, bail};
use callwire::builtins::standard_capabilities;
use callwire::runtime::{hydrate_options_from_env, init_logging, parse_max_depth};
use callwire::{DescriptorSchema, Hydrator, validate_payload};
use serde_json::Value;
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::debug;

fn main() {
    init_logging();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse()?;
    let source = args.source.read()?;
    let payload: Value =
        serde_json::from_slice(&source).context("failed to parse JSON payload")?;

    if args.validate {
        let schema = match &args.schema {
            Some(path) => DescriptorSchema::from_path(path)?,
            None => DescriptorSchema::embedded()?,
        };
        let errors = validate_payload(&schema, &payload);
        if !errors.is_empty() {
            bail!(
                "payload failed {} validation:\n{}",
                schema.schema_version(),
                errors.join("\n")
            );
        }
        debug!(schema = schema.schema_version(), "payload passed schema validation");
    }

    let mut options = hydrate_options_from_env()?;
    if let Some(depth) = args.max_depth {
        options.max_depth = depth;
    }

    let tree = standard_capabilities();
    let live = Hydrator::with_options(&tree, options).hydrate(&payload)?;
    let output = live.to_json().ok_or_else(|| {
        anyhow!(
            "hydrated result contains a {} value that has no JSON form",
            live.type_label()
        )
    })?;

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

struct CliArgs {
    source: InputSource,
    validate: bool,
    schema: Option<PathBuf>,
    /// `Some(None)` is an explicit "unbounded" from `--max-depth 0`.
    max_depth: Option<Option<usize>>,
}

enum InputSource {
    File(PathBuf),
    Stdin,
}

impl InputSource {
    fn read(&self) -> Result<Vec<u8>> {
        match self {
            InputSource::File(path) => {
                if !path.is_file() {
                    bail!("payload file not found: {}", path.display());
                }
                fs::read(path).with_context(|| format!("reading {}", path.display()))
            }
            InputSource::Stdin => {
                let mut buf = Vec::new();
                io::stdin()
                    .read_to_end(&mut buf)
                    .context("reading stdin")?;
                Ok(buf)
            }
        }
    }
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1);
        let mut source: Option<InputSource> = None;
        let mut validate = false;
        let mut schema: Option<PathBuf> = None;
        let mut max_depth: Option<Option<usize>> = None;

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--file" => {
                    let path = next_value(&mut args, "--file")?;
                    if source.is_some() {
                        bail!("--file/--stdin may only be provided once");
                    }
                    source = Some(InputSource::File(PathBuf::from(path)));
                }
                "--stdin" => {
                    if source.is_some() {
                        bail!("--file/--stdin may only be provided once");
                    }
                    source = Some(InputSource::Stdin);
                }
                "--validate" => validate = true,
                "--schema" => {
                    schema = Some(PathBuf::from(next_value(&mut args, "--schema")?));
                    validate = true;
                }
                "--max-depth" => {
                    let raw = next_value(&mut args, "--max-depth")?;
                    max_depth =
                        Some(parse_max_depth(Some(raw.as_str())).context("invalid --max-depth")?);
                }
                "--help" | "-h" => {
                    print!("{}", usage());
                    std::process::exit(0);
                }
                other => bail!("unknown flag: {other}\n{}", usage()),
            }
        }

        Ok(CliArgs {
            source: source.unwrap_or(InputSource::Stdin),
            validate,
            schema,
            max_depth,
        })
    }
}

fn next_value(args: &mut impl Iterator<Item = std::ffi::OsString>, flag: &str) -> Result<String> {
    args.next()
        .map(|os| {
            os.into_string()
                .map_err(|_| anyhow!("value for {flag} is not valid UTF-8"))
        })
        .transpose()?
        .ok_or_else(|| anyhow!("missing value for {flag}"))
}

fn usage() -> &'static str {
    "Usage: hydrate-payload [--file PATH|--stdin] [--validate] [--schema PATH] [--max-depth N]\n\
Hydrates a call-descriptor payload against the standard capability tree and prints the result as compact JSON.\n\
CALLWIRE_MAX_DEPTH sets a default depth limit; --max-depth overrides it (0 = unbounded).\n"
}
