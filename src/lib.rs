// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod invoke;
pub mod logging;
pub mod output;
pub mod presets;
pub mod types;

use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, default_config_path, load_and_validate};
use crate::errors::{Result, SidepipeError};
use crate::invoke::{EngineOptions, InvocationRequest, Invoker, ProcessInvoker};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - input reading
/// - request resolution (profile or trailing argv, then CLI overrides)
/// - the process-backed invoker
/// - writing text to stdout and the payload to `--binary-out`
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;

    let input = if args.dry_run && reads_stdin(args.input.as_deref()) {
        Vec::new()
    } else {
        read_input(args.input.as_deref())?
    };

    let request = build_request(&args, cfg.as_ref(), &input)?;
    let options = cfg
        .as_ref()
        .map(ConfigFile::engine_options)
        .unwrap_or_default();

    if args.dry_run {
        print_dry_run(&request, &options);
        return Ok(());
    }

    let invoker = ProcessInvoker::new(options);
    let mut stdout = std::io::stdout();
    execute(&invoker, &request, args.binary_out.as_deref(), &mut stdout).await
}

/// Run `request` through `invoker` and route its output.
///
/// On `ToolFailure` and `TimeoutExceeded` the partial text is still written
/// to `out` before the error is returned, since it usually explains what went
/// wrong.
pub async fn execute<I, W>(
    invoker: &I,
    request: &InvocationRequest,
    binary_out: Option<&Path>,
    out: &mut W,
) -> Result<()>
where
    I: Invoker + ?Sized,
    W: Write,
{
    match invoker.invoke(request).await {
        Ok(result) => {
            output::write_text(out, &result.text)?;
            output::write_binary(binary_out, &result.binary)?;
            Ok(())
        }
        Err(err) => {
            if !err.is_fatal() {
                if let Some(partial) = err.partial() {
                    output::write_text(out, &partial.text)?;
                }
            }
            Err(err.into())
        }
    }
}

/// Resolve the request from either `--tool` or the trailing argv, then apply
/// CLI overrides.
pub fn build_request(
    args: &CliArgs,
    cfg: Option<&ConfigFile>,
    input: &[u8],
) -> Result<InvocationRequest> {
    let mut request = match (&args.tool, args.argv.is_empty()) {
        (Some(name), true) => {
            let cfg = cfg.ok_or_else(|| {
                SidepipeError::ConfigError(format!(
                    "--tool {name} needs a config file (none found)"
                ))
            })?;
            cfg.request_for(name, input)?
        }
        (None, false) => {
            let request = InvocationRequest::new(args.argv.iter().cloned()).with_input(input);
            match cfg {
                Some(cfg) => request
                    .with_timeout(cfg.default_timeout())
                    .with_max_runtime(cfg.default_max_runtime()),
                None => request,
            }
        }
        (Some(_), false) => {
            return Err(SidepipeError::ConfigError(
                "pass either --tool or a trailing argv, not both".to_string(),
            ));
        }
        (None, true) => {
            return Err(SidepipeError::ConfigError(
                "nothing to run: pass --tool NAME or -- ARGV...".to_string(),
            ));
        }
    };

    if let Some(timeout) = args.timeout {
        request = request.with_timeout(timeout);
    }
    if let Some(max_runtime) = args.max_runtime {
        request = request.with_max_runtime(max_runtime);
    }
    if let Some(ref kind) = args.kind {
        request = request.with_side_channel_kind(kind.clone());
    }
    if args.merge_stderr {
        request = request.with_merge_stderr(true);
    }
    Ok(request)
}

/// Load the explicit config (must exist) or the default one (may be absent).
fn load_config(path: Option<&Path>) -> Result<Option<ConfigFile>> {
    match path {
        Some(path) => Ok(Some(load_and_validate(path)?)),
        None => {
            let path = default_config_path();
            if path.exists() {
                info!(path = %path.display(), "using default config file");
                Ok(Some(load_and_validate(&path)?))
            } else {
                debug!("no config file; running without tool profiles");
                Ok(None)
            }
        }
    }
}

fn reads_stdin(path: Option<&Path>) -> bool {
    path.is_none_or(|p| p.as_os_str() == "-")
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) if !reads_stdin(Some(path)) => Ok(std::fs::read(path)?),
        _ => {
            let mut buf = Vec::new();
            std::io::stdin().lock().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Simple dry-run output: print the resolved request.
fn print_dry_run(request: &InvocationRequest, options: &EngineOptions) {
    println!("sidepipe dry-run");
    println!("  argv: {:?}", request.argv());
    println!("  side_channel_kind: {:?}", request.side_channel_kind());
    println!("  input bytes: {}", request.input().len());
    println!("  timeout: {:?}", request.timeout());
    println!("  max_runtime: {:?}", request.max_runtime());
    println!("  merge_stderr: {}", request.merge_stderr());
    println!("  poll_interval: {:?}", options.poll_interval);
    println!("  kill_grace: {:?}", options.kill_grace);
    println!("  read_chunk: {}", options.read_chunk);

    debug!("dry-run complete (no execution)");
}
