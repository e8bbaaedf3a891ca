use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lib_toolkit::configs::http_config::HttpServiceConfig;
use lib_toolkit::loggers::kit_logger::{KitLogger, LogLevel, LoggerOptions};
use lib_toolkit::retrieve::{
    with_debug, with_echo, with_headers, with_params, with_timeout, Hook, HttpService,
};
use lib_toolkit::utils::json::pretty_or_raw;

/// Sends one HTTP request through the toolkit's executor and prints the response.
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Sends a single HTTP request using the toolkit's shared connection pool. Pool settings come from TOOLKIT_HTTP_* environment variables (a .env file is honoured). TLS certificates are NOT verified unless --strict-tls is given."
)]
struct Args {
    /// Absolute URL to call.
    url: String,

    /// HTTP method.
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Request body sent verbatim.
    #[arg(short = 'd', long, default_value = "")]
    body: String,

    /// Header as `Name: Value`. Repeatable; any header disables the default content type.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Query parameter as `key=value`. Repeatable; replaces any query already in the URL.
    #[arg(short = 'p', long = "param")]
    params: Vec<String>,

    /// Echo the request before sending it.
    #[arg(long)]
    echo: bool,

    /// Echo both the request and the response.
    #[arg(long)]
    debug: bool,

    /// Timeout for this call in milliseconds, overriding TOOLKIT_HTTP_TIMEOUT_SECS.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Verify TLS certificates.
    #[arg(long)]
    strict_tls: bool,

    /// Directory for log files.
    #[arg(long, env = "LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,
}

/// # Setup Logging
///
/// Console layer plus a JSON file layer rotated daily under `log_dir`. The level
/// comes from `RUST_LOG` (default "info"). The returned guard must stay alive
/// until exit so buffered lines are flushed.
fn setup_logging(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = rolling::daily(log_dir, "kit-request");
    let (non_blocking_appender, guard) = non_blocking(file_appender);

    let console_layer = fmt::layer().with_target(true).with_ansi(true);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking_appender)
        .json();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Invalid log filter")?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

fn parse_header(raw: &str) -> Result<(String, String)> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => bail!("Header {:?} must look like `Name: Value`", raw),
    }
}

fn parse_param(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => bail!("Parameter {:?} must look like `key=value`", raw),
    }
}

fn build_hooks(args: &Args) -> Result<Vec<Hook>> {
    let mut hooks: Vec<Hook> = Vec::new();

    if !args.headers.is_empty() {
        let headers = args
            .headers
            .iter()
            .map(|h| parse_header(h))
            .collect::<Result<Vec<_>>>()?;
        hooks.push(with_headers(headers));
    }
    if !args.params.is_empty() {
        let params = args
            .params
            .iter()
            .map(|p| parse_param(p))
            .collect::<Result<Vec<_>>>()?;
        hooks.push(with_params(params));
    }
    if args.echo {
        hooks.push(with_echo(true));
    }
    if args.debug {
        hooks.push(with_debug(true));
    }
    if let Some(ms) = args.timeout_ms {
        hooks.push(with_timeout(Duration::from_millis(ms)));
    }
    Ok(hooks)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let _guard = setup_logging(&args.log_dir)?;

    let mut config = HttpServiceConfig::from_env()?;
    if args.strict_tls {
        config.accept_invalid_certs = false;
    }
    info!("{}", config);

    let logger = Arc::new(KitLogger::new(
        "kit-request",
        Some(LoggerOptions {
            console_level: Some(LogLevel::Info),
            log_dir: Some(args.log_dir.clone()),
            ..Default::default()
        }),
    ));
    let service = HttpService::from_config(&config, logger)?;
    let hooks = build_hooks(&args)?;

    match service.execute(&args.method, &args.url, &args.body, hooks).await {
        Ok(result) => {
            println!("{} ({} ms)", result.status_code(), result.elapsed_ms());
            println!("{}", pretty_or_raw(result.content()));
            if let Some(reason) = result.failure() {
                eprintln!("Request completed with failure status: {}", reason);
            }
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            Err(e.into())
        }
    }
}
