//! Gatehouse Products - Entry point
//!
//! Reads one API-gateway proxy event per line from stdin and writes one
//! gateway response per line to stdout. Logs go to stderr.

use std::path::PathBuf;

use anyhow::Context;
use gatehouse::{GatewayEvent, GatewayResponse, Router};
use gatehouse_config::ConfigLoader;
use gatehouse_core::{Issue, RequestId, RouteError, ValidationError};
use gatehouse_products::{app_with_config, MemoryStore};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("gatehouse-products {}", env!("CARGO_PKG_VERSION"));
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config }
    }
}

fn print_help() {
    println!(
        r#"Gatehouse Products - product catalog over stdin/stdout

USAGE:
    gatehouse-products [OPTIONS] < events.jsonl

OPTIONS:
    -c, --config <PATH>    Path to configuration file (TOML or JSON)
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    GATEHOUSE__ROUTER__EXPOSE_INTERNAL_ERRORS   Include 500 details (default: false)
    GATEHOUSE__ROUTER__SERVICE_NAME             Service name in logs
    GATEHOUSE__LOGGING__LEVEL                   Log filter (default: info)
    GATEHOUSE__LOGGING__FORMAT                  json | pretty
    GATEHOUSE__METRICS__ENABLED                 Install the Prometheus recorder
    GATEHOUSE__METRICS__LISTEN_ADDR             Serve /metrics on this address

EXAMPLE:
    echo '{{"httpMethod":"GET","path":"/products"}}' | gatehouse-products
"#
    );
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("{e:#}");
        eprintln!("gatehouse-products: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut loader = ConfigLoader::new().with_dotenv()?;
    if let Some(path) = &args.config {
        loader = loader.with_file(path)?;
    }
    let config = loader
        .with_env_prefix("GATEHOUSE")
        .load()
        .context("failed to load configuration")?;

    let mut telemetry = config.telemetry();
    telemetry.logging = telemetry.logging.with_stderr();
    gatehouse_telemetry::init_telemetry(&telemetry).context("failed to initialize telemetry")?;

    let router = app_with_config(MemoryStore::shared(), &config.router)
        .context("failed to build routes")?;
    info!(routes = router.len(), "serving gateway events from stdin");

    serve(&router).await
}

async fn serve(router: &Router) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<GatewayEvent>(&line) {
            Ok(event) => router.dispatch_gateway(event).await,
            Err(e) => malformed_event(router, &e),
        };

        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}

/// A line that is not a gateway event is answered as a request-validation
/// failure so every input line gets exactly one output line.
fn malformed_event(router: &Router, e: &serde_json::Error) -> GatewayResponse {
    let error = RouteError::RequestValidation(ValidationError::from(vec![Issue::root(format!(
        "Invalid gateway event: {e}"
    ))]));
    router.reject(RequestId::new(), &error).into()
}
