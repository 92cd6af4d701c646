mod config;
mod cors;
mod logging;
mod shutdown;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use clap::{Parser, Subcommand};
use ops_reports::OpsReportsModule;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::config::AppConfig;

/// Ops Reports Server - ranked operational reports over directory, tracker and call-log data
#[derive(Parser)]
#[command(name = "ops-reports-server")]
#[command(about = "Ops Reports Server - ranked operational reports")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(ref path) = cli.config
        && !Path::new(path).is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    // defaults -> YAML (if provided) -> env (OPS_REPORTS__*) -> CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.port);

    logging::init_logging(&config.logging, cli.verbose)?;

    if cli.print_config {
        println!("Effective configuration:\n{}", config.to_pretty_json()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration");
    OpsReportsModule::init(config.ops_reports.clone())?;
    cors::build_cors_layer(&config.server.cors)?;
    println!("Configuration is valid");
    Ok(())
}

fn build_app(module: &OpsReportsModule, config: &AppConfig) -> Result<Router> {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %req.method(),
                path = %req.uri().path(),
                status = tracing::field::Empty,
            )
        })
        .on_response(|res: &Response<Body>, latency: std::time::Duration, span: &Span| {
            span.record("status", res.status().as_u16());
            tracing::debug!(parent: span, latency_ms = latency.as_millis(), "request finished");
        });

    Ok(module
        .register_rest(Router::new())
        .layer(trace)
        .layer(cors::build_cors_layer(&config.server.cors)?))
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Ops Reports Server starting");

    let module = OpsReportsModule::init(config.ops_reports.clone())?;
    let app = build_app(&module, &config)?;

    let addr = SocketAddr::new(config.server.bind_addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local_addr = listener.local_addr()?;
    tracing::info!(addr = %local_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = shutdown::wait_for_shutdown().await {
                tracing::error!(error = %e, "Signal handling failed, shutting down");
            }
        })
        .await
        .context("HTTP server failed")?;

    tracing::info!("Ops Reports Server stopped");
    Ok(())
}
