//! naver-scraper CLI - one-shot scrapes and the HTTP front door.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use naver_scraper::{
    server::{build_app, AppState},
    validation::validate_request,
    Scraper, ScraperConfig,
};

/// naver-scraper - resilient paginated product scraper
#[derive(Parser)]
#[command(name = "naver-scraper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a listing once and print the result as JSON
    Scrape(ScrapeArgs),

    /// Run the HTTP API
    Serve(ServeArgs),
}

#[derive(Parser)]
struct ScrapeArgs {
    /// Shopping search URL to paginate
    url: String,

    /// Maximum number of pages (clamped to 50, default 20)
    #[arg(short, long)]
    pages: Option<String>,
}

#[derive(Parser)]
struct ServeArgs {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "debug,hyper=info,reqwest=info"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ScraperConfig::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Scrape(args) => run_scrape(args, &config).await,
        Commands::Serve(args) => run_server(args, config).await,
    }
}

async fn run_scrape(args: ScrapeArgs, config: &ScraperConfig) -> Result<()> {
    let request = validate_request(Some(&args.url), args.pages.as_deref())
        .map_err(|errors| anyhow::anyhow!("Invalid request: {}", errors.join(", ")))?;

    let scraper = Scraper::from_config(config)?;
    let result = scraper.run(&request.url, request.max_pages).await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.success {
        anyhow::bail!("Scrape failed: {}", result.error.unwrap_or_default());
    }
    Ok(())
}

async fn run_server(args: ServeArgs, config: ScraperConfig) -> Result<()> {
    let port = args.port.unwrap_or(config.port);
    let scraper = Arc::new(Scraper::from_config(&config)?);
    let app = build_app(AppState::new(scraper), &config)?;

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("Server running on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down...");
}
