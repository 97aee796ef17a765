use std::path::PathBuf;

use axum::{extract::DefaultBodyLimit, http::Method, Router};
use clap::Parser;
use realty_crm::{database, init_tracing, token, Config};
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Parser)]
#[command(version, about = "Real estate brokerage CRM server")]
struct Args {
    /// Config file, created with defaults when missing
    #[arg(short, long, default_value = Config::DEFAULT_PATH)]
    config: PathBuf,
    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let mut config = match Config::read(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }
    let config = config.install();
    init_tracing(&config.log.filter);
    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}

async fn run(config: &'static Config) -> Result<(), Box<dyn std::error::Error>> {
    token::init(&config.token).map_err(|e| format!("invalid token secret: {e}"))?;
    std::fs::create_dir_all(config.property_dir())?;
    std::fs::create_dir_all(config.task_dir())?;
    database::init_pool(&config.mysql_addr())?;
    database::create_table().map_err(|e| format!("failed to create tables: {}", e.data()))?;
    let router = Router::new()
        .merge(realty_crm::pages::pages_router())
        .merge(realty_crm::perm::perm_router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers(Any),
        )
        .layer(DefaultBodyLimit::max(config.server.body_limit_mb * 1024 * 1024));
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "listening");
    axum::serve(listener, router).await?;
    Ok(())
}
