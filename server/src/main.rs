use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

use spindle_server::{build_app, SearchConfig};

#[derive(Parser)]
struct Args {
    /// Crawl artifacts directory
    #[arg(long, default_value = "./artifacts")]
    artifacts: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Champion list size
    #[arg(long, default_value_t = 20)]
    champions: usize,
    /// PageRank teleport probability
    #[arg(long, default_value_t = 0.15)]
    pagerank_alpha: f64,
    /// PageRank iteration cap
    #[arg(long, default_value_t = 100)]
    pagerank_max_iterations: usize,
    /// Weight of PageRank when blended into content scores
    #[arg(long, default_value_t = 0.5)]
    pagerank_weight: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let config = SearchConfig {
        champion_list_size: args.champions,
        pagerank_alpha: args.pagerank_alpha,
        pagerank_max_iterations: args.pagerank_max_iterations,
        pagerank_weight: args.pagerank_weight,
    };
    let app: Router = build_app(&args.artifacts, config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
