use anyhow::Result;
use axum::Router;
use clap::Parser;
use docdex_core::{load, Index};
use server::{build_app, ServerConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Package records (JSON/JSONL file or directory) loaded at startup
    #[arg(long)]
    corpus: Option<String>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let index = Arc::new(Index::new());
    if let Some(corpus) = &args.corpus {
        load::load_into(&index, corpus)?;
    }
    let app: Router = build_app(Arc::clone(&index), ServerConfig::from_env());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, documents = index.len(), "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
