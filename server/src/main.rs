use anyhow::Result;
use clap::Parser;
use lexis::{DirectorySource, SearchConfig, SearchEngine, Synonyms};
use server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Directory of .txt documents
    #[arg(long, default_value = "./content")]
    input: PathBuf,
    /// Cache directory
    #[arg(long, default_value = "./cache")]
    cache: PathBuf,
    /// JSON synonym table
    #[arg(long)]
    synonyms: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Default number of results per query
    #[arg(long, default_value_t = 10)]
    top_k: usize,
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let synonyms = args.synonyms.map(Synonyms::load_or_empty).unwrap_or_default();
    let config = SearchConfig { top_k: args.top_k, ..SearchConfig::default() };
    let source = DirectorySource::new(&args.input);
    let engine = Arc::new(SearchEngine::open(&source, &args.cache, synonyms, config)?);
    let app = build_app(engine.clone());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, num_docs = engine.index().num_docs(), "server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    engine.flush_stems()?;
    tracing::info!(stems = engine.stems().len(), "stem memo flushed");
    Ok(())
}
