use anyhow::Result;
use clap::{Parser, Subcommand};
use lexis::{DirectorySource, SearchConfig, SearchEngine, Synonyms};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query the document cache", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every .txt file of a directory, reusing the cache when it is current
    Build {
        /// Directory of .txt documents
        #[arg(long)]
        input: PathBuf,
        /// Cache directory
        #[arg(long)]
        cache: PathBuf,
        /// JSON synonym table
        #[arg(long)]
        synonyms: Option<PathBuf>,
        /// Rebuild even if the cache matches the documents
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Run one query and print the results
    Search {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        cache: PathBuf,
        #[arg(long)]
        synonyms: Option<PathBuf>,
        /// Number of results
        #[arg(short, long, default_value_t = 10)]
        k: usize,
        /// Print the result as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
        query: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, cache, synonyms, force } => build(&input, &cache, synonyms, force),
        Commands::Search { input, cache, synonyms, k, json, query } => {
            search(&input, &cache, synonyms, k, json, &query)
        }
    }
}

fn load_synonyms(path: Option<PathBuf>) -> Synonyms {
    path.map(Synonyms::load_or_empty).unwrap_or_default()
}

fn build(input: &Path, cache: &Path, synonyms: Option<PathBuf>, force: bool) -> Result<()> {
    let source = DirectorySource::new(input);
    let synonyms = load_synonyms(synonyms);
    let engine = if force {
        SearchEngine::rebuild(&source, cache, synonyms, SearchConfig::default())?
    } else {
        SearchEngine::open(&source, cache, synonyms, SearchConfig::default())?
    };
    let index = engine.index();
    tracing::info!(
        num_docs = index.num_docs(),
        num_terms = index.num_terms(),
        stop_words = index.stop_words.len(),
        rebuilt = index.changed,
        cache = %cache.display(),
        "index ready"
    );
    Ok(())
}

fn search(input: &Path, cache: &Path, synonyms: Option<PathBuf>, k: usize, json: bool, query: &str) -> Result<()> {
    let source = DirectorySource::new(input);
    let config = SearchConfig { top_k: k, ..SearchConfig::default() };
    let engine = SearchEngine::open(&source, cache, load_synonyms(synonyms), config)?;
    let result = engine.search(query);
    engine.flush_stems()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    if result.suggestion != query.trim() && !result.suggestion.is_empty() {
        println!("did you mean: {}", result.suggestion);
    }
    println!("{} of {} documents", result.items.len(), result.total_hits);
    for (rank, item) in result.items.iter().enumerate() {
        println!("{:>3}. {} ({:.4})", rank + 1, item.name, item.score);
        println!("     {}", item.snippet);
    }
    Ok(())
}
