use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use docdex_core::{load, Index, Package, SortMode, StemmingTokenizer};
use serde::Serialize;
use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Load package records into an in-memory index and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Corpus {
    /// Input path (JSON/JSONL file or directory)
    #[arg(long)]
    input: String,
    /// Match stemmed words instead of exact words
    #[arg(long, default_value_t = false)]
    stemming: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query (`all:`, `project:<root>`, `import:<path>` or free text)
    Query {
        #[command(flatten)]
        corpus: Corpus,
        /// Query string
        #[arg(long, short)]
        q: OsString,
        /// Result order: path or relevance
        #[arg(long, default_value = "path")]
        sort: String,
    },
    /// Print one stored record
    Get {
        #[command(flatten)]
        corpus: Corpus,
        /// Import path
        #[arg(long)]
        path: String,
    },
    /// List the nearest packages below an import path
    Subdirs {
        #[command(flatten)]
        corpus: Corpus,
        /// Parent import path
        #[arg(long)]
        path: String,
    },
    /// Print index statistics
    Stats {
        #[command(flatten)]
        corpus: Corpus,
    },
}

#[derive(Serialize)]
struct Line<'a> {
    import_path: &'a str,
    name: &'a str,
    synopsis: &'a str,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Query { corpus, q, sort } => {
            let index = open(&corpus)?;
            let sort: SortMode = sort.parse()?;
            print_lines(&index.query_bytes(q.as_encoded_bytes(), sort)?)
        }
        Commands::Get { corpus, path } => {
            let index = open(&corpus)?;
            let pkg = index.get(&path)?;
            serde_json::to_writer_pretty(io::stdout().lock(), pkg.as_ref())?;
            println!();
            Ok(())
        }
        Commands::Subdirs { corpus, path } => {
            let index = open(&corpus)?;
            print_lines(&index.subdirs(&path)?)
        }
        Commands::Stats { corpus } => {
            let index = open(&corpus)?;
            println!("{}", serde_json::to_string_pretty(&index.stats())?);
            Ok(())
        }
    }
}

fn open(corpus: &Corpus) -> Result<Index> {
    let index = if corpus.stemming { Index::with_tokenizer(StemmingTokenizer) } else { Index::new() };
    let count = load::load_into(&index, &corpus.input)?;
    tracing::info!(input = %corpus.input, count, "corpus ready");
    Ok(index)
}

fn print_lines(pkgs: &[Arc<Package>]) -> Result<()> {
    let mut out = io::stdout().lock();
    for pkg in pkgs {
        let line = Line { import_path: &pkg.import_path, name: &pkg.name, synopsis: &pkg.synopsis };
        serde_json::to_writer(&mut out, &line)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
