//! citerag CLI - index documents and ask cited questions about them.
//!
//! # Usage
//!
//! ```bash
//! citerag index --file handbook.pdf
//! citerag index --text "..." --source notes --keep-previous
//! citerag query "What is the refund policy?" --top-k 8 --rerank-top-k 3
//! citerag query "What is the refund policy?" --context-file handbook.pdf
//! citerag stats --json
//! citerag clear
//! ```
//!
//! Logging goes to stderr and is filtered by `CITERAG_LOG` (default `info`).

mod output;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use citerag::commands::{
    clear_index, get_index_stats, index_document, query_knowledge, read_document, IndexRequest,
    QueryRequest,
};
use citerag::{AppState, CommandResponse};

/// Retrieval-augmented question answering with cited sources.
#[derive(Parser)]
#[command(name = "citerag", version, about)]
struct Cli {
    /// Config file (default: ~/.citerag/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the JSON response envelope instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk, embed and store a document
    Index(IndexArgs),
    /// Answer a question from the indexed documents
    Query(QueryArgs),
    /// Show vector store statistics
    Stats,
    /// Remove every stored vector
    Clear,
}

#[derive(Args)]
struct IndexArgs {
    /// Document to index (PDF, Word or any text file)
    #[arg(long, conflicts_with = "text", required_unless_present = "text")]
    file: Option<PathBuf>,

    /// Raw text to index
    #[arg(long)]
    text: Option<String>,

    /// Source label stored with each chunk (default: file name or user_input)
    #[arg(long)]
    source: Option<String>,

    /// Add to the existing content instead of replacing it
    #[arg(long)]
    keep_previous: bool,
}

#[derive(Args)]
struct QueryArgs {
    question: String,

    /// Candidates fetched from the vector store
    #[arg(long)]
    top_k: Option<usize>,

    /// Chunks kept after reranking and sent to the model
    #[arg(long)]
    rerank_top_k: Option<usize>,

    /// Index this document first, replacing the stored content
    #[arg(long)]
    context_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env("CITERAG_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let state = AppState::initialize(cli.config.as_deref()).context("failed to initialize")?;
    let rag = state.rag();

    match cli.command {
        Command::Index(args) => {
            let (text, default_source) = match (args.file, args.text) {
                (Some(path), _) => {
                    let text = read_document(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned());
                    (text, name)
                }
                (None, Some(text)) => (text, None),
                (None, None) => bail!("either --file or --text is required"),
            };
            let request = IndexRequest {
                text,
                source: args.source.or(default_source),
                clear_previous: Some(!args.keep_previous),
            };
            let response = index_document(&rag, request).await;
            emit(cli.json, response, output::format_index)
        }
        Command::Query(args) => {
            if let Some(path) = args.context_file {
                let text = read_document(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let request = IndexRequest {
                    text,
                    source: path.file_name().map(|n| n.to_string_lossy().into_owned()),
                    clear_previous: Some(true),
                };
                let response = index_document(&rag, request).await;
                if let Some(error) = response.error {
                    bail!("failed to index {}: {}", path.display(), error);
                }
            }
            let request = QueryRequest {
                question: args.question,
                top_k: args.top_k,
                rerank_top_k: args.rerank_top_k,
            };
            let response = query_knowledge(&rag, request).await;
            emit(cli.json, response, output::format_query)
        }
        Command::Stats => {
            let response = get_index_stats(&rag).await;
            emit(cli.json, response, output::format_stats)
        }
        Command::Clear => {
            let response = clear_index(&rag).await;
            emit(cli.json, response, |_| "Cleared all vectors".to_string())
        }
    }
}

/// Print `response` and turn a failed one into a non-zero exit.
fn emit<T, F>(json: bool, response: CommandResponse<T>, format_human: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    if json {
        println!("{}", output::format_json(&response));
        if !response.success {
            std::process::exit(1);
        }
        return Ok(());
    }
    match (response.data, response.error) {
        (Some(data), _) => {
            println!("{}", format_human(&data));
            Ok(())
        }
        (None, error) => bail!(error.unwrap_or_else(|| "unknown error".to_string())),
    }
}
