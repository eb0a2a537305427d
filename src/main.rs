use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use docrag_cli::{
    AssistantSettings, QuestionAssistant, display_banner, handle_input_with_history,
    print_answer, print_help, print_indexing_summary,
};
use docrag_core::{EmbeddingProvider, IndexingConfig, RAGEngine, RetryConfig};
use docrag_openai::{OpenAIClient, OpenAIConfig};
use docrag_rag::{
    EmbeddingIndexer, EmbeddingTable, LocalRAGEngine, break_and_clean, default_table_path,
    process_folder,
};

#[derive(Parser)]
#[command(name = "docrag")]
#[command(about = "Ask questions about a folder of HTML, PDF and Markdown documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract documents from a folder and print them as JSON
    Extract {
        folder: PathBuf,

        /// Print chunk records instead of whole documents
        #[arg(long)]
        chunks: bool,

        #[command(flatten)]
        chunking: ChunkArgs,
    },

    /// Extract, chunk and embed a folder, then save the embedding table
    Index {
        folder: PathBuf,

        /// Output file (default: embeddings_<timestamp>.json in the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Chunks per embedding request
        #[arg(long, env = "DOCRAG_BATCH_SIZE", default_value_t = 100)]
        batch_size: usize,

        #[command(flatten)]
        chunking: ChunkArgs,

        #[command(flatten)]
        retry: RetryArgs,
    },

    /// Build the prompt for one question
    Query {
        /// Embedding table written by `index`
        #[arg(short, long)]
        table: PathBuf,

        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        #[command(flatten)]
        retrieval: RetrievalArgs,

        #[command(flatten)]
        retry: RetryArgs,
    },

    /// Ask questions interactively
    Chat {
        #[arg(short, long)]
        table: PathBuf,

        #[command(flatten)]
        retrieval: RetrievalArgs,

        #[command(flatten)]
        retry: RetryArgs,
    },

    /// Print statistics about an embedding table
    Stats {
        #[arg(short, long)]
        table: PathBuf,
    },
}

#[derive(Args)]
struct ChunkArgs {
    /// Maximum sentences per chunk
    #[arg(long, env = "DOCRAG_MAX_SENTENCES", default_value_t = 10)]
    max_sentences: usize,

    /// Keep periods in chunk text
    #[arg(long)]
    keep_periods: bool,
}

#[derive(Args)]
struct RetrievalArgs {
    /// Number of chunks placed in the context
    #[arg(long, env = "DOCRAG_TOP_K", default_value_t = 3)]
    top_k: usize,

    /// Context budget in characters
    #[arg(long, env = "DOCRAG_CONTEXT_LIMIT", default_value_t = 3750)]
    context_limit: usize,

    /// Drop chunks scoring below this cosine similarity
    #[arg(long)]
    min_score: Option<f32>,

    /// Send the prompt to the chat model and print its answer
    #[arg(long)]
    answer: bool,

    /// List the retrieved chunks
    #[arg(long)]
    show_sources: bool,
}

#[derive(Args)]
struct RetryArgs {
    /// Attempts per embedding request
    #[arg(long, env = "DOCRAG_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Seconds to wait between attempts
    #[arg(long, env = "DOCRAG_RETRY_DELAY_SECS", default_value_t = 5)]
    retry_delay_secs: u64,
}

impl ChunkArgs {
    fn indexing_config(&self, batch_size: usize) -> IndexingConfig {
        IndexingConfig {
            batch_size,
            max_sentences: self.max_sentences,
            strip_periods: !self.keep_periods,
        }
    }
}

impl RetryArgs {
    fn config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_retries,
            delay: Duration::from_secs(self.retry_delay_secs),
        }
    }
}

impl RetrievalArgs {
    fn settings(&self) -> AssistantSettings {
        AssistantSettings {
            top_k: self.top_k,
            context_limit: self.context_limit,
            score_threshold: self.min_score,
            ..Default::default()
        }
    }
}

type Assistant = QuestionAssistant<LocalRAGEngine<EmbeddingTable, OpenAIClient>, OpenAIClient>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Extract { folder, chunks, chunking } => extract(&folder, chunks, &chunking),
        Commands::Index {
            folder,
            out,
            batch_size,
            chunking,
            retry,
        } => {
            let config = chunking.indexing_config(batch_size);
            index(&folder, out, config, retry.config()).await
        }
        Commands::Query {
            table,
            question,
            retrieval,
            retry,
        } => {
            let assistant = build_assistant(&table, &retrieval, &retry)?;
            let answer = assistant.answer(&question.join(" ")).await?;
            print_answer(&answer, retrieval.show_sources);
            Ok(())
        }
        Commands::Chat {
            table,
            retrieval,
            retry,
        } => chat(&table, &retrieval, &retry).await,
        Commands::Stats { table } => {
            let table = load_table(&table)?;
            println!("{}", serde_json::to_string_pretty(&table.summary()?)?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "docrag=debug" } else { "docrag=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn extract(folder: &Path, chunks: bool, chunking: &ChunkArgs) -> Result<()> {
    let report = process_folder(folder)?;

    for failure in &report.failures {
        eprintln!("{} {}: {}", "⚠️".yellow(), failure.path, failure.error);
    }

    let json = if chunks {
        let config = chunking.indexing_config(IndexingConfig::default().batch_size);
        serde_json::to_string_pretty(&break_and_clean(&report.documents, &config)?)?
    } else {
        serde_json::to_string_pretty(&report.documents)?
    };
    println!("{}", json);
    Ok(())
}

async fn index(folder: &Path, out: Option<PathBuf>, config: IndexingConfig, retry: RetryConfig) -> Result<()> {
    let client = Arc::new(OpenAIClient::from_env()?);
    let table = Arc::new(EmbeddingTable::new(client.model_id()));

    println!("{} Indexing {} with {}", "📚".blue(), folder.display(), client.model_id());
    let indexer = EmbeddingIndexer::new(client.clone(), table.clone())
        .with_config(config)
        .with_retry(retry);
    let result = indexer.index_folder(folder).await?;

    let path = out.unwrap_or_else(|| default_table_path(Path::new(".")));
    table
        .save(&path)
        .with_context(|| format!("Failed to save table to {}", path.display()))?;

    print_indexing_summary(&result, &path.display().to_string());
    Ok(())
}

fn load_table(path: &Path) -> Result<EmbeddingTable> {
    EmbeddingTable::load(path).with_context(|| format!("Failed to load table {}", path.display()))
}

/// Query embeddings must come from the model that built the table unless
/// OPENAI_EMBEDDING_MODEL says otherwise
fn query_embedder(table: &EmbeddingTable, config: &OpenAIConfig) -> Result<OpenAIClient> {
    let client = OpenAIClient::new(config.clone())?;

    if OpenAIConfig::embedding_model_overridden() {
        if config.embedding_model != table.embedding_model() {
            warn!(
                "Table was built with {}, querying with {}",
                table.embedding_model(),
                config.embedding_model
            );
        }
        Ok(client)
    } else {
        Ok(client.with_embedding_model(table.embedding_model()))
    }
}

fn build_assistant(table_path: &Path, retrieval: &RetrievalArgs, retry: &RetryArgs) -> Result<Assistant> {
    let table = load_table(table_path)?;
    let config = OpenAIConfig::from_env()?;
    let embedder = query_embedder(&table, &config)?;
    info!("Loaded {} using {}", table_path.display(), embedder.model_id());

    let engine = LocalRAGEngine::new(Arc::new(table), Arc::new(embedder)).with_retry(retry.config());
    let assistant = if retrieval.answer {
        QuestionAssistant::with_llm(engine, OpenAIClient::new(config)?)
    } else {
        QuestionAssistant::new(engine)
    };

    Ok(assistant.settings(retrieval.settings()))
}

async fn chat(table_path: &Path, retrieval: &RetrievalArgs, retry: &RetryArgs) -> Result<()> {
    let assistant = build_assistant(table_path, retrieval, retry)?;
    let stats = assistant.engine().stats().await?;
    let rows = stats["rows"].as_u64().unwrap_or(0) as usize;

    display_banner(&table_path.display().to_string(), rows);

    let mut history = Vec::new();

    loop {
        let Some(input) = handle_input_with_history(&mut history).await? else {
            println!("{}", "👋 Goodbye!".green());
            break;
        };

        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" => {
                println!("{}", "👋 Goodbye!".green());
                break;
            }
            "help" => {
                print_help();
                continue;
            }
            "stats" => {
                println!("{}", serde_json::to_string_pretty(&assistant.engine().stats().await?)?);
                continue;
            }
            _ => {}
        }

        match assistant.answer(&input).await {
            Ok(answer) => print_answer(&answer, retrieval.show_sources),
            Err(e) => println!("{} {}", "❌".red(), e),
        }
    }

    Ok(())
}
