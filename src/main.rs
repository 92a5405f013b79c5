//! docent CLI entry point

use clap::{Parser, Subcommand};
use docent::{
    answer::AnswerEngine,
    commands::{
        cmd_ask, cmd_delete, cmd_ingest, cmd_list_documents, cmd_status, print_answer,
        print_documents, print_ingest_result, print_record, AskOptions,
    },
    config::Config,
    embed::{create_embedder, Embedder},
    error::Result,
    generate::HttpGenerator,
    index::VectorIndex,
    pipeline::{DocumentPipeline, StatusStore},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docent")]
#[command(version, about = "Question answering over PDF documents with local RAG", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a PDF document and index it for question answering
    Ingest {
        /// Path to the PDF file
        file: PathBuf,
    },

    /// Ask a question against an ingested document
    Ask {
        /// Document ID (use 'docent list' to see ingested documents)
        document_id: String,

        /// The question to answer
        question: String,

        /// Token budget for prompt assembly
        #[arg(long, default_value = "4096")]
        context_window: usize,

        /// Show the context chunks used for the answer
        #[arg(long)]
        show_context: bool,
    },

    /// Show the processing status of a document
    Status {
        /// Document ID
        document_id: String,
    },

    /// List all ingested documents
    List,

    /// Delete a document and all of its data
    Delete {
        /// Document ID to delete
        document_id: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so progress bars and command output stay clean.
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?;
    std::fs::create_dir_all(&config.data_dir)?;

    let store = Arc::new(StatusStore::open(config.records_path())?);
    let embedder: Arc<dyn Embedder> = Arc::from(create_embedder(&config.embedding)?);
    let index = Arc::new(VectorIndex::new(
        embedder,
        config.index_dir(),
        config.embedding.batch_size,
    )?);
    let pipeline = Arc::new(DocumentPipeline::new(
        config.clone(),
        store,
        Arc::clone(&index),
    )?);

    match cli.command {
        Commands::Ingest { file } => {
            let record = cmd_ingest(&pipeline, &file).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_ingest_result(&record);
            }
        }

        Commands::Ask {
            document_id,
            question,
            context_window,
            show_context,
        } => {
            let generator = Arc::new(HttpGenerator::new(&config.generation)?);
            let engine = AnswerEngine::new(index, generator, config.generation.clone());

            let options = AskOptions {
                context_window,
                show_context,
            };
            let answer = cmd_ask(&engine, &document_id, &question, &options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                print_answer(&answer, options.show_context);
            }
        }

        Commands::Status { document_id } => {
            let record = cmd_status(&pipeline, &document_id)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_record(&record);
            }
        }

        Commands::List => {
            let records = cmd_list_documents(&pipeline);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_documents(&records);
            }
        }

        Commands::Delete { document_id } => {
            cmd_delete(&pipeline, &document_id).await?;
            if cli.json {
                println!(r#"{{"status": "ok", "message": "Document deleted"}}"#);
            } else {
                println!("✓ Document '{}' deleted", document_id);
            }
        }
    }

    Ok(())
}
