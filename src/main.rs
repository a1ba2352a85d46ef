use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pdf_rag::commands::{
    ask, chat, documents, records_add, records_delete, records_get, records_list, records_update,
    serve_mcp, show_status, upload,
};
use pdf_rag::config::{resolve_base_dir, run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "pdf-rag")]
#[command(about = "Chat with your PDF documents using local embeddings and retrieval")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml and the data/ stores
    #[arg(long, global = true, env = "PDF_RAG_BASE_DIR")]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and chunking settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Extract, chunk and index a PDF document
    Upload {
        /// Path to the PDF file
        pdf: PathBuf,
    },
    /// Answer a single question from the indexed documents
    Ask {
        /// The question to answer
        question: String,
    },
    /// Ask questions interactively
    Chat,
    /// Show loaded documents and their chunk counts
    Documents,
    /// Inspect and edit stored records directly
    Records {
        #[command(subcommand)]
        action: RecordsAction,
    },
    /// Show configuration, Ollama health and store consistency
    Status,
    /// Start MCP server on stdio
    Serve,
}

#[derive(Subcommand)]
enum RecordsAction {
    /// List all records
    List,
    /// Print one record as JSON
    Get {
        /// Record ID
        id: String,
    },
    /// Add a record to the record store
    Add {
        /// Record text
        text: String,
        /// Source name for the record
        #[arg(long, default_value = "manual")]
        source: String,
        /// Explicit record ID; a UUID is generated when omitted
        #[arg(long)]
        id: Option<String>,
    },
    /// Replace the text of a record
    Update {
        /// Record ID
        id: String,
        /// New text
        text: String,
    },
    /// Delete a record
    Delete {
        /// Record ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let base_dir = resolve_base_dir(cli.base_dir)?;

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&base_dir)?;
            } else {
                run_interactive_config(&base_dir)?;
            }
        }
        Commands::Upload { pdf } => {
            upload(&base_dir, &pdf)?;
        }
        Commands::Ask { question } => {
            ask(&base_dir, &question)?;
        }
        Commands::Chat => {
            chat(&base_dir)?;
        }
        Commands::Documents => {
            documents(&base_dir)?;
        }
        Commands::Records { action } => match action {
            RecordsAction::List => records_list(&base_dir)?,
            RecordsAction::Get { id } => records_get(&base_dir, &id)?,
            RecordsAction::Add { text, source, id } => {
                records_add(&base_dir, &source, &text, id)?;
            }
            RecordsAction::Update { id, text } => records_update(&base_dir, &id, &text)?,
            RecordsAction::Delete { id } => records_delete(&base_dir, &id)?,
        },
        Commands::Status => {
            show_status(&base_dir)?;
        }
        Commands::Serve => {
            serve_mcp(&base_dir).await?;
        }
    }

    Ok(())
}
