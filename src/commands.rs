use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::documents::ChunkRecord;
use crate::embeddings::OllamaClient;
use crate::mcp::McpServer;
use crate::mcp::tools::{AskHandler, ListDocumentsHandler, UploadPdfHandler};
use crate::service::{RagService, upload_error_message, upload_success_message};

fn open_service(base_dir: &Path) -> Result<RagService> {
    let config = Config::load(base_dir).context("Failed to load configuration")?;
    RagService::from_config(config).context("Failed to open document stores")
}

fn spinner(message: String) -> ProgressBar {
    if console::user_attended_stderr() {
        let bar = ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    } else {
        ProgressBar::hidden()
    }
}

/// Extract, chunk, embed and store a PDF
#[inline]
pub fn upload(base_dir: &Path, pdf_path: &Path) -> Result<()> {
    let mut service = open_service(base_dir)?;
    info!("Uploading {}", pdf_path.display());

    let bar = spinner(format!("Processing {}", pdf_path.display()));
    let result = service.upload_pdf(pdf_path);
    bar.finish_and_clear();

    match result {
        Ok(report) => {
            println!("{}", upload_success_message(&report.source));
            println!("   Chunks: {}", report.chunks);
            println!("   Document ID: {}", report.document_id);
            Ok(())
        }
        Err(e) => {
            error!("Upload failed: {}", e);
            println!("{}", upload_error_message(&e));
            Err(e.into())
        }
    }
}

/// Answer a single question from the indexed documents
#[inline]
pub fn ask(base_dir: &Path, question: &str) -> Result<()> {
    let service = open_service(base_dir)?;

    let bar = spinner("Thinking".to_string());
    let answer = service.chat(question);
    bar.finish_and_clear();

    println!("{}", answer.context("Failed to answer question")?);
    Ok(())
}

fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

/// Interactive question loop; an empty line, `exit` or `quit` ends it
#[inline]
pub fn chat(base_dir: &Path) -> Result<()> {
    let service = open_service(base_dir)?;

    eprintln!("{}", style("💬 Chat").bold().cyan());
    eprintln!("Ask questions about uploaded documents. Empty line, 'exit' or 'quit' to leave.");
    eprintln!("{}", style(service.documents_summary()).dim());
    eprintln!();

    loop {
        let message: String = Input::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?;

        if is_exit_command(&message) {
            break;
        }

        let bar = spinner("Thinking".to_string());
        let answer = service.chat(&message);
        bar.finish_and_clear();

        match answer {
            Ok(answer) => println!("{} {}\n", style("Assistant:").bold().green(), answer),
            Err(e) => {
                warn!("Chat turn failed: {}", e);
                eprintln!("{} {}\n", style("Error:").bold().red(), e);
            }
        }
    }

    Ok(())
}

/// Print per-source chunk counts
#[inline]
pub fn documents(base_dir: &Path) -> Result<()> {
    let service = open_service(base_dir)?;
    println!("{}", service.documents_summary());
    Ok(())
}

#[inline]
pub fn records_list(base_dir: &Path) -> Result<()> {
    let service = open_service(base_dir)?;
    let records = service.records().list();

    if records.is_empty() {
        println!("No records stored yet.");
        println!("Use 'pdf-rag upload <file.pdf>' to add a document.");
        return Ok(());
    }

    println!("Records ({} total):", records.len());
    println!();
    for record in records {
        println!("📄 {} ({})", record.id, record.source);
        println!("   {}", preview(&record.text, 80));
    }
    Ok(())
}

#[inline]
pub fn records_get(base_dir: &Path, id: &str) -> Result<()> {
    let service = open_service(base_dir)?;
    let record = service
        .records()
        .get(id)
        .ok_or_else(|| anyhow!("Record not found: {}", id))?;

    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

/// Add a record to the record store only; it is not embedded
#[inline]
pub fn records_add(base_dir: &Path, source: &str, text: &str, id: Option<String>) -> Result<()> {
    let mut service = open_service(base_dir)?;
    let mut record = ChunkRecord::new(source, text);
    if let Some(id) = id {
        record = record.with_id(id);
    }

    let id = service
        .records_mut()
        .add(record)
        .context("Failed to add record")?;
    println!("✅ Added record {}", id);
    println!("   Note: records added here are not searchable until indexed from a PDF.");
    Ok(())
}

#[inline]
pub fn records_update(base_dir: &Path, id: &str, text: &str) -> Result<()> {
    let mut service = open_service(base_dir)?;
    service
        .records_mut()
        .update(id, text)
        .with_context(|| format!("Failed to update record {}", id))?;
    println!("✅ Updated record {}", id);
    Ok(())
}

#[inline]
pub fn records_delete(base_dir: &Path, id: &str) -> Result<()> {
    let mut service = open_service(base_dir)?;
    let removed = service
        .records_mut()
        .delete(id)
        .with_context(|| format!("Failed to delete record {}", id))?;
    println!("🗑️  Deleted record {} ({})", removed.id, removed.source);
    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > max_chars {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}…", cut)
    } else {
        flat
    }
}

/// Configuration, provider health, store counts and consistency
#[inline]
pub fn show_status(base_dir: &Path) -> Result<()> {
    let config = match Config::load(base_dir) {
        Ok(config) => config,
        Err(e) => {
            println!("❌ Configuration: {}", e);
            println!("Use 'pdf-rag config' to fix it.");
            return Ok(());
        }
    };

    println!("📊 PDF RAG Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("⚙️  Configuration:");
    println!("   📁 Base directory: {}", config.get_base_dir().display());
    println!(
        "   ✂️  Chunking: {} chars, {} overlap",
        config.chunking.chunk_size, config.chunking.overlap
    );
    println!();

    println!("🤖 Ollama Status:");
    match OllamaClient::new(&config.ollama) {
        Ok(client) => {
            if let Err(e) = client.ping() {
                println!("   ❌ Ollama: Unreachable - {:#}", e);
            } else {
                println!(
                    "   ✅ Ollama: Connected ({}:{})",
                    config.ollama.host, config.ollama.port
                );
                match client.health_check() {
                    Ok(()) => println!("   ✅ Models: available"),
                    Err(e) => println!("   ⚠️  Models: {:#}", e),
                }
                println!("   📋 Embedding Model: {}", config.ollama.model);
                println!("   💬 Generation Model: {}", config.ollama.generation_model);
                println!("   🔢 Batch Size: {}", config.ollama.batch_size);
            }
        }
        Err(e) => {
            println!("   ❌ Ollama: Invalid client configuration - {:#}", e);
        }
    }
    println!();

    println!("🗄️  Store Status:");
    match RagService::from_config(config) {
        Ok(service) => {
            println!("   📄 Stored records: {}", service.records().len());
            println!(
                "   🔍 Indexed vectors: {} (dimension {})",
                service.index().len(),
                service.index().dimension()
            );

            let report = service.consistency();
            if report.is_consistent {
                println!("   ✅ {}", report.summary());
            } else {
                println!("   ⚠️  {}", report.summary());
                for issue in &report.inconsistent_sources {
                    println!(
                        "      • {}: {} stored, {} indexed",
                        issue.source, issue.stored_records, issue.indexed_vectors
                    );
                }
            }
        }
        Err(e) => {
            println!("   ❌ Failed to open stores - {}", e);
        }
    }

    println!();
    println!("💡 Next Steps:");
    println!("   • Use 'pdf-rag upload <file.pdf>' to index a document");
    println!("   • Use 'pdf-rag chat' to ask questions interactively");
    println!("   • Use 'pdf-rag serve' to start the MCP server for AI assistants");

    Ok(())
}

/// Run the MCP server on stdio until the client disconnects or Ctrl+C.
///
/// Stdout carries protocol frames, so every status line here goes to stderr.
#[inline]
pub async fn serve_mcp(base_dir: &Path) -> Result<()> {
    let config = Config::load(base_dir).context("Failed to load configuration")?;

    match OllamaClient::new(&config.ollama) {
        Ok(client) => match client.health_check() {
            Ok(()) => info!(
                "Ollama connected at {}:{} with models {} / {}",
                config.ollama.host,
                config.ollama.port,
                config.ollama.model,
                config.ollama.generation_model
            ),
            Err(e) => {
                warn!("Ollama is not ready: {:#}", e);
                eprintln!("Warning: Ollama may not be ready. Uploads and questions may fail.");
            }
        },
        Err(e) => {
            error!("Invalid Ollama configuration: {:#}", e);
            eprintln!("Use 'pdf-rag config' to update connection settings.");
            return Err(e);
        }
    }

    let service = Arc::new(Mutex::new(
        RagService::from_config(config).context("Failed to open document stores")?,
    ));

    let server = Arc::new(McpServer::new(
        env!("CARGO_PKG_NAME").to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    ));

    server
        .register_tool(
            AskHandler::tool_definition(),
            AskHandler::new(Arc::clone(&service)),
        )
        .await;
    server
        .register_tool(
            UploadPdfHandler::tool_definition(),
            UploadPdfHandler::new(Arc::clone(&service)),
        )
        .await;
    server
        .register_tool(
            ListDocumentsHandler::tool_definition(),
            ListDocumentsHandler::new(Arc::clone(&service)),
        )
        .await;

    eprintln!("✅ MCP server initialized with tools: ask, upload_pdf, list_documents");
    eprintln!("Note: This server uses stdio transport. Connect via MCP client.");

    tokio::select! {
        result = Arc::clone(&server).serve_stdio() => {
            result.context("MCP server failed")?;
            info!("MCP server stopped normally");
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n📴 Received interrupt signal, shutting down...");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands() {
        assert!(is_exit_command(""));
        assert!(is_exit_command("   "));
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("QUIT"));
        assert!(!is_exit_command("what is in the manual?"));
    }

    #[test]
    fn preview_flattens_and_truncates() {
        assert_eq!(preview("line one\n\nline   two", 80), "line one line two");
        assert_eq!(preview("abcdefghij", 4), "abcd…");
    }

    #[test]
    fn records_add_then_get_and_delete() {
        let temp_dir = tempfile::TempDir::new().expect("should create temp dir");

        records_add(temp_dir.path(), "notes.txt", "hand written", Some("n1".to_string()))
            .expect("should add record");
        records_get(temp_dir.path(), "n1").expect("should find record");
        records_update(temp_dir.path(), "n1", "edited").expect("should update record");
        records_delete(temp_dir.path(), "n1").expect("should delete record");

        assert!(records_get(temp_dir.path(), "n1").is_err());
        assert!(records_delete(temp_dir.path(), "n1").is_err());
    }
}
