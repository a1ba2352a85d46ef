//! MCP Tools Implementation
//!
//! Tool handlers exposing question answering, PDF upload and the document
//! summary of a shared [`RagService`].

use crate::mcp::protocol::*;
use crate::mcp::server::{RequestError, ToolHandler};
use crate::service::{RagService, upload_error_message, upload_success_message};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Service handle shared by every tool; the mutex serialises uploads and queries
pub type SharedService = Arc<Mutex<RagService>>;

fn required_str(args: &HashMap<String, serde_json::Value>, name: &str) -> Result<String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| RequestError::InvalidParams(format!("Missing required parameter: {name}")).into())
}

/// Question answering tool handler
pub struct AskHandler {
    service: SharedService,
}

impl AskHandler {
    #[inline]
    pub fn new(service: SharedService) -> Self {
        Self { service }
    }

    /// Create the ask tool definition
    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "ask".to_string(),
            description: Some(
                "Answer a question using the content of uploaded PDF documents".to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Question to answer"
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for AskHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();
        let query = required_str(&args, "query")?;
        debug!("Answering question: '{}'", query);

        let service = Arc::clone(&self.service).lock_owned().await;
        let answer = tokio::task::spawn_blocking(move || service.chat(&query))
            .await
            .context("Answer task panicked")?;

        Ok(match answer {
            Ok(text) => CallToolResult::text(text),
            Err(e) => {
                error!("Failed to answer question: {}", e);
                CallToolResult::error(format!("Error answering question: {}", e))
            }
        })
    }
}

/// PDF upload tool handler
pub struct UploadPdfHandler {
    service: SharedService,
}

impl UploadPdfHandler {
    #[inline]
    pub fn new(service: SharedService) -> Self {
        Self { service }
    }

    /// Create the upload_pdf tool definition
    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "upload_pdf".to_string(),
            description: Some(
                "Extract, chunk and index a PDF file from the local filesystem".to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Path to a .pdf file readable by the server"
                    }
                },
                "required": ["path"],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for UploadPdfHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();
        let path = PathBuf::from(required_str(&args, "path")?);
        debug!("Uploading PDF: {}", path.display());

        let mut service = Arc::clone(&self.service).lock_owned().await;
        let result = tokio::task::spawn_blocking(move || service.upload_pdf(&path))
            .await
            .context("Upload task panicked")?;

        Ok(match result {
            Ok(report) => CallToolResult::text(format!(
                "{}\n{} chunks indexed (document {})",
                upload_success_message(&report.source),
                report.chunks,
                report.document_id
            )),
            Err(e) => {
                error!("Upload failed: {}", e);
                CallToolResult::error(upload_error_message(&e))
            }
        })
    }
}

/// Document summary tool handler
pub struct ListDocumentsHandler {
    service: SharedService,
}

impl ListDocumentsHandler {
    #[inline]
    pub fn new(service: SharedService) -> Self {
        Self { service }
    }

    /// Create the list_documents tool definition
    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "list_documents".to_string(),
            description: Some("List uploaded documents with their chunk counts".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for ListDocumentsHandler {
    #[inline]
    async fn handle(&self, _params: CallToolParams) -> Result<CallToolResult> {
        let service = self.service.lock().await;
        Ok(CallToolResult::text(service.documents_summary().to_string()))
    }
}
