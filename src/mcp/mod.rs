//! MCP (Model Context Protocol) Server Implementation
//!
//! JSON-RPC 2.0 over stdio, MCP protocol version 2025-06-18, exposing the
//! document assistant as the `ask`, `upload_pdf` and `list_documents` tools.


pub mod protocol;
pub mod server;
pub mod tools;

pub use server::{ConnectionState, McpServer, MessageHandler, ToolHandler};
pub use tools::{AskHandler, ListDocumentsHandler, SharedService, UploadPdfHandler};
