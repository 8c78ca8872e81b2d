// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MCP server for the document processing API.
//!
//! [`OperationGateway`] runs each operation end to end (path checks,
//! reference collection, dispatch, materialization, credit recording) and
//! always answers with a [`ToolOutput`](dws_core::ToolOutput).
//! [`DwsServer`] exposes the gateway as MCP tools over rmcp.

pub mod gateway;
pub mod redact;
pub mod server;

pub use gateway::{
    AiRedactorParams, CheckCreditsParams, CreditAction, DirectoryTreeParams,
    DocumentProcessorParams, DocumentSignerParams, OperationGateway,
};
pub use redact::{RedactingWriter, Redactor};
pub use server::DwsServer;
