// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MCP tool surface.
//!
//! Each tool deserializes its arguments (schemas generated by schemars),
//! hands them to the [`OperationGateway`], and wraps the uniform
//! [`ToolOutput`] in a `CallToolResult`.

use std::sync::Arc;

use dws_core::{DwsError, ToolOutput};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt, tool, tool_handler, tool_router};
use tracing::info;

use crate::gateway::{
    AiRedactorParams, CheckCreditsParams, DirectoryTreeParams, DocumentProcessorParams,
    DocumentSignerParams, OperationGateway,
};

/// MCP server exposing the processing operations as tools.
#[derive(Clone)]
pub struct DwsServer {
    gateway: Arc<OperationGateway>,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for DwsServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DwsServer").finish_non_exhaustive()
    }
}

fn into_call_result(output: ToolOutput) -> CallToolResult {
    let content = vec![Content::text(output.content)];
    if output.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

#[tool_router(vis = "pub")]
impl DwsServer {
    pub fn new(gateway: OperationGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
            tool_router: Self::tool_router(),
        }
    }

    pub fn gateway(&self) -> &OperationGateway {
        &self.gateway
    }

    /// Serves MCP over stdin/stdout until the client disconnects.
    pub async fn serve_stdio(self) -> Result<(), DwsError> {
        let service = self
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| DwsError::Internal(format!("failed to start MCP service: {e}")))?;
        info!("MCP server running on stdio");
        service
            .waiting()
            .await
            .map_err(|e| DwsError::Internal(format!("MCP service terminated abnormally: {e}")))?;
        info!("MCP server shutting down");
        Ok(())
    }

    #[tool(
        description = "Process documents with the document processing API: merge parts, convert \
between formats (PDF, PDF/A, images, Office, HTML, Markdown), OCR, watermark, rotate, flatten, \
redact by pattern, import XFDF or Instant JSON annotations, or extract text, tables and key-value \
pairs as JSON. Each part's `file` (and watermark `image`, applyXfdf/applyInstantJson `file`) may \
be a local path or an http(s) URL. Set output.type to `json-content` to get extracted content \
inline; otherwise `outputPath` is required and the result is written there."
    )]
    async fn document_processor(
        &self,
        Parameters(params): Parameters<DocumentProcessorParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(self.gateway.build(params).await))
    }

    #[tool(
        description = "Digitally sign a PDF. Accepts signature options (CMS or CAdES, visible \
appearance, position) and optional watermark and graphic images for the signature appearance. \
The signed document is written to `outputPath`."
    )]
    async fn document_signer(
        &self,
        Parameters(params): Parameters<DocumentSignerParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(self.gateway.sign(params).await))
    }

    #[tool(
        description = "Detect and redact sensitive information with AI, using plain-language \
criteria (default: all personally identifiable information). Set `stage` to add redaction \
annotations for review or `apply` to burn them in; not both. `outputPath` must differ from \
`filePath`. This can take several minutes."
    )]
    async fn ai_redactor(&self, Parameters(params): Parameters<AiRedactorParams>) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(self.gateway.ai_redact(params).await))
    }

    #[tool(
        description = "Check processing credits. `balance` returns account information from the \
service; `usage` summarizes credits spent per operation over `periodDays` (default 30) from the \
local ledger; `forecast` projects how long the remaining balance lasts at the recent burn rate."
    )]
    async fn check_credits(
        &self,
        Parameters(params): Parameters<CheckCreditsParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(self.gateway.check_credits(params).await))
    }

    #[tool(
        description = "List a directory as an indented tree, to discover input files and check \
results. Hidden entries are skipped."
    )]
    async fn directory_tree(
        &self,
        Parameters(params): Parameters<DirectoryTreeParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(self.gateway.directory_tree(params).await))
    }
}

#[tool_handler]
impl ServerHandler for DwsServer {
    fn get_info(&self) -> ServerInfo {
        let sandbox = match self.gateway.jail().root() {
            Some(root) => format!(
                "File paths are resolved inside the sandbox directory {}; relative paths are \
                 relative to it.",
                root.display()
            ),
            None => "No sandbox directory is configured: all file paths must be absolute.".to_string(),
        };
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(format!(
                "Document processing tools backed by a remote API: build/convert/extract, sign, \
                 AI redaction, and credit checks. {sandbox}"
            )),
            ..Default::default()
        }
    }
}
