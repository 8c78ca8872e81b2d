// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the gateway, the processor client, and the ledger.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::DwsError;

/// Uniform result of every tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Success message, inline JSON content, or error description.
    pub content: String,
    /// Whether the tool invocation resulted in an error.
    pub is_error: bool,
}

impl ToolOutput {
    /// A successful result carrying `content`.
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// A failed result carrying a human-readable description.
    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

impl From<Result<String, DwsError>> for ToolOutput {
    fn from(result: Result<String, DwsError>) -> Self {
        match result {
            Ok(content) => ToolOutput::success(content),
            Err(e) => ToolOutput::failure(e.client_message()),
        }
    }
}

/// Coarse classification of a processing request, used as the ledger key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Plain merge/assemble build with PDF output.
    Build,
    /// Build whose output is a non-PDF format.
    Conversion,
    /// Build containing an OCR action.
    Ocr,
    /// Build containing redaction actions.
    Redaction,
    /// Build containing a watermark action.
    Watermark,
    /// Build importing XFDF or Instant JSON.
    FormImport,
    /// Build extracting structured JSON content.
    Extraction,
    /// Digital signature.
    Sign,
    /// AI-assisted redaction.
    AiRedact,
}

/// Credit consumption reported by the processing service for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditUsage {
    /// What kind of request consumed the credits.
    pub operation: OperationKind,
    /// Credits charged for the request.
    pub cost: f64,
    /// Remaining balance after the request, when reported.
    pub remaining: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PathError;

    #[test]
    fn tool_output_from_result() {
        let ok: ToolOutput = Ok::<_, DwsError>("done".to_string()).into();
        assert_eq!(ok, ToolOutput::success("done"));

        let err: ToolOutput = Err::<String, _>(DwsError::Path(PathError::Empty)).into();
        assert!(err.is_error);
        assert!(err.content.contains("empty path"));
    }

    #[test]
    fn operation_kind_display_and_parse() {
        use std::str::FromStr;
        assert_eq!(OperationKind::AiRedact.to_string(), "ai_redact");
        assert_eq!(OperationKind::FormImport.to_string(), "form_import");
        assert_eq!(
            OperationKind::from_str("conversion").unwrap(),
            OperationKind::Conversion
        );
    }

    #[test]
    fn operation_kind_serialization() {
        let json = serde_json::to_string(&OperationKind::Ocr).unwrap();
        assert_eq!(json, "\"ocr\"");
        let parsed: OperationKind = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, OperationKind::Ocr);
    }
}
