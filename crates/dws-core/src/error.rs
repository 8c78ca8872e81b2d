// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the dws-mcp server.
//!
//! Every failure inside a tool call is one of these variants. The MCP gateway
//! turns them into a failed [`ToolOutput`](crate::ToolOutput) via
//! [`DwsError::client_message`], so messages are written as prose an agent can
//! act on: they always name the offending path, field, or flag.

use std::path::PathBuf;

use serde_json::{Map, Value};
use thiserror::Error;

/// The primary error type used across all dws crates.
#[derive(Debug, Error)]
pub enum DwsError {
    /// Configuration errors (missing credential, invalid base URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// A caller-supplied path was rejected by the sandbox.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A file-bearing instruction field could not be resolved.
    #[error("Error with referenced file {reference}: {source}")]
    Reference {
        /// The original string from the instruction field.
        reference: String,
        source: Box<DwsError>,
    },

    /// The instructions did not reference a single file or URL.
    #[error("No valid files or urls found in instructions")]
    NoReferences,

    /// Tool arguments were well-formed but semantically invalid.
    #[error("{0}")]
    Validation(String),

    /// The remote processing API failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Credit ledger errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Local filesystem errors outside of path resolution.
    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DwsError {
    /// Wraps an error with the instruction reference that produced it.
    pub fn reference(reference: impl Into<String>, source: DwsError) -> Self {
        DwsError::Reference {
            reference: reference.into(),
            source: Box::new(source),
        }
    }

    /// Returns the text handed back to the invoking agent.
    ///
    /// Hosted errors are passed through as their original JSON payload so
    /// the agent can read `failingPaths` itself; everything else uses the
    /// `Display` form.
    pub fn client_message(&self) -> String {
        match self {
            DwsError::Remote(RemoteError::Hosted(hosted)) => hosted.to_json_string(),
            other => other.to_string(),
        }
    }
}

/// Path rejections produced by the sandbox resolver.
#[derive(Debug, Error)]
pub enum PathError {
    /// Jailing is disabled and the path was relative.
    #[error(
        "Invalid path '{path}': absolute paths are required when no sandbox directory is configured"
    )]
    AbsoluteRequired { path: String },

    /// The path resolved outside the jail root.
    #[error(
        "Invalid path '{path}': you may only access files within the sandbox directory ({})",
        .root.display()
    )]
    OutsideSandbox { path: String, root: PathBuf },

    /// The path does not exist.
    #[error("Path '{path}' does not exist (resolved to {})", .resolved.display())]
    NotFound { path: String, resolved: PathBuf },

    /// The path exists but is not the expected kind of entry.
    #[error("Path '{path}' is not a {expected} (resolved to {})", .resolved.display())]
    WrongKind {
        path: String,
        resolved: PathBuf,
        expected: &'static str,
    },

    /// The path was empty.
    #[error("Invalid path: an empty path was provided")]
    Empty,

    /// The target location cannot be written.
    #[error("Cannot write to '{path}': {source}")]
    NotWritable {
        path: String,
        source: std::io::Error,
    },

    /// Any other filesystem error while resolving.
    #[error("Cannot access '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Failures talking to the remote processing API.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Structured error payload returned by the processing service.
    #[error("{}", .0.to_json_string())]
    Hosted(HostedError),

    /// Non-success response whose body is not a hosted error.
    #[error("Error processing request (HTTP {status}): {body}")]
    Opaque { status: u16, body: String },

    /// The request never produced a response.
    #[error("Error sending request to the processing API: {0}")]
    Transport(String),

    /// The response stream failed part way through.
    #[error("Error reading response stream: {0}")]
    BodyRead(String),
}

/// A structured error body from the processing service.
///
/// Recognized by the presence of `details` and `status`; `requestId` and
/// `failingPaths` are optional. The original object is kept so it can be
/// returned unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct HostedError {
    payload: Map<String, Value>,
}

impl HostedError {
    /// Parses a response body as a hosted error, if it has the right shape.
    pub fn from_body(body: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(body).ok()?;
        Self::from_value(value)
    }

    /// Accepts an already-parsed JSON value as a hosted error.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(payload) = value else {
            return None;
        };
        let has_details = payload.get("details").is_some_and(|d| !d.is_null());
        let has_status = payload.get("status").is_some_and(Value::is_number);
        if !has_details || !has_status {
            return None;
        }
        if let Some(paths) = payload.get("failingPaths")
            && !paths.is_array()
        {
            return None;
        }
        Some(Self { payload })
    }

    /// HTTP-style status carried in the payload.
    pub fn status(&self) -> Option<u64> {
        self.payload.get("status").and_then(Value::as_u64)
    }

    /// Request identifier assigned by the service, if present.
    pub fn request_id(&self) -> Option<&str> {
        self.payload.get("requestId").and_then(Value::as_str)
    }

    /// Number of entries in `failingPaths`.
    pub fn failing_path_count(&self) -> usize {
        self.payload
            .get("failingPaths")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// The original payload.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Serializes the original payload back to JSON text.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(&self.payload).unwrap_or_default()
    }
}
