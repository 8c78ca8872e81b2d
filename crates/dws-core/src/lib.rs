// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the dws-mcp server.
//!
//! This crate provides the error taxonomy, the uniform tool result shape, and
//! the adapter traits shared by the sandbox, processor, credits, and MCP
//! server crates.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{DwsError, HostedError, PathError, RemoteError};
pub use traits::UsageRecorder;
pub use types::{CreditUsage, OperationKind, ToolOutput};
