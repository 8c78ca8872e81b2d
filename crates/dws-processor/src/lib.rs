// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request pipeline for the remote document processing API.
//!
//! - [`instructions`]: the build instruction graph (parts, actions, output).
//! - [`references`]: walks the graph, swaps file fields for reference keys.
//! - [`dispatch`]: chooses JSON or multipart encoding for the outbound call.
//! - [`client`]: authenticated HTTP client and remote error mapping.
//! - [`materialize`]: turns a response into inline text or a file on disk.
//! - [`classify`]: coarse operation kind used for credit accounting.

pub mod classify;
pub mod client;
pub mod dispatch;
pub mod instructions;
pub mod materialize;
pub mod references;

pub use classify::classify_build;
pub use client::{DwsClient, Endpoint, RemoteResponse, ReportedCredits};
pub use dispatch::{
    FieldContent, MultipartField, RedactionState, RequestBody, SignRequest, plan_ai_redact,
    plan_build, plan_sign,
};
pub use instructions::{Action, FileAction, Instructions, Output, Part, WatermarkAction};
pub use materialize::{materialize_file, materialize_json, write_output};
pub use references::{
    FileReference, FileSource, ReferenceMap, ReferenceResolver, collect_references, is_remote_url,
};
