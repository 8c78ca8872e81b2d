// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a processing response into inline text or a file on disk.
//!
//! Both modes buffer the whole body before acting on it.

use std::path::PathBuf;

use dws_core::{DwsError, RemoteError};
use dws_sandbox::PathJail;
use tracing::info;

/// Reads the complete response body.
pub async fn read_body(mut response: reqwest::Response) -> Result<Vec<u8>, DwsError> {
    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| RemoteError::BodyRead(e.to_string()))?
    {
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Returns the response body as text, unparsed.
pub async fn materialize_json(response: reqwest::Response) -> Result<String, DwsError> {
    let body = read_body(response).await?;
    String::from_utf8(body).map_err(|e| RemoteError::BodyRead(format!("response is not valid UTF-8: {e}")).into())
}

/// Writes the response body to `output_path` and returns the resolved path.
pub async fn materialize_file(
    jail: &PathJail,
    response: reqwest::Response,
    output_path: &str,
) -> Result<PathBuf, DwsError> {
    let body = read_body(response).await?;
    write_output(jail, &body, output_path).await
}

/// Resolves `output_path` for writing, creates its parent, and writes `bytes`.
pub async fn write_output(jail: &PathJail, bytes: &[u8], output_path: &str) -> Result<PathBuf, DwsError> {
    let path = jail.resolve_for_write(output_path).await?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| DwsError::Io {
                context: format!("Cannot create directory {}", parent.display()),
                source,
            })?;
    }
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|source| DwsError::Io {
            context: format!("Cannot write output file {}", path.display()),
            source,
        })?;

    info!(path = %path.display(), size = bytes.len(), "output written");
    Ok(path)
}
