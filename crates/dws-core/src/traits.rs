// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits at the seams between the gateway and its collaborators.

use async_trait::async_trait;

use crate::error::DwsError;
use crate::types::CreditUsage;

/// Sink for per-request credit usage.
///
/// The gateway calls this after every successful remote request that
/// reported a credit cost. Implementations may fail; callers log and
/// discard the error so usage accounting never changes a tool's outcome.
#[async_trait]
pub trait UsageRecorder: Send + Sync {
    /// Persists one usage entry.
    async fn record_usage(&self, usage: &CreditUsage) -> Result<(), DwsError>;
}
