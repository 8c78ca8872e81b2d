// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credit usage accounting for the dws-mcp server.
//!
//! This crate provides:
//! - **Credit ledger**: every processing request's reported credit cost and
//!   remaining balance, persisted to SQLite
//! - **Reports**: per-operation usage totals and a burn-rate forecast

pub mod forecast;
pub mod ledger;

pub use forecast::{CreditForecast, UsageSummary};
pub use ledger::{CreditLedger, OperationUsage, UsageEntry};
