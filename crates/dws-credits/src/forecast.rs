// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage summaries and burn-rate forecasts built from the ledger.

use chrono::{DateTime, Duration, Utc};
use dws_core::DwsError;
use serde::Serialize;

use crate::ledger::{CreditLedger, OperationUsage, format_timestamp};

/// Credits used over a period, broken down by operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSummary {
    pub period_days: u32,
    pub since: String,
    pub total_credits: f64,
    pub operations: Vec<OperationUsage>,
}

/// Projection of when the remaining balance runs out at the recent burn rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditForecast {
    pub window_days: u32,
    pub credits_used: f64,
    pub daily_average: f64,
    /// Last balance reported by the service, if any was seen.
    pub remaining_balance: Option<f64>,
    /// `None` when there is no balance or no recent usage.
    pub days_remaining: Option<f64>,
    pub projected_depletion: Option<String>,
}

impl CreditForecast {
    /// Computes a forecast from raw figures. `window_days` of zero is
    /// treated as one day.
    pub fn compute(window_days: u32, credits_used: f64, remaining_balance: Option<f64>, now: DateTime<Utc>) -> Self {
        let daily_average = credits_used / f64::from(window_days.max(1));
        let days_remaining = remaining_balance
            .filter(|_| daily_average > 0.0)
            .map(|balance| (balance / daily_average).max(0.0));
        let projected_depletion = days_remaining
            .and_then(|days| Duration::try_seconds((days * 86_400.0) as i64))
            .and_then(|d| now.checked_add_signed(d))
            .map(|at| at.format("%Y-%m-%d").to_string());

        Self {
            window_days,
            credits_used,
            daily_average,
            remaining_balance,
            days_remaining,
            projected_depletion,
        }
    }
}

/// Start of a reporting window ending at `now`.
fn window_start(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>, DwsError> {
    Duration::try_days(i64::from(days))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| DwsError::Validation(format!("period of {days} days is out of range")))
}

impl CreditLedger {
    /// Usage over the last `period_days` days.
    pub async fn summary(&self, period_days: u32) -> Result<UsageSummary, DwsError> {
        let since = window_start(Utc::now(), period_days)?;
        let operations = self.usage_by_operation(since).await?;
        let total_credits = operations.iter().map(|o| o.credits).sum();
        Ok(UsageSummary {
            period_days,
            since: format_timestamp(since),
            total_credits,
            operations,
        })
    }

    /// Forecast from the last `window_days` days of usage and the latest
    /// reported balance.
    pub async fn forecast(&self, window_days: u32) -> Result<CreditForecast, DwsError> {
        let now = Utc::now();
        let since = window_start(now, window_days.max(1))?;
        let used = self.total_since(since).await?;
        let balance = self.latest_balance().await?;
        Ok(CreditForecast::compute(window_days, used, balance, now))
    }
}
