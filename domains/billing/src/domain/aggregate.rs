//! Invoice aggregation over the usage ledger
//!
//! The grouping pass is an explicit in-memory fold keyed by `user_id`,
//! independent of the store. It runs over whatever snapshot of ledger rows
//! the caller hands it, so the snapshot boundary is decided once by the
//! surrounding transaction and every row is counted exactly one way.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use tallybook_common::{Error, Result};

use crate::domain::entities::UsageRecord;

/// A half-open billing window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BillingPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(Error::Invalid(
                "Billing period start must precede period end".to_string(),
            ));
        }
        Ok(BillingPeriod { start, end })
    }

    /// The calendar month containing `now`: first instant of the month up to
    /// (exclusive) the first instant of the next month.
    pub fn current_month(now: DateTime<Utc>) -> Result<Self> {
        let start = Utc
            .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
            .single()
            .ok_or_else(|| Error::Internal("Invalid period start boundary".to_string()))?;

        let (next_year, next_month) = if now.month() == 12 {
            (now.year() + 1, 1)
        } else {
            (now.year(), now.month() + 1)
        };
        let end = Utc
            .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| Error::Internal("Invalid period end boundary".to_string()))?;

        BillingPeriod::new(start, end)
    }

    /// Half-open containment: start inclusive, end exclusive
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

/// Per-user subtotal produced by the grouping pass
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UsageSummary {
    pub user_id: Uuid,
    pub tokens_used: f64,
    pub cost: Decimal,
}

/// Group ledger rows by user, summing `amount` into `tokens_used` and `cost`
/// into the per-user subtotal. All usage types participate. Summaries come
/// back ordered by `user_id` so output is deterministic for a given input.
pub fn summarize_by_user(records: &[UsageRecord]) -> Vec<UsageSummary> {
    let mut groups: BTreeMap<Uuid, (f64, Decimal)> = BTreeMap::new();

    for record in records {
        let entry = groups.entry(record.user_id).or_insert((0.0, Decimal::ZERO));
        entry.0 += record.amount;
        entry.1 += record.cost;
    }

    groups
        .into_iter()
        .map(|(user_id, (tokens_used, cost))| UsageSummary {
            user_id,
            tokens_used,
            cost,
        })
        .collect()
}

/// Sum of per-user subtotals; exact, so it matches the line items bit for bit
pub fn invoice_total(summaries: &[UsageSummary]) -> Decimal {
    summaries.iter().map(|s| s.cost).sum()
}
