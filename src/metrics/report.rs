use serde::Serialize;

use super::endpoint::{EndpointMetrics, EndpointSnapshot};
use super::percentiles::{p99, sorted_copy};

/// Endpoint label of the synthesized totals row.
pub const TOTAL_ROW_LABEL: &str = "Total";

/// Summary of one endpoint. Rates are fixed-point with two decimals
/// (`x100`), so `qps_x100 == 5000` reads as 50.00 iterations per second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub endpoint: String,
    pub count: u64,
    pub success: u64,
    pub fail: u64,
    pub qps_x100: u64,
    pub avg_ms: u64,
    pub min_ms: u64,
    pub max_ms: u64,
    pub p99_ms: u64,
    pub total_cost_ms: u64,
    pub success_rate_x100: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub total: Option<ReportRow>,
}

impl Report {
    /// Endpoint rows followed by the totals row.
    pub fn all_rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().chain(self.total.iter())
    }

    #[must_use]
    pub fn row(&self, endpoint: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|row| row.endpoint == endpoint)
    }
}

/// Snapshot every endpoint and summarize it. Safe to call mid-run.
#[must_use]
pub fn build_report(metrics: &EndpointMetrics) -> Report {
    let rows: Vec<ReportRow> = metrics.snapshot().iter().map(build_row).collect();
    let total = total_row(&rows);
    Report { rows, total }
}

pub(super) fn build_row(snapshot: &EndpointSnapshot) -> ReportRow {
    let sorted = sorted_copy(&snapshot.samples);
    let count = snapshot.count();
    let total_cost_ms = sorted
        .iter()
        .map(|cost| u128::from(*cost))
        .fold(0u128, u128::saturating_add);
    let avg_ms = total_cost_ms
        .checked_div(u128::from(count))
        .map_or(0, |avg| u64::try_from(avg).unwrap_or(u64::MAX));

    ReportRow {
        endpoint: snapshot.endpoint.clone(),
        count,
        success: snapshot.success,
        fail: snapshot.fail,
        qps_x100: qps_x100(count, snapshot.span_ms()),
        avg_ms,
        min_ms: sorted.first().copied().unwrap_or(0),
        max_ms: sorted.last().copied().unwrap_or(0),
        p99_ms: p99(&sorted),
        total_cost_ms: u64::try_from(total_cost_ms).unwrap_or(u64::MAX),
        success_rate_x100: ratio_x100(snapshot.success, count),
    }
}

/// Totals across endpoint rows: counts are summed, min/max are the extreme
/// values, and avg/P99/QPS/success-rate are the plain mean of the rows
/// (every endpoint weighs the same regardless of its traffic).
pub(super) fn total_row(rows: &[ReportRow]) -> Option<ReportRow> {
    if rows.is_empty() {
        return None;
    }
    let row_count = u128::try_from(rows.len()).unwrap_or(u128::MAX);
    let mean = |pick: fn(&ReportRow) -> u64| -> u64 {
        let sum = rows
            .iter()
            .map(|row| u128::from(pick(row)))
            .fold(0u128, u128::saturating_add);
        sum.checked_div(row_count)
            .map_or(0, |value| u64::try_from(value).unwrap_or(u64::MAX))
    };
    let sum = |pick: fn(&ReportRow) -> u64| -> u64 {
        rows.iter().map(pick).fold(0u64, u64::saturating_add)
    };

    Some(ReportRow {
        endpoint: TOTAL_ROW_LABEL.to_owned(),
        count: sum(|row| row.count),
        success: sum(|row| row.success),
        fail: sum(|row| row.fail),
        qps_x100: mean(|row| row.qps_x100),
        avg_ms: mean(|row| row.avg_ms),
        min_ms: rows.iter().map(|row| row.min_ms).min().unwrap_or(0),
        max_ms: rows.iter().map(|row| row.max_ms).max().unwrap_or(0),
        p99_ms: mean(|row| row.p99_ms),
        total_cost_ms: sum(|row| row.total_cost_ms),
        success_rate_x100: mean(|row| row.success_rate_x100),
    })
}

/// `count * 1000 / span_ms`, scaled by 100.
#[must_use]
pub fn qps_x100(count: u64, span_ms: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    let scaled = u128::from(count)
        .saturating_mul(100_000)
        .checked_div(u128::from(span_ms.max(1)))
        .unwrap_or(0);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

pub(super) fn ratio_x100(part: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    let scaled = u128::from(part)
        .saturating_mul(10_000)
        .checked_div(u128::from(total))
        .unwrap_or(0);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Render a fixed-point `x100` value as `12.34`.
#[must_use]
pub fn format_x100(value: u64) -> String {
    format!(
        "{}.{:02}",
        value.checked_div(100).unwrap_or(0),
        value.checked_rem(100).unwrap_or(0)
    )
}
