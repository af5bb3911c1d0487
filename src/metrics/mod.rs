//! Per-endpoint metrics accumulation, live trend sampling and report rows.
mod endpoint;
mod percentiles;
mod report;
mod trend;

#[cfg(test)]
mod tests;

pub use endpoint::{EndpointMetrics, EndpointSnapshot, WindowStats};
pub use percentiles::{p99, percentile, sorted_copy};
pub use report::{Report, ReportRow, TOTAL_ROW_LABEL, build_report, format_x100, qps_x100};
pub use trend::{TREND_WINDOW, TrendPoint, TrendSampler};
