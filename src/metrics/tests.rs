use std::sync::Arc;

use super::report::total_row;
use super::*;

fn row(endpoint: &str, count: u64, min_ms: u64, max_ms: u64, avg_ms: u64) -> ReportRow {
    ReportRow {
        endpoint: endpoint.to_owned(),
        count,
        success: count,
        fail: 0,
        qps_x100: 1_000,
        avg_ms,
        min_ms,
        max_ms,
        p99_ms: max_ms,
        total_cost_ms: avg_ms.saturating_mul(count),
        success_rate_x100: 10_000,
    }
}

#[test]
fn p99_uses_nearest_rank() -> Result<(), String> {
    let ten: Vec<u64> = (1..=10).map(|step| step * 10).collect();
    if p99(&sorted_copy(&ten)) != 100 {
        return Err(format!("P99 of 10..100 was {}", p99(&sorted_copy(&ten))));
    }
    if p99(&sorted_copy(&[100, 5, 50])) != 100 {
        return Err("P99 of [5, 50, 100] should be 100".to_owned());
    }
    if p99(&[]) != 0 {
        return Err("P99 of no samples should be 0".to_owned());
    }
    if percentile(&[1, 2, 3, 4], 50) != 2 {
        return Err("P50 of [1, 2, 3, 4] should be 2".to_owned());
    }
    Ok(())
}

#[test]
fn qps_is_count_per_span_second() -> Result<(), String> {
    let value = qps_x100(100, 2_000);
    if value != 5_000 {
        return Err(format!("Expected 5000, got {}", value));
    }
    if format_x100(value) != "50.00" {
        return Err(format!("Unexpected rendering {}", format_x100(value)));
    }
    if format_x100(1_205) != "12.05" {
        return Err(format!("Unexpected rendering {}", format_x100(1_205)));
    }
    if qps_x100(0, 0) != 0 {
        return Err("No samples means no throughput".to_owned());
    }
    Ok(())
}

#[test]
fn report_row_uses_wall_clock_span() -> Result<(), String> {
    let metrics = EndpointMetrics::new();
    // 100 iterations of 20ms each ending evenly between 20ms and 2000ms.
    for index in 1..=100u64 {
        metrics.record_at("login", index * 20, 20, index % 10 != 0);
    }
    let report = build_report(&metrics);
    let login = report
        .row("login")
        .ok_or_else(|| "Missing login row".to_owned())?;
    if login.count != 100 || login.success != 90 || login.fail != 10 {
        return Err(format!("Unexpected counters {:?}", login));
    }
    if login.qps_x100 != 5_000 {
        return Err(format!("Expected 50.00 qps, got {}", login.qps_x100));
    }
    if login.avg_ms != 20 || login.min_ms != 20 || login.max_ms != 20 {
        return Err(format!("Unexpected latency stats {:?}", login));
    }
    if login.total_cost_ms != 2_000 {
        return Err(format!("Unexpected total cost {}", login.total_cost_ms));
    }
    if login.success_rate_x100 != 9_000 {
        return Err(format!("Unexpected success rate {}", login.success_rate_x100));
    }
    Ok(())
}

#[test]
fn concurrent_recording_keeps_counters_consistent() -> Result<(), String> {
    let metrics = Arc::new(EndpointMetrics::new());
    std::thread::scope(|scope| {
        for worker in 0..8u64 {
            let metrics = Arc::clone(&metrics);
            scope.spawn(move || {
                for index in 0..250u64 {
                    let endpoint = if index % 2 == 0 { "a" } else { "b" };
                    metrics.record(endpoint, worker + index % 7, index % 5 != 0);
                }
            });
        }
    });

    let mut total = 0u64;
    for snapshot in metrics.snapshot() {
        if snapshot.success + snapshot.fail != snapshot.count() {
            return Err(format!(
                "{}: success {} + fail {} != samples {}",
                snapshot.endpoint,
                snapshot.success,
                snapshot.fail,
                snapshot.count()
            ));
        }
        total += snapshot.count();
    }
    if total != 2_000 || metrics.total_recorded() != 2_000 {
        return Err(format!("Expected 2000 samples, got {}", total));
    }
    Ok(())
}

#[test]
fn snapshot_does_not_reorder_live_samples() -> Result<(), String> {
    let metrics = EndpointMetrics::new();
    for (end, cost) in [(10, 30), (20, 10), (30, 20)] {
        metrics.record_at("orders", end, cost, true);
    }
    let _report = build_report(&metrics);
    let snapshot = metrics.snapshot();
    let samples = snapshot
        .first()
        .map(|series| series.samples.clone())
        .ok_or_else(|| "Missing orders series".to_owned())?;
    if samples != vec![30, 10, 20] {
        return Err(format!("Live samples were reordered: {:?}", samples));
    }
    Ok(())
}

#[test]
fn total_row_sums_counts_and_averages_rates() -> Result<(), String> {
    let rows = vec![row("a", 10, 5, 40, 20), row("b", 30, 2, 90, 50)];
    let total = total_row(&rows).ok_or_else(|| "Expected totals row".to_owned())?;
    if total.endpoint != TOTAL_ROW_LABEL {
        return Err(format!("Unexpected label {}", total.endpoint));
    }
    if total.count != 40 || total.success != 40 || total.fail != 0 {
        return Err(format!("Unexpected totals counters {:?}", total));
    }
    if total.min_ms != 2 || total.max_ms != 90 {
        return Err(format!("Unexpected extremes {:?}", total));
    }
    // Plain mean across rows, not weighted by count.
    if total.avg_ms != 35 || total.p99_ms != 65 {
        return Err(format!("Unexpected means {:?}", total));
    }
    if total.total_cost_ms != 1_700 {
        return Err(format!("Unexpected total cost {}", total.total_cost_ms));
    }
    if total_row(&[]).is_some() {
        return Err("No endpoints means no totals row".to_owned());
    }
    Ok(())
}

#[test]
fn trend_summarizes_trailing_window() -> Result<(), String> {
    let metrics = Arc::new(EndpointMetrics::new());
    metrics.record_at("a", 500, 100, true);
    metrics.record_at("a", 1_200, 40, true);
    metrics.record_at("b", 1_800, 60, false);
    metrics.record_at("b", 2_000, 20, true);

    let mut sampler = TrendSampler::new(Arc::clone(&metrics));
    let point = sampler
        .sample_at(2_000, 3)
        .ok_or_else(|| "Expected a trend point".to_owned())?;
    if point.second != 2 || point.active_workers != 3 {
        return Err(format!("Unexpected point header {:?}", point));
    }
    if point.qps != 3 || point.avg_response_ms != 40 {
        return Err(format!("Unexpected window stats {:?}", point));
    }
    if point.error_percent_x100 != 3_333 || point.p99_ms != 60 {
        return Err(format!("Unexpected window error/p99 {:?}", point));
    }
    Ok(())
}

#[test]
fn trend_seconds_strictly_increase() -> Result<(), String> {
    let metrics = Arc::new(EndpointMetrics::new());
    let mut sampler = TrendSampler::new(metrics);
    if sampler.sample_at(1_000, 0).is_none() {
        return Err("First sample should be emitted".to_owned());
    }
    if sampler.sample_at(1_900, 0).is_some() {
        return Err("Same second must not be emitted twice".to_owned());
    }
    let point = sampler
        .sample_at(2_050, 0)
        .ok_or_else(|| "Next second should be emitted".to_owned())?;
    if point.qps != 0 || point.avg_response_ms != 0 || point.error_percent_x100 != 0 {
        return Err(format!("Empty window should be zeroed {:?}", point));
    }
    Ok(())
}
