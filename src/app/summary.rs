use crate::engine::RunSummary;
use crate::metrics::{ReportRow, format_x100};

const HEADERS: [&str; 10] = [
    "Endpoint", "Count", "Success", "Fail", "QPS", "Avg(ms)", "Min(ms)", "Max(ms)", "P99(ms)",
    "Success%",
];

/// Report table as aligned text lines, header first and totals last.
pub(crate) fn report_lines(summary: &RunSummary) -> Vec<String> {
    let cells: Vec<[String; 10]> = summary.report.all_rows().map(row_cells).collect();

    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    let mut lines = Vec::with_capacity(cells.len().saturating_add(1));
    lines.push(join_cells(HEADERS.iter().copied(), &widths));
    for row in &cells {
        lines.push(join_cells(row.iter().map(String::as_str), &widths));
    }
    lines
}

pub(crate) fn print_summary(summary: &RunSummary, retained_failures: usize) {
    for line in report_lines(summary) {
        println!("{}", line);
    }
    if summary.stopped_early {
        println!("Run stopped before its profile completed.");
    }
    if retained_failures > 0 {
        println!("Failed iterations retained: {}", retained_failures);
    }
}

fn row_cells(row: &ReportRow) -> [String; 10] {
    [
        row.endpoint.clone(),
        row.count.to_string(),
        row.success.to_string(),
        row.fail.to_string(),
        format_x100(row.qps_x100),
        row.avg_ms.to_string(),
        row.min_ms.to_string(),
        row.max_ms.to_string(),
        row.p99_ms.to_string(),
        format_x100(row.success_rate_x100),
    ]
}

fn join_cells<'cell>(cells: impl Iterator<Item = &'cell str>, widths: &[usize; 10]) -> String {
    cells
        .zip(widths.iter())
        .enumerate()
        .map(|(idx, (cell, width))| {
            if idx == 0 {
                format!("{:<width$}", cell, width = *width)
            } else {
                format!("{:>width$}", cell, width = *width)
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}
