//! Wall-clock comparison of the baseline algorithms against their optimized equivalents

use crate::algorithms::{
    bubble_sort_by, linear_search_numeric, native_filter_numeric, native_sort_by,
};
use crate::model::SalesTable;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

/// Timing of one baseline/optimized pair
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkResult {
    pub name: String,
    pub rows: usize,
    pub baseline: Duration,
    pub optimized: Duration,
    /// Whether both implementations produced the same rows
    pub results_match: bool,
}

impl BenchmarkResult {
    /// How many times faster the optimized implementation ran
    pub fn speedup(&self) -> f64 {
        let optimized = self.optimized.as_secs_f64();
        if optimized > 0.0 {
            self.baseline.as_secs_f64() / optimized
        } else {
            f64::INFINITY
        }
    }
}

fn timed<T>(f: impl FnOnce() -> crate::Result<T>) -> crate::Result<(T, Duration)> {
    let start = Instant::now();
    let value = f()?;
    Ok((value, start.elapsed()))
}

/// Time bubble sort against the polars stable sort on `column`
pub fn compare_sort(table: &SalesTable, column: &str) -> crate::Result<BenchmarkResult> {
    let (baseline_rows, baseline) = timed(|| bubble_sort_by(table, column))?;
    let (optimized_rows, optimized) = timed(|| native_sort_by(table, column))?;

    let result = BenchmarkResult {
        name: format!("sort by {column}"),
        rows: table.len(),
        baseline,
        optimized,
        results_match: baseline_rows == optimized_rows,
    };
    debug!(name = %result.name, speedup = result.speedup(), "sort comparison finished");
    Ok(result)
}

/// Time the linear scan against a polars filter for `column == target`
pub fn compare_search(
    table: &SalesTable,
    column: &str,
    target: f64,
) -> crate::Result<BenchmarkResult> {
    let (baseline_rows, baseline) = timed(|| linear_search_numeric(table, column, target))?;
    let (optimized_rows, optimized) = timed(|| native_filter_numeric(table, column, target))?;

    let result = BenchmarkResult {
        name: format!("search {column} == {target}"),
        rows: table.len(),
        baseline,
        optimized,
        results_match: optimized_rows.records()? == baseline_rows,
    };
    debug!(name = %result.name, speedup = result.speedup(), "search comparison finished");
    Ok(result)
}
