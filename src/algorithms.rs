//! Baseline algorithms and their optimized counterparts
//!
//! `bubble_sort_by` and `linear_search_numeric` are deliberately naive
//! (O(n²) and O(n)) row loops so they can be timed against the polars sort and
//! filter that share the same contract.

use crate::error::AnalysisError;
use crate::model::{Column, SalesRecord, SalesTable};
use polars::prelude::*;
use std::cmp::Ordering;

fn resolve_column(column: &str) -> crate::Result<Column> {
    column.parse()
}

fn resolve_numeric_column(column: &str) -> crate::Result<Column> {
    let resolved = resolve_column(column)?;
    if resolved.is_numeric() {
        Ok(resolved)
    } else {
        Err(AnalysisError::Type {
            column: column.to_string(),
            expected: "numeric",
        })
    }
}

fn compare_by(column: Column, a: &SalesRecord, b: &SalesRecord) -> Ordering {
    a.value(column)
        .partial_cmp(&b.value(column))
        .unwrap_or(Ordering::Equal)
}

/// Stable ascending sort by one column using adjacent swaps
///
/// Works on a copy; the input table is left untouched.
///
/// # Errors
/// * `AnalysisError::Lookup` if `column` is not a sales column
pub fn bubble_sort_by(table: &SalesTable, column: &str) -> crate::Result<SalesTable> {
    let column = resolve_column(column)?;
    let mut rows: Vec<(IdxSize, SalesRecord)> = (0..).zip(table.records()?).collect();
    let n = rows.len();

    for i in 0..n {
        for j in 0..n.saturating_sub(i + 1) {
            // Strictly greater only, so equal rows keep their order
            if compare_by(column, &rows[j].1, &rows[j + 1].1) == Ordering::Greater {
                rows.swap(j, j + 1);
            }
        }
    }

    let order: Vec<IdxSize> = rows.into_iter().map(|(index, _)| index).collect();
    table.take(&order)
}

/// All rows whose numeric `column` equals `target`, in table order
///
/// # Errors
/// * `AnalysisError::Lookup` if `column` is not a sales column
/// * `AnalysisError::Type` if `column` is not numeric
pub fn linear_search_numeric(
    table: &SalesTable,
    column: &str,
    target: f64,
) -> crate::Result<Vec<SalesRecord>> {
    let column = resolve_numeric_column(column)?;
    let mut matches = Vec::new();

    for record in table.records()? {
        if record.number(column) == Some(target) {
            matches.push(record);
        }
    }

    Ok(matches)
}

/// Same contract as [`bubble_sort_by`], using the polars stable sort
pub fn native_sort_by(table: &SalesTable, column: &str) -> crate::Result<SalesTable> {
    let column = resolve_column(column)?;
    let frame = table
        .lazy()
        .sort(
            [column.name()],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;
    SalesTable::from_frame(frame)
}

/// Same contract as [`linear_search_numeric`], as a polars filter
///
/// Returns the matching rows as a table, in table order.
pub fn native_filter_numeric(
    table: &SalesTable,
    column: &str,
    target: f64,
) -> crate::Result<SalesTable> {
    let column = resolve_numeric_column(column)?;
    let frame = table
        .lazy()
        .filter(column.expr().eq(lit(target)))
        .collect()?;
    SalesTable::from_frame(frame)
}
