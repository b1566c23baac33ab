//! Cleaning stage: turns a raw table into the canonical sales table
//!
//! Row-level problems are always recovered here, either by substituting a
//! default or by dropping the row. Only a missing schema is fatal.

use crate::error::AnalysisError;
use crate::model::{Column, RawTable, SalesTable};
use polars::prelude::*;
use tracing::{debug, info};

/// Status assigned to rows that carry none
pub const UNKNOWN_STATUS: &str = "unknown";

/// Accepted order date layouts, tried in order; timestamps keep their date part
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Clean a raw table
///
/// Steps, in order:
/// 1. drop exact duplicate rows, comparing every source column
/// 2. coerce quantity and unit_price, 0 on failure
/// 3. coerce order_amount, quantity * unit_price on failure
/// 4. parse order_date, null on failure
/// 5. keep rows with a date and a positive amount
/// 6. drop rows that only became identical through coercion
///
/// Columns outside the sales schema are carried through as trimmed text.
///
/// # Errors
/// * `AnalysisError::Schema` if there is no date column, or no amount column
///   and no way to derive one
pub fn clean(raw: &RawTable) -> crate::Result<SalesTable> {
    check_schema(raw)?;

    let unique = raw
        .frame()
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    debug!(
        before = raw.len(),
        after = unique.height(),
        "removed duplicate raw rows"
    );

    let quantity = Column::Quantity.expr();
    let unit_price = Column::UnitPrice.expr();

    let coerced = unique
        .lazy()
        .select(text_columns(raw))
        .with_columns([
            coerce_non_negative(quantity.clone()).alias(Column::Quantity.name()),
            coerce_non_negative(unit_price.clone()).alias(Column::UnitPrice.name()),
        ])
        .with_columns([
            coerce_amount(Column::OrderAmount.expr(), quantity, unit_price)
                .alias(Column::OrderAmount.name()),
            parse_date(Column::OrderDate.expr()).alias(Column::OrderDate.name()),
            fill_status(Column::Status.expr()).alias(Column::Status.name()),
        ])
        .filter(
            Column::OrderDate
                .expr()
                .is_not_null()
                .and(Column::OrderAmount.expr().gt(lit(0.0))),
        )
        .collect()?;
    debug!(kept = coerced.height(), "coerced rows with a date and positive amount");

    let frame = coerced
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    let table = SalesTable::from_frame(frame)?;

    info!(
        raw_rows = raw.len(),
        clean_rows = table.len(),
        dropped = raw.len().saturating_sub(table.len()),
        "cleaned sales data"
    );

    Ok(table)
}

/// Fail when the columns needed for amount and date are entirely absent
pub fn check_schema(raw: &RawTable) -> crate::Result<()> {
    let mut missing = Vec::new();

    if !raw.has_column(Column::OrderAmount) {
        let derivable = raw.has_column(Column::Quantity) && raw.has_column(Column::UnitPrice);
        if !derivable {
            missing.push(Column::OrderAmount.name().to_string());
        }
    }
    if !raw.has_column(Column::OrderDate) {
        missing.push(Column::OrderDate.name().to_string());
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AnalysisError::Schema { missing })
    }
}

/// Trimmed text for every sales column, null where the source lacks it,
/// followed by the source's extra columns
fn text_columns(raw: &RawTable) -> Vec<Expr> {
    let canonical = Column::ALL.into_iter().map(|column| {
        let text = if raw.has_column(column) {
            column.expr().str().strip_chars(lit(NULL))
        } else {
            lit(NULL).cast(DataType::String)
        };
        let text = match column {
            Column::OrderId
            | Column::CustomerId
            | Column::ProductName
            | Column::ProductCategory => text.fill_null(lit("")),
            _ => text,
        };
        text.alias(column.name())
    });

    let extra = raw
        .frame()
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str().parse::<Column>().is_err())
        .map(|name| {
            let text = col(name.as_str()).str().strip_chars(lit(NULL));
            when(text.clone().eq(lit("")))
                .then(lit(NULL).cast(DataType::String))
                .otherwise(text)
                .alias(name.as_str())
        })
        .collect::<Vec<_>>();

    canonical.chain(extra).collect()
}

/// True for numbers other than NaN and the infinities; null stays null
fn finite(number: Expr) -> Expr {
    number
        .clone()
        .gt(lit(f64::NEG_INFINITY))
        .and(number.lt(lit(f64::INFINITY)))
}

/// Quantity / unit price coercion: anything but a finite, non-negative number is 0
pub fn coerce_non_negative(cell: Expr) -> Expr {
    let number = cell.cast(DataType::Float64);
    when(finite(number.clone()).and(number.clone().gt_eq(lit(0.0))))
        .then(number)
        .otherwise(lit(0.0))
}

/// Order amount coercion, derived from quantity and unit price when unusable
///
/// A negative amount is kept so that the positive-amount filter removes it.
pub fn coerce_amount(cell: Expr, quantity: Expr, unit_price: Expr) -> Expr {
    let number = cell.cast(DataType::Float64);
    when(finite(number.clone()))
        .then(number)
        .otherwise(quantity * unit_price)
}

/// Parse calendar dates from text, trying each accepted layout in turn
pub fn parse_date(cell: Expr) -> Expr {
    DATE_FORMATS
        .into_iter()
        .map(|format| {
            cell.clone().str().to_date(StrptimeOptions {
                format: Some(format.into()),
                strict: false,
                exact: true,
                cache: true,
            })
        })
        .reduce(|parsed, next| parsed.fill_null(next))
        .unwrap_or_else(|| lit(NULL).cast(DataType::Date))
}

fn fill_status(cell: Expr) -> Expr {
    when(cell.clone().is_null().or(cell.clone().eq(lit(""))))
        .then(lit(UNKNOWN_STATUS))
        .otherwise(cell)
}
