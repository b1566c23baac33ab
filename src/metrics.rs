//! Metrics stage: pure aggregations over the cleaned sales table
//!
//! Every metric is a polars query over the table's frame. Groupings keep the
//! order in which keys are first seen, and every sort maintains order, so ties
//! always resolve to first-seen order.

use crate::model::{
    integer_values, number_values, optional_numbers, text_values, Column, SalesRecord, SalesTable,
};
use polars::prelude::*;
use serde::{Serialize, Serializer};
use std::fmt;

/// Number of customers reported by [`top_customers_by_ltv`]
pub const TOP_CUSTOMER_LIMIT: usize = 10;

/// Tukey fence multiplier
const IQR_MULTIPLIER: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRevenue {
    pub category: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerValue {
    pub customer_id: String,
    pub lifetime_value: f64,
}

/// Calendar month within a specific year
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Revenue and distinct order count for one period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSales<P> {
    pub period: P,
    pub revenue: f64,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryOrderSize {
    pub category: String,
    pub avg_quantity: f64,
    pub avg_order_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusShare {
    pub status: String,
    /// Share of all rows, 0-100
    pub percentage: f64,
}

/// Quartiles of order_amount and the resulting outlier bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TukeyFences {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierKind {
    Small,
    Large,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderOutlier {
    #[serde(flatten)]
    pub record: SalesRecord,
    pub kind: OutlierKind,
}

/// Spending tier derived from lifetime value quartiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendingTier {
    Low,
    Mid,
    High,
    Vip,
}

impl fmt::Display for SpendingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
            Self::Vip => "vip",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSegment {
    pub customer_id: String,
    pub lifetime_value: f64,
    pub tier: SpendingTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyGrowth {
    pub period: YearMonth,
    pub revenue: f64,
    pub orders: usize,
    /// Revenue difference to the previous month, `None` for the first month
    pub revenue_change: Option<f64>,
    /// Percentage change to the previous month, `None` for the first month
    pub growth_pct: Option<f64>,
}

/// Scalar metrics bundled for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSummary {
    pub rows: usize,
    pub total_revenue: f64,
    pub average_order_value: Option<f64>,
    pub customer_count: usize,
    pub repeat_customer_rate: f64,
    pub most_profitable_category: Option<CategoryRevenue>,
}

const REVENUE: &str = "revenue";
const LIFETIME_VALUE: &str = "lifetime_value";
const ORDERS: &str = "orders";
const YEAR: &str = "year";
const MONTH: &str = "month";

fn descending() -> SortMultipleOptions {
    SortMultipleOptions::default()
        .with_order_descending(true)
        .with_maintain_order(true)
}

fn to_usize(n: i64) -> usize {
    usize::try_from(n).unwrap_or_default()
}

fn order_amount_column(table: &SalesTable) -> crate::Result<Float64Chunked> {
    Ok(table
        .frame()
        .column(Column::OrderAmount.name())?
        .as_materialized_series()
        .f64()?
        .clone())
}

/// Quantile interpolating linearly between closest ranks; `None` without values
fn quantile(values: &Float64Chunked, p: f64) -> crate::Result<Option<f64>> {
    Ok(values.quantile(p, QuantileMethod::Linear)?)
}

/// Sum of order_amount per key, keys in first-seen order
fn revenue_by(table: &SalesTable, key: Column, alias: &str) -> LazyFrame {
    table
        .lazy()
        .group_by_stable([key.expr()])
        .agg([Column::OrderAmount.expr().sum().alias(alias)])
}

fn category_revenues(frame: &DataFrame) -> crate::Result<Vec<CategoryRevenue>> {
    let categories = text_values(frame, Column::ProductCategory.name())?;
    let revenue = number_values(frame, REVENUE)?;
    Ok(categories
        .into_iter()
        .zip(revenue)
        .map(|(category, revenue)| CategoryRevenue { category, revenue })
        .collect())
}

fn customer_values(frame: &DataFrame) -> crate::Result<Vec<CustomerValue>> {
    let customers = text_values(frame, Column::CustomerId.name())?;
    let values = number_values(frame, LIFETIME_VALUE)?;
    Ok(customers
        .into_iter()
        .zip(values)
        .map(|(customer_id, lifetime_value)| CustomerValue {
            customer_id,
            lifetime_value,
        })
        .collect())
}

/// Revenue and distinct orders per period, ascending by the period columns
fn period_sales(table: &SalesTable, keys: &[&str]) -> crate::Result<DataFrame> {
    let date = Column::OrderDate.expr();
    Ok(table
        .lazy()
        .with_columns([
            date.clone().dt().year().cast(DataType::Int32).alias(YEAR),
            date.dt().month().cast(DataType::UInt32).alias(MONTH),
        ])
        .group_by(keys.iter().map(|key| col(*key)).collect::<Vec<_>>())
        .agg([
            Column::OrderAmount.expr().sum().alias(REVENUE),
            Column::OrderId.expr().n_unique().alias(ORDERS),
        ])
        .sort(keys.to_vec(), SortMultipleOptions::default())
        .collect()?)
}

fn read_period_sales<P>(frame: &DataFrame, periods: Vec<P>) -> crate::Result<Vec<PeriodSales<P>>> {
    let revenue = number_values(frame, REVENUE)?;
    let orders = integer_values(frame, ORDERS)?;
    Ok(periods
        .into_iter()
        .zip(revenue)
        .zip(orders)
        .map(|((period, revenue), orders)| PeriodSales {
            period,
            revenue,
            orders: to_usize(orders),
        })
        .collect())
}

fn year_months(frame: &DataFrame) -> crate::Result<Vec<YearMonth>> {
    let years = integer_values(frame, YEAR)?;
    let months = integer_values(frame, MONTH)?;
    Ok(years
        .into_iter()
        .zip(months)
        .map(|(year, month)| YearMonth {
            year: i32::try_from(year).unwrap_or_default(),
            month: u32::try_from(month).unwrap_or_default(),
        })
        .collect())
}

/// Sum of order_amount, 0.0 for an empty table
pub fn total_revenue(table: &SalesTable) -> crate::Result<f64> {
    Ok(order_amount_column(table)?.sum().unwrap_or(0.0))
}

/// Mean order_amount; `None` when the table is empty
pub fn average_order_value(table: &SalesTable) -> crate::Result<Option<f64>> {
    Ok(order_amount_column(table)?.mean())
}

pub fn customer_count(table: &SalesTable) -> crate::Result<usize> {
    Ok(table
        .frame()
        .column(Column::CustomerId.name())?
        .as_materialized_series()
        .n_unique()?)
}

/// Revenue per category in first-seen order
pub fn category_revenue(table: &SalesTable) -> crate::Result<Vec<CategoryRevenue>> {
    let frame = revenue_by(table, Column::ProductCategory, REVENUE).collect()?;
    category_revenues(&frame)
}

/// Highest-revenue category; the first one seen wins a tie
pub fn most_profitable_category(table: &SalesTable) -> crate::Result<Option<CategoryRevenue>> {
    let frame = revenue_by(table, Column::ProductCategory, REVENUE)
        .sort([REVENUE], descending())
        .limit(1)
        .collect()?;
    Ok(category_revenues(&frame)?.into_iter().next())
}

/// Lifetime value of every customer in first-seen order
pub fn customer_lifetime_values(table: &SalesTable) -> crate::Result<Vec<CustomerValue>> {
    let frame = revenue_by(table, Column::CustomerId, LIFETIME_VALUE).collect()?;
    customer_values(&frame)
}

/// The `limit` customers with the highest lifetime value, descending
pub fn top_customers(table: &SalesTable, limit: usize) -> crate::Result<Vec<CustomerValue>> {
    let frame = revenue_by(table, Column::CustomerId, LIFETIME_VALUE)
        .sort([LIFETIME_VALUE], descending())
        .limit(IdxSize::try_from(limit).unwrap_or(IdxSize::MAX))
        .collect()?;
    customer_values(&frame)
}

pub fn top_customers_by_ltv(table: &SalesTable) -> crate::Result<Vec<CustomerValue>> {
    top_customers(table, TOP_CUSTOMER_LIMIT)
}

/// Fraction of customers with more than one distinct order
pub fn repeat_customer_rate(table: &SalesTable) -> crate::Result<f64> {
    let frame = table
        .lazy()
        .group_by([Column::CustomerId.expr()])
        .agg([Column::OrderId.expr().n_unique().alias(ORDERS)])
        .select([col(ORDERS)
            .gt(lit(1))
            .cast(DataType::Float64)
            .mean()
            .alias("rate")])
        .collect()?;
    Ok(number_values(&frame, "rate")?.into_iter().next().unwrap_or(0.0))
}

/// Revenue and orders per year-month, ascending
pub fn monthly_sales_trends(table: &SalesTable) -> crate::Result<Vec<PeriodSales<YearMonth>>> {
    monthly_from(&period_sales(table, &[YEAR, MONTH])?)
}

/// Revenue and orders per calendar month (1-12) across all years, ascending
pub fn seasonal_sales_trends(table: &SalesTable) -> crate::Result<Vec<PeriodSales<u32>>> {
    let frame = period_sales(table, &[MONTH])?;
    let months = integer_values(&frame, MONTH)?
        .into_iter()
        .map(|month| u32::try_from(month).unwrap_or_default())
        .collect();
    read_period_sales(&frame, months)
}

/// Average quantity and order amount per category, descending by amount
pub fn average_order_size_by_category(table: &SalesTable) -> crate::Result<Vec<CategoryOrderSize>> {
    let frame = table
        .lazy()
        .group_by_stable([Column::ProductCategory.expr()])
        .agg([
            Column::Quantity.expr().mean().alias("avg_quantity"),
            Column::OrderAmount.expr().mean().alias("avg_order_amount"),
        ])
        .sort(["avg_order_amount"], descending())
        .collect()?;

    let categories = text_values(&frame, Column::ProductCategory.name())?;
    let quantities = number_values(&frame, "avg_quantity")?;
    let amounts = number_values(&frame, "avg_order_amount")?;
    Ok(categories
        .into_iter()
        .zip(quantities)
        .zip(amounts)
        .map(|((category, avg_quantity), avg_order_amount)| CategoryOrderSize {
            category,
            avg_quantity,
            avg_order_amount,
        })
        .collect())
}

/// Share of rows per status, descending
pub fn status_percentages(table: &SalesTable) -> crate::Result<Vec<StatusShare>> {
    let total = table.len() as f64;
    let frame = table
        .lazy()
        .group_by_stable([Column::Status.expr()])
        .agg([len().alias("rows")])
        .with_column((col("rows").cast(DataType::Float64) / lit(total) * lit(100.0)).alias("percentage"))
        .sort(["percentage"], descending())
        .collect()?;

    let statuses = text_values(&frame, Column::Status.name())?;
    let percentages = number_values(&frame, "percentage")?;
    Ok(statuses
        .into_iter()
        .zip(percentages)
        .map(|(status, percentage)| StatusShare { status, percentage })
        .collect())
}

/// Tukey fences over order_amount; `None` for an empty table
pub fn tukey_fences(table: &SalesTable) -> crate::Result<Option<TukeyFences>> {
    let amounts = order_amount_column(table)?;
    let (Some(q1), Some(q3)) = (quantile(&amounts, 0.25)?, quantile(&amounts, 0.75)?) else {
        return Ok(None);
    };
    let iqr = q3 - q1;

    Ok(Some(TukeyFences {
        q1,
        q3,
        iqr,
        lower: q1 - IQR_MULTIPLIER * iqr,
        upper: q3 + IQR_MULTIPLIER * iqr,
    }))
}

/// Rows outside the Tukey fences, ascending by order_amount
pub fn order_outliers(table: &SalesTable) -> crate::Result<Vec<OrderOutlier>> {
    let Some(fences) = tukey_fences(table)? else {
        return Ok(Vec::new());
    };

    let amount = Column::OrderAmount.expr();
    let frame = table
        .lazy()
        .filter(
            amount
                .clone()
                .lt(lit(fences.lower))
                .or(amount.gt(lit(fences.upper))),
        )
        .sort(
            [Column::OrderAmount.name()],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;

    Ok(SalesTable::from_frame(frame)?
        .records()?
        .into_iter()
        .map(|record| OrderOutlier {
            kind: if record.order_amount < fences.lower {
                OutlierKind::Small
            } else {
                OutlierKind::Large
            },
            record,
        })
        .collect())
}

/// Tier for a value given the 25th/50th/75th percentile edges
///
/// Bins include their lower edge and exclude their upper edge.
fn spending_tier(value: f64, q25: f64, q50: f64, q75: f64) -> SpendingTier {
    if value < q25 {
        SpendingTier::Low
    } else if value < q50 {
        SpendingTier::Mid
    } else if value < q75 {
        SpendingTier::High
    } else {
        SpendingTier::Vip
    }
}

/// Lifetime value per customer bucketed into quartile tiers, descending by value
pub fn customer_segmentation_by_spending(table: &SalesTable) -> crate::Result<Vec<CustomerSegment>> {
    let customers = revenue_by(table, Column::CustomerId, LIFETIME_VALUE).collect()?;
    let values = customers
        .column(LIFETIME_VALUE)?
        .as_materialized_series()
        .f64()?
        .clone();
    let (Some(q25), Some(q50), Some(q75)) = (
        quantile(&values, 0.25)?,
        quantile(&values, 0.50)?,
        quantile(&values, 0.75)?,
    ) else {
        return Ok(Vec::new());
    };

    let ranked = customers.lazy().sort([LIFETIME_VALUE], descending()).collect()?;
    Ok(customer_values(&ranked)?
        .into_iter()
        .map(|c| CustomerSegment {
            tier: spending_tier(c.lifetime_value, q25, q50, q75),
            customer_id: c.customer_id,
            lifetime_value: c.lifetime_value,
        })
        .collect())
}

/// Monthly trend with change against the previous month
pub fn revenue_monthly_growth(table: &SalesTable) -> crate::Result<Vec<MonthlyGrowth>> {
    let frame = period_sales(table, &[YEAR, MONTH])?
        .lazy()
        .with_column(col(REVENUE).shift(lit(1)).alias("previous"))
        .with_column((col(REVENUE) - col("previous")).alias("revenue_change"))
        .with_column(
            when(col("previous").neq(lit(0.0)))
                .then(col("revenue_change") / col("previous") * lit(100.0))
                .otherwise(lit(NULL).cast(DataType::Float64))
                .alias("growth_pct"),
        )
        .collect()?;

    let changes = optional_numbers(&frame, "revenue_change")?;
    let growth = optional_numbers(&frame, "growth_pct")?;
    Ok(monthly_from(&frame)?
        .into_iter()
        .zip(changes)
        .zip(growth)
        .map(|((month, revenue_change), growth_pct)| MonthlyGrowth {
            period: month.period,
            revenue: month.revenue,
            orders: month.orders,
            revenue_change,
            growth_pct,
        })
        .collect())
}

fn monthly_from(frame: &DataFrame) -> crate::Result<Vec<PeriodSales<YearMonth>>> {
    read_period_sales(frame, year_months(frame)?)
}

/// order_amount of every row, in table order
pub fn order_amounts(table: &SalesTable) -> crate::Result<Vec<f64>> {
    number_values(table.frame(), Column::OrderAmount.name())
}

pub fn summarize(table: &SalesTable) -> crate::Result<SalesSummary> {
    Ok(SalesSummary {
        rows: table.len(),
        total_revenue: total_revenue(table)?,
        average_order_value: average_order_value(table)?,
        customer_count: customer_count(table)?,
        repeat_customer_rate: repeat_customer_rate(table)?,
        most_profitable_category: most_profitable_category(table)?,
    })
}
