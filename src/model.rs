//! Row model: raw and cleaned sales tables plus the Product/Customer/Order records
//!
//! Both tables are thin wrappers over polars frames; [`SalesRecord`] is the
//! materialized form of one cleaned row.

use crate::error::AnalysisError;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Date format used when a cleaned table is written out as CSV
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The canonical columns of a sales table, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    OrderId,
    CustomerId,
    ProductName,
    ProductCategory,
    Quantity,
    UnitPrice,
    OrderAmount,
    OrderDate,
    Status,
}

impl Column {
    pub const ALL: [Self; 9] = [
        Self::OrderId,
        Self::CustomerId,
        Self::ProductName,
        Self::ProductCategory,
        Self::Quantity,
        Self::UnitPrice,
        Self::OrderAmount,
        Self::OrderDate,
        Self::Status,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::OrderId => "order_id",
            Self::CustomerId => "customer_id",
            Self::ProductName => "product_name",
            Self::ProductCategory => "product_category",
            Self::Quantity => "quantity",
            Self::UnitPrice => "unit_price",
            Self::OrderAmount => "order_amount",
            Self::OrderDate => "order_date",
            Self::Status => "status",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Quantity | Self::UnitPrice | Self::OrderAmount)
    }

    /// Canonical polars type of the column in a cleaned table
    pub fn dtype(self) -> DataType {
        match self {
            Self::Quantity | Self::UnitPrice | Self::OrderAmount => DataType::Float64,
            Self::OrderDate => DataType::Date,
            _ => DataType::String,
        }
    }

    pub fn expr(self) -> Expr {
        col(self.name())
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|column| column.name() == s)
            .ok_or_else(|| AnalysisError::lookup(s))
    }
}

/// A single cell of a cleaned row, borrowed from the record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Text(&'a str),
    Number(f64),
    Date(NaiveDate),
}

impl PartialOrd for Value<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.partial_cmp(b),
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::Date(a), Self::Date(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Untyped input table: every column is text, null for empty or missing cells
///
/// Columns outside the sales schema (customer_name, email, ...) are kept so
/// that duplicate detection sees every source field.
#[derive(Debug, Clone)]
pub struct RawTable {
    frame: DataFrame,
}

impl RawTable {
    /// Wrap a frame, casting every column to text
    pub fn from_frame(frame: DataFrame) -> crate::Result<Self> {
        let frame = frame
            .lazy()
            .select([all().cast(DataType::String)])
            .collect()?;
        Ok(Self { frame })
    }

    /// Build a table from text rows; empty cells are stored as null
    pub fn from_rows<const N: usize>(
        headers: [&str; N],
        rows: &[[&str; N]],
    ) -> crate::Result<Self> {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let cells: Vec<Option<&str>> = rows
                    .iter()
                    .map(|row| Some(row[i]).filter(|cell| !cell.is_empty()))
                    .collect();
                Series::new(PlSmallStr::from(*name), cells).into_column()
            })
            .collect();

        Ok(Self {
            frame: DataFrame::new(columns)?,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.frame.get_column_index(column.name()).is_some()
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One cleaned sales transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    pub order_id: String,
    pub customer_id: String,
    pub product_name: String,
    pub product_category: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub order_amount: f64,
    pub order_date: NaiveDate,
    pub status: String,
}

impl SalesRecord {
    pub fn value(&self, column: Column) -> Value<'_> {
        match column {
            Column::OrderId => Value::Text(&self.order_id),
            Column::CustomerId => Value::Text(&self.customer_id),
            Column::ProductName => Value::Text(&self.product_name),
            Column::ProductCategory => Value::Text(&self.product_category),
            Column::Quantity => Value::Number(self.quantity),
            Column::UnitPrice => Value::Number(self.unit_price),
            Column::OrderAmount => Value::Number(self.order_amount),
            Column::OrderDate => Value::Date(self.order_date),
            Column::Status => Value::Text(&self.status),
        }
    }

    /// Numeric cell, `None` for text and date columns
    pub fn number(&self, column: Column) -> Option<f64> {
        match self.value(column) {
            Value::Number(n) => Some(n),
            Value::Text(_) | Value::Date(_) => None,
        }
    }
}

/// Canonical, cleaned table consumed by every metric
///
/// Backed by a polars frame holding the nine sales columns with their
/// canonical types, followed by any text columns carried over from the source.
#[derive(Debug, Clone)]
pub struct SalesTable {
    frame: DataFrame,
}

impl SalesTable {
    /// Select the sales columns with their canonical types, keeping extra columns as text
    pub fn from_frame(frame: DataFrame) -> crate::Result<Self> {
        let extra: Vec<Expr> = frame
            .get_column_names()
            .into_iter()
            .filter(|name| name.as_str().parse::<Column>().is_err())
            .map(|name| col(name.as_str()).cast(DataType::String))
            .collect();

        let columns: Vec<Expr> = Column::ALL
            .into_iter()
            .map(|column| column.expr().cast(column.dtype()))
            .chain(extra)
            .collect();

        Ok(Self {
            frame: frame.lazy().select(columns).collect()?,
        })
    }

    pub fn from_records(records: &[SalesRecord]) -> crate::Result<Self> {
        let frame = df!(
            "order_id" => records.iter().map(|r| r.order_id.as_str()).collect::<Vec<_>>(),
            "customer_id" => records.iter().map(|r| r.customer_id.as_str()).collect::<Vec<_>>(),
            "product_name" => records.iter().map(|r| r.product_name.as_str()).collect::<Vec<_>>(),
            "product_category" => records.iter().map(|r| r.product_category.as_str()).collect::<Vec<_>>(),
            "quantity" => records.iter().map(|r| r.quantity).collect::<Vec<_>>(),
            "unit_price" => records.iter().map(|r| r.unit_price).collect::<Vec<_>>(),
            "order_amount" => records.iter().map(|r| r.order_amount).collect::<Vec<_>>(),
            "order_date" => records.iter().map(|r| days_since_epoch(r.order_date)).collect::<Vec<_>>(),
            "status" => records.iter().map(|r| r.status.as_str()).collect::<Vec<_>>(),
        )?;
        Self::from_frame(frame)
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn lazy(&self) -> LazyFrame {
        self.frame.clone().lazy()
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows reordered or selected by position
    pub fn take(&self, indices: &[IdxSize]) -> crate::Result<Self> {
        let indices = IdxCa::from_vec(PlSmallStr::from("index"), indices.to_vec());
        Ok(Self {
            frame: self.frame.take(&indices)?,
        })
    }

    /// Materialize the sales columns as records, in table order
    pub fn records(&self) -> crate::Result<Vec<SalesRecord>> {
        let frame = &self.frame;
        let mut order_ids = text_values(frame, Column::OrderId.name())?.into_iter();
        let mut customer_ids = text_values(frame, Column::CustomerId.name())?.into_iter();
        let mut product_names = text_values(frame, Column::ProductName.name())?.into_iter();
        let mut categories = text_values(frame, Column::ProductCategory.name())?.into_iter();
        let mut quantities = number_values(frame, Column::Quantity.name())?.into_iter();
        let mut unit_prices = number_values(frame, Column::UnitPrice.name())?.into_iter();
        let mut amounts = number_values(frame, Column::OrderAmount.name())?.into_iter();
        let mut statuses = text_values(frame, Column::Status.name())?.into_iter();

        date_values(frame, Column::OrderDate.name())?
            .into_iter()
            .map(|order_date| -> crate::Result<SalesRecord> {
                Ok(SalesRecord {
                    order_id: order_ids.next().unwrap_or_default(),
                    customer_id: customer_ids.next().unwrap_or_default(),
                    product_name: product_names.next().unwrap_or_default(),
                    product_category: categories.next().unwrap_or_default(),
                    quantity: quantities.next().unwrap_or_default(),
                    unit_price: unit_prices.next().unwrap_or_default(),
                    order_amount: amounts.next().unwrap_or_default(),
                    order_date: order_date.ok_or_else(|| AnalysisError::Type {
                        column: Column::OrderDate.name().to_string(),
                        expected: "a date",
                    })?,
                    status: statuses.next().unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Convert back into text form so the table can be cleaned again
    pub fn to_raw(&self) -> crate::Result<RawTable> {
        RawTable::from_frame(self.frame.clone())
    }
}

impl Default for SalesTable {
    fn default() -> Self {
        let schema: Schema = Column::ALL
            .into_iter()
            .map(|column| (PlSmallStr::from(column.name()), column.dtype()))
            .collect();
        Self {
            frame: DataFrame::empty_with_schema(&schema),
        }
    }
}

impl PartialEq for SalesTable {
    fn eq(&self, other: &Self) -> bool {
        self.frame.equals_missing(&other.frame)
    }
}

/// Days between 0001-01-01 (day 1) and the Unix epoch polars counts dates from
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub(crate) fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

pub(crate) fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(EPOCH_DAYS_FROM_CE)?)
}

/// Text column as owned strings, null read as empty
pub(crate) fn text_values(frame: &DataFrame, name: &str) -> crate::Result<Vec<String>> {
    Ok(frame
        .column(name)?
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|cell| cell.unwrap_or_default().to_string())
        .collect())
}

/// Float column with nulls kept
pub(crate) fn optional_numbers(frame: &DataFrame, name: &str) -> crate::Result<Vec<Option<f64>>> {
    let values = frame
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

/// Float column, null read as 0
pub(crate) fn number_values(frame: &DataFrame, name: &str) -> crate::Result<Vec<f64>> {
    Ok(optional_numbers(frame, name)?
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

/// Integer column (counts, years, months), null read as 0
pub(crate) fn integer_values(frame: &DataFrame, name: &str) -> crate::Result<Vec<i64>> {
    let values = frame
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    Ok(values
        .i64()?
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

pub(crate) fn date_values(frame: &DataFrame, name: &str) -> crate::Result<Vec<Option<NaiveDate>>> {
    let days = frame
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Int32)?;
    Ok(days
        .i32()?
        .into_iter()
        .map(|day| day.and_then(date_from_epoch_days))
        .collect())
}

/// A catalogue product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub base_price: f64,
}

impl Product {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        category: impl Into<String>,
        base_price: f64,
    ) -> crate::Result<Self> {
        ensure_non_negative("base_price", base_price)?;
        Ok(Self {
            id,
            name: name.into(),
            category: category.into(),
            base_price,
        })
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Product(id={}, name={}, price={})",
            self.id, self.name, self.base_price
        )
    }
}

/// A customer together with their accumulated spend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub lifetime_value: f64,
}

impl Customer {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        email: impl Into<String>,
        lifetime_value: f64,
    ) -> crate::Result<Self> {
        ensure_non_negative("lifetime_value", lifetime_value)?;
        Ok(Self {
            id,
            name: name.into(),
            email: email.into(),
            lifetime_value,
        })
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Customer(id={}, name={}, LTV={})",
            self.id, self.name, self.lifetime_value
        )
    }
}

/// An order placed by a customer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: String,
    pub order_date: NaiveDate,
    /// Product names on the order
    pub items: Vec<String>,
    pub customer_id: String,
    pub amount: f64,
    pub status: String,
}

impl Order {
    pub fn new(
        id: impl Into<String>,
        order_date: NaiveDate,
        items: Vec<String>,
        customer_id: impl Into<String>,
        amount: f64,
        status: impl Into<String>,
    ) -> crate::Result<Self> {
        ensure_non_negative("amount", amount)?;
        Ok(Self {
            id: id.into(),
            order_date,
            items,
            customer_id: customer_id.into(),
            amount,
            status: status.into(),
        })
    }

    /// Build a single-item order from a cleaned row
    pub fn from_record(record: &SalesRecord) -> crate::Result<Self> {
        Self::new(
            record.order_id.clone(),
            record.order_date,
            vec![record.product_name.clone()],
            record.customer_id.clone(),
            record.order_amount,
            record.status.clone(),
        )
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order(id={}, amount={}, status={})",
            self.id, self.amount, self.status
        )
    }
}

fn ensure_non_negative(field: &str, value: f64) -> crate::Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::Validation(format!(
            "{field} must be >= 0, got {value}"
        )))
    }
}
