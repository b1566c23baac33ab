//! CSV ingestion and export using Polars

use crate::model::{Column, RawTable, SalesTable, DATE_FORMAT};
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info};

/// Fixed relative path the cleaned table is exported to
pub const DEFAULT_EXPORT_PATH: &str = "output/cleaned_sales_data.csv";

/// Load a delimited file into a raw table
///
/// Every column is read as text so that coercion is left to the cleaning
/// stage. Header names are trimmed and lowercased; when two headers normalize
/// to the same name the first one wins. Columns outside the sales schema
/// (customer_name, email, ...) are kept for duplicate detection.
///
/// # Arguments
/// * `path` - Path to the CSV file
///
/// # Returns
/// * `RawTable` with one text column per distinct header
pub fn load_raw(path: impl AsRef<Path>) -> crate::Result<RawTable> {
    let path = path.as_ref();

    // Schema inference disabled: everything arrives as String
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()?;

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(df.width());
    for header in df.get_column_names() {
        let name = header.trim().to_lowercase();
        if !seen.insert(name.clone()) {
            debug!(column = %header, "ignoring repeated column");
            continue;
        }
        columns.push(col(header.as_str()).alias(name.as_str()));
    }

    let raw = RawTable::from_frame(df.lazy().select(columns).collect()?)?;

    info!(
        path = %path.display(),
        rows = raw.len(),
        columns = raw.frame().width(),
        sales_columns = Column::ALL.iter().filter(|c| raw.has_column(**c)).count(),
        "loaded raw sales data"
    );

    Ok(raw)
}

/// Write a cleaned table as CSV with a header row
///
/// Dates are written as `YYYY-MM-DD`. Parent directories are created when
/// missing.
pub fn export_clean(table: &SalesTable, path: impl AsRef<Path>) -> crate::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut df = table.frame().clone();
    let file = File::create(path)?;
    CsvWriter::new(file)
        .include_header(true)
        .with_date_format(Some(DATE_FORMAT.into()))
        .finish(&mut df)?;

    info!(path = %path.display(), rows = table.len(), "exported cleaned table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::clean;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "order_id,customer_id,customer_name,product_name,product_category,quantity,unit_price,order_amount,order_date,status").unwrap();
        writeln!(file, "1001,C1,Ada,Desk Lamp,Home,2,12.50,25.00,2024-01-05,shipped").unwrap();
        writeln!(file, "1002,C2,Linus,USB Cable,Electronics,3,4.00,,2024-01-07,").unwrap();
        writeln!(file, "1003,C1,Ada,Notebook,Office,abc,2.00,,not-a-date,pending").unwrap();
        file
    }

    fn cell(raw: &RawTable, column: &str, row: usize) -> Option<String> {
        raw.frame()
            .column(column)
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .nth(row)
            .flatten()
            .map(str::to_string)
    }

    #[test]
    fn test_load_raw_reads_text_cells() {
        let test_file = create_test_csv();
        let raw = load_raw(test_file.path()).unwrap();

        assert_eq!(raw.len(), 3);
        assert_eq!(raw.frame().width(), 10);
        assert!(raw.has_column(Column::OrderAmount));

        assert_eq!(cell(&raw, "unit_price", 1).as_deref(), Some("4.00"));
        assert_eq!(cell(&raw, "order_amount", 1), None);
        assert_eq!(cell(&raw, "status", 1), None);
        assert_eq!(cell(&raw, "quantity", 2).as_deref(), Some("abc"));
        assert_eq!(cell(&raw, "customer_name", 0).as_deref(), Some("Ada"));
    }

    #[test]
    fn test_load_raw_normalizes_headers() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, " Order_ID ,ORDER_DATE,order_amount,order_id").unwrap();
        writeln!(file, "7,2024-01-01,3.5,8").unwrap();

        let raw = load_raw(file.path()).unwrap();
        assert_eq!(raw.frame().width(), 3);
        assert!(raw.has_column(Column::OrderDate));
        assert_eq!(cell(&raw, "order_id", 0).as_deref(), Some("7"));
    }

    #[test]
    fn test_load_raw_missing_file() {
        assert!(load_raw("does/not/exist.csv").is_err());
    }

    #[test]
    fn test_export_clean_writes_header_and_rows() {
        let test_file = create_test_csv();
        let table = clean(&load_raw(test_file.path()).unwrap()).unwrap();

        let dir = tempdir().unwrap();
        let out = dir.path().join("nested").join("cleaned.csv");
        export_clean(&table, &out).unwrap();

        let contents = fs::read_to_string(&out).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("order_id,customer_id,product_name,product_category,quantity,unit_price,order_amount,order_date,status,customer_name")
        );
        assert_eq!(lines.count(), table.len());
        assert!(contents.contains(",2024-01-05,shipped,Ada"));

        let reloaded = clean(&load_raw(&out).unwrap()).unwrap();
        assert_eq!(reloaded, table);
    }
}
