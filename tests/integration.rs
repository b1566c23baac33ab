//! Integration tests for SalesForge

use pretty_assertions::assert_eq;
use salesforge::metrics::{self, OutlierKind, SpendingTier};
use salesforge::{
    bubble_sort_by, clean, export_clean, linear_search_numeric, load_raw, native_filter_numeric,
    AnalysisError,
};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

/// Create a test CSV file with sample data
fn create_test_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "order_id,customer_id,customer_name,email,product_name,product_category,quantity,unit_price,order_amount,order_date,status"
    )
    .unwrap();

    // Customer C100 - two orders
    writeln!(file, "5001,C100,Ada,ada@example.com,Desk Lamp,Home,2,20.00,40.00,2024-01-04,shipped").unwrap();
    writeln!(file, "5002,C100,Ada,ada@example.com,Headphones,Electronics,1,80.00,80.00,2024-02-11,shipped").unwrap();

    // Exact duplicate of the first row
    writeln!(file, "5001,C100,Ada,ada@example.com,Desk Lamp,Home,2,20.00,40.00,2024-01-04,shipped").unwrap();

    // Customer C200 - amount derived from quantity * unit price, no status
    writeln!(file, "5003,C200,Grace,grace@example.com,Notebook,Office,4,2.50,,2024-02-20,").unwrap();

    // Customer C300 - one large order
    writeln!(file, "5004,C300,Linus,linus@example.com,Laptop,Electronics,1,2400.00,2400.00,2024-03-02,pending").unwrap();

    // Customer C400 - regular order
    writeln!(file, "5005,C400,Barbara,barbara@example.com,Chair,Home,1,60.00,60.00,2024-03-18,cancelled").unwrap();

    // Dropped: unparseable date, zero amount
    writeln!(file, "5006,C500,Ken,ken@example.com,Pen,Office,1,1.00,1.00,not-a-date,shipped").unwrap();
    writeln!(file, "5007,C600,Dennis,dennis@example.com,Mug,Home,abc,5.00,,2024-03-20,shipped").unwrap();

    file
}

#[test]
fn test_end_to_end_pipeline() {
    let test_file = create_test_csv();

    let raw = load_raw(test_file.path()).unwrap();
    assert_eq!(raw.len(), 8);

    let table = clean(&raw).unwrap();
    assert_eq!(table.len(), 5);
    // nine sales columns plus customer_name and email
    assert_eq!(table.frame().width(), 11);

    let records = table.records().unwrap();
    assert!(records.iter().all(|r| r.order_amount > 0.0));

    assert_eq!(metrics::total_revenue(&table).unwrap(), 2590.0);
    assert_eq!(metrics::average_order_value(&table).unwrap(), Some(518.0));
    assert_eq!(metrics::customer_count(&table).unwrap(), 4);
    assert_eq!(metrics::repeat_customer_rate(&table).unwrap(), 0.25);

    let best = metrics::most_profitable_category(&table).unwrap().unwrap();
    assert_eq!(best.category, "Electronics");
    assert_eq!(best.revenue, 2480.0);

    let top = metrics::top_customers_by_ltv(&table).unwrap();
    assert_eq!(top[0].customer_id, "C300");
    assert_eq!(top[1].customer_id, "C100");
    assert_eq!(top[1].lifetime_value, 120.0);

    let derived = records.iter().find(|r| r.order_id == "5003").unwrap();
    assert_eq!(derived.order_amount, 10.0);
    assert_eq!(derived.status, "unknown");
}

#[test]
fn test_trends_and_segments() {
    let test_file = create_test_csv();
    let table = clean(&load_raw(test_file.path()).unwrap()).unwrap();

    let monthly = metrics::monthly_sales_trends(&table).unwrap();
    let periods: Vec<String> = monthly.iter().map(|m| m.period.to_string()).collect();
    assert_eq!(periods, vec!["2024-01", "2024-02", "2024-03"]);
    assert_eq!(monthly[1].revenue, 90.0);
    assert_eq!(monthly[1].orders, 2);

    let growth = metrics::revenue_monthly_growth(&table).unwrap();
    assert_eq!(growth[0].growth_pct, None);
    assert_eq!(growth[1].growth_pct, Some(125.0));

    let outliers = metrics::order_outliers(&table).unwrap();
    assert_eq!(outliers.len(), 1);
    assert_eq!(outliers[0].record.order_id, "5004");
    assert_eq!(outliers[0].kind, OutlierKind::Large);

    let segments = metrics::customer_segmentation_by_spending(&table).unwrap();
    assert_eq!(segments[0].customer_id, "C300");
    assert_eq!(segments[0].tier, SpendingTier::Vip);
    assert_eq!(segments.last().unwrap().tier, SpendingTier::Low);

    let statuses = metrics::status_percentages(&table).unwrap();
    assert_eq!(statuses[0].status, "shipped");
    assert_eq!(statuses[0].percentage, 40.0);
}

#[test]
fn test_baseline_algorithms_on_loaded_data() {
    let test_file = create_test_csv();
    let table = clean(&load_raw(test_file.path()).unwrap()).unwrap();

    let sorted = bubble_sort_by(&table, "unit_price").unwrap();
    let prices: Vec<f64> = sorted
        .records()
        .unwrap()
        .iter()
        .map(|r| r.unit_price)
        .collect();
    assert_eq!(prices, vec![2.5, 20.0, 60.0, 80.0, 2400.0]);

    let singles = linear_search_numeric(&table, "quantity", 1.0).unwrap();
    let ids: Vec<&str> = singles.iter().map(|r| r.order_id.as_str()).collect();
    assert_eq!(ids, vec!["5002", "5004", "5005"]);

    let filtered = native_filter_numeric(&table, "quantity", 1.0).unwrap();
    assert_eq!(filtered.records().unwrap(), singles);

    assert!(matches!(
        linear_search_numeric(&table, "product_name", 1.0),
        Err(AnalysisError::Type { .. })
    ));
}

#[test]
fn test_export_and_reload() {
    let test_file = create_test_csv();
    let table = clean(&load_raw(test_file.path()).unwrap()).unwrap();

    let dir = tempdir().unwrap();
    let out = dir.path().join("cleaned_sales_data.csv");
    export_clean(&table, &out).unwrap();

    let reloaded = clean(&load_raw(&out).unwrap()).unwrap();
    assert_eq!(reloaded, table);
}

#[test]
fn test_error_handling_missing_columns() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "order_id,customer_id,product_name").unwrap();
    writeln!(file, "1,C1,Mug").unwrap();

    let raw = load_raw(file.path()).unwrap();
    let err = clean(&raw).unwrap_err();
    assert!(matches!(err, AnalysisError::Schema { .. }));
    assert!(err.to_string().contains("order_date"));
}
