//! Property tests for cleaning and the baseline algorithms

use proptest::prelude::*;
use salesforge::{
    bubble_sort_by, clean, linear_search_numeric, native_sort_by, Column, RawTable, SalesRecord,
};
use std::cmp::Ordering;

fn numeric_cell() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..50).prop_map(|n| n.to_string()),
        (0u32..5000).prop_map(|n| format!("{:.2}", f64::from(n) / 100.0)),
        Just(String::new()),
        Just("n/a".to_string()),
        Just("-4".to_string()),
    ]
}

fn date_cell() -> impl Strategy<Value = String> {
    prop_oneof![
        (2022i32..2025, 1u32..13, 1u32..29).prop_map(|(y, m, d)| format!("{y}-{m:02}-{d:02}")),
        (2022i32..2025, 1u32..13, 1u32..29).prop_map(|(y, m, d)| format!("{m:02}/{d:02}/{y}")),
        Just("unknown date".to_string()),
        Just(String::new()),
    ]
}

fn raw_row() -> impl Strategy<Value = [String; 9]> {
    (
        0u32..20,
        0u32..6,
        prop::sample::select(vec!["Books", "Games", "Home"]),
        numeric_cell(),
        numeric_cell(),
        numeric_cell(),
        date_cell(),
        prop::sample::select(vec!["shipped", "pending", ""]),
    )
        .prop_map(|(order, customer, category, qty, price, amount, date, status)| {
            [
                order.to_string(),
                format!("C{customer}"),
                format!("{category} item"),
                category.to_string(),
                qty,
                price,
                amount,
                date,
                status.to_string(),
            ]
        })
}

fn raw_table() -> impl Strategy<Value = RawTable> {
    prop::collection::vec(raw_row(), 0..40).prop_map(|rows| {
        let cells: Vec<[&str; 9]> = rows
            .iter()
            .map(|row| row.each_ref().map(String::as_str))
            .collect();
        RawTable::from_rows(Column::ALL.map(Column::name), &cells).unwrap()
    })
}

fn canonical_order(rows: &[SalesRecord]) -> Vec<SalesRecord> {
    let mut rows = rows.to_vec();
    rows.sort_by(|a, b| {
        Column::ALL
            .iter()
            .filter_map(|&c| a.value(c).partial_cmp(&b.value(c)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    rows
}

proptest! {
    /// Property: cleaning an already clean table changes nothing
    #[test]
    fn prop_clean_is_idempotent(raw in raw_table()) {
        let once = clean(&raw).unwrap();
        let twice = clean(&once.to_raw().unwrap()).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Property: every cleaned row has a positive amount and non-negative inputs
    #[test]
    fn prop_clean_rows_satisfy_invariants(raw in raw_table()) {
        let table = clean(&raw).unwrap();
        prop_assert!(table.len() <= raw.len());
        for row in table.records().unwrap() {
            prop_assert!(row.order_amount > 0.0);
            prop_assert!(row.quantity >= 0.0);
            prop_assert!(row.unit_price >= 0.0);
            prop_assert!(!row.status.is_empty());
        }
    }

    /// Property: bubble sort output is ordered, a permutation, and matches the native sort
    #[test]
    fn prop_bubble_sort_orders_and_permutes(
        raw in raw_table(),
        column in prop::sample::select(vec!["quantity", "unit_price", "order_amount", "order_date", "customer_id"]),
    ) {
        let table = clean(&raw).unwrap();
        let sorted = bubble_sort_by(&table, column).unwrap();
        let key: Column = column.parse().unwrap();

        let sorted_rows = sorted.records().unwrap();
        let input_rows = table.records().unwrap();

        prop_assert_eq!(sorted_rows.len(), input_rows.len());
        for pair in sorted_rows.windows(2) {
            prop_assert!(pair[0].value(key) <= pair[1].value(key));
        }
        prop_assert_eq!(canonical_order(&sorted_rows), canonical_order(&input_rows));
        prop_assert_eq!(&sorted, &native_sort_by(&table, column).unwrap());
    }

    /// Property: linear search equals a reference equality filter, in order
    #[test]
    fn prop_linear_search_matches_filter(raw in raw_table(), target in 0u32..10) {
        let table = clean(&raw).unwrap();
        let target = f64::from(target);

        let found = linear_search_numeric(&table, "quantity", target).unwrap();
        let expected: Vec<SalesRecord> = table
            .records()
            .unwrap()
            .into_iter()
            .filter(|r| r.quantity == target)
            .collect();
        prop_assert_eq!(found, expected);
    }
}
