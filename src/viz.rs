//! Chart rendering for the sales report using Plotters

use crate::error::AnalysisError;
use crate::metrics::{self, CategoryRevenue, PeriodSales, YearMonth};
use crate::model::SalesTable;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Directory the charts are written to when `--figures` is given without a value
pub const DEFAULT_FIGURES_DIR: &str = "output/figures";

pub const CATEGORY_CHART_FILE: &str = "revenue_by_category.svg";
pub const TREND_CHART_FILE: &str = "monthly_revenue_trend.svg";
pub const DISTRIBUTION_CHART_FILE: &str = "order_value_distribution.svg";

/// Number of bins in the order value histogram
pub const HISTOGRAM_BINS: usize = 40;

fn render_err<E: std::error::Error>(err: E) -> AnalysisError {
    AnalysisError::Render(err.to_string())
}

/// Label for an integer x position, blank between bars
fn label_at(labels: &[String], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

/// Bar chart of revenue per category
pub fn create_category_revenue_chart(
    categories: &[CategoryRevenue],
    output_path: &Path,
) -> crate::Result<()> {
    let labels: Vec<String> = categories.iter().map(|c| c.category.clone()).collect();
    let max_revenue = categories.iter().map(|c| c.revenue).fold(0.0, f64::max);

    let root = SVGBackend::new(output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Revenue by Category", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(
            -0.5f64..(categories.len() as f64 - 0.5),
            0f64..(max_revenue * 1.1).max(1.0),
        )
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&|x| label_at(&labels, *x))
        .x_desc("Category")
        .y_desc("Revenue")
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(categories.iter().enumerate().map(|(i, c)| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, c.revenue)], BLUE.filled())
        }))
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    info!(path = %output_path.display(), "category revenue chart saved");
    Ok(())
}

/// Line chart of revenue per year-month
pub fn create_monthly_trend_chart(
    monthly: &[PeriodSales<YearMonth>],
    output_path: &Path,
) -> crate::Result<()> {
    let labels: Vec<String> = monthly.iter().map(|m| m.period.to_string()).collect();
    let max_revenue = monthly.iter().map(|m| m.revenue).fold(0.0, f64::max);

    let root = SVGBackend::new(output_path, (900, 500)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Revenue Trend", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(
            -0.5f64..(monthly.len() as f64 - 0.5),
            0f64..(max_revenue * 1.1).max(1.0),
        )
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_labels(monthly.len())
        .x_label_formatter(&|x| label_at(&labels, *x))
        .x_desc("Month")
        .y_desc("Revenue")
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(render_err)?;

    let points: Vec<(f64, f64)> = monthly
        .iter()
        .enumerate()
        .map(|(i, m)| (i as f64, m.revenue))
        .collect();

    chart
        .draw_series(LineSeries::new(points.iter().copied(), &BLUE))
        .map_err(render_err)?;
    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, 4, BLUE.filled())))
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    info!(path = %output_path.display(), "monthly trend chart saved");
    Ok(())
}

/// Split values into equal-width bins over their range
///
/// Returns `(start, end, count)` per bin. A constant series gets a single
/// unit-wide range so every bin has a positive width.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max > min { max - min } else { 1.0 };
    let width = span / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let start = min + i as f64 * width;
            (start, start + width, count)
        })
        .collect()
}

/// Histogram of order amounts
pub fn create_order_distribution_chart(amounts: &[f64], output_path: &Path) -> crate::Result<()> {
    let bins = histogram_bins(amounts, HISTOGRAM_BINS);
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Ok(());
    };
    let max_count = bins.iter().map(|b| b.2).max().unwrap_or(1);

    let root = SVGBackend::new(output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Order Value Distribution", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(first.0..last.1, 0f64..(max_count as f64 * 1.1))
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Order Amount")
        .y_desc("Number of Orders")
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(bins.iter().flat_map(|&(start, end, count)| {
            [
                Rectangle::new([(start, 0.0), (end, count as f64)], BLUE.filled()),
                Rectangle::new([(start, 0.0), (end, count as f64)], BLACK.stroke_width(1)),
            ]
        }))
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    info!(path = %output_path.display(), "order distribution chart saved");
    Ok(())
}

/// Render all charts for a cleaned table into `output_dir`
///
/// Charts without data are skipped. Returns the paths written.
pub fn generate_visualization_report(
    table: &SalesTable,
    output_dir: &Path,
) -> crate::Result<Vec<PathBuf>> {
    if table.is_empty() {
        warn!("no rows to chart, skipping visualizations");
        return Ok(Vec::new());
    }

    fs::create_dir_all(output_dir)?;
    let mut written = Vec::with_capacity(3);

    let category_path = output_dir.join(CATEGORY_CHART_FILE);
    create_category_revenue_chart(&metrics::category_revenue(table)?, &category_path)?;
    written.push(category_path);

    let trend_path = output_dir.join(TREND_CHART_FILE);
    create_monthly_trend_chart(&metrics::monthly_sales_trends(table)?, &trend_path)?;
    written.push(trend_path);

    let distribution_path = output_dir.join(DISTRIBUTION_CHART_FILE);
    create_order_distribution_chart(&metrics::order_amounts(table)?, &distribution_path)?;
    written.push(distribution_path);

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SalesRecord;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn create_test_table() -> SalesTable {
        let rows = [
            ("1", "Books", 12.0, (2024, 1, 3)),
            ("2", "Games", 60.0, (2024, 1, 9)),
            ("3", "Books", 25.0, (2024, 2, 1)),
            ("4", "Garden", 140.0, (2024, 3, 15)),
        ];
        let records: Vec<SalesRecord> = rows
            .iter()
            .map(|&(id, category, amount, (y, m, d))| SalesRecord {
                order_id: id.to_string(),
                customer_id: format!("C{id}"),
                product_name: "Item".to_string(),
                product_category: category.to_string(),
                quantity: 1.0,
                unit_price: amount,
                order_amount: amount,
                order_date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
                status: "shipped".to_string(),
            })
            .collect();
        SalesTable::from_records(&records).unwrap()
    }

    #[test]
    fn test_histogram_bins() {
        let bins = histogram_bins(&[0.0, 1.0, 2.0, 10.0], 5);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins[0], (0.0, 2.0, 2));
        assert_eq!(bins[1].2, 1);
        assert_eq!(bins[4].2, 1);
        assert_eq!(bins.iter().map(|b| b.2).sum::<usize>(), 4);

        let constant = histogram_bins(&[3.0, 3.0], 4);
        assert_eq!(constant[0].2, 2);
        assert!(histogram_bins(&[], 4).is_empty());
    }

    #[test]
    fn test_label_at() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(label_at(&labels, 1.0), "b");
        assert_eq!(label_at(&labels, 0.5), "");
        assert_eq!(label_at(&labels, 5.0), "");
        assert_eq!(label_at(&labels, -1.0), "");
    }

    #[test]
    fn test_generate_visualization_report() {
        let table = create_test_table();
        let temp_dir = tempdir().unwrap();
        let out_dir = temp_dir.path().join("figures");

        let written = generate_visualization_report(&table, &out_dir).unwrap();
        assert_eq!(written.len(), 3);
        for path in &written {
            assert!(path.exists(), "missing chart {}", path.display());
        }
        assert!(out_dir.join(CATEGORY_CHART_FILE).exists());
    }

    #[test]
    fn test_empty_table_writes_nothing() {
        let temp_dir = tempdir().unwrap();
        let written =
            generate_visualization_report(&SalesTable::default(), temp_dir.path()).unwrap();
        assert!(written.is_empty());
    }
}
