//! SalesForge: sales data cleaning and metrics CLI
//!
//! This is the main entrypoint that orchestrates loading, cleaning, the
//! metrics report, export, charts and the baseline benchmark.

use anyhow::{Context as _, Result};
use clap::Parser;
use salesforge::benchmark::{self, BenchmarkResult};
use salesforge::metrics::{self, MonthlyGrowth, SalesSummary};
use salesforge::{clean, data, load_raw, logging, viz, Args, SalesTable};
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// Everything the text report prints, in serializable form
#[derive(Debug, Serialize)]
struct Report {
    summary: SalesSummary,
    top_customers: Vec<metrics::CustomerValue>,
    monthly_growth: Vec<MonthlyGrowth>,
    seasonal_trends: Vec<metrics::PeriodSales<u32>>,
    order_size_by_category: Vec<metrics::CategoryOrderSize>,
    status_percentages: Vec<metrics::StatusShare>,
    outlier_fences: Option<metrics::TukeyFences>,
    outliers: Vec<metrics::OrderOutlier>,
    segments: Vec<metrics::CustomerSegment>,
    benchmarks: Vec<BenchmarkResult>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose)?;
    args.validate().context("Invalid benchmark arguments")?;

    let start_time = Instant::now();

    let raw = load_raw(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    let table = clean(&raw).context("Failed to clean sales data")?;
    info!(rows = table.len(), "data ready");

    if args.export {
        data::export_clean(&table, data::DEFAULT_EXPORT_PATH)
            .context("Failed to export cleaned data")?;
    }

    if let Some(dir) = &args.figures {
        let written = viz::generate_visualization_report(&table, dir)
            .context("Failed to render charts")?;
        info!(charts = written.len(), dir = %dir.display(), "charts rendered");
    }

    let benchmarks = if args.benchmark {
        run_benchmarks(&args, &table)?
    } else {
        Vec::new()
    };

    let report = build_report(&table, benchmarks).context("Failed to compute metrics")?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    info!(
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        "pipeline complete"
    );
    Ok(())
}

fn run_benchmarks(args: &Args, table: &SalesTable) -> Result<Vec<BenchmarkResult>> {
    let sort = benchmark::compare_sort(table, &args.sort_column)?;
    let search = benchmark::compare_search(table, &args.search_column, args.search_target)?;
    Ok(vec![sort, search])
}

fn build_report(
    table: &SalesTable,
    benchmarks: Vec<BenchmarkResult>,
) -> salesforge::Result<Report> {
    Ok(Report {
        summary: metrics::summarize(table)?,
        top_customers: metrics::top_customers_by_ltv(table)?,
        monthly_growth: metrics::revenue_monthly_growth(table)?,
        seasonal_trends: metrics::seasonal_sales_trends(table)?,
        order_size_by_category: metrics::average_order_size_by_category(table)?,
        status_percentages: metrics::status_percentages(table)?,
        outlier_fences: metrics::tukey_fences(table)?,
        outliers: metrics::order_outliers(table)?,
        segments: metrics::customer_segmentation_by_spending(table)?,
        benchmarks,
    })
}

fn print_report(report: &Report) {
    let summary = &report.summary;
    println!("=== Sales Summary ===");
    println!("Rows analysed:        {}", summary.rows);
    println!("Total revenue:        {:.2}", summary.total_revenue);
    match summary.average_order_value {
        Some(avg) => println!("Average order value:  {avg:.2}"),
        None => println!("Average order value:  undefined (no orders)"),
    }
    println!("Customers:            {}", summary.customer_count);
    println!(
        "Repeat customer rate: {:.1}%",
        summary.repeat_customer_rate * 100.0
    );
    if let Some(best) = &summary.most_profitable_category {
        println!(
            "Top category:         {} ({:.2})",
            best.category, best.revenue
        );
    }

    println!("\n=== Top Customers by Lifetime Value ===");
    for (rank, customer) in report.top_customers.iter().enumerate() {
        println!(
            "  {:2}. {:<12} {:>12.2}",
            rank + 1,
            customer.customer_id,
            customer.lifetime_value
        );
    }

    println!("\n=== Monthly Revenue ===");
    println!("  Month   |      Revenue | Orders |   Change | Growth");
    for month in &report.monthly_growth {
        let change = month
            .revenue_change
            .map_or_else(|| "-".to_string(), |c| format!("{c:.2}"));
        let growth = month
            .growth_pct
            .map_or_else(|| "-".to_string(), |g| format!("{g:.1}%"));
        println!(
            "  {} | {:>12.2} | {:>6} | {:>8} | {:>6}",
            month.period, month.revenue, month.orders, change, growth
        );
    }

    println!("\n=== Seasonal Revenue (by calendar month) ===");
    for season in &report.seasonal_trends {
        println!(
            "  {:02}: {:>12.2} ({} orders)",
            season.period, season.revenue, season.orders
        );
    }

    println!("\n=== Average Order Size by Category ===");
    for size in &report.order_size_by_category {
        println!(
            "  {:<16} qty {:>6.2}  amount {:>10.2}",
            size.category, size.avg_quantity, size.avg_order_amount
        );
    }

    println!("\n=== Order Status ===");
    for share in &report.status_percentages {
        println!("  {:<12} {:>5.1}%", share.status, share.percentage);
    }

    println!("\n=== Order Outliers ===");
    if let Some(fences) = &report.outlier_fences {
        println!(
            "  Q1={:.2} Q3={:.2} IQR={:.2} bounds=[{:.2}, {:.2}]",
            fences.q1, fences.q3, fences.iqr, fences.lower, fences.upper
        );
    }
    for outlier in &report.outliers {
        println!(
            "  order {:<10} {:>12.2} ({:?})",
            outlier.record.order_id, outlier.record.order_amount, outlier.kind
        );
    }

    println!("\n=== Customer Segments ===");
    for tier in [
        metrics::SpendingTier::Vip,
        metrics::SpendingTier::High,
        metrics::SpendingTier::Mid,
        metrics::SpendingTier::Low,
    ] {
        let count = report.segments.iter().filter(|s| s.tier == tier).count();
        println!("  {:<5} {count} customers", tier.to_string());
    }

    if !report.benchmarks.is_empty() {
        println!("\n=== Baseline vs Optimized ===");
        for result in &report.benchmarks {
            println!(
                "  {:<28} baseline {:>10.3} ms  optimized {:>10.3} ms  speedup {:>8.1}x  match: {}",
                result.name,
                result.baseline.as_secs_f64() * 1000.0,
                result.optimized.as_secs_f64() * 1000.0,
                result.speedup(),
                result.results_match
            );
        }
    }
}
