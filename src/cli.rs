//! Command-line interface definitions and argument parsing

use crate::error::AnalysisError;
use crate::model::Column;
use crate::viz::DEFAULT_FIGURES_DIR;
use clap::Parser;
use std::path::PathBuf;

/// Clean a sales CSV and report revenue, customer and trend metrics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, env = "SALESFORGE_INPUT", default_value = "data/sales_data.csv")]
    pub input: PathBuf,

    /// Write the cleaned table to output/cleaned_sales_data.csv
    #[arg(short, long)]
    pub export: bool,

    /// Render charts into this directory; output/figures when given without a value
    #[arg(
        short,
        long,
        env = "SALESFORGE_FIGURES",
        num_args = 0..=1,
        default_missing_value = DEFAULT_FIGURES_DIR
    )]
    pub figures: Option<PathBuf>,

    /// Time the bubble sort and linear scan against their optimized equivalents
    #[arg(short, long)]
    pub benchmark: bool,

    /// Column the sort benchmark orders by
    #[arg(long, default_value = "unit_price")]
    pub sort_column: String,

    /// Numeric column the search benchmark scans
    #[arg(long, default_value = "quantity")]
    pub search_column: String,

    /// Value the search benchmark looks for
    #[arg(long, default_value = "1", allow_negative_numbers = true)]
    pub search_target: f64,

    /// Print the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Check the benchmark column names before any data is loaded
    pub fn validate(&self) -> crate::Result<()> {
        if !self.benchmark {
            return Ok(());
        }

        self.sort_column.parse::<Column>()?;
        let search: Column = self.search_column.parse()?;
        if !search.is_numeric() {
            return Err(AnalysisError::Type {
                column: self.search_column.clone(),
                expected: "numeric",
            });
        }
        Ok(())
    }
}
