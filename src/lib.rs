//! SalesForge: sales transaction cleaning and descriptive business metrics
//!
//! A raw CSV is loaded into a [`RawTable`], cleaned into a canonical
//! [`SalesTable`], and then fed to pure metric functions. A naive bubble
//! sort and linear scan are kept alongside the optimized operations so the
//! two can be benchmarked against each other.

pub mod algorithms;
pub mod benchmark;
pub mod cleaning;
pub mod cli;
pub mod data;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod viz;

// Re-export public items for easier access
pub use algorithms::{bubble_sort_by, linear_search_numeric, native_filter_numeric, native_sort_by};
pub use cleaning::clean;
pub use cli::Args;
pub use data::{export_clean, load_raw};
pub use error::AnalysisError;
pub use model::{Column, Customer, Order, Product, RawTable, SalesRecord, SalesTable};
pub use viz::generate_visualization_report;

/// Common result type used throughout the library
pub type Result<T> = std::result::Result<T, AnalysisError>;
