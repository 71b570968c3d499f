//! forecast-prep - Train/inference windowing for multi-series sales data
//!
//! This crate implements the data-preparation step of a many-models sales
//! forecasting pipeline:
//!
//! - [`split`] - Per-series horizon extension and train/inference windowing
//! - [`utils`] - Table loading and persistence (CSV, JSON, Parquet)
//! - [`cli`] - Command-line interface
//!
//! The core operation groups a sales table by its two partition-key columns,
//! appends `forecast_horizon` weekly future rows to every series, and cuts
//! each extended series so the inference window holds exactly
//! `forecast_horizon + max(target_lags)` trailing rows.

// Core error handling
pub mod error;

// Core windowing
pub mod split;

// Table I/O
pub mod utils;

// Services
pub mod cli;

pub use error::{PrepError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PrepError, Result};

    // Windowing
    pub use crate::split::{SeriesSplitter, SplitConfig, SplitOutput, Step};

    // Table I/O
    pub use crate::utils::{DataLoader, DataSaver};
}
