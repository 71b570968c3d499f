//! Split configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Which output table a pipeline run persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Train,
    Inference,
}

impl FromStr for Step {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(Step::Train),
            "inference" => Ok(Step::Inference),
            other => Err(PrepError::InvalidStep(other.to_string())),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Train => write!(f, "train"),
            Step::Inference => write!(f, "inference"),
        }
    }
}

/// Configuration for the series splitter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Columns identifying series membership (exactly two)
    pub partition_columns: [String; 2],

    /// Column holding chronological values
    pub time_column: String,

    /// Column holding the forecast target
    pub label_column: String,

    /// Lag offsets used by downstream feature engineering
    /// Only the largest lag affects window sizing
    pub target_lags: Vec<usize>,

    /// Number of future periods to generate per series
    pub forecast_horizon: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            partition_columns: ["Store".to_string(), "Brand".to_string()],
            time_column: "WeekStarting".to_string(),
            label_column: "Quantity".to_string(),
            target_lags: vec![1],
            forecast_horizon: 4,
        }
    }
}

impl SplitConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the partition-key columns
    pub fn with_partitions(mut self, first: &str, second: &str) -> Self {
        self.partition_columns = [first.to_string(), second.to_string()];
        self
    }

    /// Builder method to set the time column
    pub fn with_time_column(mut self, name: &str) -> Self {
        self.time_column = name.to_string();
        self
    }

    /// Builder method to set the label column
    pub fn with_label_column(mut self, name: &str) -> Self {
        self.label_column = name.to_string();
        self
    }

    /// Builder method to set the target lags
    pub fn with_target_lags(mut self, lags: Vec<usize>) -> Self {
        self.target_lags = lags;
        self
    }

    /// Builder method to set the forecast horizon
    pub fn with_forecast_horizon(mut self, horizon: usize) -> Self {
        self.forecast_horizon = horizon;
        self
    }

    /// Largest configured lag
    pub fn max_lag(&self) -> Result<usize> {
        self.target_lags
            .iter()
            .copied()
            .max()
            .ok_or(PrepError::EmptyLagList)
    }

    /// Rows every inference window must hold: the horizon plus the largest lag
    pub fn required_window(&self) -> Result<usize> {
        Ok(self.forecast_horizon + self.max_lag()?)
    }

    /// Check configuration invariants before any data is touched
    pub fn validate(&self) -> Result<()> {
        if self.target_lags.is_empty() {
            return Err(PrepError::EmptyLagList);
        }
        if self.forecast_horizon == 0 {
            return Err(PrepError::ConfigError(
                "forecast_horizon must be a positive integer".to_string(),
            ));
        }
        for name in self
            .partition_columns
            .iter()
            .chain([&self.time_column, &self.label_column])
        {
            if name.is_empty() {
                return Err(PrepError::ConfigError("column names must be non-empty".to_string()));
            }
        }
        Ok(())
    }
}
