//! Per-series train/inference windowing

use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

use super::config::{SplitConfig, Step};
use crate::error::{PrepError, Result};

/// The two tables produced by a split run
///
/// They are row-disjoint and together re-partition the horizon-extended
/// input: original rows land in either table, synthetic rows only in the
/// inference table.
#[derive(Debug, Clone)]
pub struct SplitOutput {
    pub train: DataFrame,
    pub inference: DataFrame,
}

impl SplitOutput {
    /// The table a given pipeline step persists
    pub fn select(self, step: Step) -> DataFrame {
        match step {
            Step::Train => self.train,
            Step::Inference => self.inference,
        }
    }
}

/// Splits a multi-series table into training and inference windows.
///
/// Rows sharing the same partition-key pair form one series. Every series
/// is extended with `forecast_horizon` weekly future timestamps and cut at
/// `len - (forecast_horizon + max(target_lags))`, so each inference window
/// carries enough trailing history for lag-feature construction downstream.
pub struct SeriesSplitter {
    config: SplitConfig,
}

impl SeriesSplitter {
    /// Create a splitter from a validated-on-use configuration
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Split `table` into the training and inference tables.
    ///
    /// Both outputs are sorted ascending by the two partition columns and
    /// the time column, so the result does not depend on input row order
    /// or on the order series are processed in.
    pub fn split(&self, table: &DataFrame) -> Result<SplitOutput> {
        self.config.validate()?;
        for name in self.required_columns() {
            if !table.get_column_names().iter().any(|c| c.as_str() == name) {
                return Err(PrepError::MissingColumn(name.to_string()));
            }
        }

        let table = self.normalize_time(table)?;

        let groups = table.partition_by_stable(
            self.config.partition_columns.iter().map(|c| c.as_str()),
            true,
        )?;
        let n_series = groups.len();
        if n_series == 0 {
            return Ok(SplitOutput {
                train: table.clear(),
                inference: table.clear(),
            });
        }

        // Series are independent; windows are computed in parallel and the
        // final sort makes the merged result deterministic.
        let windows: Vec<(DataFrame, DataFrame)> = groups
            .into_par_iter()
            .map(|series| self.split_series(series))
            .collect::<Result<_>>()?;

        let mut train_parts = Vec::with_capacity(n_series);
        let mut inference_parts = Vec::with_capacity(n_series);
        for (train, inference) in windows {
            train_parts.push(train);
            inference_parts.push(inference);
        }

        let train = self.finish(train_parts)?;
        let inference = self.finish(inference_parts)?;
        info!(
            "split {} series into {} training and {} inference rows",
            n_series,
            train.height(),
            inference.height()
        );

        Ok(SplitOutput { train, inference })
    }

    fn required_columns(&self) -> impl Iterator<Item = &str> {
        self.config
            .partition_columns
            .iter()
            .map(|s| s.as_str())
            .chain([
                self.config.time_column.as_str(),
                self.config.label_column.as_str(),
            ])
    }

    /// Ensure the time column carries the `Date` dtype
    fn normalize_time(&self, table: &DataFrame) -> Result<DataFrame> {
        let name = self.config.time_column.as_str();
        let series = table.column(name)?.as_materialized_series().clone();
        let dates = match series.dtype() {
            DataType::Date => return Ok(table.clone()),
            DataType::Datetime(_, _) => series.cast(&DataType::Date)?,
            DataType::String => series.str()?.as_date(None, false)?.into_series(),
            other => {
                return Err(PrepError::DataError(format!(
                    "time column '{name}' has non-chronological dtype {other}"
                )))
            }
        };
        let mut table = table.clone();
        table.replace(name, dates)?;
        Ok(table)
    }

    /// Extend one series with future timestamps and cut it into windows
    fn split_series(&self, series: DataFrame) -> Result<(DataFrame, DataFrame)> {
        let time = self.config.time_column.as_str();
        let sorted = series.sort(vec![time.to_string()], SortMultipleOptions::default())?;

        let extended = self.extend_series(&sorted)?;
        let required = self.config.required_window()?;
        let total = extended.height();
        if total < required {
            return Err(PrepError::InsufficientHistory {
                series: self.describe_series(&sorted),
                length: total,
                required,
            });
        }

        let cut = total - required;
        debug!(
            "series [{}]: {} rows extended to {}, cut at {}",
            self.describe_series(&sorted),
            sorted.height(),
            total,
            cut
        );
        Ok((extended.slice(0, cut), extended.slice(cut as i64, required)))
    }

    /// Append `forecast_horizon` weekly rows after the series' last timestamp.
    ///
    /// Synthetic rows hold null in every column except the time column.
    fn extend_series(&self, sorted: &DataFrame) -> Result<DataFrame> {
        let time = self.config.time_column.as_str();
        let dates = sorted.column(time)?.as_materialized_series().clone();
        let last = dates
            .date()?
            .as_date_iter()
            .flatten()
            .max()
            .ok_or_else(|| PrepError::DataError(format!("series has no '{time}' values")))?;

        let future: Vec<NaiveDate> = (1..=self.config.forecast_horizon as i64)
            .map(|week| last + Duration::weeks(week))
            .collect();

        let columns: Vec<Column> = sorted
            .get_columns()
            .iter()
            .map(|col| {
                if col.name().as_str() == time {
                    DateChunked::from_naive_date(col.name().clone(), future.iter().copied())
                        .into_series()
                        .into_column()
                } else {
                    Series::full_null(col.name().clone(), future.len(), col.dtype()).into_column()
                }
            })
            .collect();

        let synthetic = DataFrame::new(columns)?;
        sorted.vstack(&synthetic).map_err(PrepError::from)
    }

    /// Merge per-series windows and apply the deterministic final sort
    fn finish(&self, mut parts: Vec<DataFrame>) -> Result<DataFrame> {
        let mut merged = parts.remove(0);
        for part in &parts {
            merged.vstack_mut(part)?;
        }
        let by = vec![
            self.config.partition_columns[0].clone(),
            self.config.partition_columns[1].clone(),
            self.config.time_column.clone(),
        ];
        // Synthetic rows hold null partition keys and must trail the real
        // rows, matching the reference process ordering.
        merged
            .sort(
                by,
                SortMultipleOptions::default()
                    .with_maintain_order(true)
                    .with_nulls_last(true),
            )
            .map_err(PrepError::from)
    }

    /// Human-readable partition-key pair, for logs and errors
    fn describe_series(&self, series: &DataFrame) -> String {
        self.config
            .partition_columns
            .iter()
            .map(|name| {
                let value = series
                    .column(name)
                    .ok()
                    .and_then(|col| col.as_materialized_series().get(0).ok())
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "?".to_string());
                format!("{name}={value}")
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekly_dates(start: &str, n: usize) -> Vec<String> {
        let first: NaiveDate = start.parse().unwrap();
        (0..n)
            .map(|i| (first + Duration::weeks(i as i64)).to_string())
            .collect()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    /// Nine weekly rows ending 2020-03-01 for the (1, "A") series
    fn single_series_df() -> DataFrame {
        df!(
            "Store" => &[1i64; 9],
            "Brand" => &["A"; 9],
            "WeekStarting" => weekly_dates("2020-01-05", 9),
            "Quantity" => &[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0],
            "Price" => &[2.5, 2.5, 2.4, 2.6, 2.5, 2.5, 2.7, 2.4, 2.5],
        )
        .unwrap()
    }

    fn example_config() -> SplitConfig {
        SplitConfig::new()
            .with_partitions("Store", "Brand")
            .with_time_column("WeekStarting")
            .with_label_column("Quantity")
            .with_target_lags(vec![1, 3])
            .with_forecast_horizon(2)
    }

    fn column_dates(df: &DataFrame, name: &str) -> Vec<NaiveDate> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .date()
            .unwrap()
            .as_date_iter()
            .flatten()
            .collect()
    }

    #[test]
    fn test_example_window_sizes() {
        // 9 rows + horizon 2 = 11 extended, cut = 11 - (2 + 3) = 6
        let output = SeriesSplitter::new(example_config())
            .split(&single_series_df())
            .unwrap();

        assert_eq!(output.train.height(), 6);
        assert_eq!(output.inference.height(), 5);
    }

    #[test]
    fn test_train_window_holds_prefix() {
        let output = SeriesSplitter::new(example_config())
            .split(&single_series_df())
            .unwrap();

        let labels: Vec<f64> = output
            .train
            .column("Quantity")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(labels, vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        assert_eq!(output.train.column("Quantity").unwrap().null_count(), 0);
    }

    #[test]
    fn test_synthetic_timestamp_spacing() {
        let output = SeriesSplitter::new(example_config())
            .split(&single_series_df())
            .unwrap();

        let dates = column_dates(&output.inference, "WeekStarting");
        assert_eq!(
            dates,
            vec![
                date("2020-02-16"),
                date("2020-02-23"),
                date("2020-03-01"),
                date("2020-03-08"),
                date("2020-03-15"),
            ]
        );
        // Synthetic rows carry null everywhere but the time column
        assert_eq!(output.inference.column("Quantity").unwrap().null_count(), 2);
        assert_eq!(output.inference.column("Price").unwrap().null_count(), 2);
        assert_eq!(output.inference.column("Store").unwrap().null_count(), 2);
    }

    #[test]
    fn test_multi_series_completeness() {
        let short = single_series_df();
        let long = df!(
            "Store" => &[2i64; 12],
            "Brand" => &["B"; 12],
            "WeekStarting" => weekly_dates("2019-12-01", 12),
            "Quantity" => &[1.0; 12],
            "Price" => &[3.0; 12],
        )
        .unwrap();
        let table = short.vstack(&long).unwrap();

        let output = SeriesSplitter::new(example_config()).split(&table).unwrap();

        // Each series contributes original_count + horizon rows overall,
        // with an inference window of exactly horizon + max(lag) rows.
        assert_eq!(output.inference.height(), 10);
        assert_eq!(output.train.height(), (9 + 2 - 5) + (12 + 2 - 5));
        assert_eq!(
            output.train.height() + output.inference.height(),
            (9 + 2) + (12 + 2)
        );
    }

    #[test]
    fn test_output_ordering() {
        let a = single_series_df();
        let b = df!(
            "Store" => &[1i64; 9],
            "Brand" => &["B"; 9],
            "WeekStarting" => weekly_dates("2020-01-05", 9),
            "Quantity" => &[5.0; 9],
            "Price" => &[1.0; 9],
        )
        .unwrap();
        // Stack series B ahead of A so discovery order differs from sort order
        let table = b.vstack(&a).unwrap();

        let output = SeriesSplitter::new(example_config()).split(&table).unwrap();

        for frame in [&output.train, &output.inference] {
            // Null partition keys (synthetic rows) sort after every real row.
            let brands: Vec<(u8, String)> = frame
                .column("Brand")
                .unwrap()
                .as_materialized_series()
                .str()
                .unwrap()
                .into_iter()
                .map(|v| match v {
                    Some(brand) => (0, brand.to_string()),
                    None => (1, String::new()),
                })
                .collect();
            let dates = column_dates(frame, "WeekStarting");
            let keyed: Vec<(u8, String, NaiveDate)> = brands
                .into_iter()
                .zip(dates)
                .map(|((null_flag, brand), date)| (null_flag, brand, date))
                .collect();
            for pair in keyed.windows(2) {
                assert!(pair[0] <= pair[1], "rows out of order: {pair:?}");
            }
        }
    }

    #[test]
    fn test_idempotent_under_reordering() {
        let df = single_series_df();
        // Reverse the row order; the split must not notice.
        let reversed = df.sort(
            vec!["WeekStarting".to_string()],
            SortMultipleOptions::default().with_order_descending(true),
        )
        .unwrap();

        let splitter = SeriesSplitter::new(example_config());
        let a = splitter.split(&df).unwrap();
        let b = splitter.split(&reversed).unwrap();

        assert!(a.train.equals(&b.train));
        assert!(a.inference.equals_missing(&b.inference));
    }

    #[test]
    fn test_empty_lag_list_rejected() {
        let config = example_config().with_target_lags(vec![]);
        let result = SeriesSplitter::new(config).split(&single_series_df());
        assert!(matches!(result, Err(PrepError::EmptyLagList)));
    }

    #[test]
    fn test_insufficient_history_rejected() {
        let table = df!(
            "Store" => &[7i64, 7],
            "Brand" => &["C", "C"],
            "WeekStarting" => weekly_dates("2020-01-05", 2),
            "Quantity" => &[1.0, 2.0],
            "Price" => &[1.0, 1.0],
        )
        .unwrap();
        let config = example_config().with_target_lags(vec![1, 4]);

        let result = SeriesSplitter::new(config).split(&table);
        match result {
            Err(PrepError::InsufficientHistory {
                series,
                length,
                required,
            }) => {
                assert!(series.contains("Store=7"));
                assert_eq!(length, 4);
                assert_eq!(required, 6);
            }
            other => panic!("expected InsufficientHistory, got {other:?}"),
        }
    }

    #[test]
    fn test_short_series_aborts_whole_run() {
        // A single undersized series fails the run even when others fit.
        let table = single_series_df()
            .vstack(
                &df!(
                    "Store" => &[9i64],
                    "Brand" => &["Z"],
                    "WeekStarting" => weekly_dates("2020-01-05", 1),
                    "Quantity" => &[1.0],
                    "Price" => &[1.0],
                )
                .unwrap(),
            )
            .unwrap();

        let result = SeriesSplitter::new(example_config()).split(&table);
        assert!(matches!(result, Err(PrepError::InsufficientHistory { .. })));
    }

    #[test]
    fn test_missing_column_rejected() {
        let table = single_series_df().drop("Quantity").unwrap();
        let result = SeriesSplitter::new(example_config()).split(&table);
        match result {
            Err(PrepError::MissingColumn(name)) => assert_eq!(name, "Quantity"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_train_window_allowed() {
        // 3 rows + horizon 2 = 5 extended, required 5 -> cut lands at zero.
        let table = df!(
            "Store" => &[1i64; 3],
            "Brand" => &["A"; 3],
            "WeekStarting" => weekly_dates("2020-01-05", 3),
            "Quantity" => &[1.0, 2.0, 3.0],
            "Price" => &[1.0, 1.0, 1.0],
        )
        .unwrap();

        let output = SeriesSplitter::new(example_config()).split(&table).unwrap();
        assert_eq!(output.train.height(), 0);
        assert_eq!(output.inference.height(), 5);
    }

    #[test]
    fn test_time_column_parsed_to_date() {
        let output = SeriesSplitter::new(example_config())
            .split(&single_series_df())
            .unwrap();
        assert_eq!(
            output.train.column("WeekStarting").unwrap().dtype(),
            &DataType::Date
        );
    }

    #[test]
    fn test_select_step() {
        let output = SeriesSplitter::new(example_config())
            .split(&single_series_df())
            .unwrap();
        let height = output.inference.height();
        assert_eq!(output.select(Step::Inference).height(), height);
    }
}
