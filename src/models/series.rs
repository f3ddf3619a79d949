//! Time-indexed table of raw hourly weather variables
//!
//! The weather API returns named numeric columns over a shared UTC hour
//! index. `HourlySeries` keeps that shape and provides the operations the
//! record transformation needs: timezone shifting, year filtering, bounded
//! gap interpolation and monthly aggregation.

use crate::{EpwGenError, Result};
use chrono::{Datelike, Duration, NaiveDateTime};
use std::collections::BTreeMap;

/// Longest run of consecutive missing samples that interpolation may fill.
/// Longer gaps are left missing and surface as a data-completeness error
/// when the affected column is materialized.
pub const MAX_INTERPOLATION_GAP: usize = 6;

/// Hourly weather samples as named columns over a shared time index
#[derive(Debug, Clone)]
pub struct HourlySeries {
    timestamps: Vec<NaiveDateTime>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl HourlySeries {
    /// Create a series, checking that every column matches the time index
    /// and that timestamps are strictly increasing.
    pub fn new(
        timestamps: Vec<NaiveDateTime>,
        columns: BTreeMap<String, Vec<Option<f64>>>,
    ) -> Result<Self> {
        for window in timestamps.windows(2) {
            if window[1] <= window[0] {
                return Err(EpwGenError::format(format!(
                    "timestamps must be strictly increasing, found {} after {}",
                    window[1], window[0]
                )));
            }
        }
        for (name, values) in &columns {
            if values.len() != timestamps.len() {
                return Err(EpwGenError::format(format!(
                    "column '{}' has {} values for {} timestamps",
                    name,
                    values.len(),
                    timestamps.len()
                )));
            }
        }
        Ok(Self {
            timestamps,
            columns,
        })
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the series has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The shared time index
    #[must_use]
    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// A raw column by name, if present
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// First value of a column, for metadata columns that repeat one value
    /// per row (UTC offset, model elevation).
    pub fn scalar(&self, name: &str) -> Result<f64> {
        self.column(name)
            .and_then(|values| values.first().copied().flatten())
            .ok_or_else(|| {
                EpwGenError::format(format!(
                    "metadata column '{name}' is missing or empty in the fetched data"
                ))
            })
    }

    /// Shift the time index by a UTC offset in hours to obtain local time
    pub fn shift_hours(&mut self, offset_hours: f64) {
        let shift = Duration::seconds((offset_hours * 3600.0).round() as i64);
        for timestamp in &mut self.timestamps {
            *timestamp += shift;
        }
    }

    /// Keep only rows whose (local) year matches `year`
    #[must_use]
    pub fn filter_year(&self, year: i32) -> Self {
        let keep: Vec<usize> = self
            .timestamps
            .iter()
            .enumerate()
            .filter(|(_, ts)| ts.year() == year)
            .map(|(i, _)| i)
            .collect();

        let timestamps = keep.iter().map(|&i| self.timestamps[i]).collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| {
                (
                    name.clone(),
                    keep.iter().map(|&i| values[i]).collect::<Vec<_>>(),
                )
            })
            .collect();

        Self {
            timestamps,
            columns,
        }
    }

    /// Replace every missing value in a column with a fixed sentinel
    pub fn fill_missing(&mut self, name: &str, value: f64) {
        if let Some(values) = self.columns.get_mut(name) {
            for slot in values.iter_mut() {
                if slot.is_none() {
                    *slot = Some(value);
                }
            }
        }
    }

    /// Fill missing samples in every column by linear interpolation along
    /// the time axis. Runs of up to `limit` consecutive missing samples are
    /// filled; runs at the edges of the series are padded with the nearest
    /// valid value. Longer runs are left missing.
    pub fn interpolate_gaps(&mut self, limit: usize) {
        for values in self.columns.values_mut() {
            interpolate_column(values, limit);
        }
    }

    /// Materialize a column that the output requires. Any remaining missing
    /// run fails with the field name and the time span of the gap.
    pub fn require_column(&self, name: &str) -> Result<Vec<f64>> {
        let values = self.column(name).ok_or_else(|| {
            EpwGenError::format(format!(
                "required column '{name}' is not present in the fetched data"
            ))
        })?;

        if let Some(start) = values.iter().position(Option::is_none) {
            let end = values[start..]
                .iter()
                .position(Option::is_some)
                .map_or(values.len(), |offset| start + offset);
            return Err(EpwGenError::DataCompleteness {
                field: name.to_string(),
                start: self.timestamps[start],
                end: self.timestamps[end - 1],
                max_gap: MAX_INTERPOLATION_GAP,
            });
        }

        Ok(values.iter().map(|v| v.unwrap_or_default()).collect())
    }

    /// Mean of a column per calendar month, in month order. Missing samples
    /// are skipped; a month with no valid samples at all is reported as a
    /// completeness error.
    pub fn monthly_means(&self, name: &str) -> Result<[f64; 12]> {
        let values = self.column(name).ok_or_else(|| {
            EpwGenError::format(format!(
                "required column '{name}' is not present in the fetched data"
            ))
        })?;

        let mut sums = [0.0_f64; 12];
        let mut counts = [0_usize; 12];
        let mut spans: [Option<(NaiveDateTime, NaiveDateTime)>; 12] = [None; 12];

        for (timestamp, value) in self.timestamps.iter().zip(values) {
            let month = timestamp.month0() as usize;
            spans[month] = Some(match spans[month] {
                Some((first, _)) => (first, *timestamp),
                None => (*timestamp, *timestamp),
            });
            if let Some(v) = value {
                sums[month] += v;
                counts[month] += 1;
            }
        }

        let mut means = [0.0_f64; 12];
        for month in 0..12 {
            if counts[month] > 0 {
                means[month] = sums[month] / counts[month] as f64;
            } else if let Some((start, end)) = spans[month] {
                return Err(EpwGenError::DataCompleteness {
                    field: name.to_string(),
                    start,
                    end,
                    max_gap: MAX_INTERPOLATION_GAP,
                });
            } else {
                return Err(EpwGenError::format(format!(
                    "column '{}' has no samples for month {}",
                    name,
                    month + 1
                )));
            }
        }

        Ok(means)
    }
}

fn interpolate_column(values: &mut [Option<f64>], limit: usize) {
    let n = values.len();
    let mut i = 0;
    while i < n {
        if values[i].is_some() {
            i += 1;
            continue;
        }
        let start = i;
        while i < n && values[i].is_none() {
            i += 1;
        }
        let run = i - start;
        if run > limit {
            continue;
        }
        let before = if start > 0 { values[start - 1] } else { None };
        let after = if i < n { values[i] } else { None };
        match (before, after) {
            (Some(a), Some(b)) => {
                for k in 0..run {
                    let t = (k + 1) as f64 / (run + 1) as f64;
                    values[start + k] = Some(a + (b - a) * t);
                }
            }
            // Edge runs have a single anchor and are padded with it
            (None, Some(b)) => values[start..start + run].fill(Some(b)),
            (Some(a), None) => values[start..start + run].fill(Some(a)),
            (None, None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hourly_timestamps(year: i32, month: u32, day: u32, count: usize) -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..count)
            .map(|i| start + Duration::hours(i as i64))
            .collect()
    }

    fn series_with(values: Vec<Option<f64>>) -> HourlySeries {
        let timestamps = hourly_timestamps(2023, 1, 1, values.len());
        let columns = BTreeMap::from([("x".to_string(), values)]);
        HourlySeries::new(timestamps, columns).unwrap()
    }

    #[test]
    fn test_rejects_unsorted_timestamps() {
        let mut timestamps = hourly_timestamps(2023, 1, 1, 3);
        timestamps.swap(0, 1);
        let result = HourlySeries::new(timestamps, BTreeMap::new());
        assert!(matches!(result, Err(EpwGenError::Format { .. })));
    }

    #[test]
    fn test_rejects_column_length_mismatch() {
        let timestamps = hourly_timestamps(2023, 1, 1, 3);
        let columns = BTreeMap::from([("x".to_string(), vec![Some(1.0)])]);
        let result = HourlySeries::new(timestamps, columns);
        assert!(matches!(result, Err(EpwGenError::Format { .. })));
    }

    #[test]
    fn test_single_gap_is_linearly_interpolated() {
        let mut series = series_with(vec![Some(10.0), None, Some(20.0)]);
        series.interpolate_gaps(MAX_INTERPOLATION_GAP);
        let filled = series.require_column("x").unwrap();
        assert_eq!(filled, vec![10.0, 15.0, 20.0]);
    }

    #[test]
    fn test_six_hour_gap_is_filled() {
        let mut values = vec![Some(0.0)];
        values.extend(vec![None; 6]);
        values.push(Some(7.0));
        let mut series = series_with(values);
        series.interpolate_gaps(MAX_INTERPOLATION_GAP);
        let filled = series.require_column("x").unwrap();
        assert_eq!(filled, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_seven_hour_gap_raises_completeness_error() {
        let mut values = vec![Some(0.0)];
        values.extend(vec![None; 7]);
        values.push(Some(8.0));
        let mut series = series_with(values);
        series.interpolate_gaps(MAX_INTERPOLATION_GAP);
        let result = series.require_column("x");
        match result {
            Err(EpwGenError::DataCompleteness { field, start, end, .. }) => {
                assert_eq!(field, "x");
                assert_eq!(start.format("%H").to_string(), "01");
                assert_eq!(end.format("%H").to_string(), "07");
            }
            other => panic!("expected DataCompleteness, got {other:?}"),
        }
    }

    #[test]
    fn test_edge_gaps_are_padded_with_nearest_value() {
        let mut series = series_with(vec![None, None, Some(5.0), None]);
        series.interpolate_gaps(MAX_INTERPOLATION_GAP);
        let filled = series.require_column("x").unwrap();
        assert_eq!(filled, vec![5.0, 5.0, 5.0, 5.0]);
    }

    #[test]
    fn test_fill_missing_sentinel() {
        let mut series = series_with(vec![Some(100.0), None, None]);
        series.fill_missing("x", 77777.0);
        let filled = series.require_column("x").unwrap();
        assert_eq!(filled, vec![100.0, 77777.0, 77777.0]);
    }

    #[test]
    fn test_filter_year_keeps_only_target_year() {
        // 48 hours starting Dec 31, so 24 rows belong to the next year
        let timestamps = hourly_timestamps(2022, 12, 31, 48);
        let columns = BTreeMap::from([(
            "x".to_string(),
            (0..48).map(|i| Some(f64::from(i))).collect::<Vec<_>>(),
        )]);
        let series = HourlySeries::new(timestamps, columns).unwrap();

        let filtered = series.filter_year(2023);
        assert_eq!(filtered.len(), 24);
        assert_eq!(filtered.timestamps()[0].year(), 2023);
        assert_eq!(filtered.require_column("x").unwrap()[0], 24.0);
    }

    #[test]
    fn test_shift_hours_moves_index() {
        let mut series = series_with(vec![Some(1.0), Some(2.0), Some(3.0)]);
        series.shift_hours(-7.0);
        assert_eq!(
            series.timestamps()[0],
            NaiveDate::from_ymd_opt(2022, 12, 31)
                .unwrap()
                .and_hms_opt(17, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_monthly_means_over_full_year() {
        // Full non-leap year where every sample holds its month number
        let timestamps = hourly_timestamps(2023, 1, 1, 8760);
        let values: Vec<Option<f64>> = timestamps
            .iter()
            .map(|ts| Some(f64::from(ts.month())))
            .collect();
        let columns = BTreeMap::from([("soil".to_string(), values)]);
        let series = HourlySeries::new(timestamps, columns).unwrap();

        let means = series.monthly_means("soil").unwrap();
        for (month0, mean) in means.iter().enumerate() {
            assert!((mean - (month0 + 1) as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_monthly_means_empty_month_fails() {
        // January has values, February is entirely missing
        let timestamps = hourly_timestamps(2023, 1, 1, (31 + 28) * 24);
        let values: Vec<Option<f64>> = timestamps
            .iter()
            .map(|ts| (ts.month() == 1).then_some(5.0))
            .collect();
        let columns = BTreeMap::from([("soil".to_string(), values)]);
        let series = HourlySeries::new(timestamps, columns).unwrap();

        let result = series.monthly_means("soil");
        assert!(matches!(
            result,
            Err(EpwGenError::DataCompleteness { .. }) | Err(EpwGenError::Format { .. })
        ));
    }

    #[test]
    fn test_scalar_reads_first_value() {
        let series = series_with(vec![Some(-7.0), Some(-7.0), Some(-7.0)]);
        assert_eq!(series.scalar("x").unwrap(), -7.0);
        assert!(series.scalar("missing").is_err());
    }
}
