use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::peak::Peak;
use super::stats::{self, DatasetSummary};
use crate::constants::columns::{INTENSITY, MS_LEVEL, MZ, PRECURSOR_MZ, REQUIRED, SCAN_NUMBER};
use crate::constants::precision::MZ_DECIMALS;
use crate::error::{Result, ViewerError};

/// PeakTable wraps a Polars DataFrame holding one row per (scan, peak)
#[derive(Clone)]
pub struct PeakTable {
    df: DataFrame,
    /// Original file path
    file_path: Option<PathBuf>,
}

impl std::fmt::Debug for PeakTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeakTable")
            .field("rows", &self.df.height())
            .field("columns", &self.column_names())
            .field("file_path", &self.file_path)
            .finish()
    }
}

impl PeakTable {
    /// Load a peak table from a Parquet or CSV file
    pub fn load(path: &Path) -> Result<Self> {
        profiling::scope!("PeakTable::load");

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ViewerError::Format("file has no extension".to_string()))?;

        let lazy = match extension.to_lowercase().as_str() {
            "parquet" => LazyFrame::scan_parquet(path, Default::default()),
            "csv" => LazyCsvReader::new(path)
                .with_has_header(true)
                .with_infer_schema_length(Some(100))
                .finish(),
            ext => {
                return Err(ViewerError::Format(format!(
                    "unsupported file format '.{}'",
                    ext
                )));
            }
        };

        let df = lazy
            .and_then(|lf| lf.collect())
            .map_err(|e| ViewerError::Format(format!("{}: {}", path.display(), e)))?;

        tracing::info!(path = %path.display(), rows = df.height(), "loaded peak table");

        Ok(Self {
            df,
            file_path: Some(path.to_path_buf()),
        })
    }

    /// Create a table from an already-loaded DataFrame
    pub fn from_dataframe(df: DataFrame, path: Option<PathBuf>) -> Self {
        Self {
            df,
            file_path: path,
        }
    }

    /// Build a table with the canonical schema from peak rows
    pub fn from_peaks(peaks: &[Peak]) -> Result<Self> {
        let scan_numbers: Vec<i64> = peaks.iter().map(|p| p.scan_number).collect();
        let mz: Vec<f64> = peaks.iter().map(|p| p.mz).collect();
        let intensity: Vec<f64> = peaks.iter().map(|p| p.intensity).collect();
        let ms_level: Vec<i32> = peaks.iter().map(|p| i32::from(p.ms_level)).collect();
        let precursor: Vec<Option<f64>> = peaks.iter().map(|p| p.precursor_mz).collect();

        let df = df!(
            SCAN_NUMBER => scan_numbers,
            MZ => mz,
            INTENSITY => intensity,
            MS_LEVEL => ms_level,
            PRECURSOR_MZ => precursor
        )?;
        Ok(Self::from_dataframe(df, None))
    }

    /// Get a reference to the underlying DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn width(&self) -> usize {
        self.df.width()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Get all column names
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    /// Names from `required` that the table lacks, in the given order
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect()
    }

    /// Fail with a schema error naming every missing column
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        let missing = self.missing_columns(required);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ViewerError::Schema { missing })
        }
    }

    /// Keep rows whose MS level satisfies `predicate`; the source is untouched
    pub fn filter(&self, predicate: impl Fn(u8) -> bool) -> Result<PeakTable> {
        self.require_columns(&[MS_LEVEL])?;
        let levels = self.i64_values(MS_LEVEL)?;
        let mask: Vec<bool> = levels
            .iter()
            .map(|level| {
                level
                    .and_then(|l| u8::try_from(l).ok())
                    .is_some_and(&predicate)
            })
            .collect();
        let mask = BooleanChunked::from_slice("mask".into(), &mask);
        let df = self.df.filter(&mask)?;
        Ok(Self {
            df,
            file_path: self.file_path.clone(),
        })
    }

    /// Rows of a single MS level
    pub fn filter_level(&self, level: u8) -> Result<PeakTable> {
        self.filter(|l| l == level)
    }

    /// Replace scan numbers by a gap-free 1..N sequence
    ///
    /// Returns the old -> new mapping. Row order and the column dtype are kept.
    pub fn renumber_scans_densely(&mut self) -> Result<BTreeMap<i64, i64>> {
        self.require_columns(&[SCAN_NUMBER])?;
        let scans = self.required_i64(SCAN_NUMBER)?;

        let mapping: BTreeMap<i64, i64> = scans
            .iter()
            .copied()
            .collect::<std::collections::BTreeSet<i64>>()
            .into_iter()
            .zip(1..)
            .collect();

        let renumbered: Vec<i64> = scans.iter().map(|s| mapping[s]).collect();
        let dtype = self.df.column(SCAN_NUMBER)?.dtype().clone();
        let series = Series::new(SCAN_NUMBER.into(), renumbered).cast(&dtype)?;
        self.df.with_column(series)?;

        tracing::debug!(scans = mapping.len(), "renumbered scans densely");
        Ok(mapping)
    }

    /// Narrow column types to cut memory use
    ///
    /// m/z values are rounded to five decimals before narrowing to f32 and
    /// intensities are truncated to integers. Columns that are absent are skipped.
    pub fn optimize_types(&mut self) -> Result<()> {
        profiling::scope!("PeakTable::optimize_types");
        let before = self.df.estimated_size();

        if self.has_column(SCAN_NUMBER) {
            self.cast_column(SCAN_NUMBER, DataType::Int32)?;
        }
        if self.has_column(MZ) {
            let rounded: Vec<Option<f64>> = self
                .f64_values(MZ)?
                .into_iter()
                .map(|v| v.map(round_mz))
                .collect();
            let series = Series::new(MZ.into(), rounded).cast(&DataType::Float32)?;
            self.df.with_column(series)?;
        }
        if self.has_column(INTENSITY) {
            self.cast_column(INTENSITY, DataType::Int64)?;
        }
        if self.has_column(MS_LEVEL) {
            self.cast_column(MS_LEVEL, DataType::Int8)?;
        }
        if self.has_column(PRECURSOR_MZ) {
            let rounded: Vec<Option<f64>> = self
                .f64_values(PRECURSOR_MZ)?
                .into_iter()
                .map(|v| v.map(round_mz))
                .collect();
            let series = Series::new(PRECURSOR_MZ.into(), rounded).cast(&DataType::Float32)?;
            self.df.with_column(series)?;
        }

        tracing::info!(
            before_bytes = before,
            after_bytes = self.df.estimated_size(),
            "optimized column types"
        );
        Ok(())
    }

    /// Materialize every row as a [`Peak`]
    pub fn peaks(&self) -> Result<Vec<Peak>> {
        profiling::scope!("PeakTable::peaks");
        self.require_columns(&REQUIRED)?;

        let scans = self.required_i64(SCAN_NUMBER)?;
        let mz = self.required_f64(MZ)?;
        let intensity = self.required_f64(INTENSITY)?;
        let levels = self.required_i64(MS_LEVEL)?;
        let precursor = if self.has_column(PRECURSOR_MZ) {
            self.f64_values(PRECURSOR_MZ)?
        } else {
            vec![None; self.height()]
        };

        let mut peaks = Vec::with_capacity(self.height());
        for row in 0..self.height() {
            let ms_level = u8::try_from(levels[row])
                .ok()
                .filter(|l| *l >= 1)
                .ok_or_else(|| {
                    ViewerError::Format(format!(
                        "invalid ms_level {} at row {}",
                        levels[row], row
                    ))
                })?;
            peaks.push(Peak {
                scan_number: scans[row],
                mz: mz[row],
                intensity: intensity[row],
                ms_level,
                precursor_mz: precursor[row].filter(|p| !p.is_nan()),
            });
        }
        Ok(peaks)
    }

    /// Write the table as Snappy-compressed Parquet
    pub fn write_parquet(&self, path: &Path) -> Result<u64> {
        let mut file = File::create(path)?;
        let mut df = self.df.clone();
        let written = ParquetWriter::new(&mut file)
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut df)?;
        Ok(written)
    }

    /// Shape, types and per-column statistics
    pub fn summary(&self) -> DatasetSummary {
        stats::summarize(&self.df)
    }

    /// First `n` rows rendered as strings, for previews
    pub fn preview_rows(&self, n: usize) -> Vec<Vec<String>> {
        let n = n.min(self.height());
        let columns: Vec<&Series> = self
            .df
            .get_columns()
            .iter()
            .map(|c| c.as_materialized_series())
            .collect();
        (0..n)
            .map(|row| {
                columns
                    .iter()
                    .map(|s| s.get(row).map(|v| v.to_string()).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    fn cast_column(&mut self, name: &str, dtype: DataType) -> Result<()> {
        let series = self
            .df
            .column(name)?
            .as_materialized_series()
            .cast(&dtype)?;
        self.df.with_column(series)?;
        Ok(())
    }

    fn i64_values(&self, name: &str) -> Result<Vec<Option<i64>>> {
        let series = self
            .df
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::Int64)?;
        Ok(series.i64()?.into_iter().collect())
    }

    fn f64_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let series = self
            .df
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        Ok(series.f64()?.into_iter().collect())
    }

    fn required_i64(&self, name: &str) -> Result<Vec<i64>> {
        self.i64_values(name)?
            .into_iter()
            .enumerate()
            .map(|(row, v)| v.ok_or_else(|| null_error(name, row)))
            .collect()
    }

    fn required_f64(&self, name: &str) -> Result<Vec<f64>> {
        self.f64_values(name)?
            .into_iter()
            .enumerate()
            .map(|(row, v)| v.ok_or_else(|| null_error(name, row)))
            .collect()
    }
}

fn null_error(column: &str, row: usize) -> ViewerError {
    ViewerError::Format(format!("null value in column '{}' at row {}", column, row))
}

/// Round an m/z value to the stored precision
pub fn round_mz(value: f64) -> f64 {
    let factor = 10f64.powi(MZ_DECIMALS);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn sample_peaks() -> Vec<Peak> {
        vec![
            Peak::new(5, 100.123456789, 10.0, 1),
            Peak::new(5, 200.987654321, 20.5, 1),
            Peak::new(9, 150.5, 5.0, 2).with_precursor(500.123456789),
            Peak::new(9, 250.25, 7.0, 2).with_precursor(500.123456789),
            Peak::new(9, 350.0, 9.0, 2).with_precursor(500.123456789),
            Peak::new(20, 400.000001, 30.0, 1),
        ]
    }

    #[test]
    fn test_parquet_round_trip() {
        let table = PeakTable::from_peaks(&sample_peaks()).unwrap();
        let file = Builder::new().suffix(".parquet").tempfile().unwrap();
        table.write_parquet(file.path()).unwrap();

        let loaded = PeakTable::load(file.path()).unwrap();
        assert_eq!(loaded.height(), 6);
        assert_eq!(loaded.file_path(), Some(file.path()));
        assert_eq!(loaded.peaks().unwrap(), sample_peaks());
    }

    #[test]
    fn test_csv_loading_without_precursor() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "scan_number,mz,intensity,ms_level").unwrap();
        writeln!(file, "1,100.5,10,1").unwrap();
        writeln!(file, "2,101.5,20,2").unwrap();
        file.flush().unwrap();

        let table = PeakTable::load(file.path()).unwrap();
        let peaks = table.peaks().unwrap();
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[1].ms_level, 2);
        assert_eq!(peaks[1].precursor_mz, None);
    }

    #[test]
    fn test_load_rejects_unsupported_and_corrupt_files() {
        let file = Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(matches!(
            PeakTable::load(file.path()),
            Err(ViewerError::Format(_))
        ));

        let mut file = Builder::new().suffix(".parquet").tempfile().unwrap();
        writeln!(file, "definitely not parquet").unwrap();
        file.flush().unwrap();
        assert!(matches!(
            PeakTable::load(file.path()),
            Err(ViewerError::Format(_))
        ));
    }

    #[test]
    fn test_peaks_reports_all_missing_columns() {
        let df = df!("scan_number" => [1i64, 2], "intensity" => [1.0, 2.0]).unwrap();
        let table = PeakTable::from_dataframe(df, None);
        match table.peaks() {
            Err(ViewerError::Schema { missing }) => {
                assert_eq!(missing, vec!["ms_level".to_string(), "mz".to_string()]);
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_null_in_required_column_is_format_error() {
        let df = df!(
            "scan_number" => [Some(1i64), None],
            "mz" => [1.0, 2.0],
            "intensity" => [1.0, 2.0],
            "ms_level" => [1i32, 1]
        )
        .unwrap();
        let table = PeakTable::from_dataframe(df, None);
        assert!(matches!(table.peaks(), Err(ViewerError::Format(_))));
    }

    #[test]
    fn test_nan_precursor_is_absent() {
        let df = df!(
            "scan_number" => [1i64],
            "mz" => [1.0],
            "intensity" => [1.0],
            "ms_level" => [1i32],
            "precursor_mz" => [f64::NAN]
        )
        .unwrap();
        let table = PeakTable::from_dataframe(df, None);
        assert_eq!(table.peaks().unwrap()[0].precursor_mz, None);
    }

    #[test]
    fn test_filter_leaves_source_untouched() {
        let table = PeakTable::from_peaks(&sample_peaks()).unwrap();
        let ms1 = table.filter_level(1).unwrap();
        assert_eq!(ms1.height(), 3);
        assert!(ms1.peaks().unwrap().iter().all(|p| p.ms_level == 1));
        assert_eq!(table.height(), 6);

        let none = table.filter(|level| level > 2).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_renumber_scans_densely() {
        let mut table = PeakTable::from_peaks(&sample_peaks()).unwrap();
        let mapping = table.renumber_scans_densely().unwrap();

        let expected: BTreeMap<i64, i64> = [(5, 1), (9, 2), (20, 3)].into_iter().collect();
        assert_eq!(mapping, expected);

        let scans: Vec<i64> = table.peaks().unwrap().iter().map(|p| p.scan_number).collect();
        assert_eq!(scans, vec![1, 1, 2, 2, 2, 3]);
        assert_eq!(
            table.dataframe().column("scan_number").unwrap().dtype(),
            &DataType::Int64
        );
    }

    #[test]
    fn test_optimize_types_round_trip() {
        let original = sample_peaks();
        let mut table = PeakTable::from_peaks(&original).unwrap();
        table.optimize_types().unwrap();

        let df = table.dataframe();
        assert_eq!(df.column("scan_number").unwrap().dtype(), &DataType::Int32);
        assert_eq!(df.column("mz").unwrap().dtype(), &DataType::Float32);
        assert_eq!(df.column("intensity").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("ms_level").unwrap().dtype(), &DataType::Int8);
        assert_eq!(df.column("precursor_mz").unwrap().dtype(), &DataType::Float32);
        assert_eq!(table.height(), original.len());

        let peaks = table.peaks().unwrap();
        for (before, after) in original.iter().zip(&peaks) {
            assert_eq!(before.scan_number, after.scan_number);
            let expected = round_mz(before.mz);
            let tolerance = expected.abs() * f32::EPSILON as f64;
            assert!(
                (after.mz - expected).abs() <= tolerance,
                "{} vs {}",
                after.mz,
                expected
            );
            assert_eq!(after.intensity, before.intensity.trunc());
            assert_eq!(after.precursor_mz.is_some(), before.precursor_mz.is_some());
        }
    }

    #[test]
    fn test_round_mz() {
        assert_eq!(round_mz(100.123456789), 100.12346);
        assert_eq!(round_mz(1.5), 1.5);
    }

    #[test]
    fn test_preview_and_summary() {
        let table = PeakTable::from_peaks(&sample_peaks()).unwrap();
        let rows = table.preview_rows(2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 5);
        assert_eq!(rows[0][0], "5");

        let summary = table.summary();
        assert_eq!(summary.rows, 6);
        assert_eq!(summary.columns.len(), 5);
    }
}
