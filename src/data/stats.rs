use polars::prelude::*;

/// Statistics of one numeric column
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Description of a single column
#[derive(Debug, Clone)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
    /// `None` for non-numeric columns
    pub stats: Option<Stats>,
}

/// Shape, types and statistics of a loaded table
#[derive(Debug, Clone)]
pub struct DatasetSummary {
    pub rows: usize,
    pub estimated_bytes: usize,
    pub columns: Vec<ColumnSummary>,
}

impl DatasetSummary {
    pub fn estimated_megabytes(&self) -> f64 {
        self.estimated_bytes as f64 / 1024.0 / 1024.0
    }

    /// Columns that contain at least one null
    pub fn columns_with_nulls(&self) -> impl Iterator<Item = &ColumnSummary> {
        self.columns.iter().filter(|c| c.null_count > 0)
    }
}

/// Calculate statistics from a Series using polars; nulls are skipped
pub fn calculate_stats(series: &Series) -> Stats {
    let series_f64 = match series.cast(&DataType::Float64) {
        Ok(s) => s,
        Err(_) => return Stats::default(),
    };

    let chunked = match series_f64.f64() {
        Ok(c) => c,
        Err(_) => return Stats::default(),
    };

    let count = chunked.len() - chunked.null_count();
    if count == 0 {
        return Stats::default();
    }

    Stats {
        mean: chunked.mean().unwrap_or(0.0),
        std_dev: chunked.std(1).unwrap_or(0.0), // ddof=1 for sample std dev
        median: chunked.median().unwrap_or(0.0),
        min: chunked.min().unwrap_or(0.0),
        max: chunked.max().unwrap_or(0.0),
        count,
    }
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Summarize every column of a DataFrame
pub fn summarize(df: &DataFrame) -> DatasetSummary {
    profiling::scope!("summarize");

    let columns = df
        .get_columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series();
            let dtype = series.dtype();
            ColumnSummary {
                name: series.name().to_string(),
                dtype: dtype.to_string(),
                null_count: series.null_count(),
                stats: is_numeric(dtype).then(|| calculate_stats(series)),
            }
        })
        .collect();

    DatasetSummary {
        rows: df.height(),
        estimated_bytes: df.estimated_size(),
        columns,
    }
}
