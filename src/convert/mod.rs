//! Raw instrument output (mzML) to peak-table conversion

pub mod mzml;
pub mod worker;

pub use worker::{ConversionEvent, ConversionJob, ConversionSummary, output_path, timestamped};
