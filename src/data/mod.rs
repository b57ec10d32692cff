pub mod peak;
pub mod stats;
pub mod table;

// Re-export key types for convenience
pub use peak::Peak;
pub use stats::{ColumnSummary, DatasetSummary, Stats};
pub use table::PeakTable;
