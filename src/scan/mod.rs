pub mod index;

pub use index::{Direction, ScanIndex, ScanRecord};
