//! Ordered scan list and chromatogram derived from a peak table
//!
//! A [`ScanIndex`] is built once per filtered dataset. Scan numbers are kept in
//! ascending order, which is both the chromatogram x order and the arrow-key
//! navigation order.

use std::collections::BTreeMap;

use crate::data::{Peak, PeakTable};
use crate::error::{Result, ViewerError};

/// Navigation direction through the ordered scan list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// Per-scan aggregate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanRecord {
    pub scan_number: i64,
    /// Sum of intensities of every peak in the scan, any level
    pub total_intensity: f64,
    /// Level shared by all peaks of the scan; `None` if the scan mixes levels
    pub ms_level: Option<u8>,
}

/// Scan lookup structure: records in ascending scan order plus the row
/// indices (into the peak slice it was built from) belonging to each scan
#[derive(Debug, Clone)]
pub struct ScanIndex {
    records: Vec<ScanRecord>,
    rows: Vec<Vec<usize>>,
}

impl ScanIndex {
    /// Build the index from a table
    pub fn build(table: &PeakTable) -> Result<Self> {
        Self::from_peaks(&table.peaks()?)
    }

    /// Group peaks by scan number, summing intensity per group
    pub fn from_peaks(peaks: &[Peak]) -> Result<Self> {
        profiling::scope!("ScanIndex::from_peaks");

        if peaks.is_empty() {
            return Err(ViewerError::empty("peak"));
        }

        let mut groups: BTreeMap<i64, (ScanRecord, Vec<usize>)> = BTreeMap::new();
        for (row, peak) in peaks.iter().enumerate() {
            let (record, rows) = groups.entry(peak.scan_number).or_insert_with(|| {
                (
                    ScanRecord {
                        scan_number: peak.scan_number,
                        total_intensity: 0.0,
                        ms_level: Some(peak.ms_level),
                    },
                    Vec::new(),
                )
            });
            record.total_intensity += peak.intensity;
            if record.ms_level != Some(peak.ms_level) {
                record.ms_level = None;
            }
            rows.push(row);
        }

        let (records, rows) = groups.into_values().unzip();
        Ok(Self { records, rows })
    }

    pub fn records(&self) -> &[ScanRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn scan_numbers(&self) -> impl Iterator<Item = i64> + '_ {
        self.records.iter().map(|r| r.scan_number)
    }

    pub fn first_scan(&self) -> Option<i64> {
        self.records.first().map(|r| r.scan_number)
    }

    pub fn last_scan(&self) -> Option<i64> {
        self.records.last().map(|r| r.scan_number)
    }

    /// Scan at the middle of the ordered list (`len / 2`)
    pub fn middle_scan(&self) -> Option<i64> {
        self.records.get(self.records.len() / 2).map(|r| r.scan_number)
    }

    /// Position of a scan in the ordered list
    pub fn position(&self, scan_number: i64) -> Option<usize> {
        self.records
            .binary_search_by_key(&scan_number, |r| r.scan_number)
            .ok()
    }

    pub fn contains(&self, scan_number: i64) -> bool {
        self.position(scan_number).is_some()
    }

    pub fn record(&self, scan_number: i64) -> Option<&ScanRecord> {
        self.position(scan_number).map(|i| &self.records[i])
    }

    /// Row indices of a scan's peaks, in table order
    pub fn rows(&self, scan_number: i64) -> &[usize] {
        self.position(scan_number)
            .map(|i| self.rows[i].as_slice())
            .unwrap_or(&[])
    }

    /// Chromatogram as (scan_number, total_intensity) points
    pub fn chromatogram(&self) -> Vec<[f64; 2]> {
        self.records
            .iter()
            .map(|r| [r.scan_number as f64, r.total_intensity])
            .collect()
    }

    /// Largest per-scan total intensity
    pub fn max_total_intensity(&self) -> f64 {
        self.records
            .iter()
            .map(|r| r.total_intensity)
            .fold(0.0, f64::max)
    }

    /// Whether `x` lies within the first..=last scan range
    pub fn in_bounds(&self, x: f64) -> bool {
        match (self.first_scan(), self.last_scan()) {
            (Some(first), Some(last)) => x >= first as f64 && x <= last as f64,
            _ => false,
        }
    }

    /// Resolve a continuous x coordinate to a present scan number
    ///
    /// `x` is rounded to an integer first (exact halves go to the smaller
    /// integer). If that integer is not a scan, the closest present scan wins,
    /// ties going to the smaller scan number.
    pub fn nearest_scan(&self, x: f64) -> Option<i64> {
        if !x.is_finite() || self.records.is_empty() {
            return None;
        }
        let target = (x - 0.5).ceil() as i64;

        let idx = self.records.partition_point(|r| r.scan_number < target);
        let above = self.records.get(idx).map(|r| r.scan_number);
        let below = idx
            .checked_sub(1)
            .and_then(|i| self.records.get(i))
            .map(|r| r.scan_number);

        match (below, above) {
            (_, Some(a)) if a == target => Some(a),
            (Some(b), Some(a)) => {
                if target.abs_diff(b) <= a.abs_diff(target) {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (None, None) => None,
        }
    }

    /// Latest scan at or before `from_scan` whose peaks are all of `level`
    pub fn previous_scan_at_level(&self, from_scan: i64, level: u8) -> Option<i64> {
        let end = self.records.partition_point(|r| r.scan_number <= from_scan);
        self.records[..end]
            .iter()
            .rev()
            .find(|r| r.ms_level == Some(level))
            .map(|r| r.scan_number)
    }

    /// Adjacent scan in the ordered list, `None` at either end
    pub fn neighbor(&self, scan_number: i64, direction: Direction) -> Option<i64> {
        let pos = self.position(scan_number)?;
        let next = match direction {
            Direction::Prev => pos.checked_sub(1)?,
            Direction::Next => pos + 1,
        };
        self.records.get(next).map(|r| r.scan_number)
    }
}
