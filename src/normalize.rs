//! Intensity scaling and axis-range rules
//!
//! Everything here is a pure function of the processed dataset and the scan
//! being displayed. Scale factors turn raw intensities into percent of some
//! maximum; axis helpers produce the ranges every panel is framed with.

use std::collections::BTreeMap;

use crate::constants::axis::{MS1_NOISE_FLOOR_DIVISOR, MZ_MARGIN, PERCENT_MAX, Y_HEADROOM};
use crate::data::Peak;
use crate::data::peak::{max_intensity, mz_bounds};
use crate::scan::ScanIndex;

/// How a spectrum's intensities are scaled to percent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationMode {
    /// Percent of the largest intensity in the whole processed dataset
    FixedGlobal,
    /// Percent of the scan's flagged reference peak
    FixedFamily,
    /// Percent of the largest intensity in the displayed scan
    VariablePerScan,
}

/// Closed interval on the m/z (or any) axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MzRange {
    pub min: f64,
    pub max: f64,
}

impl MzRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Window around `center` given as (below, above) half-widths
    pub fn around(center: f64, (below, above): (f64, f64)) -> Self {
        Self::new(center - below, center + above)
    }

    /// Global m/z range with margin, from the MS1 subset if there is one
    pub fn default_from(peaks: &[Peak]) -> Option<Self> {
        let ms1 = mz_bounds(peaks.iter().filter(|p| p.ms_level == 1));
        let (lo, hi) = ms1.or_else(|| mz_bounds(peaks))?;
        Some(Self::new(lo - MZ_MARGIN, hi + MZ_MARGIN))
    }

    /// Range spanned by `peaks` padded by the standard margin
    pub fn padded(peaks: &[Peak]) -> Option<Self> {
        mz_bounds(peaks).map(|(lo, hi)| Self::new(lo - MZ_MARGIN, hi + MZ_MARGIN))
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// The reference peak of one scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePeak {
    /// Row in the peak slice the flags were computed from
    pub row: usize,
    pub mz: f64,
    pub intensity: f64,
}

/// Highest peak of every scan, first occurrence on ties
#[derive(Debug, Clone, Default)]
pub struct ReferencePeaks {
    by_scan: BTreeMap<i64, ReferencePeak>,
}

impl ReferencePeaks {
    pub fn flag(peaks: &[Peak], index: &ScanIndex) -> Self {
        profiling::scope!("ReferencePeaks::flag");
        let mut by_scan = BTreeMap::new();
        for record in index.records() {
            let mut best: Option<ReferencePeak> = None;
            for &row in index.rows(record.scan_number) {
                let peak = &peaks[row];
                if best.is_none_or(|b| peak.intensity > b.intensity) {
                    best = Some(ReferencePeak {
                        row,
                        mz: peak.mz,
                        intensity: peak.intensity,
                    });
                }
            }
            if let Some(best) = best {
                by_scan.insert(record.scan_number, best);
            }
        }
        Self { by_scan }
    }

    pub fn get(&self, scan_number: i64) -> Option<&ReferencePeak> {
        self.by_scan.get(&scan_number)
    }

    /// Reference peak that appears first in table order
    pub fn first_in_table(&self) -> Option<&ReferencePeak> {
        self.by_scan.values().min_by_key(|r| r.row)
    }

    pub fn is_flagged(&self, row: usize) -> bool {
        self.by_scan.values().any(|r| r.row == row)
    }

    pub fn len(&self) -> usize {
        self.by_scan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_scan.is_empty()
    }
}

/// `100 / denominator`, `None` when the denominator is not positive
pub fn percent_factor(denominator: f64) -> Option<f64> {
    (denominator.is_finite() && denominator > 0.0).then(|| PERCENT_MAX / denominator)
}

/// Process-time scaling context of one dataset
#[derive(Debug, Clone)]
pub struct NormalizationPolicy {
    global_max: f64,
    default_range: Option<MzRange>,
    references: ReferencePeaks,
}

impl NormalizationPolicy {
    /// Compute global maximum and default m/z range; references are flagged
    /// only when `with_references` is set
    pub fn compute(peaks: &[Peak], index: &ScanIndex, with_references: bool) -> Self {
        let references = if with_references {
            ReferencePeaks::flag(peaks, index)
        } else {
            ReferencePeaks::default()
        };
        Self {
            global_max: max_intensity(peaks).unwrap_or(0.0),
            default_range: MzRange::default_from(peaks),
            references,
        }
    }

    pub fn global_max(&self) -> f64 {
        self.global_max
    }

    pub fn default_range(&self) -> Option<MzRange> {
        self.default_range
    }

    pub fn references(&self) -> &ReferencePeaks {
        &self.references
    }

    /// Factor turning raw intensities of `scan_peaks` into percent
    pub fn scale_factor(
        &self,
        mode: NormalizationMode,
        scan_number: i64,
        scan_peaks: &[Peak],
    ) -> Option<f64> {
        match mode {
            NormalizationMode::FixedGlobal => percent_factor(self.global_max),
            NormalizationMode::FixedFamily => self
                .references
                .get(scan_number)
                .and_then(|r| percent_factor(r.intensity)),
            NormalizationMode::VariablePerScan => {
                max_intensity(scan_peaks).and_then(percent_factor)
            }
        }
    }

    /// (m/z, scaled height) pairs; heights are 0 without a factor
    pub fn scale(
        &self,
        mode: NormalizationMode,
        scan_number: i64,
        scan_peaks: &[Peak],
    ) -> Vec<[f64; 2]> {
        let factor = self.scale_factor(mode, scan_number, scan_peaks);
        scan_peaks
            .iter()
            .map(|p| [p.mz, factor.map_or(0.0, |f| p.intensity * f)])
            .collect()
    }
}

/// Raw (m/z, intensity) pairs
pub fn raw_points(peaks: &[Peak]) -> Vec<[f64; 2]> {
    peaks.iter().map(|p| [p.mz, p.intensity]).collect()
}

/// `[0, max * 1.05]`
pub fn fit_y(max: f64) -> (f64, f64) {
    (0.0, max * Y_HEADROOM)
}

/// `[0, max / 10]`, showing low-abundance MS1 signal
pub fn noise_floor_y(max: f64) -> (f64, f64) {
    (0.0, max / MS1_NOISE_FLOOR_DIVISOR)
}

/// `[0, 100]`
pub fn percent_y() -> (f64, f64) {
    (0.0, PERCENT_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> (Vec<Peak>, ScanIndex) {
        let peaks = vec![
            Peak::new(1, 100.0, 40.0, 1),
            Peak::new(1, 101.0, 80.0, 1),
            Peak::new(1, 102.0, 80.0, 1),
            Peak::new(2, 150.0, 200.0, 1),
            Peak::new(2, 151.0, 50.0, 1),
            Peak::new(3, 90.0, 0.0, 1),
            Peak::new(4, 600.0, 999.0, 2),
        ];
        let index = ScanIndex::from_peaks(&peaks).unwrap();
        (peaks, index)
    }

    fn scan(peaks: &[Peak], number: i64) -> Vec<Peak> {
        peaks.iter().copied().filter(|p| p.scan_number == number).collect()
    }

    #[test]
    fn test_fixed_global_scales_dataset_max_to_100() {
        let (peaks, index) = dataset();
        let policy = NormalizationPolicy::compute(&peaks, &index, false);
        let factor = policy
            .scale_factor(NormalizationMode::FixedGlobal, 1, &scan(&peaks, 1))
            .unwrap();
        assert!((factor * policy.global_max() - 100.0).abs() < 1e-9);
        assert_eq!(policy.global_max(), 999.0);
    }

    #[test]
    fn test_variable_per_scan_own_max_is_exactly_100() {
        let (peaks, index) = dataset();
        let policy = NormalizationPolicy::compute(&peaks, &index, false);
        for number in [1, 2] {
            let scan_peaks = scan(&peaks, number);
            let scaled = policy.scale(NormalizationMode::VariablePerScan, number, &scan_peaks);
            let top = scaled.iter().map(|p| p[1]).fold(f64::MIN, f64::max);
            assert_eq!(top, 100.0);
        }
    }

    #[test]
    fn test_zero_denominator_renders_zero_heights() {
        let (peaks, index) = dataset();
        let policy = NormalizationPolicy::compute(&peaks, &index, true);
        let scan_peaks = scan(&peaks, 3);
        assert_eq!(
            policy.scale_factor(NormalizationMode::VariablePerScan, 3, &scan_peaks),
            None
        );
        let scaled = policy.scale(NormalizationMode::FixedFamily, 3, &scan_peaks);
        assert_eq!(scaled, vec![[90.0, 0.0]]);
        assert_eq!(percent_factor(-1.0), None);
        assert_eq!(percent_factor(f64::NAN), None);
    }

    #[test]
    fn test_reference_peaks_take_first_maximum() {
        let (peaks, index) = dataset();
        let refs = ReferencePeaks::flag(&peaks, &index);
        assert_eq!(refs.get(1).map(|r| r.row), Some(1));
        assert_eq!(refs.get(2).map(|r| r.mz), Some(150.0));
        assert_eq!(refs.first_in_table().map(|r| r.mz), Some(101.0));
        assert!(refs.is_flagged(3));
        assert!(!refs.is_flagged(2));
        assert_eq!(refs.len(), 4);

        let policy = NormalizationPolicy::compute(&peaks, &index, true);
        let scaled = policy.scale(NormalizationMode::FixedFamily, 1, &scan(&peaks, 1));
        assert_eq!(scaled[0], [100.0, 50.0]);
        assert_eq!(scaled[1], [101.0, 100.0]);
    }

    #[test]
    fn test_default_range_prefers_ms1() {
        let (peaks, _) = dataset();
        assert_eq!(
            MzRange::default_from(&peaks),
            Some(MzRange::new(80.0, 161.0))
        );

        let ms2_only = vec![Peak::new(1, 300.0, 1.0, 2), Peak::new(1, 400.0, 1.0, 2)];
        assert_eq!(
            MzRange::default_from(&ms2_only),
            Some(MzRange::new(290.0, 410.0))
        );
        assert_eq!(MzRange::default_from(&[]), None);
    }

    #[test]
    fn test_zoom_windows() {
        let mid = MzRange::around(500.0, (0.5, 2.5));
        assert_eq!(mid, MzRange::new(499.5, 502.5));
        assert!(mid.contains(501.0));
        assert_eq!(mid.width(), 3.0);
        assert!((fit_y(100.0).1 - 105.0).abs() < 1e-9);
        assert_eq!(noise_floor_y(1000.0), (0.0, 100.0));
        assert_eq!(percent_y(), (0.0, 100.0));
    }
}
