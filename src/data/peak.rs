/// One row of a peak table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub scan_number: i64,
    pub mz: f64,
    pub intensity: f64,
    pub ms_level: u8,
    /// Selected precursor m/z, only for MS2 peaks
    pub precursor_mz: Option<f64>,
}

impl Peak {
    pub fn new(scan_number: i64, mz: f64, intensity: f64, ms_level: u8) -> Self {
        Self {
            scan_number,
            mz,
            intensity,
            ms_level,
            precursor_mz: None,
        }
    }

    pub fn with_precursor(mut self, precursor_mz: f64) -> Self {
        self.precursor_mz = Some(precursor_mz);
        self
    }
}

/// Highest intensity among the given peaks, `None` when empty
pub fn max_intensity<'a>(peaks: impl IntoIterator<Item = &'a Peak>) -> Option<f64> {
    peaks
        .into_iter()
        .map(|p| p.intensity)
        .fold(None, |acc, v| match acc {
            Some(m) if m >= v => Some(m),
            _ => Some(v),
        })
}

/// (min, max) m/z among the given peaks, `None` when empty
pub fn mz_bounds<'a>(peaks: impl IntoIterator<Item = &'a Peak>) -> Option<(f64, f64)> {
    peaks.into_iter().fold(None, |acc, p| match acc {
        None => Some((p.mz, p.mz)),
        Some((lo, hi)) => Some((lo.min(p.mz), hi.max(p.mz))),
    })
}
