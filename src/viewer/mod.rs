//! The three linked-plot viewers and the events that drive them

pub mod controller;

use std::fmt;

use crate::data::PeakTable;
use crate::render::PanelId;
use crate::scan::Direction;

pub use controller::{NavigationState, ViewportController};

/// Which panel group a controller drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerMode {
    /// MS1 spectra with a per-scan Y axis next to a dataset-wide Y axis
    FixedVsVariable,
    /// MS1 spectrum at three zoom levels around the reference peak
    IsotopeZoom,
    /// Chromatogram of every level with linked MS1 and MS2 spectra
    Dda,
}

impl ViewerMode {
    pub const ALL: [ViewerMode; 3] = [
        ViewerMode::FixedVsVariable,
        ViewerMode::IsotopeZoom,
        ViewerMode::Dda,
    ];

    /// Panels in display order, chromatogram first
    pub fn panels(self) -> &'static [PanelId] {
        match self {
            ViewerMode::FixedVsVariable => &[
                PanelId::Chromatogram,
                PanelId::Ms1Variable,
                PanelId::Ms1Fixed,
            ],
            ViewerMode::IsotopeZoom => &[
                PanelId::Chromatogram,
                PanelId::Overview,
                PanelId::MidZoom,
                PanelId::HighZoom,
            ],
            ViewerMode::Dda => &[PanelId::Chromatogram, PanelId::Ms1, PanelId::Ms2],
        }
    }

    /// MS level kept at process time, `None` for all levels
    pub fn level_filter(self) -> Option<u8> {
        match self {
            ViewerMode::FixedVsVariable | ViewerMode::IsotopeZoom => Some(1),
            ViewerMode::Dda => None,
        }
    }

    pub fn level_label(self) -> &'static str {
        match self {
            ViewerMode::FixedVsVariable | ViewerMode::IsotopeZoom => "MS1",
            ViewerMode::Dda => "MS1/MS2",
        }
    }

    pub fn renumbers_scans(self) -> bool {
        self.level_filter().is_some()
    }

    pub fn flags_reference_peaks(self) -> bool {
        self == ViewerMode::IsotopeZoom
    }

    pub fn previews_middle_scan(self) -> bool {
        self.level_filter().is_some()
    }

    pub fn tab_title(self) -> &'static str {
        match self {
            ViewerMode::FixedVsVariable => "Fixed vs Variable Y",
            ViewerMode::IsotopeZoom => "Isotope Zoom",
            ViewerMode::Dda => "MS1 / MS2 (DDA)",
        }
    }

    pub fn chromatogram_title(self) -> &'static str {
        match self {
            ViewerMode::Dda => "Chromatogram (All MS Levels)",
            _ => "MS1 Chromatogram",
        }
    }

    /// Title a panel shows before anything was processed
    pub fn placeholder_title(self, panel: PanelId) -> &'static str {
        match panel {
            PanelId::Chromatogram => self.chromatogram_title(),
            PanelId::Ms1Variable => "MS1 Spectrum (Variable Height)",
            PanelId::Ms1Fixed => "MS1 Spectrum (Fixed Height)",
            PanelId::Overview => "MS1 Spectrum (Overview)",
            PanelId::MidZoom => "MS1 Spectrum (Isotope Pattern)",
            PanelId::HighZoom => "MS1 Spectrum (Peak Shape)",
            PanelId::Ms1 => "MS1 Spectrum",
            PanelId::Ms2 => "MS2 Spectrum",
        }
    }
}

impl fmt::Display for ViewerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewerMode::FixedVsVariable => "fixed-vs-variable",
            ViewerMode::IsotopeZoom => "isotope-zoom",
            ViewerMode::Dda => "dda",
        })
    }
}

/// Lifecycle of a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Empty,
    Ready,
    ScanSelected,
}

/// Raw user input forwarded to a controller
#[derive(Debug, Clone)]
pub enum ViewerEvent {
    SetData(PeakTable),
    Process,
    Click { panel: PanelId, x: f64, y: f64 },
    Key(Direction),
}
