//! Application-wide constants and default values
//!
//! Axis margins, zoom widths and isolation-window offsets are domain
//! conventions of the viewer and are kept here as named values.

/// Column names of the peak table schema
pub mod columns {
    pub const SCAN_NUMBER: &str = "scan_number";
    pub const MZ: &str = "mz";
    pub const INTENSITY: &str = "intensity";
    pub const MS_LEVEL: &str = "ms_level";
    pub const PRECURSOR_MZ: &str = "precursor_mz";

    /// Columns every processed view needs
    pub const REQUIRED: [&str; 4] = [SCAN_NUMBER, INTENSITY, MS_LEVEL, MZ];
}

/// Numeric precision used when re-typing a table
pub mod precision {
    /// Decimal places kept for m/z values before narrowing to f32
    pub const MZ_DECIMALS: i32 = 5;
}

/// Axis range rules
pub mod axis {
    /// Margin added on both sides of the global m/z range
    pub const MZ_MARGIN: f64 = 10.0;

    /// Headroom factor for "fit to data" Y axes
    pub const Y_HEADROOM: f64 = 1.05;

    /// Upper bound of percent-scaled Y axes
    pub const PERCENT_MAX: f64 = 100.0;

    /// Y ceiling of the mid-zoom isotope panel
    pub const MID_ZOOM_PERCENT_MAX: f64 = 15.0;

    /// DDA MS1 panel shows up to a tenth of the scan's maximum (noise floor view)
    pub const MS1_NOISE_FLOOR_DIVISOR: f64 = 10.0;
}

/// Zoom windows around a reference m/z, as (below, above) half-widths
pub mod zoom {
    /// Region of the overview panel highlighted as "zoomed"
    pub const OVERVIEW_REGION: (f64, f64) = (1.0, 3.0);

    /// Mid-zoom panel range (isotope pattern)
    pub const MID_WINDOW: (f64, f64) = (0.5, 2.5);

    /// Band drawn on the mid-zoom panel marking the high-zoom range
    pub const MID_BAND: (f64, f64) = (0.02, 0.02);

    /// High-zoom panel range (peak shape / resolution)
    pub const HIGH_WINDOW: (f64, f64) = (0.02, 0.02);

    /// High-zoom framing before any scan is selected
    pub const HIGH_INITIAL_WINDOW: (f64, f64) = (0.1, 0.5);

    /// Tick label precision on the high-zoom panel
    pub const HIGH_TICK_DECIMALS: usize = 3;
}

/// Precursor isolation window drawing
pub mod isolation {
    /// Half-width of the isolation window drawn on the MS1 panel
    pub const HALF_WIDTH: f64 = 1.5;

    /// Inset applied to each side of the window for the MS2 precursor band
    pub const PRECURSOR_INSET: f64 = 1.45;
}

/// Performance and optimization constants
pub mod performance {
    /// Point threshold before applying LTTB downsampling to line series
    pub const DOWNSAMPLE_THRESHOLD: usize = 5000;

    /// Maximum number of recent files to track
    pub const MAX_RECENT_FILES: usize = 10;
}

/// Data loader tab
pub mod loader {
    /// Rows shown in the table preview
    pub const PREVIEW_ROWS: usize = 100;
}

/// UI layout defaults
pub mod layout {
    /// Height of the chromatogram plot
    pub const CHROMATOGRAM_HEIGHT: f32 = 220.0;

    /// Minimum height of a spectrum plot
    pub const MIN_SPECTRUM_HEIGHT: f32 = 200.0;

    /// Width of the DDA description side panel
    pub const DESCRIPTION_WIDTH: f32 = 260.0;

    /// Table header row height
    pub const TABLE_HEADER_HEIGHT: f32 = 20.0;

    /// Table body row height
    pub const TABLE_ROW_HEIGHT: f32 = 18.0;
}

/// Configuration file paths
pub mod config {
    /// Settings file name
    pub const SETTINGS_FILE: &str = "ms-scope.json";
}
