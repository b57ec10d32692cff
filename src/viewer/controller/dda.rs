//! Data-dependent acquisition view: clicked scan's MS2 next to its
//! governing MS1 scan, with the precursor isolation window highlighted

use super::{ViewportController, fresh_plan, range_of};
use crate::constants::isolation::{HALF_WIDTH, PRECURSOR_INSET};
use crate::data::peak::max_intensity;
use crate::normalize::{self, MzRange};
use crate::render::{Color, OverlayCategory, OverlayShape, PanelId, RenderPlan, RenderUpdate};

/// `[p - 1.5, p + 1.5]`
pub fn isolation_window(precursor_mz: f64) -> (f64, f64) {
    (precursor_mz - HALF_WIDTH, precursor_mz + HALF_WIDTH)
}

/// Isolation window inset by 1.45 on each side, 0.1 wide
pub fn precursor_band(precursor_mz: f64) -> (f64, f64) {
    let (lo, hi) = isolation_window(precursor_mz);
    (lo + PRECURSOR_INSET, hi - PRECURSOR_INSET)
}

impl ViewportController {
    pub(super) fn setup_dda(&mut self, update: &mut RenderUpdate) {
        let mz_range = self.processed.as_ref().and_then(|p| p.mz_range());
        for panel in [PanelId::Ms1, PanelId::Ms2] {
            let mut plan = fresh_plan(&mut self.overlays, panel);
            plan.title(self.mode.placeholder_title(panel))
                .axis_labels("m/z", "Intensity");
            if let Some(range) = mz_range {
                plan.x_range(range);
            }
            update.push(plan);
        }
    }

    pub(super) fn render_dda(&mut self, scan_number: i64, update: &mut RenderUpdate) -> String {
        let Some(data) = self.processed.as_ref() else {
            return String::new();
        };
        let mz_range = data.mz_range();

        // MS1 panel: governing scan, or keep whatever is shown
        let ms1_scan = data.index.previous_scan_at_level(scan_number, 1);
        let mut ms1_plan = RenderPlan::new(PanelId::Ms1);
        match ms1_scan {
            Some(ms1_scan) => {
                let ms1_peaks: Vec<_> = data
                    .scan_peaks(ms1_scan)
                    .into_iter()
                    .filter(|p| p.ms_level == 1)
                    .collect();
                ms1_plan = fresh_plan(&mut self.overlays, PanelId::Ms1);
                ms1_plan
                    .title(format!("MS1 Spectrum - Scan {}", ms1_scan))
                    .axis_labels("m/z", "Intensity")
                    .stems(normalize::raw_points(&ms1_peaks), Color::BLUE)
                    .y_range(normalize::noise_floor_y(
                        max_intensity(&ms1_peaks).unwrap_or(0.0),
                    ));
                if let Some(range) = mz_range {
                    ms1_plan.x_range(range);
                }
                self.nav.shown_ms1_scan = Some(ms1_scan);
            }
            None if self.nav.shown_ms1_scan.is_none() => {
                ms1_plan = fresh_plan(&mut self.overlays, PanelId::Ms1);
                ms1_plan
                    .title("MS1 Spectrum - No MS1 data available")
                    .axis_labels("m/z", "Intensity");
                if let Some(range) = mz_range {
                    ms1_plan.x_range(range);
                }
            }
            None => {}
        }
        self.overlays
            .clear(&mut ms1_plan, OverlayCategory::Ms1Highlight);

        // MS2 panel: the clicked scan itself
        let ms2_peaks: Vec<_> = data
            .scan_peaks(scan_number)
            .into_iter()
            .filter(|p| p.ms_level == 2)
            .collect();
        let mut ms2_plan = fresh_plan(&mut self.overlays, PanelId::Ms2);
        self.nav.last_highlighted_precursor_window = None;

        if ms2_peaks.is_empty() {
            ms2_plan
                .title(format!("MS2 Spectrum - Scan {} (No MS2 data)", scan_number))
                .axis_labels("m/z", "Intensity");
            if let Some(range) = mz_range {
                ms2_plan.x_range(range);
            }
        } else {
            ms2_plan
                .title(format!("MS2 Spectrum - Scan {}", scan_number))
                .axis_labels("m/z", "Intensity")
                .stems(normalize::raw_points(&ms2_peaks), Color::BLACK)
                .y_range(normalize::fit_y(max_intensity(&ms2_peaks).unwrap_or(0.0)));
            if let Some(range) = MzRange::padded(&ms2_peaks) {
                ms2_plan.x_range(range_of(range));
            }

            if let Some(precursor) = ms2_peaks.iter().find_map(|p| p.precursor_mz) {
                let (lo, hi) = precursor_band(precursor);
                self.overlays.replace(
                    &mut ms2_plan,
                    OverlayCategory::Ms2Highlight,
                    OverlayShape::span(lo, hi, Color::RED),
                );
                let window = isolation_window(precursor);
                // Band follows whichever MS1 spectrum is on screen, held or fresh
                if self.nav.shown_ms1_scan.is_some() {
                    self.overlays.replace(
                        &mut ms1_plan,
                        OverlayCategory::Ms1Highlight,
                        OverlayShape::span(window.0, window.1, Color::YELLOW),
                    );
                }
                self.nav.last_highlighted_precursor_window = Some(window);
            }
        }

        update.push(ms1_plan);
        update.push(ms2_plan);

        let ms1_info = match ms1_scan {
            Some(scan) => format!("MS1: Scan {}", scan),
            None => "MS1: none".to_string(),
        };
        let ms2_info = if ms2_peaks.is_empty() {
            "MS2: none".to_string()
        } else {
            format!("MS2: Scan {}", scan_number)
        };
        format!("{}, {} (use ←/→ to move)", ms1_info, ms2_info)
    }
}
