//! One MS1 scan at three zoom levels around its reference peak

use super::{ViewportController, fresh_plan, range_of};
use crate::constants::axis::MID_ZOOM_PERCENT_MAX;
use crate::constants::zoom::{
    HIGH_INITIAL_WINDOW, HIGH_TICK_DECIMALS, HIGH_WINDOW, MID_BAND, MID_WINDOW, OVERVIEW_REGION,
};
use crate::normalize::{self, MzRange, NormalizationMode};
use crate::render::{Color, OverlayCategory, OverlayShape, PanelId, RenderUpdate};

const PERCENT_LABEL: &str = "Intensity (%)";

impl ViewportController {
    pub(super) fn setup_isotope(&mut self, update: &mut RenderUpdate) {
        let Some(data) = self.processed.as_ref() else {
            return;
        };
        let center = data.policy.references().first_in_table().map(|r| r.mz);

        let mut overview = fresh_plan(&mut self.overlays, PanelId::Overview);
        overview
            .title(self.mode.placeholder_title(PanelId::Overview))
            .axis_labels("m/z", PERCENT_LABEL)
            .y_range(normalize::percent_y());
        if let Some(range) = data.mz_range() {
            overview.x_range(range);
        }
        update.push(overview);

        let mut mid = fresh_plan(&mut self.overlays, PanelId::MidZoom);
        mid.title(self.mode.placeholder_title(PanelId::MidZoom))
            .axis_labels("m/z", PERCENT_LABEL)
            .y_range((0.0, MID_ZOOM_PERCENT_MAX));
        if let Some(c) = center {
            mid.x_range(range_of(MzRange::around(c, MID_WINDOW)));
        }
        update.push(mid);

        let mut high = fresh_plan(&mut self.overlays, PanelId::HighZoom);
        high.title(self.mode.placeholder_title(PanelId::HighZoom))
            .axis_labels("m/z", PERCENT_LABEL)
            .y_range(normalize::percent_y());
        if let Some(c) = center {
            high.x_range(range_of(MzRange::around(c, HIGH_INITIAL_WINDOW)));
        }
        update.push(high);
    }

    pub(super) fn render_isotope(&mut self, scan_number: i64, update: &mut RenderUpdate) -> String {
        let Some(data) = self.processed.as_ref() else {
            return String::new();
        };
        let peaks = data.scan_peaks(scan_number);
        let Some(center) = data.policy.references().get(scan_number).map(|r| r.mz) else {
            return format!("Scan {} has no peaks", scan_number);
        };

        let mut overview = fresh_plan(&mut self.overlays, PanelId::Overview);
        overview
            .title(format!("Full Spectrum - Scan {}", scan_number))
            .axis_labels("m/z", PERCENT_LABEL)
            .stems(
                data.policy
                    .scale(NormalizationMode::VariablePerScan, scan_number, &peaks),
                Color::BLACK,
            )
            .y_range(normalize::percent_y());
        if let Some(range) = data.mz_range() {
            overview.x_range(range);
        }
        let region = MzRange::around(center, OVERVIEW_REGION);
        self.overlays.replace(
            &mut overview,
            OverlayCategory::ZoomRegion,
            OverlayShape::span(region.min, region.max, Color::YELLOW),
        );
        update.push(overview);

        let family = data
            .policy
            .scale(NormalizationMode::FixedFamily, scan_number, &peaks);

        let mut mid = fresh_plan(&mut self.overlays, PanelId::MidZoom);
        mid.title(format!("Isotope Pattern - Scan {}", scan_number))
            .axis_labels("m/z", PERCENT_LABEL)
            .stems(family.clone(), Color::BLACK)
            .x_range(range_of(MzRange::around(center, MID_WINDOW)))
            .y_range((0.0, MID_ZOOM_PERCENT_MAX));
        let band = MzRange::around(center, MID_BAND);
        self.overlays.replace(
            &mut mid,
            OverlayCategory::ZoomRegion,
            OverlayShape::span(band.min, band.max, Color::YELLOW),
        );
        update.push(mid);

        let window = MzRange::around(center, HIGH_WINDOW);
        // Line series are drawn and culled as x-sorted polylines
        let mut profile = family;
        profile.sort_by(|a, b| a[0].total_cmp(&b[0]));
        let mut high = fresh_plan(&mut self.overlays, PanelId::HighZoom);
        high.title(format!("Peak Shape - Scan {}", scan_number))
            .axis_labels("m/z", PERCENT_LABEL)
            .line(profile, Color::BLACK)
            .x_range(range_of(window))
            .ticks(
                vec![window.min, window.midpoint(), window.max],
                HIGH_TICK_DECIMALS,
            )
            .y_range(normalize::percent_y());
        update.push(high);

        format!(
            "Showing Scan {} - reference m/z {:.4} (use ←/→ to move)",
            scan_number, center
        )
    }
}
