//! Side-by-side MS1 spectra: per-scan Y axis vs dataset-wide Y axis

use super::{ViewportController, fresh_plan};
use crate::data::peak::max_intensity;
use crate::normalize::{self, NormalizationMode};
use crate::render::{Color, PanelId, RenderUpdate};

const PERCENT_LABEL: &str = "Intensity (%)";

/// Two-decimal scientific notation with a signed, two-digit exponent
/// (`5.00e+01`)
fn scientific(value: f64) -> String {
    let formatted = format!("{:.2e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => format!(
                "{}e{}{:02}",
                mantissa,
                if exp < 0 { '-' } else { '+' },
                exp.abs()
            ),
            Err(_) => formatted,
        },
        None => formatted,
    }
}

impl ViewportController {
    pub(super) fn setup_fixed_variable(&mut self, update: &mut RenderUpdate) {
        let mz_range = self.processed.as_ref().and_then(|p| p.mz_range());
        for panel in [PanelId::Ms1Variable, PanelId::Ms1Fixed] {
            let mut plan = fresh_plan(&mut self.overlays, panel);
            plan.title(self.mode.placeholder_title(panel))
                .axis_labels("m/z", PERCENT_LABEL)
                .y_range(normalize::percent_y());
            if let Some(range) = mz_range {
                plan.x_range(range);
            }
            update.push(plan);
        }
    }

    pub(super) fn render_fixed_variable(
        &mut self,
        scan_number: i64,
        update: &mut RenderUpdate,
    ) -> String {
        let Some(data) = self.processed.as_ref() else {
            return String::new();
        };
        let peaks = data.scan_peaks(scan_number);
        let scan_max = max_intensity(&peaks).unwrap_or(0.0);

        let panels = [
            (
                PanelId::Ms1Variable,
                NormalizationMode::VariablePerScan,
                "Y Axis Auto-Scaled",
                format!("Max: {}", scientific(scan_max)),
            ),
            (
                PanelId::Ms1Fixed,
                NormalizationMode::FixedGlobal,
                "Y Axis Fixed",
                format!("Global Max: {}", scientific(data.policy.global_max())),
            ),
        ];

        for (panel, mode, title, annotation) in panels {
            let mut plan = fresh_plan(&mut self.overlays, panel);
            plan.title(format!("{} - Scan {}", title, scan_number))
                .axis_labels("m/z", PERCENT_LABEL)
                .stems(data.policy.scale(mode, scan_number, &peaks), Color::BLACK)
                .y_range(normalize::percent_y())
                .annotation(annotation);
            if let Some(range) = data.mz_range() {
                plan.x_range(range);
            }
            update.push(plan);
        }

        format!("Showing Scan {} (use ←/→ to move)", scan_number)
    }
}

#[cfg(test)]
mod tests {
    use super::scientific;
    use crate::data::{Peak, PeakTable};
    use crate::render::{CanvasSurface, PanelId, RenderSurface};
    use crate::viewer::{ViewerMode, ViewportController};

    #[test]
    fn test_scientific_exponent_is_signed_and_padded() {
        assert_eq!(scientific(50.0), "5.00e+01");
        assert_eq!(scientific(123456.0), "1.23e+05");
        assert_eq!(scientific(0.00042), "4.20e-04");
        assert_eq!(scientific(0.0), "0.00e+00");
        assert_eq!(scientific(3.2e120), "3.20e+120");
    }

    fn processed() -> (ViewportController, CanvasSurface) {
        let peaks = vec![
            Peak::new(7, 100.0, 50.0, 1),
            Peak::new(7, 110.0, 25.0, 1),
            Peak::new(8, 120.0, 200.0, 1),
            Peak::new(8, 130.0, 1000.0, 2),
        ];
        let mut controller = ViewportController::new(ViewerMode::FixedVsVariable);
        let mut surface = CanvasSurface::new();
        surface.apply(&controller.set_data(PeakTable::from_peaks(&peaks).unwrap()));
        surface.apply(&controller.process().unwrap());
        (controller, surface)
    }

    #[test]
    fn test_variable_and_fixed_heights() {
        let (mut controller, mut surface) = processed();
        surface.apply(&controller.select_scan(1));

        let variable = surface.panel(PanelId::Ms1Variable);
        let heights: Vec<f64> = variable.stem_points().map(|p| p[1]).collect();
        assert_eq!(heights, vec![100.0, 50.0]);
        assert_eq!(variable.annotation.as_deref(), Some("Max: 5.00e+01"));
        assert_eq!(variable.y_range, Some((0.0, 100.0)));
        assert_eq!(variable.x_range, Some((90.0, 130.0)));
        assert_eq!(variable.title, "Y Axis Auto-Scaled - Scan 1");

        // MS2 rows were filtered away, so the global max is 200
        let fixed = surface.panel(PanelId::Ms1Fixed);
        let heights: Vec<f64> = fixed.stem_points().map(|p| p[1]).collect();
        assert_eq!(heights, vec![25.0, 12.5]);
        assert_eq!(fixed.annotation.as_deref(), Some("Global Max: 2.00e+02"));
    }

    #[test]
    fn test_reselecting_replaces_series() {
        let (mut controller, mut surface) = processed();
        surface.apply(&controller.select_scan(2));
        surface.apply(&controller.select_scan(1));
        surface.apply(&controller.select_scan(2));

        let fixed = surface.panel(PanelId::Ms1Fixed);
        assert_eq!(fixed.series.len(), 1);
        assert_eq!(fixed.stem_points().count(), 1);
        assert_eq!(surface.status(), Some("Showing Scan 2 (use ←/→ to move)"));
    }
}
