use eframe::egui;

use super::plot::paint_canvas;
use crate::app::MsScopeApp;
use crate::constants::layout::{CHROMATOGRAM_HEIGHT, DESCRIPTION_WIDTH, MIN_SPECTRUM_HEIGHT};
use crate::render::PanelId;
use crate::viewer::{ControllerState, ViewerEvent, ViewerMode};

fn process_label(mode: ViewerMode) -> &'static str {
    match mode.level_filter() {
        Some(_) => "Process MS1 Data",
        None => "Process Data",
    }
}

fn description(mode: ViewerMode) -> &'static str {
    match mode {
        ViewerMode::FixedVsVariable => {
            "Left: each scan scaled to its own maximum. Right: every scan on the \
             dataset-wide maximum, so intensities compare across scans."
        }
        ViewerMode::IsotopeZoom => {
            "Overview, isotope pattern and peak shape around the most intense MS1 \
             peak of the selected scan."
        }
        ViewerMode::Dda => {
            "Click the chromatogram to select a scan. MS2 scans show their spectrum \
             with the governing MS1 scan; the yellow band marks the isolation window \
             and the red band the precursor."
        }
    }
}

/// Paint `panel` and turn a click on it into a viewer event
fn panel(app: &mut MsScopeApp, mode: ViewerMode, panel: PanelId, ui: &mut egui::Ui, height: f32) {
    let Some(canvas) = app
        .surfaces
        .get(&mode)
        .and_then(|s| s.panel_ref(panel))
        .cloned()
    else {
        ui.weak(mode.placeholder_title(panel));
        return;
    };
    let key = (mode, panel);
    let apply_bounds = app.painted_revisions.get(&key) != Some(&canvas.revision);
    app.painted_revisions.insert(key, canvas.revision);

    let id = format!("{}-{}", mode, panel);
    if let Some((x, y)) = paint_canvas(ui, id, &canvas, height, apply_bounds) {
        tracing::debug!(%mode, %panel, x, y, "plot clicked");
        app.dispatch(mode, ViewerEvent::Click { panel, x, y });
    }
}

/// Toolbar, chromatogram and the spectrum panels of one viewer
pub fn render_viewer(app: &mut MsScopeApp, mode: ViewerMode, ui: &mut egui::Ui) {
    profiling::scope!("render_viewer");

    let state = app
        .session
        .controller(mode)
        .map(|c| c.state())
        .unwrap_or(ControllerState::Empty);

    ui.horizontal(|ui| {
        let enabled = state != ControllerState::Empty;
        if ui
            .add_enabled(enabled, egui::Button::new(process_label(mode)))
            .on_disabled_hover_text("Load a peak table first")
            .clicked()
        {
            app.dispatch(mode, ViewerEvent::Process);
        }
        ui.separator();
        let status = app
            .surfaces
            .get(&mode)
            .and_then(|s| s.status())
            .unwrap_or("Load a peak table in the Data Loader tab");
        ui.label(status);
    });
    ui.separator();

    if mode == ViewerMode::Dda {
        egui::SidePanel::right(format!("{}-description", mode))
            .exact_width(DESCRIPTION_WIDTH)
            .resizable(false)
            .show_inside(ui, |ui| {
                ui.heading("DDA view");
                ui.label(description(mode));
                ui.add_space(8.0);
                ui.label("←/→ move between scans.");
            });
    } else {
        ui.label(description(mode));
    }

    egui::ScrollArea::vertical()
        .id_salt(format!("{}-scroll", mode))
        .show(ui, |ui| {
            panel(app, mode, PanelId::Chromatogram, ui, CHROMATOGRAM_HEIGHT);
            ui.separator();

            let spectra: Vec<PanelId> = mode.panels()[1..].to_vec();
            let height = (ui.available_height() - 40.0).max(MIN_SPECTRUM_HEIGHT);
            ui.columns(spectra.len(), |columns| {
                for (column, &id) in columns.iter_mut().zip(&spectra) {
                    panel(app, mode, id, column, height);
                }
            });
        });
}
