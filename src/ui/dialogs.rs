use eframe::egui;

use crate::app::{MsScopeApp, Tab};

pub fn render_error_dialog(app: &mut MsScopeApp, ctx: &egui::Context) {
    let Some(error) = &app.error else {
        return;
    };
    let mut dismissed = false;
    egui::Window::new(format!("⚠ {}", error.title))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(&error.message);
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });
    if dismissed {
        app.error = None;
    }
}

/// Offer to load a freshly converted file
pub fn render_confirm_dialog(app: &mut MsScopeApp, ctx: &egui::Context) {
    let Some(output) = app.session.pending_output() else {
        return;
    };
    let message = format!("Conversion finished. Load {} now?", output.display());
    let mut load = false;
    let mut dismiss = false;
    egui::Window::new("Conversion complete")
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(message);
            ui.horizontal(|ui| {
                load = ui.button("Load").clicked();
                dismiss = ui.button("Not now").clicked();
            });
        });
    if load {
        app.load_converted();
        app.tab = Tab::Loader;
    } else if dismiss {
        app.session.dismiss_converted();
    }
}

pub fn render_help_dialog(app: &mut MsScopeApp, ctx: &egui::Context) {
    if !app.show_help {
        return;
    }
    egui::Window::new("⌨ Keyboard Shortcuts")
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .collapsible(false)
        .show(ctx, |ui| {
            ui.heading("Scans");
            ui.label("← / → - Previous / next scan");
            ui.label("Click chromatogram - Select nearest scan");

            ui.separator();
            ui.heading("Plots");
            ui.label("Scroll - Zoom");
            ui.label("Drag - Pan view");
            ui.label("Right-drag - Box zoom");
            ui.label("Double-click - Reset view");

            ui.separator();
            ui.heading("General");
            ui.label("T - Toggle dark/light theme");
            ui.label("H / F1 - Toggle help");
            ui.label("ESC - Close help");

            ui.separator();
            if ui.button("Close").clicked() {
                app.show_help = false;
            }
        });
}

pub fn render_status_bar(app: &MsScopeApp, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        match app.session.table() {
            Some(table) => {
                if let Some(name) = table.file_path().and_then(|p| p.file_name()) {
                    ui.label(format!("📁 {}", name.to_string_lossy()));
                    ui.separator();
                }
                ui.label(format!("Rows: {} | Cols: {}", table.height(), table.width()));
            }
            None => {
                ui.weak("No dataset");
            }
        }
        if app.session.is_converting() {
            ui.separator();
            ui.spinner();
            ui.label("Converting mzML");
        }
        if let Some(last) = app.session.log().last() {
            ui.separator();
            ui.weak(last);
        }
    });
}
