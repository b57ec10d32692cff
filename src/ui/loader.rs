use eframe::egui;

use super::data_table::{render_preview_table, render_summary_table};
use crate::app::MsScopeApp;
use crate::constants::loader::PREVIEW_ROWS;

/// File pickers, conversion controls, dataset summary and the activity log
pub fn render_loader(app: &mut MsScopeApp, ui: &mut egui::Ui) {
    profiling::scope!("render_loader");

    ui.horizontal(|ui| {
        if ui.button("📂 Open peak table").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("Peak tables", &["parquet", "csv"])
                .pick_file()
            {
                app.load_file(&path);
            }
        }

        if !app.settings.recent_files.is_empty() {
            let mut chosen = None;
            egui::ComboBox::from_id_salt("recent_files")
                .selected_text("Recent")
                .show_ui(ui, |ui| {
                    for path in &app.settings.recent_files {
                        let name = path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_else(|| path.display().to_string());
                        if ui
                            .button(name)
                            .on_hover_text(path.display().to_string())
                            .clicked()
                        {
                            chosen = Some(path.clone());
                        }
                    }
                });
            if let Some(path) = chosen {
                app.load_file(&path);
            }
        }

        if ui
            .checkbox(&mut app.settings.optimize_on_load, "Optimize column types")
            .on_hover_text("Narrow numeric types after loading to save memory")
            .changed()
        {
            app.persist_settings();
        }

        ui.separator();

        let converting = app.session.is_converting();
        if ui
            .add_enabled(!converting, egui::Button::new("⚙ Convert mzML"))
            .clicked()
        {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("mzML", &["mzML", "mzml"])
                .pick_file()
            {
                app.start_conversion(path);
            }
        }
        if converting {
            ui.spinner();
            ui.label("Converting…");
        }
    });

    ui.separator();

    match (app.session.table(), app.session.summary()) {
        (Some(table), Some(summary)) => {
            ui.horizontal(|ui| {
                if let Some(path) = table.file_path() {
                    ui.label(format!(
                        "📄 {}",
                        path.file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default()
                    ))
                    .on_hover_text(path.display().to_string());
                    ui.separator();
                }
                ui.label(format!(
                    "{} rows × {} columns, ~{:.1} MB",
                    summary.rows,
                    summary.columns.len(),
                    summary.estimated_megabytes()
                ));
                let with_nulls: Vec<&str> = summary
                    .columns_with_nulls()
                    .map(|c| c.name.as_str())
                    .collect();
                if !with_nulls.is_empty() {
                    ui.separator();
                    ui.colored_label(
                        egui::Color32::from_rgb(200, 120, 0),
                        format!("Nulls in: {}", with_nulls.join(", ")),
                    );
                }
            });

            egui::CollapsingHeader::new("Column summary")
                .default_open(true)
                .show(ui, |ui| render_summary_table(ui, summary));

            egui::CollapsingHeader::new(format!("Preview (first {} rows)", PREVIEW_ROWS))
                .default_open(true)
                .show(ui, |ui| {
                    ui.set_max_height(ui.available_height() * 0.6);
                    render_preview_table(ui, table, PREVIEW_ROWS);
                });
        }
        _ => {
            ui.vertical_centered(|ui| {
                ui.add_space(24.0);
                ui.heading("No data loaded");
                ui.label("Open a Parquet or CSV peak table, convert an mzML file, or drop a file here");
            });
        }
    }

    ui.separator();
    render_log(app, ui);
}

fn render_log(app: &mut MsScopeApp, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        ui.strong("Log");
        if ui.small_button("Copy").clicked() {
            let text = app.session.log().join("\n");
            match arboard::Clipboard::new().and_then(|mut c| c.set_text(text)) {
                Ok(()) => tracing::debug!("log copied to clipboard"),
                Err(e) => tracing::warn!("clipboard unavailable: {}", e),
            }
        }
        if ui.small_button("Clear").clicked() {
            app.session.clear_log();
        }
    });

    egui::ScrollArea::vertical()
        .id_salt("log")
        .stick_to_bottom(true)
        .auto_shrink([false, true])
        .show(ui, |ui| {
            for line in app.session.log() {
                ui.monospace(line);
            }
        });
}
