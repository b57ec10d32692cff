use eframe::egui;
use egui_extras::{Column, TableBuilder};

use crate::constants::layout::{TABLE_HEADER_HEIGHT, TABLE_ROW_HEIGHT};
use crate::data::{DatasetSummary, PeakTable};

fn fmt_stat(value: f64) -> String {
    if value.abs() >= 1e5 || (value != 0.0 && value.abs() < 1e-3) {
        format!("{:.3e}", value)
    } else {
        format!("{:.4}", value)
    }
}

/// Per-column dtype, null count and statistics
pub fn render_summary_table(ui: &mut egui::Ui, summary: &DatasetSummary) {
    profiling::scope!("render_summary_table");
    const HEADERS: [&str; 7] = ["Column", "Type", "Nulls", "Min", "Max", "Mean", "Median"];

    TableBuilder::new(ui)
        .id_salt("summary_table")
        .striped(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .columns(Column::auto().resizable(true), HEADERS.len())
        .header(TABLE_HEADER_HEIGHT, |mut header| {
            for title in HEADERS {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for column in &summary.columns {
                body.row(TABLE_ROW_HEIGHT, |mut row| {
                    row.col(|ui| {
                        ui.label(&column.name);
                    });
                    row.col(|ui| {
                        ui.monospace(&column.dtype);
                    });
                    row.col(|ui| {
                        if column.null_count > 0 {
                            ui.colored_label(egui::Color32::RED, column.null_count.to_string());
                        } else {
                            ui.label("0");
                        }
                    });
                    match &column.stats {
                        Some(stats) => {
                            for value in [stats.min, stats.max, stats.mean, stats.median] {
                                row.col(|ui| {
                                    ui.label(fmt_stat(value));
                                });
                            }
                        }
                        None => {
                            for _ in 0..4 {
                                row.col(|ui| {
                                    ui.weak("-");
                                });
                            }
                        }
                    }
                });
            }
        });
}

/// First rows of the table with virtual scrolling
pub fn render_preview_table(ui: &mut egui::Ui, table: &PeakTable, rows: usize) {
    profiling::scope!("render_preview_table");
    let headers = table.column_names();
    let cells = table.preview_rows(rows);

    TableBuilder::new(ui)
        .id_salt("preview_table")
        .striped(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::initial(45.0).resizable(false))
        .columns(
            Column::initial(110.0).resizable(true).clip(true),
            headers.len(),
        )
        .header(TABLE_HEADER_HEIGHT, |mut header| {
            header.col(|ui| {
                ui.strong("#");
            });
            for name in &headers {
                header.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(TABLE_ROW_HEIGHT, cells.len(), |mut row| {
                let index = row.index();
                row.col(|ui| {
                    ui.weak((index + 1).to_string());
                });
                for cell in &cells[index] {
                    row.col(|ui| {
                        ui.label(cell);
                    });
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_formatting() {
        assert_eq!(fmt_stat(12.5), "12.5000");
        assert_eq!(fmt_stat(0.0), "0.0000");
        assert_eq!(fmt_stat(2.5e6), "2.500e6");
        assert_eq!(fmt_stat(0.0001), "1.000e-4");
    }
}
