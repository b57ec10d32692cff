use eframe::egui::{self, Color32};
use egui_plot::{GridMark, Line, LineStyle, Plot, PlotPoints, Polygon, VLine};

use crate::downsample;
use crate::render::{Color, OverlayShape, PanelCanvas, SeriesKind};

fn color32(color: Color) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

/// Stems as one polyline that returns to the baseline between peaks
fn comb<'a>(points: impl IntoIterator<Item = &'a [f64; 2]>) -> Vec<[f64; 2]> {
    let mut out = Vec::new();
    for &[x, y] in points {
        out.push([x, 0.0]);
        out.push([x, y]);
        out.push([x, 0.0]);
    }
    out
}

/// Paint one panel; returns the plot coordinate of a primary click
pub fn paint_canvas(
    ui: &mut egui::Ui,
    id: impl std::hash::Hash,
    canvas: &PanelCanvas,
    height: f32,
    apply_bounds: bool,
) -> Option<(f64, f64)> {
    profiling::scope!("paint_canvas");

    ui.horizontal(|ui| {
        ui.strong(&canvas.title);
        if let Some(annotation) = &canvas.annotation {
            ui.separator();
            ui.monospace(annotation);
        }
    });

    let mut plot = Plot::new(id)
        .height(height)
        .x_axis_label(canvas.x_label.clone())
        .y_axis_label(canvas.y_label.clone())
        .allow_boxed_zoom(true)
        .y_axis_formatter(|mark, _range| {
            if mark.value.abs() >= 1e4 {
                format!("{:.1e}", mark.value)
            } else {
                format!("{:.0}", mark.value)
            }
        });

    if let Some(ticks) = &canvas.ticks {
        let positions = ticks.positions.clone();
        let decimals = ticks.decimals;
        let step = positions
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(f64::INFINITY, f64::min);
        plot = plot
            .x_grid_spacer(move |_input| {
                positions
                    .iter()
                    .map(|&value| GridMark {
                        value,
                        step_size: if step.is_finite() { step } else { 1.0 },
                    })
                    .collect()
            })
            .x_axis_formatter(move |mark, _range| format!("{:.*}", decimals, mark.value));
    }

    let response = plot.show(ui, |plot_ui| {
        if apply_bounds {
            if let Some((min, max)) = canvas.x_range {
                plot_ui.set_plot_bounds_x(min..=max);
            }
            if let Some((min, max)) = canvas.y_range {
                plot_ui.set_plot_bounds_y(min..=max);
            }
        }
        let bounds = plot_ui.plot_bounds();
        let (x_min, x_max) = (bounds.min()[0], bounds.max()[0]);
        let (y_min, y_max) = (bounds.min()[1], bounds.max()[1]);

        for overlay in canvas.overlays.values() {
            if let OverlayShape::Span {
                x_min: lo,
                x_max: hi,
                color,
            } = overlay
            {
                let corners = vec![[*lo, y_min], [*hi, y_min], [*hi, y_max], [*lo, y_max]];
                plot_ui.polygon(
                    Polygon::new("highlight", PlotPoints::from(corners))
                        .fill_color(color32(*color))
                        .stroke(egui::Stroke::NONE),
                );
            }
        }

        for (i, series) in canvas.series.iter().enumerate() {
            let points = match series.kind {
                SeriesKind::Stems => comb(
                    series
                        .points
                        .iter()
                        .filter(|p| (x_min..=x_max).contains(&p[0])),
                ),
                SeriesKind::Line => {
                    downsample::for_display(downsample::cull(&series.points, x_min, x_max))
                }
            };
            plot_ui.line(
                Line::new(format!("series {}", i), PlotPoints::from(points))
                    .color(color32(series.color))
                    .width(1.0),
            );
        }

        for overlay in canvas.overlays.values() {
            if let OverlayShape::Marker { x, color, dashed } = overlay {
                let mut line = VLine::new("selection", *x).color(color32(*color)).width(1.5);
                if *dashed {
                    line = line.style(LineStyle::Dashed { length: 6.0 });
                }
                plot_ui.vline(line);
            }
        }
    });

    if response.response.clicked() {
        let pos = response.response.interact_pointer_pos()?;
        let value = response.transform.value_from_position(pos);
        return Some((value.x, value.y));
    }
    None
}
