//! Drawing surfaces that consume render plans
//!
//! [`CanvasSurface`] is a retained model of every panel. The egui shell paints
//! from it each frame and tests inspect it directly.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use super::overlay::OverlayHandle;
use super::plan::{Color, DrawInstruction, OverlayShape, PanelId, RenderUpdate};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("{handle} is not on panel {panel}")]
    UnknownOverlay { panel: PanelId, handle: OverlayHandle },

    #[error("{handle} already exists on panel {panel}")]
    DuplicateOverlay { panel: PanelId, handle: OverlayHandle },

    #[error("invalid range [{min}, {max}] on panel {panel}")]
    InvalidRange { panel: PanelId, min: f64, max: f64 },
}

/// Anything that can execute draw instructions
pub trait RenderSurface {
    fn execute(&mut self, panel: PanelId, instruction: &DrawInstruction)
    -> Result<(), SurfaceError>;

    fn set_status(&mut self, _status: &str) {}

    /// Execute every plan in order. A failing instruction is logged and
    /// skipped so later ones (such as the replacement overlay) still land.
    fn apply(&mut self, update: &RenderUpdate) {
        profiling::scope!("RenderSurface::apply");
        for plan in &update.plans {
            for instruction in &plan.instructions {
                if let Err(e) = self.execute(plan.panel, instruction) {
                    tracing::warn!(panel = %plan.panel, "draw instruction failed: {}", e);
                }
            }
        }
        if let Some(status) = &update.status {
            self.set_status(status);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Stems,
    Line,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub kind: SeriesKind,
    pub points: Vec<[f64; 2]>,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickSpec {
    pub positions: Vec<f64>,
    pub decimals: usize,
}

/// Retained contents of one panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelCanvas {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: Option<(f64, f64)>,
    pub y_range: Option<(f64, f64)>,
    pub series: Vec<PlotSeries>,
    pub overlays: BTreeMap<OverlayHandle, OverlayShape>,
    pub annotation: Option<String>,
    pub ticks: Option<TickSpec>,
    /// Bumped whenever the axis ranges change
    pub revision: u64,
}

impl PanelCanvas {
    pub fn is_blank(&self) -> bool {
        self.series.is_empty() && self.overlays.is_empty()
    }

    /// Overlay spans as (x_min, x_max, color)
    pub fn spans(&self) -> impl Iterator<Item = (f64, f64, Color)> + '_ {
        self.overlays.values().filter_map(|shape| match shape {
            OverlayShape::Span {
                x_min,
                x_max,
                color,
            } => Some((*x_min, *x_max, *color)),
            OverlayShape::Marker { .. } => None,
        })
    }

    /// Overlay marker x positions
    pub fn markers(&self) -> impl Iterator<Item = f64> + '_ {
        self.overlays.values().filter_map(|shape| match shape {
            OverlayShape::Marker { x, .. } => Some(*x),
            OverlayShape::Span { .. } => None,
        })
    }

    /// All stem points drawn on the panel
    pub fn stem_points(&self) -> impl Iterator<Item = &[f64; 2]> {
        self.series
            .iter()
            .filter(|s| s.kind == SeriesKind::Stems)
            .flat_map(|s| s.points.iter())
    }
}

fn check_range(panel: PanelId, min: f64, max: f64) -> Result<(), SurfaceError> {
    if min.is_finite() && max.is_finite() && min <= max {
        Ok(())
    } else {
        Err(SurfaceError::InvalidRange { panel, min, max })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CanvasSurface {
    panels: HashMap<PanelId, PanelCanvas>,
    status: Option<String>,
}

impl CanvasSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canvas of a panel; panels never drawn to are blank
    pub fn panel(&self, panel: PanelId) -> PanelCanvas {
        self.panels.get(&panel).cloned().unwrap_or_default()
    }

    pub fn panel_ref(&self, panel: PanelId) -> Option<&PanelCanvas> {
        self.panels.get(&panel)
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Wipe every panel, e.g. when the dataset changes
    pub fn reset(&mut self) {
        for canvas in self.panels.values_mut() {
            let revision = canvas.revision + 1;
            *canvas = PanelCanvas {
                revision,
                ..PanelCanvas::default()
            };
        }
        self.status = None;
    }
}

impl RenderSurface for CanvasSurface {
    fn execute(
        &mut self,
        panel: PanelId,
        instruction: &DrawInstruction,
    ) -> Result<(), SurfaceError> {
        let canvas = self.panels.entry(panel).or_default();
        match instruction {
            DrawInstruction::Clear => {
                canvas.series.clear();
                canvas.overlays.clear();
                canvas.annotation = None;
                canvas.ticks = None;
            }
            DrawInstruction::SetTitle(title) => canvas.title = title.clone(),
            DrawInstruction::SetAxisLabels { x, y } => {
                canvas.x_label = x.clone();
                canvas.y_label = y.clone();
            }
            DrawInstruction::SetXRange(min, max) => {
                check_range(panel, *min, *max)?;
                canvas.x_range = Some((*min, *max));
                canvas.revision += 1;
            }
            DrawInstruction::SetYRange(min, max) => {
                check_range(panel, *min, *max)?;
                canvas.y_range = Some((*min, *max));
                canvas.revision += 1;
            }
            DrawInstruction::VerticalLines { points, color } => canvas.series.push(PlotSeries {
                kind: SeriesKind::Stems,
                points: points.clone(),
                color: *color,
            }),
            DrawInstruction::Line { points, color } => canvas.series.push(PlotSeries {
                kind: SeriesKind::Line,
                points: points.clone(),
                color: *color,
            }),
            DrawInstruction::Annotation(text) => canvas.annotation = Some(text.clone()),
            DrawInstruction::XTicks {
                positions,
                decimals,
            } => {
                canvas.ticks = Some(TickSpec {
                    positions: positions.clone(),
                    decimals: *decimals,
                })
            }
            DrawInstruction::AddOverlay { handle, shape } => {
                if canvas.overlays.contains_key(handle) {
                    return Err(SurfaceError::DuplicateOverlay {
                        panel,
                        handle: *handle,
                    });
                }
                canvas.overlays.insert(*handle, shape.clone());
            }
            DrawInstruction::RemoveOverlay(handle) => {
                if canvas.overlays.remove(handle).is_none() {
                    return Err(SurfaceError::UnknownOverlay {
                        panel,
                        handle: *handle,
                    });
                }
            }
        }
        Ok(())
    }

    fn set_status(&mut self, status: &str) {
        self.status = Some(status.to_string());
    }
}
