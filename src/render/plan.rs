//! Render plans: ordered draw instructions addressed to one panel
//!
//! Plans are plain data. Controllers build them, a [`RenderSurface`] consumes
//! them once and they are dropped.
//!
//! [`RenderSurface`]: super::surface::RenderSurface

use std::fmt;

use super::overlay::OverlayHandle;

/// Every plot panel of the three viewer layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PanelId {
    Chromatogram,
    Ms1Variable,
    Ms1Fixed,
    Overview,
    MidZoom,
    HighZoom,
    Ms1,
    Ms2,
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PanelId::Chromatogram => "chromatogram",
            PanelId::Ms1Variable => "ms1-variable",
            PanelId::Ms1Fixed => "ms1-fixed",
            PanelId::Overview => "overview",
            PanelId::MidZoom => "mid-zoom",
            PanelId::HighZoom => "high-zoom",
            PanelId::Ms1 => "ms1",
            PanelId::Ms2 => "ms2",
        };
        f.write_str(name)
    }
}

/// RGBA color, unmultiplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const BLUE: Color = Color::rgb(31, 119, 180);
    pub const RED: Color = Color::rgb(214, 39, 40);
    pub const YELLOW: Color = Color::rgb(255, 215, 0);
    pub const GRAY: Color = Color::rgb(110, 110, 110);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

/// Artifact managed through an overlay handle
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayShape {
    /// Vertical marker line at `x`
    Marker { x: f64, color: Color, dashed: bool },
    /// Shaded vertical band between two x values
    Span { x_min: f64, x_max: f64, color: Color },
}

impl OverlayShape {
    pub fn selection(x: f64) -> Self {
        OverlayShape::Marker {
            x,
            color: Color::RED,
            dashed: true,
        }
    }

    pub fn span(x_min: f64, x_max: f64, color: Color) -> Self {
        OverlayShape::Span {
            x_min,
            x_max,
            color: color.with_alpha(90),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawInstruction {
    /// Drop series, overlays, annotation and ticks; keeps nothing but the panel
    Clear,
    SetTitle(String),
    SetAxisLabels { x: String, y: String },
    SetXRange(f64, f64),
    SetYRange(f64, f64),
    /// One stem from 0 to y per (x, y) point
    VerticalLines { points: Vec<[f64; 2]>, color: Color },
    /// Connected line through the points
    Line { points: Vec<[f64; 2]>, color: Color },
    /// Free text shown in a corner of the panel
    Annotation(String),
    /// Explicit x tick positions and label precision
    XTicks { positions: Vec<f64>, decimals: usize },
    AddOverlay {
        handle: OverlayHandle,
        shape: OverlayShape,
    },
    RemoveOverlay(OverlayHandle),
}

/// Ordered instructions for one panel
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub panel: PanelId,
    pub instructions: Vec<DrawInstruction>,
}

impl RenderPlan {
    pub fn new(panel: PanelId) -> Self {
        Self {
            panel,
            instructions: Vec::new(),
        }
    }

    pub fn push(&mut self, instruction: DrawInstruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    pub fn clear(&mut self) -> &mut Self {
        self.push(DrawInstruction::Clear)
    }

    pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
        self.push(DrawInstruction::SetTitle(title.into()))
    }

    pub fn axis_labels(&mut self, x: impl Into<String>, y: impl Into<String>) -> &mut Self {
        self.push(DrawInstruction::SetAxisLabels {
            x: x.into(),
            y: y.into(),
        })
    }

    pub fn x_range(&mut self, (min, max): (f64, f64)) -> &mut Self {
        self.push(DrawInstruction::SetXRange(min, max))
    }

    pub fn y_range(&mut self, (min, max): (f64, f64)) -> &mut Self {
        self.push(DrawInstruction::SetYRange(min, max))
    }

    pub fn stems(&mut self, points: Vec<[f64; 2]>, color: Color) -> &mut Self {
        self.push(DrawInstruction::VerticalLines { points, color })
    }

    pub fn line(&mut self, points: Vec<[f64; 2]>, color: Color) -> &mut Self {
        self.push(DrawInstruction::Line { points, color })
    }

    pub fn annotation(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(DrawInstruction::Annotation(text.into()))
    }

    pub fn ticks(&mut self, positions: Vec<f64>, decimals: usize) -> &mut Self {
        self.push(DrawInstruction::XTicks {
            positions,
            decimals,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Everything one controller call wants drawn, plus an optional status line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderUpdate {
    pub plans: Vec<RenderPlan>,
    pub status: Option<String>,
}

impl RenderUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plan, skipping empty ones
    pub fn push(&mut self, plan: RenderPlan) {
        if !plan.is_empty() {
            self.plans.push(plan);
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// All instructions addressed to `panel`, in order
    pub fn instructions_for(&self, panel: PanelId) -> impl Iterator<Item = &DrawInstruction> {
        self.plans
            .iter()
            .filter(move |p| p.panel == panel)
            .flat_map(|p| p.instructions.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty() && self.status.is_none()
    }
}
