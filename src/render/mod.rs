//! Render plans, overlay bookkeeping and the surfaces that draw them

pub mod overlay;
pub mod plan;
pub mod surface;

pub use overlay::{OverlayCategory, OverlayHandle, OverlayManager};
pub use plan::{Color, DrawInstruction, OverlayShape, PanelId, RenderPlan, RenderUpdate};
pub use surface::{CanvasSurface, PanelCanvas, RenderSurface, SeriesKind, SurfaceError};
