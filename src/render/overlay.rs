//! Overlay artifact bookkeeping
//!
//! Selection lines and highlight bands are drawn on top of a panel's data and
//! replaced on every navigation event. The manager remembers one live handle
//! per (panel, category) and turns a replace into "remove old, add new".

use std::collections::HashMap;
use std::fmt;

use super::plan::{DrawInstruction, OverlayShape, PanelId, RenderPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayCategory {
    SelectionLine,
    Ms1Highlight,
    Ms2Highlight,
    ZoomRegion,
}

/// Opaque id of a drawn artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayHandle(u64);

impl fmt::Display for OverlayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct OverlayManager {
    next_handle: u64,
    live: HashMap<(PanelId, OverlayCategory), OverlayHandle>,
}

impl OverlayManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove the previous artifact of this category (if any) and install `shape`
    pub fn replace(
        &mut self,
        plan: &mut RenderPlan,
        category: OverlayCategory,
        shape: OverlayShape,
    ) -> OverlayHandle {
        self.clear(plan, category);

        self.next_handle += 1;
        let handle = OverlayHandle(self.next_handle);
        plan.push(DrawInstruction::AddOverlay { handle, shape });
        self.live.insert((plan.panel, category), handle);
        handle
    }

    /// Remove the artifact of this category, if one is live
    pub fn clear(&mut self, plan: &mut RenderPlan, category: OverlayCategory) {
        if let Some(old) = self.live.remove(&(plan.panel, category)) {
            plan.push(DrawInstruction::RemoveOverlay(old));
        }
    }

    /// Forget every handle of a panel whose contents were wiped by a clear
    pub fn panel_cleared(&mut self, panel: PanelId) {
        self.live.retain(|(p, _), _| *p != panel);
    }

    /// Forget everything, e.g. when a new dataset arrives
    pub fn reset(&mut self) {
        self.live.clear();
    }

    pub fn live(&self, panel: PanelId, category: OverlayCategory) -> Option<OverlayHandle> {
        self.live.get(&(panel, category)).copied()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::plan::Color;

    #[test]
    fn test_replace_removes_previous() {
        let mut overlays = OverlayManager::new();
        let mut plan = RenderPlan::new(PanelId::Chromatogram);

        let first = overlays.replace(&mut plan, OverlayCategory::SelectionLine, OverlayShape::selection(1.0));
        let second = overlays.replace(&mut plan, OverlayCategory::SelectionLine, OverlayShape::selection(2.0));

        assert_ne!(first, second);
        assert_eq!(overlays.live_count(), 1);
        assert_eq!(
            overlays.live(PanelId::Chromatogram, OverlayCategory::SelectionLine),
            Some(second)
        );
        assert_eq!(plan.instructions[1], DrawInstruction::RemoveOverlay(first));
        assert!(matches!(
            plan.instructions[2],
            DrawInstruction::AddOverlay { handle, .. } if handle == second
        ));
    }

    #[test]
    fn test_categories_and_panels_are_independent() {
        let mut overlays = OverlayManager::new();
        let mut ms1 = RenderPlan::new(PanelId::Ms1);
        let mut ms2 = RenderPlan::new(PanelId::Ms2);

        overlays.replace(&mut ms1, OverlayCategory::Ms1Highlight, OverlayShape::span(1.0, 2.0, Color::YELLOW));
        overlays.replace(&mut ms2, OverlayCategory::Ms2Highlight, OverlayShape::span(1.0, 2.0, Color::RED));
        overlays.replace(&mut ms2, OverlayCategory::SelectionLine, OverlayShape::selection(1.5));
        assert_eq!(overlays.live_count(), 3);

        overlays.clear(&mut ms1, OverlayCategory::Ms1Highlight);
        assert_eq!(overlays.live_count(), 2);
        overlays.clear(&mut ms1, OverlayCategory::Ms1Highlight);
        assert_eq!(ms1.instructions.len(), 2);

        overlays.panel_cleared(PanelId::Ms2);
        assert_eq!(overlays.live_count(), 0);
    }
}
