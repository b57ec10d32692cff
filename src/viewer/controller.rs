//! Viewport controller: navigation state and render-plan production
//!
//! A controller owns a private copy of the peak table, derives its scan index
//! at process time and turns user events into [`RenderUpdate`]s. It never
//! draws; the caller hands updates to a [`RenderSurface`].
//!
//! [`RenderSurface`]: crate::render::RenderSurface

mod dda;
mod fixed_variable;
mod isotope;

use crate::constants::columns::REQUIRED;
use crate::data::{Peak, PeakTable};
use crate::error::{Result, ViewerError};
use crate::normalize::{self, MzRange, NormalizationPolicy};
use crate::render::{
    Color, OverlayCategory, OverlayManager, OverlayShape, PanelId, RenderPlan, RenderUpdate,
};
use crate::scan::{Direction, ScanIndex};

use super::{ControllerState, ViewerEvent, ViewerMode};

/// Per-controller navigation state, reset with every new dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationState {
    pub current_scan: Option<i64>,
    /// Isolation window `[p - 1.5, p + 1.5]` of the last highlighted precursor
    pub last_highlighted_precursor_window: Option<(f64, f64)>,
    /// MS1 scan whose spectrum is on the MS1 panel of the dual view
    pub shown_ms1_scan: Option<i64>,
}

/// Everything derived from the table at process time
#[derive(Debug, Clone)]
struct Processed {
    peaks: Vec<Peak>,
    index: ScanIndex,
    policy: NormalizationPolicy,
}

impl Processed {
    fn scan_peaks(&self, scan_number: i64) -> Vec<Peak> {
        self.index
            .rows(scan_number)
            .iter()
            .map(|&row| self.peaks[row])
            .collect()
    }

    fn mz_range(&self) -> Option<(f64, f64)> {
        self.policy.default_range().map(|r| (r.min, r.max))
    }
}

/// Start a plan that wipes the panel, forgetting its overlay handles
fn fresh_plan(overlays: &mut OverlayManager, panel: PanelId) -> RenderPlan {
    overlays.panel_cleared(panel);
    let mut plan = RenderPlan::new(panel);
    plan.clear();
    plan
}

fn range_of(range: MzRange) -> (f64, f64) {
    (range.min, range.max)
}

#[derive(Debug)]
pub struct ViewportController {
    mode: ViewerMode,
    table: Option<PeakTable>,
    processed: Option<Processed>,
    nav: NavigationState,
    overlays: OverlayManager,
}

impl ViewportController {
    pub fn new(mode: ViewerMode) -> Self {
        Self {
            mode,
            table: None,
            processed: None,
            nav: NavigationState::default(),
            overlays: OverlayManager::new(),
        }
    }

    pub fn mode(&self) -> ViewerMode {
        self.mode
    }

    pub fn state(&self) -> ControllerState {
        match (&self.table, self.nav.current_scan) {
            (None, _) => ControllerState::Empty,
            (Some(_), None) => ControllerState::Ready,
            (Some(_), Some(_)) => ControllerState::ScanSelected,
        }
    }

    pub fn has_data(&self) -> bool {
        self.table.is_some()
    }

    pub fn is_processed(&self) -> bool {
        self.processed.is_some()
    }

    pub fn current_scan(&self) -> Option<i64> {
        self.nav.current_scan
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    pub fn index(&self) -> Option<&ScanIndex> {
        self.processed.as_ref().map(|p| &p.index)
    }

    pub fn policy(&self) -> Option<&NormalizationPolicy> {
        self.processed.as_ref().map(|p| &p.policy)
    }

    /// Dispatch one user event
    pub fn handle(&mut self, event: ViewerEvent) -> Result<RenderUpdate> {
        match event {
            ViewerEvent::SetData(table) => Ok(self.set_data(table)),
            ViewerEvent::Process => self.process(),
            ViewerEvent::Click { panel, x, y } => Ok(self.handle_click(panel, x, y)),
            ViewerEvent::Key(direction) => Ok(self.handle_key(direction)),
        }
    }

    /// Take a new dataset; the previous one, its index and all navigation
    /// state are dropped
    pub fn set_data(&mut self, table: PeakTable) -> RenderUpdate {
        let rows = table.height();
        self.table = Some(table);
        self.processed = None;
        self.nav = NavigationState::default();
        self.overlays.reset();

        let mut update = RenderUpdate::new();
        for &panel in self.mode.panels() {
            let mut plan = fresh_plan(&mut self.overlays, panel);
            plan.title(self.mode.placeholder_title(panel));
            update.push(plan);
        }
        tracing::info!(mode = %self.mode, rows, "dataset received");
        update.with_status(format!(
            "Data received ({} rows) - process to build the {} view",
            rows,
            self.mode.level_label()
        ))
    }

    /// Filter, index and normalize the dataset, then draw the chromatogram
    /// and empty spectrum panels. On error nothing changes.
    pub fn process(&mut self) -> Result<RenderUpdate> {
        profiling::scope!("ViewportController::process");
        let table = self.table.as_ref().ok_or(ViewerError::NoData)?;
        table.require_columns(&REQUIRED)?;

        let mut filtered = match self.mode.level_filter() {
            Some(level) => table.filter_level(level)?,
            None => table.clone(),
        };
        if filtered.is_empty() {
            return Err(ViewerError::empty(self.mode.level_label()));
        }
        if self.mode.renumbers_scans() {
            filtered.renumber_scans_densely()?;
        }

        let peaks = filtered.peaks()?;
        let index = ScanIndex::from_peaks(&peaks)?;
        let policy =
            NormalizationPolicy::compute(&peaks, &index, self.mode.flags_reference_peaks());
        let scans = index.len();

        self.processed = Some(Processed {
            peaks,
            index,
            policy,
        });
        self.nav = NavigationState::default();
        self.overlays.reset();

        let mut update = RenderUpdate::new();
        update.push(self.chromatogram_plan());
        match self.mode {
            ViewerMode::FixedVsVariable => self.setup_fixed_variable(&mut update),
            ViewerMode::IsotopeZoom => self.setup_isotope(&mut update),
            ViewerMode::Dda => self.setup_dda(&mut update),
        }
        tracing::info!(mode = %self.mode, scans, "processed dataset");
        let mut update = update.with_status(format!(
            "{} processing complete - {} scans (click the chromatogram)",
            self.mode.level_label(),
            scans
        ));

        if self.mode.previews_middle_scan() {
            let middle = self.index().and_then(|i| i.middle_scan());
            if let Some(middle) = middle {
                let preview = self.select_scan(middle);
                update.plans.extend(preview.plans);
                if preview.status.is_some() {
                    update.status = preview.status;
                }
            }
        }
        Ok(update)
    }

    /// Chromatogram click; anything outside the scan range or off the
    /// chromatogram is ignored
    pub fn handle_click(&mut self, panel: PanelId, x: f64, _y: f64) -> RenderUpdate {
        if panel != PanelId::Chromatogram {
            return RenderUpdate::new();
        }
        let target = match self.index() {
            Some(index) if index.in_bounds(x) => index.nearest_scan(x),
            _ => None,
        };
        match target {
            Some(scan) => self.select_scan(scan),
            None => RenderUpdate::new(),
        }
    }

    /// Arrow-key navigation; no wrap-around at either end
    pub fn handle_key(&mut self, direction: Direction) -> RenderUpdate {
        let target = match (self.index(), self.nav.current_scan) {
            (Some(index), Some(current)) => index.neighbor(current, direction),
            _ => None,
        };
        match target {
            Some(scan) => self.select_scan(scan),
            None => RenderUpdate::new(),
        }
    }

    /// Make `scan_number` current and redraw every spectrum panel
    pub fn select_scan(&mut self, scan_number: i64) -> RenderUpdate {
        profiling::scope!("ViewportController::select_scan");
        let known = self
            .index()
            .is_some_and(|index| index.contains(scan_number));
        if !known {
            return RenderUpdate::new();
        }

        self.nav.current_scan = Some(scan_number);
        tracing::debug!(mode = %self.mode, scan = scan_number, "scan selected");

        let mut update = RenderUpdate::new();
        let mut chromatogram = RenderPlan::new(PanelId::Chromatogram);
        self.overlays.replace(
            &mut chromatogram,
            OverlayCategory::SelectionLine,
            OverlayShape::selection(scan_number as f64),
        );
        update.push(chromatogram);

        let status = match self.mode {
            ViewerMode::FixedVsVariable => self.render_fixed_variable(scan_number, &mut update),
            ViewerMode::IsotopeZoom => self.render_isotope(scan_number, &mut update),
            ViewerMode::Dda => self.render_dda(scan_number, &mut update),
        };
        update.with_status(status)
    }

    fn chromatogram_plan(&mut self) -> RenderPlan {
        let mut plan = fresh_plan(&mut self.overlays, PanelId::Chromatogram);
        plan.title(self.mode.chromatogram_title())
            .axis_labels("Scan Number", "Total Intensity");
        if let Some(data) = &self.processed {
            let index = &data.index;
            plan.line(index.chromatogram(), Color::BLACK);
            if let (Some(first), Some(last)) = (index.first_scan(), index.last_scan()) {
                plan.x_range((first as f64, last as f64));
            }
            plan.y_range(normalize::fit_y(index.max_total_intensity()));
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{CanvasSurface, RenderSurface};

    fn ms1_table() -> PeakTable {
        let peaks = vec![
            Peak::new(10, 100.0, 10.0, 1),
            Peak::new(10, 101.0, 20.0, 1),
            Peak::new(20, 100.5, 40.0, 1),
            Peak::new(25, 300.0, 99.0, 2).with_precursor(100.5),
            Peak::new(30, 102.0, 5.0, 1),
        ];
        PeakTable::from_peaks(&peaks).unwrap()
    }

    #[test]
    fn test_states_follow_lifecycle() {
        let mut controller = ViewportController::new(ViewerMode::Dda);
        assert_eq!(controller.state(), ControllerState::Empty);
        assert!(matches!(controller.process(), Err(ViewerError::NoData)));

        controller.set_data(ms1_table());
        assert_eq!(controller.state(), ControllerState::Ready);
        assert!(!controller.is_processed());

        controller.process().unwrap();
        assert_eq!(controller.state(), ControllerState::Ready);

        controller.handle_click(PanelId::Chromatogram, 20.2, 0.0);
        assert_eq!(controller.state(), ControllerState::ScanSelected);

        controller.set_data(ms1_table());
        assert_eq!(controller.state(), ControllerState::Ready);
        assert_eq!(controller.navigation(), &NavigationState::default());
        assert!(controller.index().is_none());
    }

    #[test]
    fn test_schema_error_names_missing_columns() {
        let df = polars::prelude::df!("scan_number" => [1i64], "mz" => [100.0]).unwrap();
        let mut controller = ViewportController::new(ViewerMode::FixedVsVariable);
        controller.set_data(PeakTable::from_dataframe(df, None));
        match controller.process() {
            Err(ViewerError::Schema { missing }) => {
                assert_eq!(missing, vec!["intensity".to_string(), "ms_level".to_string()]);
            }
            other => panic!("expected schema error, got {:?}", other),
        }
        assert!(!controller.is_processed());
    }

    #[test]
    fn test_no_ms1_rows_is_empty_dataset() {
        let peaks = vec![Peak::new(1, 200.0, 1.0, 2).with_precursor(500.0)];
        let mut controller = ViewportController::new(ViewerMode::IsotopeZoom);
        controller.set_data(PeakTable::from_peaks(&peaks).unwrap());
        match controller.process() {
            Err(e @ ViewerError::EmptyDataset { .. }) => {
                assert_eq!(e.user_message(), "No MS1 data found");
            }
            other => panic!("expected empty dataset, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_process_keeps_previous_state() {
        let mut controller = ViewportController::new(ViewerMode::FixedVsVariable);
        controller.set_data(ms1_table());
        controller.process().unwrap();
        let scan = controller.current_scan();
        assert!(scan.is_some());

        let update = controller.handle_key(Direction::Next);
        assert!(!update.is_empty());
        let before = controller.current_scan();

        controller.table = Some(PeakTable::from_peaks(&[Peak::new(1, 1.0, 1.0, 2)]).unwrap());
        assert!(controller.process().is_err());
        assert_eq!(controller.current_scan(), before);
        assert_eq!(controller.index().map(|i| i.len()), Some(3));
    }

    #[test]
    fn test_ms1_modes_renumber_and_preview_middle_scan() {
        let mut controller = ViewportController::new(ViewerMode::FixedVsVariable);
        controller.set_data(ms1_table());
        let update = controller.process().unwrap();

        let scans: Vec<i64> = controller.index().unwrap().scan_numbers().collect();
        assert_eq!(scans, vec![1, 2, 3]);
        assert_eq!(controller.current_scan(), Some(2));
        assert_eq!(controller.state(), ControllerState::ScanSelected);
        assert!(update.status.unwrap().contains("Scan 2"));
    }

    #[test]
    fn test_clicks_outside_range_or_panel_are_ignored() {
        let mut controller = ViewportController::new(ViewerMode::Dda);
        controller.set_data(ms1_table());
        controller.process().unwrap();

        assert!(controller.handle_click(PanelId::Chromatogram, 9.0, 0.0).is_empty());
        assert!(controller.handle_click(PanelId::Chromatogram, 30.5, 0.0).is_empty());
        assert!(controller.handle_click(PanelId::Ms1, 20.0, 0.0).is_empty());
        assert_eq!(controller.current_scan(), None);

        controller.handle_click(PanelId::Chromatogram, 22.5, 0.0);
        assert_eq!(controller.current_scan(), Some(20));
        controller.handle_click(PanelId::Chromatogram, 27.6, 0.0);
        assert_eq!(controller.current_scan(), Some(30));
    }

    #[test]
    fn test_key_navigation_stops_at_boundaries() {
        let mut controller = ViewportController::new(ViewerMode::Dda);
        controller.set_data(ms1_table());
        controller.process().unwrap();

        assert!(controller.handle_key(Direction::Next).is_empty());

        controller.select_scan(10);
        assert!(controller.handle_key(Direction::Prev).is_empty());
        assert_eq!(controller.current_scan(), Some(10));

        controller.handle(ViewerEvent::Key(Direction::Next)).unwrap();
        assert_eq!(controller.current_scan(), Some(20));

        controller.select_scan(30);
        assert!(controller.handle_key(Direction::Next).is_empty());
        assert_eq!(controller.current_scan(), Some(30));
    }

    #[test]
    fn test_unknown_scan_is_a_no_op() {
        let mut controller = ViewportController::new(ViewerMode::Dda);
        controller.set_data(ms1_table());
        controller.process().unwrap();
        assert!(controller.select_scan(11).is_empty());
        assert_eq!(controller.current_scan(), None);
    }

    #[test]
    fn test_selection_line_never_duplicates() {
        let mut controller = ViewportController::new(ViewerMode::Dda);
        let mut surface = CanvasSurface::new();
        surface.apply(&controller.set_data(ms1_table()));
        surface.apply(&controller.process().unwrap());

        for x in [10.0, 20.0, 25.0, 30.0, 12.0] {
            surface.apply(&controller.handle_click(PanelId::Chromatogram, x, 0.0));
            let canvas = surface.panel(PanelId::Chromatogram);
            assert_eq!(canvas.markers().count(), 1);
        }
        let canvas = surface.panel(PanelId::Chromatogram);
        assert_eq!(canvas.markers().collect::<Vec<_>>(), vec![10.0]);
        assert_eq!(canvas.x_range, Some((10.0, 30.0)));
        assert_eq!(canvas.series.len(), 1);
    }
}
