//! Session: the loaded dataset, the three viewer controllers and the
//! conversion job
//!
//! The session owns the one authoritative [`PeakTable`] and hands every
//! controller its own copy. A failed load never disturbs the current dataset.

use std::path::{Path, PathBuf};

use crate::convert::{ConversionEvent, ConversionJob, timestamped};
use crate::data::{DatasetSummary, PeakTable};
use crate::error::{Result, ViewerError};
use crate::render::RenderUpdate;
use crate::viewer::{ViewerEvent, ViewerMode, ViewportController};

/// Render updates produced by fanning a new dataset out to the viewers
pub type ViewUpdates = Vec<(ViewerMode, RenderUpdate)>;

pub struct Session {
    table: Option<PeakTable>,
    summary: Option<DatasetSummary>,
    controllers: Vec<ViewportController>,
    conversion: Option<ConversionJob>,
    /// Converted file waiting for the user to confirm loading it
    pending_output: Option<PathBuf>,
    log: Vec<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            table: None,
            summary: None,
            controllers: ViewerMode::ALL
                .iter()
                .map(|&mode| ViewportController::new(mode))
                .collect(),
            conversion: None,
            pending_output: None,
            log: Vec::new(),
        }
    }

    pub fn table(&self) -> Option<&PeakTable> {
        self.table.as_ref()
    }

    pub fn summary(&self) -> Option<&DatasetSummary> {
        self.summary.as_ref()
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn log_line(&mut self, message: &str) {
        self.log.push(timestamped(message));
    }

    pub fn controller(&self, mode: ViewerMode) -> Option<&ViewportController> {
        self.controllers.iter().find(|c| c.mode() == mode)
    }

    pub fn controller_mut(&mut self, mode: ViewerMode) -> Option<&mut ViewportController> {
        self.controllers.iter_mut().find(|c| c.mode() == mode)
    }

    /// Load a peak table and hand a copy to every viewer
    pub fn load(&mut self, path: &Path, optimize: bool) -> Result<ViewUpdates> {
        profiling::scope!("Session::load");
        self.log_line(&format!("Loading {}", path.display()));

        let table = match Self::read_table(path, optimize) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(path = %path.display(), "load failed: {}", e);
                self.log_line(&format!("Load failed: {}", e.user_message()));
                return Err(e);
            }
        };
        self.log_line(&format!(
            "Loaded {} rows x {} columns{}",
            table.height(),
            table.width(),
            if optimize { " (types optimized)" } else { "" }
        ));
        Ok(self.set_table(table))
    }

    fn read_table(path: &Path, optimize: bool) -> Result<PeakTable> {
        let mut table = PeakTable::load(path)?;
        if optimize {
            table.optimize_types()?;
        }
        Ok(table)
    }

    /// Install `table` as the session dataset
    pub fn set_table(&mut self, table: PeakTable) -> ViewUpdates {
        self.summary = Some(table.summary());
        let updates = self
            .controllers
            .iter_mut()
            .map(|controller| (controller.mode(), controller.set_data(table.clone())))
            .collect();
        self.table = Some(table);
        updates
    }

    /// Forward one event to the controller of `mode`
    pub fn dispatch(&mut self, mode: ViewerMode, event: ViewerEvent) -> Result<RenderUpdate> {
        let controller = self
            .controller_mut(mode)
            .ok_or_else(|| ViewerError::Config(format!("no controller for {}", mode)))?;
        controller.handle(event)
    }

    pub fn is_converting(&self) -> bool {
        self.conversion.is_some()
    }

    /// Start converting `input` on the worker thread
    pub fn start_conversion(&mut self, input: PathBuf) -> Result<()> {
        if let Some(job) = &self.conversion {
            return Err(ViewerError::Conversion(format!(
                "already converting {}",
                job.input().display()
            )));
        }
        self.pending_output = None;
        self.log_line(&format!("Starting conversion of {}", input.display()));
        self.conversion = Some(ConversionJob::spawn(input));
        Ok(())
    }

    /// Drain worker events into the log; returns the terminal event once
    pub fn poll_conversion(&mut self) -> Option<ConversionEvent> {
        let job = self.conversion.as_mut()?;
        let mut terminal = None;
        for event in job.poll() {
            match &event {
                ConversionEvent::Progress(line) => self.log.push(line.clone()),
                ConversionEvent::Finished {
                    success,
                    message,
                    output,
                } => {
                    self.log.push(timestamped(message));
                    if *success {
                        self.pending_output = output.clone();
                    }
                    terminal = Some(event.clone());
                }
            }
        }
        if terminal.is_some() {
            self.conversion = None;
        }
        terminal
    }

    pub fn pending_output(&self) -> Option<&Path> {
        self.pending_output.as_deref()
    }

    /// Load the converted file the user agreed to open
    pub fn load_converted(&mut self, optimize: bool) -> Result<ViewUpdates> {
        let path = self.pending_output.take().ok_or(ViewerError::NoData)?;
        self.load(&path, optimize)
    }

    pub fn dismiss_converted(&mut self) {
        self.pending_output = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::mzml::fixtures;
    use crate::data::Peak;
    use crate::scan::Direction;
    use crate::viewer::ControllerState;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn write_table(dir: &Path) -> PathBuf {
        let peaks = vec![
            Peak::new(1, 100.0, 10.5, 1),
            Peak::new(2, 200.0, 20.0, 2).with_precursor(100.0),
            Peak::new(3, 110.0, 30.0, 1),
        ];
        let path = dir.join("peaks.parquet");
        PeakTable::from_peaks(&peaks).unwrap().write_parquet(&path).unwrap();
        path
    }

    #[test]
    fn test_load_fans_out_independent_copies() {
        let dir = tempdir().unwrap();
        let path = write_table(dir.path());
        let mut session = Session::new();

        let updates = session.load(&path, true).unwrap();
        assert_eq!(updates.len(), 3);
        assert_eq!(session.table().unwrap().height(), 3);
        assert_eq!(session.summary().unwrap().rows, 3);

        for mode in ViewerMode::ALL {
            assert_eq!(session.controller(mode).unwrap().state(), ControllerState::Ready);
        }

        // Processing one viewer leaves the others and the session table alone
        session.dispatch(ViewerMode::FixedVsVariable, ViewerEvent::Process).unwrap();
        assert_eq!(session.table().unwrap().height(), 3);
        assert!(!session.controller(ViewerMode::Dda).unwrap().is_processed());

        session.dispatch(ViewerMode::Dda, ViewerEvent::Process).unwrap();
        let dda = session.controller(ViewerMode::Dda).unwrap().index().unwrap();
        assert_eq!(dda.len(), 3);
        let fixed = session
            .controller(ViewerMode::FixedVsVariable)
            .unwrap()
            .index()
            .unwrap();
        assert_eq!(fixed.scan_numbers().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_failed_load_keeps_previous_dataset() {
        let dir = tempdir().unwrap();
        let path = write_table(dir.path());
        let mut session = Session::new();
        session.load(&path, false).unwrap();
        session.dispatch(ViewerMode::Dda, ViewerEvent::Process).unwrap();
        session
            .dispatch(
                ViewerMode::Dda,
                ViewerEvent::Click {
                    panel: crate::render::PanelId::Chromatogram,
                    x: 2.0,
                    y: 0.0,
                },
            )
            .unwrap();

        let bogus = dir.path().join("bogus.parquet");
        std::fs::write(&bogus, "nope").unwrap();
        assert!(session.load(&bogus, false).is_err());
        assert!(session.load(&dir.path().join("x.txt"), false).is_err());

        assert_eq!(session.table().unwrap().height(), 3);
        let dda = session.controller(ViewerMode::Dda).unwrap();
        assert_eq!(dda.current_scan(), Some(2));
        assert!(session.log().iter().any(|l| l.contains("Load failed")));

        session
            .dispatch(ViewerMode::Dda, ViewerEvent::Key(Direction::Next))
            .unwrap();
        assert_eq!(session.controller(ViewerMode::Dda).unwrap().current_scan(), Some(3));
    }

    #[test]
    fn test_conversion_then_confirmed_load() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("run.mzML");
        std::fs::write(&input, fixtures::small_run()).unwrap();

        let mut session = Session::new();
        session.start_conversion(input.clone()).unwrap();
        assert!(session.is_converting());
        assert!(session.start_conversion(input).is_err());

        let deadline = Instant::now() + Duration::from_secs(30);
        let terminal = loop {
            if let Some(event) = session.poll_conversion() {
                break event;
            }
            assert!(Instant::now() < deadline, "conversion timed out");
            std::thread::sleep(Duration::from_millis(10));
        };

        assert!(matches!(terminal, ConversionEvent::Finished { success: true, .. }));
        assert!(!session.is_converting());
        assert!(session.table().is_none());
        assert_eq!(session.pending_output(), Some(dir.path().join("run.parquet").as_path()));
        assert!(session.log().len() >= 3);
        assert!(session.log().iter().all(|l| l.starts_with('[')));

        session.load_converted(true).unwrap();
        assert_eq!(session.table().unwrap().height(), 6);
        assert_eq!(session.pending_output(), None);
        assert!(matches!(session.load_converted(true), Err(ViewerError::NoData)));
    }
}
