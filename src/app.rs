use std::collections::HashMap;
use std::path::{Path, PathBuf};

use eframe::egui;

use crate::convert::ConversionEvent;
use crate::error::ViewerError;
use crate::render::{CanvasSurface, PanelId, RenderSurface, RenderUpdate};
use crate::scan::Direction;
use crate::session::{Session, ViewUpdates};
use crate::settings::AppSettings;
use crate::viewer::{ViewerEvent, ViewerMode};

/// Top-level tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Loader,
    Viewer(ViewerMode),
}

impl Tab {
    pub const ALL: [Tab; 4] = [
        Tab::Loader,
        Tab::Viewer(ViewerMode::FixedVsVariable),
        Tab::Viewer(ViewerMode::IsotopeZoom),
        Tab::Viewer(ViewerMode::Dda),
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Loader => "Data Loader",
            Tab::Viewer(mode) => mode.tab_title(),
        }
    }
}

/// Error shown in a modal window until dismissed
pub struct ErrorDialog {
    pub title: &'static str,
    pub message: String,
}

pub struct MsScopeApp {
    pub(crate) session: Session,
    pub(crate) settings: AppSettings,
    settings_path: PathBuf,
    pub(crate) surfaces: HashMap<ViewerMode, CanvasSurface>,
    /// Last axis revision pushed into each egui plot
    pub(crate) painted_revisions: HashMap<(ViewerMode, PanelId), u64>,
    pub(crate) tab: Tab,
    pub(crate) error: Option<ErrorDialog>,
    pub(crate) show_help: bool,
}

impl MsScopeApp {
    pub fn new(settings: AppSettings, settings_path: PathBuf) -> Self {
        Self {
            session: Session::new(),
            settings,
            settings_path,
            surfaces: ViewerMode::ALL
                .iter()
                .map(|&mode| (mode, CanvasSurface::new()))
                .collect(),
            painted_revisions: HashMap::new(),
            tab: Tab::Loader,
            error: None,
            show_help: false,
        }
    }

    pub(crate) fn report(&mut self, error: ViewerError) {
        tracing::warn!("{}", error);
        self.error = Some(ErrorDialog {
            title: error.title(),
            message: error.user_message(),
        });
    }

    fn install(&mut self, updates: ViewUpdates) {
        for (mode, update) in updates {
            let surface = self.surfaces.entry(mode).or_default();
            surface.reset();
            surface.apply(&update);
        }
    }

    pub(crate) fn load_file(&mut self, path: &Path) {
        match self.session.load(path, self.settings.optimize_on_load) {
            Ok(updates) => {
                self.install(updates);
                self.settings.remember_file(path);
                self.persist_settings();
            }
            Err(e) => self.report(e),
        }
    }

    pub(crate) fn load_converted(&mut self) {
        match self.session.load_converted(self.settings.optimize_on_load) {
            Ok(updates) => {
                self.install(updates);
                if let Some(path) = self.session.table().and_then(|t| t.file_path()) {
                    let path = path.to_path_buf();
                    self.settings.remember_file(&path);
                    self.persist_settings();
                }
            }
            Err(e) => self.report(e),
        }
    }

    pub(crate) fn start_conversion(&mut self, input: PathBuf) {
        if let Err(e) = self.session.start_conversion(input) {
            self.report(e);
        }
    }

    /// Route one event to a viewer and draw the result
    pub(crate) fn dispatch(&mut self, mode: ViewerMode, event: ViewerEvent) {
        match self.session.dispatch(mode, event) {
            Ok(update) => self.apply(mode, &update),
            Err(e) => self.report(e),
        }
    }

    fn apply(&mut self, mode: ViewerMode, update: &RenderUpdate) {
        if !update.is_empty() {
            self.surfaces.entry(mode).or_default().apply(update);
        }
    }

    pub(crate) fn persist_settings(&self) {
        if let Err(e) = self.settings.save(&self.settings_path) {
            tracing::warn!(path = %self.settings_path.display(), "could not save settings: {}", e);
        }
    }

    fn poll_conversion(&mut self, ctx: &egui::Context) {
        if !self.session.is_converting() {
            return;
        }
        if let Some(ConversionEvent::Finished {
            success: false,
            message,
            ..
        }) = self.session.poll_conversion()
        {
            self.report(ViewerError::Conversion(message));
        }
        // Keep polling while the worker runs
        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (prev, next, help, escape, theme) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::H) || i.key_pressed(egui::Key::F1),
                i.key_pressed(egui::Key::Escape),
                i.key_pressed(egui::Key::T),
            )
        });

        if let Tab::Viewer(mode) = self.tab {
            if prev {
                self.dispatch(mode, ViewerEvent::Key(Direction::Prev));
            }
            if next {
                self.dispatch(mode, ViewerEvent::Key(Direction::Next));
            }
        }
        if help {
            self.show_help = !self.show_help;
        }
        if escape {
            self.show_help = false;
        }
        if theme {
            self.settings.dark_mode = !self.settings.dark_mode;
            self.persist_settings();
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| {
            i.raw
                .dropped_files
                .first()
                .and_then(|f| f.path.clone())
        });
        if let Some(path) = dropped {
            self.open_path(path);
        }
    }

    /// Load a peak table, or start converting an mzML file
    pub fn open_path(&mut self, path: PathBuf) {
        let is_mzml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("mzml"));
        if is_mzml {
            self.start_conversion(path);
        } else {
            self.load_file(&path);
        }
        self.tab = Tab::Loader;
    }
}

impl eframe::App for MsScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        profiling::finish_frame!();

        if self.settings.dark_mode {
            ctx.set_visuals(egui::Visuals::dark());
        } else {
            ctx.set_visuals(egui::Visuals::light());
        }

        self.poll_conversion(ctx);
        self.handle_dropped_files(ctx);
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for tab in Tab::ALL {
                    ui.selectable_value(&mut self.tab, tab, tab.title());
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("?").on_hover_text("Keyboard shortcuts (H)").clicked() {
                        self.show_help = !self.show_help;
                    }
                    if ui
                        .checkbox(&mut self.settings.dark_mode, "Dark mode")
                        .changed()
                    {
                        self.persist_settings();
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            crate::ui::render_status_bar(self, ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.tab {
            Tab::Loader => crate::ui::render_loader(self, ui),
            Tab::Viewer(mode) => crate::ui::render_viewer(self, mode, ui),
        });

        crate::ui::render_confirm_dialog(self, ctx);
        crate::ui::render_error_dialog(self, ctx);
        crate::ui::render_help_dialog(self, ctx);
    }
}

impl Drop for MsScopeApp {
    fn drop(&mut self) {
        self.persist_settings();
    }
}
