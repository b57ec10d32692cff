#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use ms_scope::app::MsScopeApp;
use ms_scope::constants::config::SETTINGS_FILE;
use ms_scope::settings::AppSettings;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    #[cfg(feature = "profile-with-puffin")]
    let _puffin_server = {
        puffin::set_scopes_on(true);
        match puffin_http::Server::new(&format!("127.0.0.1:{}", puffin_http::DEFAULT_PORT)) {
            Ok(server) => Some(server),
            Err(e) => {
                tracing::warn!("puffin server failed to start: {}", e);
                None
            }
        }
    };

    let settings_path = PathBuf::from(SETTINGS_FILE);
    let settings = AppSettings::load(&settings_path).unwrap_or_else(|e| {
        tracing::warn!("using default settings: {}", e);
        AppSettings::default()
    });

    // Open a file passed on the command line
    let initial = std::env::args_os().nth(1).map(PathBuf::from);

    tracing::info!("starting ms-scope");
    eframe::run_native(
        "ms-scope - MS Scan Viewer",
        eframe::NativeOptions::default(),
        Box::new(move |_cc| {
            let mut app = MsScopeApp::new(settings, settings_path);
            if let Some(path) = initial {
                app.open_path(path);
            }
            Ok(Box::new(app))
        }),
    )
}
