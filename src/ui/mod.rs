mod data_table;
mod dialogs;
mod loader;
mod plot;
mod viewer;

pub use dialogs::{render_confirm_dialog, render_error_dialog, render_help_dialog, render_status_bar};
pub use loader::render_loader;
pub use viewer::render_viewer;
