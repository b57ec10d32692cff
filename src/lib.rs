//! ms-scope: linked chromatogram and spectrum views over mass-spectrometry
//! peak tables
//!
//! The core ([`scan`], [`normalize`], [`viewer`], [`render`]) never draws. It
//! turns user events into render plans that a [`render::RenderSurface`]
//! executes. The egui shell in [`app`] and [`ui`] paints those surfaces.

pub mod app;
pub mod constants;
pub mod convert;
pub mod data;
pub mod downsample;
pub mod error;
pub mod normalize;
pub mod render;
pub mod scan;
pub mod session;
pub mod settings;
pub mod ui;
pub mod viewer;

pub use error::{Result, ViewerError};
