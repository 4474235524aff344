//! Bindings to the Tesseract OCR C API and a lifecycle façade over them.
//!
//! - [`capi`]: native enums, plus raw declarations behind `engine-tesseract`
//! - [`engine`]: the [`OcrEngine`] seam the façade drives
//! - [`tesseract`]: the [`Tesseract`] façade
//! - [`engines`]: native engine implementations

#[cfg(feature = "static-tesseract")]
extern crate tesseract_static as _;

pub mod capi;
pub mod config;
pub mod decode;
pub mod deskew;
pub mod engine;
pub mod engines;
pub mod error;
pub mod iterator;
pub mod monitor;
pub mod pixels;
pub mod renderer;
pub mod tessdata;
pub mod tesseract;

pub use config::TessConfig;
pub use engine::{InitOptions, OcrEngine, PageCursor, ResultCursor};
pub use error::OcrError;
pub use iterator::{ElementCursor, TextElement};
pub use monitor::ProgressMonitor;
pub use pixels::{PixelBuffer, PixelLayout, Rect};
pub use renderer::{Document, DocumentReport, RenderOutcome, RenderedFormat};
pub use tesseract::Tesseract;
