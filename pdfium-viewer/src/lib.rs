//! # pdfium-viewer
//!
//! Render PDF pages onto arbitrary surfaces through PDFium, with the engine's
//! process-wide lifecycle managed for you.
//!
//! - The PDFium shared library is located and bound at runtime, right before
//!   it is first initialized ([`EngineConfig`]).
//! - The engine is initialized once per process and destroyed at most once,
//!   never while a document is open ([`EngineLifecycle`]).
//! - Pages are placed into target bounds with fit / stretch / aspect / center
//!   / auto-rotate rules ([`RenderPolicy`]) and scaled to the surface's DPI.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfium_viewer::{BitmapSurface, EngineLifecycle, PdfDocument, Rect};
//!
//! // Shut the engine down when main returns
//! let _guard = EngineLifecycle::global().shutdown_guard();
//!
//! let doc = PdfDocument::load("document.pdf")?;
//! for (i, size) in doc.page_sizes().iter().enumerate() {
//!     let (w, h) = size.to_pixels(150.0, 150.0);
//!     let mut surface = BitmapSurface::new(w as u32, h as u32).with_dpi(150.0, 150.0);
//!     surface.clear([255, 255, 255, 255]);
//!     doc.render(i, &mut surface, 150.0, 150.0, Rect::new(0, 0, w as i32, h as i32), false)?;
//!     surface.save_as_png(format!("page_{}.png", i))?;
//! }
//! # Ok::<(), pdfium_viewer::PdfError>(())
//! ```

mod character;
mod config;
mod document;
mod engine;
mod error;
mod geometry;
mod handle;
mod layout;
mod lifecycle;
mod pdfium;
mod render;
mod surface;

pub use character::PdfCharacterInfo;
pub use config::{EngineConfig, ENV_LIBRARY_PATH, ENV_LIB_DIR};
pub use document::PdfDocument;
pub use engine::{
    NativeDocument, NativeEngine, NativeLoadError, PixelTarget, RenderFlags, SaveFlags,
};
pub use error::{PdfError, Result};
pub use geometry::{Matrix, PageSize, Rect, RectF};
pub use handle::DocumentHandle;
pub use layout::{Placement, RenderPolicy};
pub use lifecycle::{shutdown_global, EngineLease, EngineLifecycle, ShutdownGuard, ShutdownOutcome};
pub use pdfium::PdfiumEngine;
pub use render::{DeviceTransform, PageRenderer, RenderRequest};
pub use surface::{BitmapContext, BitmapSurface, DrawingContext, RenderSurface};
