//! Native engine abstraction
//!
//! The rest of the crate talks to PDFium only through these two traits.
//! [`crate::PdfiumEngine`] implements them over the real library; tests plug
//! in counting stubs.

use crate::geometry::{Matrix, RectF};
use std::io::Write;

/// Why the engine refused to open a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeLoadError {
    /// Engine not initialized (or already torn down).
    NotInitialized,
    /// File could not be read by the engine.
    File,
    /// Not a PDF, or corrupted.
    Format,
    /// Password required or incorrect.
    Password,
    /// Unsupported security scheme.
    Security,
    /// Anything else, with the raw engine code.
    Unknown(u32),
}

impl NativeLoadError {
    pub fn from_code(code: u32) -> Self {
        match code {
            pdfium_sys::FPDF_ERR_FILE => NativeLoadError::File,
            pdfium_sys::FPDF_ERR_FORMAT => NativeLoadError::Format,
            pdfium_sys::FPDF_ERR_PASSWORD => NativeLoadError::Password,
            pdfium_sys::FPDF_ERR_SECURITY => NativeLoadError::Security,
            other => NativeLoadError::Unknown(other),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            NativeLoadError::NotInitialized => "engine is not initialized".to_string(),
            NativeLoadError::File => "file could not be read".to_string(),
            NativeLoadError::Format => "not a PDF or corrupted".to_string(),
            NativeLoadError::Password => "password required or incorrect".to_string(),
            NativeLoadError::Security => "unsupported security scheme".to_string(),
            NativeLoadError::Unknown(code) => format!("PDFium error code: {}", code),
        }
    }
}

/// Flags passed through to the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderFlags {
    pub annotations: bool,
    pub lcd_text: bool,
    pub grayscale: bool,
    pub printing: bool,
}

impl Default for RenderFlags {
    fn default() -> Self {
        Self {
            annotations: true,
            lcd_text: false,
            grayscale: false,
            printing: false,
        }
    }
}

impl RenderFlags {
    /// Convert to PDFium render flags.
    pub fn to_raw(self) -> i32 {
        let mut flags = 0u32;
        if self.annotations {
            flags |= pdfium_sys::FPDF_ANNOT;
        }
        if self.lcd_text {
            flags |= pdfium_sys::FPDF_LCD_TEXT;
        }
        if self.grayscale {
            flags |= pdfium_sys::FPDF_GRAYSCALE;
        }
        if self.printing {
            flags |= pdfium_sys::FPDF_PRINTING;
        }
        flags as i32
    }
}

/// Flags for controlling how a document is saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveFlags {
    /// Save incrementally (append changes instead of rewriting).
    pub incremental: bool,

    /// Remove security/encryption from the saved document.
    pub remove_security: bool,
}

impl SaveFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incremental(mut self) -> Self {
        self.incremental = true;
        self
    }

    pub fn remove_security(mut self) -> Self {
        self.remove_security = true;
        self
    }

    /// Convert to PDFium save flags.
    pub fn to_raw(self) -> u32 {
        if self.remove_security {
            pdfium_sys::FPDF_REMOVE_SECURITY
        } else if self.incremental {
            pdfium_sys::FPDF_INCREMENTAL
        } else {
            pdfium_sys::FPDF_NO_INCREMENTAL
        }
    }
}

/// Mutable BGRA pixel buffer the rasterizer paints into.
#[derive(Debug)]
pub struct PixelTarget<'a> {
    pub width: u32,
    pub height: u32,
    /// Bytes per row, at least `width * 4`.
    pub stride: usize,
    pub data: &'a mut [u8],
}

impl PixelTarget<'_> {
    /// Whole-target rectangle in device pixels.
    pub fn bounds(&self) -> RectF {
        RectF {
            left: 0.0,
            top: 0.0,
            right: self.width as f32,
            bottom: self.height as f32,
        }
    }

    /// Check that the buffer really holds `height` rows of `stride` bytes,
    /// each row wide enough for `width` BGRA pixels, and that every dimension
    /// fits a C `int`.
    pub fn check_layout(&self) -> std::result::Result<(), String> {
        let row_bytes = (self.width as usize)
            .checked_mul(4)
            .ok_or_else(|| format!("width {} overflows a row", self.width))?;
        if self.stride < row_bytes {
            return Err(format!(
                "stride {} is smaller than {} bytes per row",
                self.stride, row_bytes
            ));
        }
        let needed = self
            .stride
            .checked_mul(self.height as usize)
            .ok_or_else(|| format!("{} rows of {} bytes overflow", self.height, self.stride))?;
        if needed > self.data.len() {
            return Err(format!(
                "buffer holds {} bytes, {} needed",
                self.data.len(),
                needed
            ));
        }
        if i32::try_from(self.width).is_err()
            || i32::try_from(self.height).is_err()
            || i32::try_from(self.stride).is_err()
        {
            return Err(format!(
                "{}x{} target with stride {} exceeds native limits",
                self.width, self.height, self.stride
            ));
        }
        Ok(())
    }

    /// Fill an axis-aligned device rectangle with one BGRA color, clipped to the target.
    pub fn fill_rect(&mut self, rect: &RectF, bgra: [u8; 4]) {
        let r = rect.intersect(&self.bounds());
        let x0 = r.left.floor().max(0.0) as usize;
        let y0 = r.top.floor().max(0.0) as usize;
        let x1 = (r.right.ceil() as usize).min(self.width as usize);
        let y1 = (r.bottom.ceil() as usize).min(self.height as usize);
        for y in y0..y1 {
            let row = y * self.stride;
            for x in x0..x1 {
                let offset = row + x * 4;
                self.data[offset..offset + 4].copy_from_slice(&bgra);
            }
        }
    }
}

/// Process-wide native rendering engine.
pub trait NativeEngine: Send + Sync {
    /// Initialize the engine. Called at most once per engine value.
    fn init_library(&self) -> std::result::Result<(), String>;

    /// Tear the engine down. Called at most once, after `init_library` succeeded
    /// and after every document opened through it has been dropped.
    fn destroy_library(&self);

    /// Open a document from bytes. The document owns `data` for its lifetime.
    fn load_document(
        &self,
        data: Vec<u8>,
        password: Option<&str>,
    ) -> std::result::Result<Box<dyn NativeDocument>, NativeLoadError>;
}

/// One open native document. Dropping it releases the native handle.
pub trait NativeDocument: Send {
    /// Number of pages, negative on failure.
    fn page_count(&self) -> i32;

    /// Page size in points, `None` when the engine reports failure.
    fn page_size(&self, index: i32) -> Option<(f64, f64)>;

    /// Rasterize a page. `matrix` maps page points (origin top-left, y down)
    /// to target pixels; nothing may be written outside `clip`. Callers pass
    /// only targets that satisfy [`PixelTarget::check_layout`].
    fn render_page(
        &self,
        index: i32,
        target: &mut PixelTarget<'_>,
        matrix: &Matrix,
        clip: &RectF,
        flags: RenderFlags,
    ) -> bool;

    /// Serialize the document into `sink`. The error carries a reason fit
    /// for the user, including any error the sink returned.
    fn save(&self, sink: &mut dyn Write, flags: SaveFlags) -> std::result::Result<(), String>;
}
