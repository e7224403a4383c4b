//! FFI bindings to PDFium
//!
//! This crate provides low-level bindings to the PDFium library.
//! PDFium is a PDF rendering library developed by Google as part of the Chromium project.
//!
//! The library is not linked at build time. Symbols are resolved at runtime from a
//! shared library located by path, so the embedding application decides which PDFium
//! build to use (and when to load it):
//!
//! ```no_run
//! use pdfium_sys::{platform_library_name, PdfiumLibrary};
//!
//! let library = PdfiumLibrary::load(platform_library_name())?;
//! unsafe {
//!     (library.FPDF_InitLibrary)();
//!     (library.FPDF_DestroyLibrary)();
//! }
//! # Ok::<(), pdfium_sys::LoadError>(())
//! ```

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

mod library;

pub use library::{platform_library_name, LoadError, PdfiumLibrary};

use libc::{c_int, c_ulong, c_void};

// ========================================
// Opaque handles
// ========================================

pub type FPDF_DOCUMENT = *mut c_void;
pub type FPDF_PAGE = *mut c_void;
pub type FPDF_BITMAP = *mut c_void;
pub type FPDF_BOOL = c_int;
pub type FPDF_DWORD = c_ulong;
pub type FPDF_BYTESTRING = *const libc::c_char;

// ========================================
// Error codes (FPDF_GetLastError)
// ========================================

pub const FPDF_ERR_SUCCESS: u32 = 0;
pub const FPDF_ERR_UNKNOWN: u32 = 1;
pub const FPDF_ERR_FILE: u32 = 2;
pub const FPDF_ERR_FORMAT: u32 = 3;
pub const FPDF_ERR_PASSWORD: u32 = 4;
pub const FPDF_ERR_SECURITY: u32 = 5;
pub const FPDF_ERR_PAGE: u32 = 6;

// ========================================
// Render flags
// ========================================

/// Render annotations.
pub const FPDF_ANNOT: u32 = 0x01;
/// Use LCD text rendering.
pub const FPDF_LCD_TEXT: u32 = 0x02;
/// Don't use the native text output available on some platforms.
pub const FPDF_NO_NATIVETEXT: u32 = 0x04;
/// Grayscale output.
pub const FPDF_GRAYSCALE: u32 = 0x08;
/// Render for printing.
pub const FPDF_PRINTING: u32 = 0x800;

// ========================================
// Bitmap formats
// ========================================

pub const FPDFBitmap_Unknown: u32 = 0;
pub const FPDFBitmap_Gray: u32 = 1;
pub const FPDFBitmap_BGR: u32 = 2;
pub const FPDFBitmap_BGRx: u32 = 3;
pub const FPDFBitmap_BGRA: u32 = 4;

// ========================================
// Save flags (FPDF_SaveAsCopy)
// ========================================

pub const FPDF_INCREMENTAL: u32 = 1;
pub const FPDF_NO_INCREMENTAL: u32 = 2;
pub const FPDF_REMOVE_SECURITY: u32 = 3;

/// Affine matrix, `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FS_MATRIX {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

/// Rectangle in float coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FS_RECTF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// File writer callback table passed to `FPDF_SaveAsCopy`.
///
/// Callers may embed this as the first field of a larger `#[repr(C)]` struct
/// to carry their own state into `WriteBlock`.
#[repr(C)]
pub struct FPDF_FILEWRITE_ {
    pub version: c_int,
    pub WriteBlock: Option<
        unsafe extern "C" fn(pThis: *mut FPDF_FILEWRITE_, pData: *const c_void, size: c_ulong) -> c_int,
    >,
}

pub type FPDF_FILEWRITE = FPDF_FILEWRITE_;
