//! Runtime symbol binding for the PDFium shared library

use crate::*;
use libc::{c_int, c_ulong, c_void};
use libloading::Library;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while binding to a PDFium shared library.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The shared library could not be opened
    #[error("Failed to load PDFium library from {path}: {source}")]
    Library {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// The library was opened but lacks a required export
    #[error("PDFium library is missing symbol {symbol}: {source}")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },
}

/// File name of the PDFium shared library on the current platform.
pub fn platform_library_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "pdfium.dll"
    } else if cfg!(target_os = "macos") {
        "libpdfium.dylib"
    } else {
        "libpdfium.so"
    }
}

/// Function table bound from a loaded PDFium library.
///
/// The table keeps the library mapped for as long as it lives; the function
/// pointers must not be used after it is dropped.
pub struct PdfiumLibrary {
    path: PathBuf,
    pub FPDF_InitLibrary: unsafe extern "C" fn(),
    pub FPDF_DestroyLibrary: unsafe extern "C" fn(),
    pub FPDF_GetLastError: unsafe extern "C" fn() -> c_ulong,
    pub FPDF_LoadMemDocument:
        unsafe extern "C" fn(data_buf: *const c_void, size: c_int, password: FPDF_BYTESTRING) -> FPDF_DOCUMENT,
    pub FPDF_CloseDocument: unsafe extern "C" fn(document: FPDF_DOCUMENT),
    pub FPDF_GetPageCount: unsafe extern "C" fn(document: FPDF_DOCUMENT) -> c_int,
    pub FPDF_GetPageSizeByIndex: unsafe extern "C" fn(
        document: FPDF_DOCUMENT,
        page_index: c_int,
        width: *mut f64,
        height: *mut f64,
    ) -> c_int,
    pub FPDF_LoadPage: unsafe extern "C" fn(document: FPDF_DOCUMENT, page_index: c_int) -> FPDF_PAGE,
    pub FPDF_ClosePage: unsafe extern "C" fn(page: FPDF_PAGE),
    pub FPDFBitmap_CreateEx: unsafe extern "C" fn(
        width: c_int,
        height: c_int,
        format: c_int,
        first_scan: *mut c_void,
        stride: c_int,
    ) -> FPDF_BITMAP,
    pub FPDFBitmap_Destroy: unsafe extern "C" fn(bitmap: FPDF_BITMAP),
    pub FPDF_RenderPageBitmapWithMatrix: unsafe extern "C" fn(
        bitmap: FPDF_BITMAP,
        page: FPDF_PAGE,
        matrix: *const FS_MATRIX,
        clipping: *const FS_RECTF,
        flags: c_int,
    ),
    pub FPDF_SaveAsCopy: unsafe extern "C" fn(
        document: FPDF_DOCUMENT,
        file_write: *mut FPDF_FILEWRITE,
        flags: FPDF_DWORD,
    ) -> FPDF_BOOL,
    // Declared last so the function pointers above are dropped before the mapping.
    _library: Library,
}

impl PdfiumLibrary {
    /// Open the shared library at `path` and bind every symbol this crate exposes.
    ///
    /// A bare file name (no directory) is handed to the system loader, which
    /// applies its usual search rules.
    pub fn load<P: AsRef<OsStr>>(path: P) -> Result<Self, LoadError> {
        let path = PathBuf::from(path.as_ref());

        // SAFETY: loading PDFium runs no initialization routines with
        // preconditions beyond those of any shared library.
        let library = unsafe { Library::new(path.as_os_str()) }.map_err(|source| {
            LoadError::Library {
                path: path.clone(),
                source,
            }
        })?;

        // SAFETY: every field type matches the PDFium public header signature.
        unsafe {
            Ok(Self {
                FPDF_InitLibrary: bind(&library, "FPDF_InitLibrary")?,
                FPDF_DestroyLibrary: bind(&library, "FPDF_DestroyLibrary")?,
                FPDF_GetLastError: bind(&library, "FPDF_GetLastError")?,
                FPDF_LoadMemDocument: bind(&library, "FPDF_LoadMemDocument")?,
                FPDF_CloseDocument: bind(&library, "FPDF_CloseDocument")?,
                FPDF_GetPageCount: bind(&library, "FPDF_GetPageCount")?,
                FPDF_GetPageSizeByIndex: bind(&library, "FPDF_GetPageSizeByIndex")?,
                FPDF_LoadPage: bind(&library, "FPDF_LoadPage")?,
                FPDF_ClosePage: bind(&library, "FPDF_ClosePage")?,
                FPDFBitmap_CreateEx: bind(&library, "FPDFBitmap_CreateEx")?,
                FPDFBitmap_Destroy: bind(&library, "FPDFBitmap_Destroy")?,
                FPDF_RenderPageBitmapWithMatrix: bind(&library, "FPDF_RenderPageBitmapWithMatrix")?,
                FPDF_SaveAsCopy: bind(&library, "FPDF_SaveAsCopy")?,
                path,
                _library: library,
            })
        }
    }

    /// Path (or bare name) the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for PdfiumLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfiumLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Resolve one exported function and copy the pointer out of the symbol.
///
/// # Safety
///
/// `T` must be the exact function pointer type of the export.
unsafe fn bind<T: Copy>(library: &Library, symbol: &'static str) -> Result<T, LoadError> {
    library
        .get::<T>(symbol.as_bytes())
        .map(|sym| *sym)
        .map_err(|source| LoadError::MissingSymbol { symbol, source })
}
