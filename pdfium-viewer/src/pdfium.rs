//! PDFium-backed native engine

use crate::config::EngineConfig;
use crate::engine::{NativeDocument, NativeEngine, NativeLoadError, PixelTarget, RenderFlags, SaveFlags};
use crate::geometry::{Matrix, RectF};
use libc::{c_int, c_ulong, c_void};
use pdfium_sys::*;
use std::ffi::CString;
use std::io::Write;
use std::sync::{Arc, OnceLock};

/// Native engine over a PDFium shared library loaded at runtime.
///
/// The library is located and bound on the first `init_library` call, using
/// the candidate list from [`EngineConfig::candidates`].
pub struct PdfiumEngine {
    config: EngineConfig,
    library: OnceLock<Arc<PdfiumLibrary>>,
}

impl PdfiumEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            library: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The bound library, once `init_library` has succeeded.
    pub fn library(&self) -> Option<&Arc<PdfiumLibrary>> {
        self.library.get()
    }

    fn resolve(&self) -> std::result::Result<PdfiumLibrary, String> {
        let candidates = self.config.candidates();
        if candidates.is_empty() {
            return Err("no PDFium library candidates configured".to_string());
        }

        let mut failures = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            match PdfiumLibrary::load(candidate) {
                Ok(library) => {
                    tracing::debug!("Bound PDFium library at {}", candidate.display());
                    return Ok(library);
                }
                Err(e) => {
                    tracing::debug!("Skipping PDFium candidate {}: {}", candidate.display(), e);
                    failures.push(e.to_string());
                }
            }
        }

        Err(format!(
            "no usable PDFium library found ({})",
            failures.join("; ")
        ))
    }
}

impl NativeEngine for PdfiumEngine {
    fn init_library(&self) -> std::result::Result<(), String> {
        let library = match self.library.get() {
            Some(library) => Arc::clone(library),
            None => {
                let library = Arc::new(self.resolve()?);
                Arc::clone(self.library.get_or_init(|| library))
            }
        };
        unsafe { (library.FPDF_InitLibrary)() };
        Ok(())
    }

    fn destroy_library(&self) {
        if let Some(library) = self.library.get() {
            unsafe { (library.FPDF_DestroyLibrary)() };
        }
    }

    fn load_document(
        &self,
        data: Vec<u8>,
        password: Option<&str>,
    ) -> std::result::Result<Box<dyn NativeDocument>, NativeLoadError> {
        let library = self.library.get().ok_or(NativeLoadError::NotInitialized)?;

        let size = c_int::try_from(data.len()).map_err(|_| NativeLoadError::File)?;

        // Convert password to C string if provided
        let c_password = password
            .map(CString::new)
            .transpose()
            .map_err(|_| NativeLoadError::Password)?;
        let password_ptr = c_password
            .as_ref()
            .map(|p| p.as_ptr())
            .unwrap_or(std::ptr::null());

        // The document keeps `data` alive; PDFium reads from it lazily.
        let handle = unsafe {
            (library.FPDF_LoadMemDocument)(data.as_ptr() as *const c_void, size, password_ptr)
        };

        if handle.is_null() {
            let code = unsafe { (library.FPDF_GetLastError)() };
            return Err(NativeLoadError::from_code(code as u32));
        }

        Ok(Box::new(PdfiumDocument {
            library: Arc::clone(library),
            handle,
            _data: data,
        }))
    }
}

/// An open PDFium document together with the bytes it was loaded from.
struct PdfiumDocument {
    library: Arc<PdfiumLibrary>,
    handle: FPDF_DOCUMENT,
    _data: Vec<u8>,
}

// SAFETY: the handle is only used through `&self`/`&mut self` of one owner at a
// time; PDFium document handles may move between threads.
unsafe impl Send for PdfiumDocument {}

impl NativeDocument for PdfiumDocument {
    fn page_count(&self) -> i32 {
        unsafe { (self.library.FPDF_GetPageCount)(self.handle) }
    }

    fn page_size(&self, index: i32) -> Option<(f64, f64)> {
        let mut width = 0.0f64;
        let mut height = 0.0f64;
        let ok = unsafe {
            (self.library.FPDF_GetPageSizeByIndex)(self.handle, index, &mut width, &mut height)
        };
        if ok == 0 {
            None
        } else {
            Some((width, height))
        }
    }

    fn render_page(
        &self,
        index: i32,
        target: &mut PixelTarget<'_>,
        matrix: &Matrix,
        clip: &RectF,
        flags: RenderFlags,
    ) -> bool {
        let lib = &self.library;
        if let Err(reason) = target.check_layout() {
            tracing::warn!("Refusing to rasterize page {}: {}", index, reason);
            return false;
        }

        let page = unsafe { (lib.FPDF_LoadPage)(self.handle, index) };
        if page.is_null() {
            return false;
        }

        // Wrap the caller's buffer; PDFium does not free external buffers.
        let bitmap = unsafe {
            (lib.FPDFBitmap_CreateEx)(
                target.width as c_int,
                target.height as c_int,
                FPDFBitmap_BGRA as c_int,
                target.data.as_mut_ptr() as *mut c_void,
                target.stride as c_int,
            )
        };
        if bitmap.is_null() {
            unsafe { (lib.FPDF_ClosePage)(page) };
            return false;
        }

        let matrix = matrix.to_ffi();
        let clip = clip.to_ffi();
        unsafe {
            (lib.FPDF_RenderPageBitmapWithMatrix)(bitmap, page, &matrix, &clip, flags.to_raw());
            (lib.FPDFBitmap_Destroy)(bitmap);
            (lib.FPDF_ClosePage)(page);
        }
        true
    }

    fn save(&self, sink: &mut dyn Write, flags: SaveFlags) -> std::result::Result<(), String> {
        let mut writer = SinkWriter::new(sink);
        let success = unsafe {
            (self.library.FPDF_SaveAsCopy)(
                self.handle,
                &mut writer as *mut SinkWriter<'_> as *mut FPDF_FILEWRITE,
                flags.to_raw() as FPDF_DWORD,
            )
        };

        if let Some(e) = writer.error.take() {
            return Err(format!("write to sink failed: {}", e));
        }
        if success == 0 {
            return Err("PDFium could not serialize the document".to_string());
        }
        Ok(())
    }
}

/// `FPDF_FILEWRITE` that forwards blocks to a Rust writer and keeps the first
/// sink error. `base` must stay the first field so PDFium's `pThis` can be
/// cast back to the whole struct.
#[repr(C)]
struct SinkWriter<'a> {
    base: FPDF_FILEWRITE,
    sink: &'a mut dyn Write,
    error: Option<std::io::Error>,
}

impl<'a> SinkWriter<'a> {
    fn new(sink: &'a mut dyn Write) -> Self {
        Self {
            base: FPDF_FILEWRITE {
                version: 1,
                WriteBlock: Some(write_block),
            },
            sink,
            error: None,
        }
    }
}

unsafe extern "C" fn write_block(
    pthis: *mut FPDF_FILEWRITE,
    data: *const c_void,
    size: c_ulong,
) -> c_int {
    let writer = &mut *(pthis as *mut SinkWriter<'_>);
    if writer.error.is_some() {
        return 0;
    }
    let bytes = if size == 0 || data.is_null() {
        &[][..]
    } else {
        std::slice::from_raw_parts(data as *const u8, size as usize)
    };
    match writer.sink.write_all(bytes) {
        Ok(()) => 1,
        Err(e) => {
            writer.error = Some(e);
            0
        }
    }
}

impl Drop for PdfiumDocument {
    fn drop(&mut self) {
        unsafe {
            (self.library.FPDF_CloseDocument)(self.handle);
        }
    }
}
