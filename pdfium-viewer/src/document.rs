//! Public document facade

use crate::engine::SaveFlags;
use crate::error::{PdfError, Result};
use crate::geometry::{PageSize, Rect};
use crate::handle::DocumentHandle;
use crate::layout::RenderPolicy;
use crate::lifecycle::EngineLifecycle;
use crate::render::{PageRenderer, RenderRequest};
use crate::surface::RenderSurface;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;

/// A PDF document loaded for rendering and saving.
///
/// Loading makes sure the engine is initialized. The document keeps the
/// engine alive until it is closed, either by [`close`](Self::close) or on
/// drop. Page sizes are read once at load time and stay available after close.
///
/// # Example
///
/// ```no_run
/// use pdfium_viewer::{BitmapSurface, PdfDocument, Rect};
///
/// let mut doc = PdfDocument::load("document.pdf")?;
/// println!("{} pages", doc.page_count());
///
/// let mut surface = BitmapSurface::new(850, 1100);
/// surface.clear([255, 255, 255, 255]);
/// doc.render(0, &mut surface, 96.0, 96.0, Rect::new(0, 0, 850, 1100), false)?;
/// surface.save_as_png("page0.png")?;
///
/// doc.save("copy.pdf")?;
/// doc.close();
/// # Ok::<(), pdfium_viewer::PdfError>(())
/// ```
#[derive(Debug)]
pub struct PdfDocument {
    handle: DocumentHandle,
    page_sizes: Vec<PageSize>,
}

impl PdfDocument {
    /// Load a document from a file using the global engine.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_password(path, None)
    }

    /// Load a password-protected document from a file using the global engine.
    pub fn load_with_password<P: AsRef<Path>>(path: P, password: Option<&str>) -> Result<Self> {
        let lifecycle = EngineLifecycle::global();
        lifecycle.ensure_ready()?;
        let data = read_file(path.as_ref())?;
        Self::open(&lifecycle, data, password)
    }

    /// Load a document from any reader using the global engine.
    pub fn load_from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::load_from_reader_with(&EngineLifecycle::global(), reader, None)
    }

    /// Load a document from bytes using the global engine.
    pub fn load_from_bytes(data: Vec<u8>, password: Option<&str>) -> Result<Self> {
        Self::load_with(&EngineLifecycle::global(), data, password)
    }

    /// Load a document from bytes on a specific engine lifecycle.
    pub fn load_with(
        lifecycle: &Arc<EngineLifecycle>,
        data: Vec<u8>,
        password: Option<&str>,
    ) -> Result<Self> {
        lifecycle.ensure_ready()?;
        Self::open(lifecycle, data, password)
    }

    /// Load a document from a file on a specific engine lifecycle.
    pub fn load_path_with<P: AsRef<Path>>(
        lifecycle: &Arc<EngineLifecycle>,
        path: P,
        password: Option<&str>,
    ) -> Result<Self> {
        lifecycle.ensure_ready()?;
        let data = read_file(path.as_ref())?;
        Self::open(lifecycle, data, password)
    }

    /// Load a document from a reader on a specific engine lifecycle.
    pub fn load_from_reader_with<R: Read>(
        lifecycle: &Arc<EngineLifecycle>,
        mut reader: R,
        password: Option<&str>,
    ) -> Result<Self> {
        lifecycle.ensure_ready()?;
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| PdfError::OpenFailed {
                reason: format!("cannot read document: {}", e),
            })?;
        Self::open(lifecycle, data, password)
    }

    fn open(
        lifecycle: &Arc<EngineLifecycle>,
        data: Vec<u8>,
        password: Option<&str>,
    ) -> Result<Self> {
        let handle = DocumentHandle::open(lifecycle, data, password)?;
        let page_sizes = handle.page_sizes().to_vec();
        Ok(Self { handle, page_sizes })
    }

    pub fn page_count(&self) -> usize {
        self.page_sizes.len()
    }

    /// Page sizes in points, in page order.
    pub fn page_sizes(&self) -> &[PageSize] {
        &self.page_sizes
    }

    /// Size of one page in points.
    pub fn page_size(&self, index: usize) -> Result<PageSize> {
        self.handle.page_size(index)
    }

    /// Render a page with the default placement policy.
    ///
    /// `bounds` is in logical pixels at `dpi_x`/`dpi_y`. When the surface
    /// reports a different DPI the drawing is scaled to match for the duration
    /// of the call.
    pub fn render<S: RenderSurface>(
        &self,
        page: usize,
        surface: &mut S,
        dpi_x: f32,
        dpi_y: f32,
        bounds: Rect,
        for_printing: bool,
    ) -> Result<()> {
        let request = RenderRequest::new(page, dpi_x, bounds)
            .with_dpi(dpi_x, dpi_y)
            .for_printing(for_printing);
        self.render_with_policy(surface, &request, &RenderPolicy::default())
    }

    /// Render a page for a printer: print flag set, default placement policy.
    pub fn render_for_printing<S: RenderSurface>(
        &self,
        page: usize,
        surface: &mut S,
        dpi_x: f32,
        dpi_y: f32,
        bounds: Rect,
    ) -> Result<()> {
        self.render(page, surface, dpi_x, dpi_y, bounds, true)
    }

    /// Render with an explicit request and placement policy.
    pub fn render_with_policy<S: RenderSurface>(
        &self,
        surface: &mut S,
        request: &RenderRequest,
        policy: &RenderPolicy,
    ) -> Result<()> {
        PageRenderer::new(*policy)
            .render(&self.handle, surface, request)
            .map(|_| ())
    }

    /// Save the document to a file, overwriting it.
    ///
    /// The file is closed whether or not saving succeeds; a partially written
    /// file is left in place on failure.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.save_with_flags(path, SaveFlags::default())
    }

    pub fn save_with_flags<P: AsRef<Path>>(&self, path: P, flags: SaveFlags) -> Result<()> {
        if !self.handle.is_open() {
            return Err(PdfError::UseAfterClose);
        }
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.handle.save_to(&mut writer, flags)?;
        writer.flush()?;
        tracing::debug!("Saved PDF document to {}", path.display());
        Ok(())
    }

    /// Save the document into a writer.
    pub fn save_to_writer<W: Write>(&self, mut writer: W, flags: SaveFlags) -> Result<()> {
        self.handle.save_to(&mut writer, flags)?;
        writer.flush()?;
        Ok(())
    }

    /// Serialize the document into memory.
    pub fn save_to_bytes(&self, flags: SaveFlags) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.handle.save_to(&mut bytes, flags)?;
        Ok(bytes)
    }

    /// Release the native document. Safe to call more than once.
    pub fn close(&mut self) {
        self.handle.close();
    }

    pub fn is_closed(&self) -> bool {
        !self.handle.is_open()
    }

    /// The engine lifecycle this document was loaded on.
    pub fn lifecycle(&self) -> &Arc<EngineLifecycle> {
        self.handle.lifecycle()
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| PdfError::OpenFailed {
        reason: format!("cannot read {}: {}", path.display(), e),
    })
}
