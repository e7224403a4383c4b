//! Owned native document handle

use crate::engine::{NativeDocument, SaveFlags};
use crate::error::{PdfError, Result};
use crate::geometry::{PageSize, Rect};
use crate::layout::{Placement, RenderPolicy};
use crate::lifecycle::{EngineLease, EngineLifecycle};
use crate::surface::DrawingContext;
use std::io::Write;
use std::sync::Arc;

/// One native document and the page sizes read when it was opened.
///
/// The native handle is released exactly once, by [`close`](Self::close) or
/// on drop. Every operation after that fails with [`PdfError::UseAfterClose`]
/// without reaching the engine.
pub struct DocumentHandle {
    native: Option<Box<dyn NativeDocument>>,
    page_sizes: Vec<PageSize>,
    // Dropped after `native`, so the engine outlives the document.
    lease: EngineLease,
}

impl std::fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("open", &self.is_open())
            .field("page_sizes", &self.page_sizes)
            .finish()
    }
}

impl DocumentHandle {
    /// Open a document from bytes. The engine must already be ready.
    pub fn open(
        lifecycle: &Arc<EngineLifecycle>,
        data: Vec<u8>,
        password: Option<&str>,
    ) -> Result<Self> {
        let lease = lifecycle.lease()?;
        let size = data.len();

        let native = lease
            .engine()
            .load_document(data, password)
            .map_err(|e| {
                tracing::debug!("PDFium rejected document ({} bytes): {:?}", size, e);
                PdfError::OpenFailed {
                    reason: e.describe(),
                }
            })?;

        let count = native.page_count();
        if count < 0 {
            return Err(PdfError::OpenFailed {
                reason: format!("invalid page count {}", count),
            });
        }

        let mut page_sizes = Vec::with_capacity(count as usize);
        for index in 0..count {
            let (width, height) = native.page_size(index).ok_or_else(|| PdfError::OpenFailed {
                reason: format!("could not read size of page {}", index),
            })?;
            page_sizes.push(PageSize::new(width, height));
        }

        tracing::debug!("Opened PDF document: {} pages, {} bytes", count, size);

        Ok(Self {
            native: Some(native),
            page_sizes,
            lease,
        })
    }

    pub fn is_open(&self) -> bool {
        self.native.is_some()
    }

    pub fn page_count(&self) -> usize {
        self.page_sizes.len()
    }

    /// Page sizes in points, as read at open time.
    pub fn page_sizes(&self) -> &[PageSize] {
        &self.page_sizes
    }

    /// Size of one page in points.
    pub fn page_size(&self, index: usize) -> Result<PageSize> {
        self.native()?;
        self.check_index(index)?;
        Ok(self.page_sizes[index])
    }

    /// Rasterize a page into `context` within `bounds`.
    ///
    /// `bounds` is in the context's logical coordinates at `dpi_x`/`dpi_y`;
    /// the context's world transform maps it to device pixels. Nothing is
    /// drawn outside the transformed bounds.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        index: usize,
        context: &mut dyn DrawingContext,
        dpi_x: f32,
        dpi_y: f32,
        bounds: Rect,
        policy: &RenderPolicy,
        for_printing: bool,
    ) -> Result<()> {
        let native = self.native()?;
        self.check_index(index)?;

        if !(dpi_x > 0.0 && dpi_y > 0.0) {
            return Err(PdfError::InvalidParameter(format!(
                "DPI must be positive, got {}x{}",
                dpi_x, dpi_y
            )));
        }
        if bounds.is_empty() {
            return Ok(());
        }

        let page = self.page_sizes[index];
        let placement = Placement::compute(page, dpi_x, dpi_y, bounds, policy);
        let world = context.transform();
        let matrix = placement.page_matrix(page).then(&world);

        let mut target = context.pixels();
        target.check_layout().map_err(|reason| {
            PdfError::InvalidParameter(format!("unusable pixel target: {}", reason))
        })?;
        let clip = world.map_rect(&bounds.to_rectf()).intersect(&target.bounds());
        if clip.is_empty() {
            return Ok(());
        }

        let flags = policy.render_flags(for_printing);
        if native.render_page(index as i32, &mut target, &matrix, &clip, flags) {
            Ok(())
        } else {
            tracing::warn!("PDFium failed to render page {}", index);
            Err(PdfError::RenderFailed {
                index,
                reason: "native rasterization failed".to_string(),
            })
        }
    }

    /// Serialize the document into `sink`. The sink is left as the writer
    /// leaves it on failure.
    pub fn save_to(&self, sink: &mut dyn Write, flags: SaveFlags) -> Result<()> {
        let native = self.native()?;
        native.save(sink, flags).map_err(|reason| {
            tracing::warn!("PDF save failed: {}", reason);
            PdfError::SaveFailed { reason }
        })
    }

    /// Release the native handle. Returns false when it was already released.
    pub fn close(&mut self) -> bool {
        match self.native.take() {
            Some(native) => {
                drop(native);
                tracing::debug!("Closed PDF document");
                true
            }
            None => false,
        }
    }

    pub fn lifecycle(&self) -> &Arc<EngineLifecycle> {
        self.lease.lifecycle()
    }

    fn native(&self) -> Result<&dyn NativeDocument> {
        self.native.as_deref().ok_or(PdfError::UseAfterClose)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.page_sizes.len() {
            return Err(PdfError::PageIndexOutOfBounds {
                index,
                count: self.page_sizes.len(),
            });
        }
        Ok(())
    }
}

impl Drop for DocumentHandle {
    fn drop(&mut self) {
        self.close();
    }
}
