//! Page rendering onto surfaces
//!
//! The rasterizer paints at the DPI the caller asks for. A surface may report
//! a different DPI (a printer at 600 DPI previewed at 96, a HiDPI window), so
//! before rasterizing we scale the drawing context by `surface_dpi / dpi` on
//! top of whatever transform the caller already set. The context's transform
//! is restored and the context released on every exit path.

use crate::error::Result;
use crate::geometry::{Matrix, Rect};
use crate::handle::DocumentHandle;
use crate::layout::RenderPolicy;
use crate::surface::{DrawingContext, RenderSurface};

/// One render call: which page, at what DPI, into which bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub page_index: usize,
    pub dpi_x: f32,
    pub dpi_y: f32,
    /// Target rectangle in logical pixels at the requested DPI.
    pub bounds: Rect,
    pub for_printing: bool,
}

impl RenderRequest {
    pub fn new(page_index: usize, dpi: f32, bounds: Rect) -> Self {
        Self {
            page_index,
            dpi_x: dpi,
            dpi_y: dpi,
            bounds,
            for_printing: false,
        }
    }

    pub fn with_dpi(mut self, dpi_x: f32, dpi_y: f32) -> Self {
        self.dpi_x = dpi_x;
        self.dpi_y = dpi_y;
        self
    }

    pub fn for_printing(mut self, for_printing: bool) -> Self {
        self.for_printing = for_printing;
        self
    }
}

/// Scale reconciling the requested DPI with the surface's own DPI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceTransform {
    pub scale_x: f32,
    pub scale_y: f32,
}

impl DeviceTransform {
    /// `None` when the surface DPI already matches the requested DPI, compared
    /// after truncation to whole dots per inch.
    pub fn compute(surface_dpi: (f32, f32), requested_dpi: (f32, f32)) -> Option<Self> {
        let (surface_x, surface_y) = surface_dpi;
        let (dpi_x, dpi_y) = requested_dpi;

        if surface_x as i32 == dpi_x as i32 && surface_y as i32 == dpi_y as i32 {
            return None;
        }

        Some(Self {
            scale_x: surface_x / dpi_x,
            scale_y: surface_y / dpi_y,
        })
    }

    pub fn to_matrix(self) -> Matrix {
        Matrix::scale(self.scale_x, self.scale_y)
    }
}

/// Restores a context's transform when dropped.
struct TransformGuard<'c, C: DrawingContext> {
    context: &'c mut C,
    saved: Matrix,
}

impl<'c, C: DrawingContext> TransformGuard<'c, C> {
    fn new(context: &'c mut C) -> Self {
        let saved = context.transform();
        Self { context, saved }
    }

    /// Left-multiply: `transform` applies first, the saved transform outward of it.
    fn prepend(&mut self, transform: Matrix) {
        self.context.set_transform(transform.then(&self.saved));
    }

    fn context(&mut self) -> &mut C {
        self.context
    }
}

impl<C: DrawingContext> Drop for TransformGuard<'_, C> {
    fn drop(&mut self) {
        self.context.set_transform(self.saved);
    }
}

/// Computes device transforms and drives rasterization onto surfaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageRenderer {
    policy: RenderPolicy,
}

impl PageRenderer {
    pub fn new(policy: RenderPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RenderPolicy {
        &self.policy
    }

    /// Render one page onto `surface`.
    ///
    /// Returns the device transform that was applied for the duration of the
    /// call, if any. The page index and handle state are validated before the
    /// surface is touched.
    pub fn render<S: RenderSurface>(
        &self,
        handle: &DocumentHandle,
        surface: &mut S,
        request: &RenderRequest,
    ) -> Result<Option<DeviceTransform>> {
        handle.page_size(request.page_index)?;

        let device = DeviceTransform::compute(surface.dpi(), (request.dpi_x, request.dpi_y));

        let mut context = surface.acquire_context()?;
        let result = {
            let mut guard = TransformGuard::new(&mut context);
            if let Some(device) = device {
                tracing::debug!(
                    "Scaling drawing context by {}x{} for {} DPI request",
                    device.scale_x,
                    device.scale_y,
                    request.dpi_x
                );
                guard.prepend(device.to_matrix());
            }
            handle.render(
                request.page_index,
                guard.context(),
                request.dpi_x,
                request.dpi_y,
                request.bounds,
                &self.policy,
                request.for_printing,
            )
        };
        drop(context);

        result.map(|()| device)
    }
}
