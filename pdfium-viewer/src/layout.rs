//! Fit, stretch, center and rotation policy for placing a page in bounds

use crate::engine::RenderFlags;
use crate::geometry::{Matrix, PageSize, Rect, RectF};
use serde::{Deserialize, Serialize};

/// How a page is placed into the target bounds.
///
/// The default turns every placement flag on: the page is scaled to fit
/// (down and up) with its aspect ratio kept, centered, and rotated by 90
/// degrees when its orientation differs from the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderPolicy {
    /// Shrink a page that is larger than the bounds.
    pub fit_to_bounds: bool,
    /// Grow a page that is smaller than the bounds.
    pub stretch_to_bounds: bool,
    /// Scale both axes by the same factor.
    pub keep_aspect_ratio: bool,
    /// Center the page when it does not fill the bounds.
    pub center_in_bounds: bool,
    /// Rotate landscape pages into portrait bounds (and vice versa).
    pub auto_rotate: bool,
    /// Render annotations.
    pub annotations: bool,
    /// LCD-optimized text.
    pub lcd_text: bool,
    /// Grayscale output.
    pub grayscale: bool,
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self {
            fit_to_bounds: true,
            stretch_to_bounds: true,
            keep_aspect_ratio: true,
            center_in_bounds: true,
            auto_rotate: true,
            annotations: true,
            lcd_text: false,
            grayscale: false,
        }
    }
}

impl RenderPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render at natural size, anchored at the top-left of the bounds.
    pub fn natural_size() -> Self {
        Self {
            fit_to_bounds: false,
            stretch_to_bounds: false,
            center_in_bounds: false,
            auto_rotate: false,
            ..Self::default()
        }
    }

    pub fn render_flags(&self, for_printing: bool) -> RenderFlags {
        RenderFlags {
            annotations: self.annotations,
            lcd_text: self.lcd_text,
            grayscale: self.grayscale,
            printing: for_printing,
        }
    }
}

/// Where a page lands inside the bounds, in pixels at the requested DPI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Rectangle covered by the (possibly rotated) page.
    pub rect: RectF,
    /// Page rotated 90 degrees clockwise.
    pub rotated: bool,
}

impl Placement {
    /// Compute the placement of `page` inside `bounds`.
    pub fn compute(
        page: PageSize,
        dpi_x: f32,
        dpi_y: f32,
        bounds: Rect,
        policy: &RenderPolicy,
    ) -> Placement {
        let bounds_w = bounds.width as f64;
        let bounds_h = bounds.height as f64;

        let rotated = policy.auto_rotate
            && page.width != page.height
            && bounds_w != bounds_h
            && page.is_landscape() != (bounds_w > bounds_h);

        // Pixel size of the page as it will appear (after rotation).
        let (mut width, mut height) = if rotated {
            (
                page.height * dpi_x as f64 / 72.0,
                page.width * dpi_y as f64 / 72.0,
            )
        } else {
            page.to_pixels(dpi_x, dpi_y)
        };

        if width > 0.0 && height > 0.0 && bounds_w > 0.0 && bounds_h > 0.0 {
            let scale_x = bounds_w / width;
            let scale_y = bounds_h / height;
            let wanted = |scale: f64| {
                (policy.fit_to_bounds && scale < 1.0) || (policy.stretch_to_bounds && scale > 1.0)
            };

            if policy.keep_aspect_ratio {
                let scale = scale_x.min(scale_y);
                if wanted(scale) {
                    width *= scale;
                    height *= scale;
                }
            } else {
                if wanted(scale_x) {
                    width *= scale_x;
                }
                if wanted(scale_y) {
                    height *= scale_y;
                }
            }
        }

        let (left, top) = if policy.center_in_bounds {
            (
                bounds.x as f64 + (bounds_w - width) / 2.0,
                bounds.y as f64 + (bounds_h - height) / 2.0,
            )
        } else {
            (bounds.x as f64, bounds.y as f64)
        };

        Placement {
            rect: RectF {
                left: left as f32,
                top: top as f32,
                right: (left + width) as f32,
                bottom: (top + height) as f32,
            },
            rotated,
        }
    }

    /// Matrix from page points (origin top-left, y down) onto `rect`.
    pub fn page_matrix(&self, page: PageSize) -> Matrix {
        let rect = &self.rect;
        if page.width <= 0.0 || page.height <= 0.0 {
            return Matrix::translate(rect.left, rect.top);
        }
        let page_w = page.width as f32;
        let page_h = page.height as f32;

        if self.rotated {
            // (x, y) -> (right - y * sx, top + x * sy)
            Matrix {
                a: 0.0,
                b: rect.height() / page_w,
                c: -rect.width() / page_h,
                d: 0.0,
                e: rect.right,
                f: rect.top,
            }
        } else {
            Matrix {
                a: rect.width() / page_w,
                b: 0.0,
                c: 0.0,
                d: rect.height() / page_h,
                e: rect.left,
                f: rect.top,
            }
        }
    }
}
