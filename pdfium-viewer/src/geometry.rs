//! Page and device geometry

use serde::{Deserialize, Serialize};

/// Size of a page in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size in pixels at the given horizontal and vertical DPI.
    pub fn to_pixels(self, dpi_x: f32, dpi_y: f32) -> (f64, f64) {
        (
            self.width * dpi_x as f64 / 72.0,
            self.height * dpi_y as f64 / 72.0,
        )
    }

    pub fn is_landscape(self) -> bool {
        self.width > self.height
    }
}

impl From<(f64, f64)> for PageSize {
    fn from((width, height): (f64, f64)) -> Self {
        Self { width, height }
    }
}

/// Integer device rectangle (x, y, width, height), as handed to `render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn to_rectf(self) -> RectF {
        RectF {
            left: self.x as f32,
            top: self.y as f32,
            right: self.x as f32 + self.width as f32,
            bottom: self.y as f32 + self.height as f32,
        }
    }
}

/// Float rectangle in left/top/right/bottom form (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl RectF {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Overlap of two rectangles; empty (zero sized) when they do not intersect.
    pub fn intersect(&self, other: &RectF) -> RectF {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right).max(left);
        let bottom = self.bottom.min(other.bottom).max(top);
        RectF {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// 2D affine transform in row-vector form:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
///
/// Same layout as GDI's `XFORM` and PDFium's `FS_MATRIX`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: 0.0,
            f: 0.0,
        }
    }

    pub const fn translate(dx: f32, dy: f32) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: dx,
            f: dy,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// `self` followed by `next`.
    ///
    /// `scale.then(current)` is GDI's left multiplication: the scale applies
    /// first and `current` stays in effect outward of it.
    pub fn then(&self, next: &Matrix) -> Matrix {
        Matrix {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            e: self.e * next.a + self.f * next.c + next.e,
            f: self.e * next.b + self.f * next.d + next.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Axis-aligned bounding box of `rect` after transformation.
    pub fn map_rect(&self, rect: &RectF) -> RectF {
        let corners = [
            self.apply(rect.left, rect.top),
            self.apply(rect.right, rect.top),
            self.apply(rect.left, rect.bottom),
            self.apply(rect.right, rect.bottom),
        ];
        let mut out = RectF {
            left: f32::INFINITY,
            top: f32::INFINITY,
            right: f32::NEG_INFINITY,
            bottom: f32::NEG_INFINITY,
        };
        for (x, y) in corners {
            out.left = out.left.min(x);
            out.top = out.top.min(y);
            out.right = out.right.max(x);
            out.bottom = out.bottom.max(y);
        }
        out
    }

    pub fn to_ffi(&self) -> pdfium_sys::FS_MATRIX {
        pdfium_sys::FS_MATRIX {
            a: self.a,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            f: self.f,
        }
    }
}

impl RectF {
    pub fn to_ffi(&self) -> pdfium_sys::FS_RECTF {
        pdfium_sys::FS_RECTF {
            left: self.left,
            top: self.top,
            right: self.right,
            bottom: self.bottom,
        }
    }
}
