//! Rendering surfaces and drawing contexts

use crate::engine::PixelTarget;
use crate::error::{PdfError, Result};
use crate::geometry::Matrix;
use std::path::Path;

/// Something pages can be rendered onto: a window, a printer page, a bitmap.
///
/// The surface reports its own DPI and hands out a drawing context for the
/// duration of one render. The context is released by dropping it.
pub trait RenderSurface {
    /// Drawing context borrowed from the surface.
    type Context<'a>: DrawingContext
    where
        Self: 'a;

    /// Horizontal and vertical DPI of the surface.
    fn dpi(&self) -> (f32, f32);

    /// Acquire the native drawing context.
    fn acquire_context(&mut self) -> Result<Self::Context<'_>>;
}

/// An acquired drawing context.
pub trait DrawingContext {
    /// Current world transform (logical coordinates to device pixels).
    fn transform(&self) -> Matrix;

    /// Replace the world transform.
    fn set_transform(&mut self, transform: Matrix);

    /// Device pixel buffer, BGRA.
    fn pixels(&mut self) -> PixelTarget<'_>;
}

/// In-memory BGRA bitmap surface.
///
/// # Example
///
/// ```
/// use pdfium_viewer::BitmapSurface;
///
/// let mut surface = BitmapSurface::new(800, 600).with_dpi(96.0, 96.0);
/// surface.clear([255, 255, 255, 255]);
/// assert_eq!(surface.pixel(0, 0), Some([255, 255, 255, 255]));
/// ```
#[derive(Debug, Clone)]
pub struct BitmapSurface {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
    dpi: (f32, f32),
    transform: Matrix,
}

impl BitmapSurface {
    /// Default DPI of a new surface.
    pub const DEFAULT_DPI: f32 = 96.0;

    /// Create a transparent surface of `width` x `height` pixels.
    pub fn new(width: u32, height: u32) -> Self {
        let stride = width as usize * 4;
        Self {
            width,
            height,
            stride,
            data: vec![0; buffer_len(width, height, 4)],
            dpi: (Self::DEFAULT_DPI, Self::DEFAULT_DPI),
            transform: Matrix::identity(),
        }
    }

    pub fn with_dpi(mut self, dpi_x: f32, dpi_y: f32) -> Self {
        self.dpi = (dpi_x, dpi_y);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Raw BGRA data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// World transform applied to everything drawn on this surface.
    pub fn transform(&self) -> Matrix {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Matrix) {
        self.transform = transform;
    }

    /// Fill the whole surface with one BGRA color.
    pub fn clear(&mut self, bgra: [u8; 4]) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&bgra);
        }
    }

    /// BGRA value at (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride + x as usize * 4;
        let px = &self.data[offset..offset + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Convert BGRA to RGB data (copies and converts).
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(buffer_len(self.width, self.height, 3));
        for y in 0..self.height as usize {
            for x in 0..self.width as usize {
                let offset = y * self.stride + x * 4;
                // BGRA -> RGB
                rgb.push(self.data[offset + 2]);
                rgb.push(self.data[offset + 1]);
                rgb.push(self.data[offset]);
            }
        }
        rgb
    }

    fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(buffer_len(self.width, self.height, 4));
        for y in 0..self.height as usize {
            for x in 0..self.width as usize {
                let offset = y * self.stride + x * 4;
                rgba.push(self.data[offset + 2]);
                rgba.push(self.data[offset + 1]);
                rgba.push(self.data[offset]);
                rgba.push(self.data[offset + 3]);
            }
        }
        rgba
    }

    /// Save the surface as a PNG file.
    pub fn save_as_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use png::{BitDepth, ColorType, Encoder};
        use std::fs::File;
        use std::io::BufWriter;

        let file = File::create(path)?;
        let writer = BufWriter::new(file);

        let mut encoder = Encoder::new(writer, self.width, self.height);
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);

        let mut png_writer = encoder
            .write_header()
            .map_err(|e| PdfError::PngEncoding(e.to_string()))?;

        png_writer
            .write_image_data(&self.to_rgba())
            .map_err(|e| PdfError::PngEncoding(e.to_string()))?;

        Ok(())
    }

    /// Save the surface as a JPEG file.
    ///
    /// # Arguments
    ///
    /// * `path` - Output file path
    /// * `quality` - JPEG quality (1-100)
    pub fn save_as_jpeg<P: AsRef<Path>>(&self, path: P, quality: u8) -> Result<()> {
        use jpeg_encoder::{ColorType as JpegColorType, Encoder};
        use std::fs::File;
        use std::io::BufWriter;

        let width = u16::try_from(self.width).map_err(|_| {
            PdfError::JpegEncoding(format!("width {} exceeds JPEG limit", self.width))
        })?;
        let height = u16::try_from(self.height).map_err(|_| {
            PdfError::JpegEncoding(format!("height {} exceeds JPEG limit", self.height))
        })?;

        let rgb = self.to_rgb();
        let file = File::create(path)?;
        let writer = BufWriter::new(file);

        let encoder = Encoder::new(writer, quality);
        encoder
            .encode(&rgb, width, height, JpegColorType::Rgb)
            .map_err(|e| PdfError::JpegEncoding(e.to_string()))?;

        Ok(())
    }
}

impl RenderSurface for BitmapSurface {
    type Context<'a> = BitmapContext<'a>;

    fn dpi(&self) -> (f32, f32) {
        self.dpi
    }

    fn acquire_context(&mut self) -> Result<Self::Context<'_>> {
        Ok(BitmapContext { surface: self })
    }
}

/// Drawing context of a [`BitmapSurface`].
#[derive(Debug)]
pub struct BitmapContext<'a> {
    surface: &'a mut BitmapSurface,
}

impl DrawingContext for BitmapContext<'_> {
    fn transform(&self) -> Matrix {
        self.surface.transform
    }

    fn set_transform(&mut self, transform: Matrix) {
        self.surface.transform = transform;
    }

    fn pixels(&mut self) -> PixelTarget<'_> {
        PixelTarget {
            width: self.surface.width,
            height: self.surface.height,
            stride: self.surface.stride,
            data: &mut self.surface.data,
        }
    }
}

/// Bytes in a tightly packed `width` x `height` image, in `usize` so large
/// surfaces do not wrap in `u32`.
fn buffer_len(width: u32, height: u32, channels: usize) -> usize {
    width as usize * height as usize * channels
}
