//! Stub native engine shared by the integration tests.
//!
//! Documents use a tiny text format instead of PDF:
//!
//! ```text
//! STUB-PDF
//! #secret          (optional password line)
//! 612 792          (one line per page: width height, in points)
//! ```
//!
//! Every native call is counted and appended to an event log so tests can
//! check ordering (documents closed before the engine is destroyed) and that
//! nothing reaches the engine after a document is closed.

#![allow(dead_code)]

use pdfium_viewer::{
    BitmapContext, BitmapSurface, DrawingContext, EngineLifecycle, Matrix, NativeDocument,
    NativeEngine, NativeLoadError, PixelTarget, RectF, RenderFlags, RenderSurface, SaveFlags,
};
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const HEADER: &str = "STUB-PDF";

/// BGRA color the stub paints rendered pages with.
pub const PAGE_COLOR: [u8; 4] = [0, 0, 255, 255];

pub const WHITE: [u8; 4] = [255, 255, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCall {
    pub index: i32,
    pub matrix: Matrix,
    pub clip: RectF,
    pub flags: RenderFlags,
}

#[derive(Debug, Default)]
pub struct Stats {
    pub inits: AtomicUsize,
    pub destroys: AtomicUsize,
    pub loads: AtomicUsize,
    pub closes: AtomicUsize,
    pub renders: AtomicUsize,
    pub saves: AtomicUsize,
    pub fail_render: AtomicBool,
    pub fail_save: AtomicBool,
    pub events: Mutex<Vec<&'static str>>,
    pub render_calls: Mutex<Vec<RenderCall>>,
}

impl Stats {
    fn record(&self, counter: &AtomicUsize, event: &'static str) {
        counter.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(event);
    }

    pub fn count(&self, counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    pub fn last_render(&self) -> Option<RenderCall> {
        self.render_calls.lock().unwrap().last().copied()
    }
}

pub struct StubEngine {
    stats: Arc<Stats>,
    init_error: Option<String>,
}

impl StubEngine {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(Stats::default()),
            init_error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            stats: Arc::new(Stats::default()),
            init_error: Some(reason.to_string()),
        }
    }

    pub fn stats(&self) -> Arc<Stats> {
        Arc::clone(&self.stats)
    }
}

impl NativeEngine for StubEngine {
    fn init_library(&self) -> Result<(), String> {
        self.stats.record(&self.stats.inits, "init");
        match &self.init_error {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }

    fn destroy_library(&self) {
        self.stats.record(&self.stats.destroys, "destroy");
    }

    fn load_document(
        &self,
        data: Vec<u8>,
        password: Option<&str>,
    ) -> Result<Box<dyn NativeDocument>, NativeLoadError> {
        self.stats.record(&self.stats.loads, "load");
        let text = String::from_utf8(data).map_err(|_| NativeLoadError::Format)?;
        let mut lines = text.lines();
        if lines.next() != Some(HEADER) {
            return Err(NativeLoadError::Format);
        }

        let mut required_password = None;
        let mut pages = Vec::new();
        for line in lines {
            if let Some(pw) = line.strip_prefix('#') {
                required_password = Some(pw.to_string());
                continue;
            }
            let mut parts = line.split_whitespace();
            let width = parts.next().and_then(|v| v.parse::<f64>().ok());
            let height = parts.next().and_then(|v| v.parse::<f64>().ok());
            match (width, height) {
                (Some(w), Some(h)) => pages.push((w, h)),
                _ => return Err(NativeLoadError::Format),
            }
        }

        if let Some(expected) = &required_password {
            if password != Some(expected.as_str()) {
                return Err(NativeLoadError::Password);
            }
        }

        Ok(Box::new(StubDocument {
            stats: Arc::clone(&self.stats),
            pages,
            password: required_password,
        }))
    }
}

struct StubDocument {
    stats: Arc<Stats>,
    pages: Vec<(f64, f64)>,
    password: Option<String>,
}

impl NativeDocument for StubDocument {
    fn page_count(&self) -> i32 {
        self.pages.len() as i32
    }

    fn page_size(&self, index: i32) -> Option<(f64, f64)> {
        self.pages.get(index as usize).copied()
    }

    fn render_page(
        &self,
        index: i32,
        target: &mut PixelTarget<'_>,
        matrix: &Matrix,
        clip: &RectF,
        flags: RenderFlags,
    ) -> bool {
        self.stats.record(&self.stats.renders, "render");
        self.stats.render_calls.lock().unwrap().push(RenderCall {
            index,
            matrix: *matrix,
            clip: *clip,
            flags,
        });
        if self.stats.fail_render.load(Ordering::SeqCst) {
            return false;
        }
        target.fill_rect(clip, PAGE_COLOR);
        true
    }

    fn save(&self, sink: &mut dyn Write, flags: SaveFlags) -> Result<(), String> {
        self.stats.record(&self.stats.saves, "save");
        if self.stats.fail_save.load(Ordering::SeqCst) {
            // Leave a partial write behind, as a real engine would.
            let _ = sink.write_all(HEADER.as_bytes());
            return Err("injected failure".to_string());
        }
        let password = if flags.remove_security {
            None
        } else {
            self.password.as_deref()
        };
        sink.write_all(&stub_pdf_bytes(&self.pages, password))
            .map_err(|e| format!("write to sink failed: {}", e))
    }
}

impl Drop for StubDocument {
    fn drop(&mut self) {
        self.stats.record(&self.stats.closes, "close");
    }
}

fn stub_pdf_bytes(pages: &[(f64, f64)], password: Option<&str>) -> Vec<u8> {
    let mut out = format!("{}\n", HEADER);
    if let Some(pw) = password {
        out.push_str(&format!("#{}\n", pw));
    }
    for (w, h) in pages {
        out.push_str(&format!("{} {}\n", w, h));
    }
    out.into_bytes()
}

pub fn stub_pdf(pages: &[(f64, f64)]) -> Vec<u8> {
    stub_pdf_bytes(pages, None)
}

pub fn stub_pdf_with_password(pages: &[(f64, f64)], password: &str) -> Vec<u8> {
    stub_pdf_bytes(pages, Some(password))
}

/// The three-page document used across tests.
pub fn three_pages() -> Vec<u8> {
    stub_pdf(&[(612.0, 792.0), (612.0, 792.0), (300.0, 400.0)])
}

/// A fresh lifecycle over a stub engine.
pub fn stub_lifecycle() -> (Arc<EngineLifecycle>, Arc<Stats>) {
    let engine = StubEngine::new();
    let stats = engine.stats();
    (Arc::new(EngineLifecycle::new(Arc::new(engine))), stats)
}

/// A ready lifecycle over a stub engine.
pub fn ready_lifecycle() -> (Arc<EngineLifecycle>, Arc<Stats>) {
    let (lifecycle, stats) = stub_lifecycle();
    lifecycle.ensure_ready().unwrap();
    (lifecycle, stats)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Bitmap surface that counts acquired and released drawing contexts.
///
/// With `zero_stride` set, its context hands out a 100x100 pixel target with
/// no backing bytes.
pub struct CountingSurface {
    pub bitmap: BitmapSurface,
    pub acquires: usize,
    pub releases: usize,
    pub zero_stride: bool,
}

impl CountingSurface {
    pub fn new(width: u32, height: u32, dpi: f32) -> Self {
        let mut bitmap = BitmapSurface::new(width, height).with_dpi(dpi, dpi);
        bitmap.clear(WHITE);
        Self {
            bitmap,
            acquires: 0,
            releases: 0,
            zero_stride: false,
        }
    }

    /// True when every acquired context has been released.
    pub fn balanced(&self) -> bool {
        self.acquires == self.releases
    }
}

impl RenderSurface for CountingSurface {
    type Context<'a> = CountingContext<'a>;

    fn dpi(&self) -> (f32, f32) {
        self.bitmap.dpi()
    }

    fn acquire_context(&mut self) -> pdfium_viewer::Result<Self::Context<'_>> {
        self.acquires += 1;
        Ok(CountingContext {
            inner: self.bitmap.acquire_context()?,
            releases: &mut self.releases,
            zero_stride: self.zero_stride,
        })
    }
}

pub struct CountingContext<'a> {
    inner: BitmapContext<'a>,
    releases: &'a mut usize,
    zero_stride: bool,
}

impl DrawingContext for CountingContext<'_> {
    fn transform(&self) -> Matrix {
        self.inner.transform()
    }

    fn set_transform(&mut self, transform: Matrix) {
        self.inner.set_transform(transform);
    }

    fn pixels(&mut self) -> PixelTarget<'_> {
        if self.zero_stride {
            PixelTarget {
                width: 100,
                height: 100,
                stride: 0,
                data: &mut [],
            }
        } else {
            self.inner.pixels()
        }
    }
}

impl Drop for CountingContext<'_> {
    fn drop(&mut self) {
        *self.releases += 1;
    }
}
