//! Process-wide engine lifecycle
//!
//! PDFium must be initialized once per process and destroyed at most once,
//! never while a document is still open. [`EngineLifecycle`] owns that state
//! behind a single mutex. Open documents hold an [`EngineLease`]; a shutdown
//! requested while leases are outstanding is deferred until the last one is
//! released.

use crate::config::EngineConfig;
use crate::engine::NativeEngine;
use crate::error::{PdfError, Result};
use crate::pdfium::PdfiumEngine;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

static GLOBAL: OnceLock<Arc<EngineLifecycle>> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Ready,
    Failed(String),
    TornDown,
}

#[derive(Debug)]
struct LifecycleState {
    phase: Phase,
    live_documents: usize,
    shutdown_pending: bool,
}

/// What a call to [`EngineLifecycle::shutdown`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The engine was destroyed by this call.
    TornDown,
    /// Documents are still open; the engine is destroyed when the last closes.
    Deferred { live_documents: usize },
    /// Teardown already happened (or is already pending).
    AlreadyShutDown,
    /// The engine never initialized successfully; nothing to destroy.
    NotInitialized,
}

/// Owner of the native engine's init/teardown state.
///
/// # Example
///
/// ```no_run
/// use pdfium_viewer::EngineLifecycle;
///
/// let engine = EngineLifecycle::global();
/// engine.ensure_ready()?;
/// // ... open and render documents ...
/// pdfium_viewer::shutdown_global();
/// # Ok::<(), pdfium_viewer::PdfError>(())
/// ```
pub struct EngineLifecycle {
    engine: Arc<dyn NativeEngine>,
    state: Mutex<LifecycleState>,
}

impl std::fmt::Debug for EngineLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineLifecycle")
            .field("state", &*self.lock())
            .finish_non_exhaustive()
    }
}

impl EngineLifecycle {
    /// Wrap a native engine. Nothing is initialized until [`ensure_ready`](Self::ensure_ready).
    pub fn new(engine: Arc<dyn NativeEngine>) -> Self {
        Self {
            engine,
            state: Mutex::new(LifecycleState {
                phase: Phase::Uninitialized,
                live_documents: 0,
                shutdown_pending: false,
            }),
        }
    }

    /// Lifecycle over the PDFium shared library resolved from `config`.
    pub fn with_config(config: EngineConfig) -> Self {
        Self::new(Arc::new(PdfiumEngine::new(config)))
    }

    /// The process-wide lifecycle.
    ///
    /// Unless [`install_global`](Self::install_global) ran first, this is a
    /// PDFium engine configured from the environment.
    pub fn global() -> Arc<EngineLifecycle> {
        GLOBAL
            .get_or_init(|| Arc::new(Self::with_config(EngineConfig::from_env())))
            .clone()
    }

    /// Install the process-wide lifecycle. Fails (handing the value back) when
    /// one is already installed or [`global`](Self::global) was already used.
    pub fn install_global(
        lifecycle: Arc<EngineLifecycle>,
    ) -> std::result::Result<(), Arc<EngineLifecycle>> {
        GLOBAL.set(lifecycle)
    }

    /// Initialize the engine on first call; later calls are no-ops.
    ///
    /// A failed initialization is sticky: every later call reports the same
    /// `EngineInitializationFailed` without touching the engine again.
    pub fn ensure_ready(&self) -> Result<()> {
        let mut state = self.lock();
        if state.shutdown_pending {
            return Err(PdfError::EngineShutDown);
        }
        match state.phase.clone() {
            Phase::Ready => Ok(()),
            Phase::Failed(reason) => Err(PdfError::EngineInitializationFailed { reason }),
            Phase::TornDown => Err(PdfError::EngineShutDown),
            Phase::Uninitialized => match self.engine.init_library() {
                Ok(()) => {
                    tracing::debug!("PDFium engine initialized");
                    state.phase = Phase::Ready;
                    Ok(())
                }
                Err(reason) => {
                    tracing::warn!("PDFium engine initialization failed: {}", reason);
                    state.phase = Phase::Failed(reason.clone());
                    Err(PdfError::EngineInitializationFailed { reason })
                }
            },
        }
    }

    /// True once initialized and until a shutdown is requested.
    pub fn is_ready(&self) -> bool {
        let state = self.lock();
        state.phase == Phase::Ready && !state.shutdown_pending
    }

    /// Number of documents currently holding a lease.
    pub fn live_documents(&self) -> usize {
        self.lock().live_documents
    }

    /// Request teardown. Idempotent: only the first effective request destroys
    /// the engine, later ones report [`ShutdownOutcome::AlreadyShutDown`].
    pub fn shutdown(&self) -> ShutdownOutcome {
        let mut state = self.lock();
        if state.shutdown_pending {
            return ShutdownOutcome::AlreadyShutDown;
        }
        match state.phase.clone() {
            Phase::TornDown => ShutdownOutcome::AlreadyShutDown,
            Phase::Failed(_) => ShutdownOutcome::NotInitialized,
            Phase::Uninitialized => {
                // Nothing to destroy, but later ensure_ready calls must not init.
                state.phase = Phase::TornDown;
                ShutdownOutcome::NotInitialized
            }
            Phase::Ready if state.live_documents > 0 => {
                tracing::debug!(
                    "PDFium shutdown deferred until {} document(s) close",
                    state.live_documents
                );
                state.shutdown_pending = true;
                ShutdownOutcome::Deferred {
                    live_documents: state.live_documents,
                }
            }
            Phase::Ready => {
                self.teardown(&mut state);
                ShutdownOutcome::TornDown
            }
        }
    }

    /// Guard that calls [`shutdown`](Self::shutdown) when dropped, for use at
    /// the top of `main`.
    pub fn shutdown_guard(self: &Arc<Self>) -> ShutdownGuard {
        ShutdownGuard {
            lifecycle: Arc::clone(self),
        }
    }

    /// Take a lease for a new document. Requires a ready engine.
    pub(crate) fn lease(self: &Arc<Self>) -> Result<EngineLease> {
        let mut state = self.lock();
        if state.shutdown_pending {
            return Err(PdfError::EngineShutDown);
        }
        match state.phase.clone() {
            Phase::Ready => {
                state.live_documents += 1;
                Ok(EngineLease {
                    lifecycle: Arc::clone(self),
                })
            }
            Phase::Uninitialized => Err(PdfError::EngineNotReady),
            Phase::Failed(reason) => Err(PdfError::EngineInitializationFailed { reason }),
            Phase::TornDown => Err(PdfError::EngineShutDown),
        }
    }

    pub(crate) fn engine(&self) -> &dyn NativeEngine {
        self.engine.as_ref()
    }

    fn release(&self) {
        let mut state = self.lock();
        state.live_documents = state.live_documents.saturating_sub(1);
        if state.live_documents == 0 && state.shutdown_pending {
            self.teardown(&mut state);
        }
    }

    fn teardown(&self, state: &mut LifecycleState) {
        if state.phase != Phase::Ready {
            return;
        }
        self.engine.destroy_library();
        state.phase = Phase::TornDown;
        state.shutdown_pending = false;
        tracing::debug!("PDFium engine destroyed");
    }

    fn lock(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shut down the process-wide engine, if it was ever created.
pub fn shutdown_global() -> Option<ShutdownOutcome> {
    GLOBAL.get().map(|lifecycle| lifecycle.shutdown())
}

/// Keeps the engine alive for one open document.
#[derive(Debug)]
pub struct EngineLease {
    lifecycle: Arc<EngineLifecycle>,
}

impl EngineLease {
    pub(crate) fn engine(&self) -> &dyn NativeEngine {
        self.lifecycle.engine()
    }

    pub fn lifecycle(&self) -> &Arc<EngineLifecycle> {
        &self.lifecycle
    }
}

impl Drop for EngineLease {
    fn drop(&mut self) {
        self.lifecycle.release();
    }
}

/// Shuts the lifecycle down when dropped.
#[derive(Debug)]
#[must_use = "the engine is shut down as soon as the guard is dropped"]
pub struct ShutdownGuard {
    lifecycle: Arc<EngineLifecycle>,
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.lifecycle.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{NativeDocument, NativeLoadError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingEngine {
        inits: AtomicUsize,
        destroys: AtomicUsize,
        fail_init: bool,
    }

    impl NativeEngine for CountingEngine {
        fn init_library(&self) -> std::result::Result<(), String> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                Err("library not found".to_string())
            } else {
                Ok(())
            }
        }

        fn destroy_library(&self) {
            self.destroys.fetch_add(1, Ordering::SeqCst);
        }

        fn load_document(
            &self,
            _data: Vec<u8>,
            _password: Option<&str>,
        ) -> std::result::Result<Box<dyn NativeDocument>, NativeLoadError> {
            Err(NativeLoadError::Format)
        }
    }

    fn lifecycle(engine: &Arc<CountingEngine>) -> Arc<EngineLifecycle> {
        Arc::new(EngineLifecycle::new(engine.clone()))
    }

    #[test]
    fn test_ensure_ready_is_idempotent() {
        let engine = Arc::new(CountingEngine::default());
        let lc = lifecycle(&engine);
        for _ in 0..5 {
            lc.ensure_ready().unwrap();
        }
        assert_eq!(engine.inits.load(Ordering::SeqCst), 1);
        assert!(lc.is_ready());
    }

    #[test]
    fn test_failed_init_is_sticky() {
        let engine = Arc::new(CountingEngine {
            fail_init: true,
            ..Default::default()
        });
        let lc = lifecycle(&engine);

        for _ in 0..3 {
            match lc.ensure_ready() {
                Err(PdfError::EngineInitializationFailed { reason }) => {
                    assert_eq!(reason, "library not found")
                }
                other => panic!("Expected EngineInitializationFailed, got {:?}", other),
            }
        }
        assert_eq!(engine.inits.load(Ordering::SeqCst), 1);
        assert_eq!(lc.shutdown(), ShutdownOutcome::NotInitialized);
        assert_eq!(engine.destroys.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shutdown_twice_destroys_once() {
        let engine = Arc::new(CountingEngine::default());
        let lc = lifecycle(&engine);
        lc.ensure_ready().unwrap();

        assert_eq!(lc.shutdown(), ShutdownOutcome::TornDown);
        assert_eq!(lc.shutdown(), ShutdownOutcome::AlreadyShutDown);
        assert_eq!(engine.destroys.load(Ordering::SeqCst), 1);
        assert!(matches!(lc.ensure_ready(), Err(PdfError::EngineShutDown)));
    }

    #[test]
    fn test_shutdown_deferred_while_leased() {
        let engine = Arc::new(CountingEngine::default());
        let lc = lifecycle(&engine);
        lc.ensure_ready().unwrap();

        let first = lc.lease().unwrap();
        let second = lc.lease().unwrap();
        assert_eq!(lc.live_documents(), 2);

        assert_eq!(
            lc.shutdown(),
            ShutdownOutcome::Deferred { live_documents: 2 }
        );
        assert_eq!(lc.shutdown(), ShutdownOutcome::AlreadyShutDown);
        assert!(!lc.is_ready());
        assert!(matches!(lc.lease(), Err(PdfError::EngineShutDown)));

        drop(first);
        assert_eq!(engine.destroys.load(Ordering::SeqCst), 0);
        drop(second);
        assert_eq!(engine.destroys.load(Ordering::SeqCst), 1);
        assert_eq!(lc.live_documents(), 0);
    }

    #[test]
    fn test_lease_requires_ready() {
        let engine = Arc::new(CountingEngine::default());
        let lc = lifecycle(&engine);
        assert!(matches!(lc.lease(), Err(PdfError::EngineNotReady)));
    }

    #[test]
    fn test_shutdown_before_init() {
        let engine = Arc::new(CountingEngine::default());
        let lc = lifecycle(&engine);
        assert_eq!(lc.shutdown(), ShutdownOutcome::NotInitialized);
        assert!(matches!(lc.ensure_ready(), Err(PdfError::EngineShutDown)));
        assert_eq!(engine.inits.load(Ordering::SeqCst), 0);
        assert_eq!(engine.destroys.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shutdown_guard() {
        let engine = Arc::new(CountingEngine::default());
        let lc = lifecycle(&engine);
        lc.ensure_ready().unwrap();
        {
            let _guard = lc.shutdown_guard();
        }
        assert_eq!(engine.destroys.load(Ordering::SeqCst), 1);
    }
}
