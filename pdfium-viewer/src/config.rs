//! Engine configuration and PDFium library resolution

use pdfium_sys::platform_library_name;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the PDFium shared library file.
pub const ENV_LIBRARY_PATH: &str = "PDFIUM_LIBRARY_PATH";

/// Environment variable naming a directory containing the PDFium shared library.
pub const ENV_LIB_DIR: &str = "PDFIUM_LIB_DIR";

/// Configuration for the native engine.
///
/// Library resolution happens once, lazily, right before the engine is
/// initialized. Candidates are tried in this order:
///
/// 1. `library_path`, when set and non-empty
/// 2. the platform library name inside each of `search_paths`
/// 3. `lib/` next to the running executable
/// 4. the bare platform library name (system loader search)
///
/// # Example
///
/// ```
/// use pdfium_viewer::EngineConfig;
///
/// let config = EngineConfig::new()
///     .set_library_path("/opt/pdfium/lib/libpdfium.so")
///     .add_search_path("/usr/local/lib");
/// assert_eq!(config.candidates()[0].to_str(), Some("/opt/pdfium/lib/libpdfium.so"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Explicit path to the PDFium shared library.
    pub library_path: Option<PathBuf>,
    /// Directories searched for the platform library name.
    pub search_paths: Vec<PathBuf>,
    /// Skip the executable-relative and system loader fallbacks.
    pub disable_default_search: bool,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from `PDFIUM_LIBRARY_PATH` and `PDFIUM_LIB_DIR`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = std::env::var_os(ENV_LIBRARY_PATH).filter(|p| !p.is_empty()) {
            config.library_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = std::env::var_os(ENV_LIB_DIR).filter(|p| !p.is_empty()) {
            config.search_paths.push(PathBuf::from(dir));
        }
        config
    }

    pub fn set_library_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.library_path = Some(path.into());
        self
    }

    pub fn add_search_path<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    pub fn set_default_search(mut self, enabled: bool) -> Self {
        self.disable_default_search = !enabled;
        self
    }

    /// Ordered list of library locations to try.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let name = platform_library_name();
        let mut paths = Vec::new();

        if let Some(path) = self
            .library_path
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
        {
            paths.push(path.clone());
        }

        for dir in &self.search_paths {
            paths.push(dir.join(name));
        }

        if !self.disable_default_search {
            if let Some(exe_dir) = std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
            {
                paths.push(exe_dir.join("lib").join(name));
            }
            paths.push(PathBuf::from(name));
        }

        paths
    }
}
