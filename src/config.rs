//! Process-wide resolution settings, fixed at construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Rewrites an editor-reported path to the path the file actually lives at
/// before the fast strategy reads it. Test suites serve documents from
/// temporary directories that do not match the editor's URIs; production
/// never installs one, which means identity.
pub type PathRemapFn = Arc<dyn Fn(&Path) -> PathBuf + Send + Sync>;

/// Configuration consumed once when the backend is constructed. The
/// strategy switch is never renegotiated per request.
#[derive(Clone)]
pub struct Config {
    /// Serve definition requests from the fast single-file strategy
    /// instead of whole-program resolution. Type-definition requests
    /// always use the whole-program strategy.
    pub use_fast_path: bool,
    /// Root of the Mica installation. Builtins have no source position of
    /// their own; locations for them point at
    /// `<stdlib_root>/src/builtin/builtin.mica`.
    pub stdlib_root: PathBuf,
    /// See [`PathRemapFn`]. `None` means identity.
    pub path_remap: Option<PathRemapFn>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_fast_path: false,
            stdlib_root: std::env::var_os("MICA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/usr/local/mica")),
            path_remap: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("use_fast_path", &self.use_fast_path)
            .field("stdlib_root", &self.stdlib_root)
            .field("path_remap", &self.path_remap.is_some())
            .finish()
    }
}
