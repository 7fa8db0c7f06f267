use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Host-side cache of downloaded web files.
///
/// Populated by a separate process; acquisition never fetches on a miss.
#[async_trait]
pub trait WebFileCache: Send + Sync {
    async fn cached_file(&self, url: &str) -> Option<PathBuf>;
}

/// Host-side image resizer. Implementations write `destination` with a
/// `.png` suffix appended, and move CPU-bound work off the runtime
/// (`spawn_blocking`) themselves.
#[async_trait]
pub trait ImageResizer: Send + Sync {
    async fn resize(
        &self,
        source: &Path,
        width: u32,
        height: u32,
        destination: &Path,
    ) -> Result<()>;
}

/// What happened to one icon request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconOutcome {
    /// URL was not http(s); nothing was touched.
    Rejected,
    /// The cache had no copy of the image.
    CacheMiss,
    /// Icon written.
    Resized,
    /// The resizer produced a zero-byte file, which was removed.
    DeletedEmpty,
    /// Resizing or cleanup failed.
    Failed,
}

impl IconOutcome {
    /// True only when a usable icon is on disk.
    pub fn is_available(self) -> bool {
        matches!(self, IconOutcome::Resized)
    }
}
