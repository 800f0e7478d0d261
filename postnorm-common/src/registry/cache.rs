//! Read-through registry cache
//!
//! Keeps the last parsed registry keyed on the document's modification time.
//! Every lookup stats the document; a different mtime, or a document that has
//! gone away, drops the cached copy. Staleness is bounded by the filesystem's
//! mtime resolution.

use super::{load_all_configs, Registry, RegistrySource};
use crate::{Error, Result};
use arc_swap::ArcSwapOption;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

struct Snapshot {
    modified: SystemTime,
    registry: Arc<Registry>,
}

/// Registry source that re-parses only when the document changes
///
/// Readers get an owned `Arc<Registry>`, so a reload swapping in a new
/// snapshot never disturbs a request already holding the old one.
pub struct CachedRegistry {
    path: PathBuf,
    base_dir: Option<PathBuf>,
    current: ArcSwapOption<Snapshot>,
}

impl CachedRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            base_dir: None,
            current: ArcSwapOption::empty(),
        }
    }

    /// Resolve relative source locations against `base_dir`
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Drop the cached snapshot
    pub fn invalidate(&self) {
        self.current.store(None);
    }

    /// Whether a snapshot is currently held
    pub fn is_warm(&self) -> bool {
        self.current.load().is_some()
    }

    fn reload(&self, modified: Option<SystemTime>) -> Result<Arc<Registry>> {
        let registry = Arc::new(load_all_configs(&self.path, self.base_dir.as_deref())?);

        match modified {
            Some(modified) => {
                self.current.store(Some(Arc::new(Snapshot {
                    modified,
                    registry: Arc::clone(&registry),
                })));
                info!(path = %self.path.display(), "Registry cache refreshed");
            }
            None => self.invalidate(),
        }

        Ok(registry)
    }
}

impl RegistrySource for CachedRegistry {
    fn load(&self) -> Result<Arc<Registry>> {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(source) => {
                self.invalidate();
                return Err(Error::ConfigNotFound {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        // Filesystems without mtime support fall back to uncached reads
        let modified = metadata.modified().ok();

        if let (Some(modified), Some(snapshot)) = (modified, self.current.load_full()) {
            if snapshot.modified == modified {
                debug!(path = %self.path.display(), "Registry cache hit");
                return Ok(Arc::clone(&snapshot.registry));
            }
        }

        self.reload(modified)
    }
}
