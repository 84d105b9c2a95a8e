//! Clean up files in `Drop`. Unlike what the `tempfile` crate offers,
//! can clean paths that we didn't open ourselves, and lets the caller
//! pick the path (the report files get their names from the dataset
//! and platform).

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use crate::debug;

static COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct TemporaryFile {
    path: PathBuf,
}

impl TemporaryFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A path in the system temp directory that is unique for this
    /// process, ending in `file_name`. Nothing is created.
    pub fn in_temp_dir(file_name: &str) -> Self {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let pid = std::process::id();
        let path = std::env::temp_dir().join(format!("kfusion-bench-{pid}-{n}-{file_name}"));
        Self { path }
    }
}

impl From<PathBuf> for TemporaryFile {
    fn from(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for TemporaryFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("deleted temporary file {:?}", self.path),
            Err(e) => debug!("error deleting temporary file {:?}: {e:#}", self.path),
        }
    }
}
