// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

// Scoped checkout directory for one background task.
//
// The directory is removed when the guard drops, on success, error and
// unwinding alike. A failed removal is logged and counted but never
// replaces the task's own result.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, error};

pub const CLEANUP_FAILURES_METRIC: &str = "monocrat_workspace_cleanup_failures_total";

pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    pub fn create() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("monocrat-").tempdir()?;
        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "Created workspace");
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        match dir.close() {
            Ok(()) => debug!(path = %self.path.display(), "Removed workspace"),
            Err(e) => {
                metrics::counter!(CLEANUP_FAILURES_METRIC).increment(1);
                error!(path = %self.path.display(), error = %e, "Failed to remove workspace; directory leaked");
            }
        }
    }
}
