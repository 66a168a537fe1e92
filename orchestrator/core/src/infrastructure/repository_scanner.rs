// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Repository Scanner
//!
//! Builds a [`RepositoryIndex`] by walking a checked-out tree for module
//! manifests (`go.mod`) and application entry points (`main.go`).
//! Version-control metadata and CI configuration directories are skipped
//! as whole subtrees. Any traversal error aborts the scan; there is no
//! partial index.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Filesystem discovery of modules and applications

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::domain::repo_path;
use crate::domain::topology::{RepositoryIndex, TopologyError};

#[derive(Debug, Error)]
pub enum ScanError {
    /// `path` is relative to the scanned root.
    #[error("Failed to walk {}: {reason}", repo_path::display_dir(.path))]
    Walk { path: PathBuf, reason: String },

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error("Scan task failed: {0}")]
    Join(String),
}

/// File and directory names the scanner keys on.
#[derive(Debug, Clone)]
pub struct ScanRules {
    pub manifest_file: String,
    pub entry_point_file: String,
    pub excluded_dirs: Vec<String>,
}

impl Default for ScanRules {
    fn default() -> Self {
        Self {
            manifest_file: "go.mod".to_string(),
            entry_point_file: "main.go".to_string(),
            excluded_dirs: vec![".git".to_string(), ".github".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RepositoryScanner {
    rules: ScanRules,
}

impl RepositoryScanner {
    pub fn new(rules: ScanRules) -> Self {
        Self { rules }
    }

    /// Walk `root` on the blocking pool.
    pub async fn scan(&self, root: &Path) -> Result<RepositoryIndex, ScanError> {
        let rules = self.rules.clone();
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || scan_blocking(&rules, &root))
            .await
            .map_err(|e| ScanError::Join(e.to_string()))?
    }
}

fn scan_blocking(rules: &ScanRules, root: &Path) -> Result<RepositoryIndex, ScanError> {
    let root = std::fs::canonicalize(root).map_err(|e| ScanError::Walk {
        path: PathBuf::new(),
        reason: e.to_string(),
    })?;

    let mut module_dirs = Vec::new();
    let mut application_dirs = Vec::new();

    let walker = WalkDir::new(&root).follow_links(false).into_iter();
    let entries = walker.filter_entry(|entry| {
        entry.depth() == 0
            || !entry.file_type().is_dir()
            || !rules
                .excluded_dirs
                .iter()
                .any(|excluded| entry.file_name() == excluded.as_str())
    });

    for entry in entries {
        let entry = entry.map_err(|e| ScanError::Walk {
            path: e
                .path()
                .and_then(|path| repo_path::relative_to(path, &root))
                .unwrap_or_default(),
            reason: e
                .io_error()
                .map(ToString::to_string)
                .unwrap_or_else(|| "filesystem loop".to_string()),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(dir) = entry.path().parent() else {
            continue;
        };
        let name = entry.file_name();
        if name == rules.manifest_file.as_str() {
            debug!(module = %dir.display(), "Found module");
            module_dirs.push(dir.to_path_buf());
        } else if name == rules.entry_point_file.as_str() {
            debug!(application = %dir.display(), "Found application");
            application_dirs.push(dir.to_path_buf());
        }
    }

    let index = RepositoryIndex::new(&root, module_dirs, application_dirs)?;
    info!(
        root = %root.display(),
        modules = index.modules().count(),
        applications = index.applications().count(),
        "Indexed repository"
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[tokio::test]
    async fn test_scan_finds_modules_and_applications() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "billing/go.mod");
        touch(tmp.path(), "billing/cmd/api/main.go");
        touch(tmp.path(), "billing/internal/store.go");
        touch(tmp.path(), "auth/go.mod");
        touch(tmp.path(), "auth/main.go");

        let index = RepositoryScanner::default().scan(tmp.path()).await.unwrap();
        let root = index.root().to_path_buf();

        let modules: Vec<_> = index.modules().map(|m| m.dir().to_path_buf()).collect();
        assert_eq!(modules, vec![root.join("auth"), root.join("billing")]);

        let apps: Vec<_> = index.applications().map(|a| a.dir().to_path_buf()).collect();
        assert_eq!(apps, vec![root.join("auth"), root.join("billing/cmd/api")]);
    }

    #[tokio::test]
    async fn test_scan_skips_excluded_directories() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "go.mod");
        touch(tmp.path(), ".git/go.mod");
        touch(tmp.path(), ".github/actions/tool/main.go");
        touch(tmp.path(), "svc/main.go");

        let index = RepositoryScanner::default().scan(tmp.path()).await.unwrap();
        assert_eq!(index.modules().count(), 1);
        assert_eq!(index.applications().count(), 1);
    }

    #[tokio::test]
    async fn test_nested_modules_fail_the_scan() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "go.mod");
        touch(tmp.path(), "tools/go.mod");

        let err = RepositoryScanner::default().scan(tmp.path()).await.unwrap_err();
        assert!(matches!(
            err,
            ScanError::Topology(TopologyError::NestedModules { .. })
        ));
        assert!(!err.to_string().contains(&tmp.path().display().to_string()));
    }

    #[tokio::test]
    async fn test_missing_root_is_a_walk_error() {
        let tmp = TempDir::new().unwrap();
        let err = RepositoryScanner::default()
            .scan(&tmp.path().join("absent"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Walk { .. }));
    }
}
