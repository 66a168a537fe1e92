// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Repository Path Rules
//!
//! Lexical normalization and directory-boundary tests for paths inside a
//! checked-out repository. Every ownership and impact decision in the
//! resolver goes through these helpers, so "under a directory" always means
//! a whole-segment prefix match (`/repo/foo` never contains `/repo/foo2`).
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Canonical path comparison for modules, applications and changes

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoPathError {
    #[error("Path traversal component in {0}")]
    Traversal(String),

    #[error("Path is not absolute: {0}")]
    NotAbsolute(String),
}

/// Normalize an absolute path without touching the filesystem.
///
/// Drops `.` components and rejects `..` so two spellings of the same
/// directory compare equal and no path can escape its root lexically.
pub fn normalize(path: &Path) -> Result<PathBuf, RepoPathError> {
    if !path.is_absolute() {
        return Err(RepoPathError::NotAbsolute(path.display().to_string()));
    }

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component),
            Component::CurDir => {}
            Component::Normal(part) => normalized.push(part),
            Component::ParentDir => {
                tracing::warn!(path = %path.display(), "Rejecting path with '..' component");
                return Err(RepoPathError::Traversal(path.display().to_string()));
            }
        }
    }

    Ok(normalized)
}

/// True when `path` is `dir` itself or lies below it, compared segment by segment.
pub fn is_within(path: &Path, dir: &Path) -> bool {
    path.starts_with(dir)
}

/// True when `path` lies strictly below `dir`.
pub fn is_strictly_within(path: &Path, dir: &Path) -> bool {
    path != dir && path.starts_with(dir)
}

/// `path` expressed relative to `root`, or `None` when it lies elsewhere.
pub fn relative_to(path: &Path, root: &Path) -> Option<PathBuf> {
    path.strip_prefix(root).ok().map(Path::to_path_buf)
}

/// Repository-relative directory for messages; `.` for the root itself.
pub fn display_dir(dir: &Path) -> String {
    if dir.as_os_str().is_empty() {
        ".".to_string()
    } else {
        dir.display().to_string()
    }
}
