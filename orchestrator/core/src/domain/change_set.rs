// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::vcs::{CommitRange, VcsError, VersionControl};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// One changed file between two commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEntry {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// File-level diff of a commit range, anchored at a checkout root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    entries: Vec<ChangeEntry>,
}

impl ChangeSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Re-anchor repository-relative entries at `root`.
    pub fn anchored(root: &Path, entries: Vec<ChangeEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| ChangeEntry {
                path: root.join(&entry.path),
                kind: entry.kind,
            })
            .collect();
        Self { entries }
    }

    /// Diff `range` inside the checkout at `root`.
    ///
    /// An empty range short-circuits without asking the collaborator for a diff.
    pub async fn between(
        vcs: &dyn VersionControl,
        root: &Path,
        range: &CommitRange,
    ) -> Result<Self, VcsError> {
        if range.is_empty() {
            info!(commit = %range.after, "Same commit on both ends of the range; nothing changed");
            return Ok(Self::empty());
        }

        let entries = vcs.diff(root, &range.before, &range.after).await?;
        for entry in &entries {
            debug!(path = %entry.path.display(), kind = ?entry.kind, "Changed file");
        }
        Ok(Self::anchored(root, entries))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.entries.iter()
    }
}
