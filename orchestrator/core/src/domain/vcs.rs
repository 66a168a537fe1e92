// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::change_set::ChangeEntry;

const NULL_SHA: &str = "0000000000000000000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitSha(String);

impl CommitSha {
    pub fn new(sha: impl Into<String>) -> Self {
        Self(sha.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First twelve characters, used as the default image version.
    pub fn short(&self) -> &str {
        let end = self.0.char_indices().nth(12).map(|(i, _)| i).unwrap_or(self.0.len());
        &self.0[..end]
    }

    /// GitHub reports the all-zero SHA when one side of a range does not exist.
    pub fn is_null(&self) -> bool {
        self.0.is_empty() || self.0 == NULL_SHA
    }
}

impl fmt::Display for CommitSha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The before/after pair a release is computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRange {
    pub before: CommitSha,
    pub after: CommitSha,
}

impl CommitRange {
    /// Both ends must be present and non-null.
    pub fn from_parts(before: Option<CommitSha>, after: Option<CommitSha>) -> Option<Self> {
        match (before, after) {
            (Some(before), Some(after)) if !before.is_null() && !after.is_null() => {
                Some(Self { before, after })
            }
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.before == self.after
    }
}

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("Failed to clone {remote}: {reason}")]
    Clone { remote: String, reason: String },

    #[error("Failed to check out {commit}: {reason}")]
    Checkout {
        path: PathBuf,
        commit: CommitSha,
        reason: String,
    },

    #[error("Failed to diff {before}..{after}: {reason}")]
    Diff {
        before: CommitSha,
        after: CommitSha,
        reason: String,
    },

    #[error("Failed to read commit {commit}: {reason}")]
    Commit { commit: CommitSha, reason: String },

    #[error("Repository operation failed: {0}")]
    Other(String),
}

/// Source-control collaborator: clone, checkout and file-level diffs.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Clone `remote` into the existing, empty directory `into`.
    async fn clone_repository(&self, remote: &str, into: &Path) -> Result<(), VcsError>;

    async fn checkout(&self, local: &Path, commit: &CommitSha) -> Result<(), VcsError>;

    /// Repository-relative changed paths between two commits.
    async fn diff(
        &self,
        local: &Path,
        before: &CommitSha,
        after: &CommitSha,
    ) -> Result<Vec<ChangeEntry>, VcsError>;

    async fn commit_message(&self, local: &Path, commit: &CommitSha) -> Result<String, VcsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_sha() {
        let sha = CommitSha::new("9fceb02d0ae598e95dc970b74767f19372d61af8");
        assert_eq!(sha.short(), "9fceb02d0ae5");
        assert_eq!(CommitSha::new("abc").short(), "abc");
    }

    #[test]
    fn test_range_requires_both_non_null_ends() {
        let a = CommitSha::new("a1");
        let b = CommitSha::new("b2");
        assert!(CommitRange::from_parts(Some(a.clone()), Some(b.clone())).is_some());
        assert!(CommitRange::from_parts(None, Some(b.clone())).is_none());
        assert!(CommitRange::from_parts(Some(CommitSha::new(NULL_SHA)), Some(b)).is_none());
        assert!(CommitRange::from_parts(Some(a.clone()), Some(a)).unwrap().is_empty());
    }
}
