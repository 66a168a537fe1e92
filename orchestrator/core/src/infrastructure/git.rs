// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! libgit2-backed [`VersionControl`].
//!
//! libgit2 is synchronous, so every operation runs on the blocking pool.
//! Renames are reported as a deletion of the old path plus a creation of
//! the new one, so both sides count toward impact resolution.

use async_trait::async_trait;
use git2::{build::CheckoutBuilder, Delta, Oid, Repository};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::change_set::{ChangeEntry, ChangeKind};
use crate::domain::vcs::{CommitSha, VcsError, VersionControl};

#[derive(Debug, Clone, Default)]
pub struct GitVersionControl;

impl GitVersionControl {
    pub fn new() -> Self {
        Self
    }
}

async fn blocking<T, F>(f: F) -> Result<T, VcsError>
where
    F: FnOnce() -> Result<T, VcsError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| VcsError::Other(format!("git task failed: {e}")))?
}

fn open(local: &Path) -> Result<Repository, VcsError> {
    Repository::open(local).map_err(|e| VcsError::Other(format!("open repository: {}", e.message())))
}

fn find_commit<'r>(repo: &'r Repository, sha: &CommitSha) -> Result<git2::Commit<'r>, git2::Error> {
    let oid = Oid::from_str(sha.as_str())?;
    repo.find_commit(oid)
}

fn diff_entries(repo: &Repository, before: &CommitSha, after: &CommitSha) -> Result<Vec<ChangeEntry>, git2::Error> {
    let old_tree = find_commit(repo, before)?.tree()?;
    let new_tree = find_commit(repo, after)?.tree()?;
    let diff = repo.diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)?;

    let mut entries = Vec::new();
    for delta in diff.deltas() {
        let old_path = delta.old_file().path().map(Path::to_path_buf);
        let new_path = delta.new_file().path().map(Path::to_path_buf);
        let mut push = |path: Option<PathBuf>, kind| {
            if let Some(path) = path {
                entries.push(ChangeEntry::new(path, kind));
            }
        };

        match delta.status() {
            Delta::Added | Delta::Copied => push(new_path, ChangeKind::Created),
            Delta::Deleted => push(old_path, ChangeKind::Deleted),
            Delta::Modified | Delta::Typechange => push(new_path, ChangeKind::Updated),
            Delta::Renamed => {
                push(old_path, ChangeKind::Deleted);
                push(new_path, ChangeKind::Created);
            }
            other => debug!(status = ?other, "Skipping diff delta"),
        }
    }
    Ok(entries)
}

#[async_trait]
impl VersionControl for GitVersionControl {
    async fn clone_repository(&self, remote: &str, into: &Path) -> Result<(), VcsError> {
        let remote = remote.to_string();
        let into = into.to_path_buf();
        info!(remote = %remote, path = %into.display(), "Cloning repository");

        blocking(move || {
            Repository::clone(&remote, &into)
                .map(|_| ())
                .map_err(|e| VcsError::Clone {
                    remote: remote.clone(),
                    reason: e.message().to_string(),
                })
        })
        .await
    }

    async fn checkout(&self, local: &Path, commit: &CommitSha) -> Result<(), VcsError> {
        let local = local.to_path_buf();
        let commit = commit.clone();

        blocking(move || {
            let repo = open(&local)?;
            let checkout = || -> Result<(), git2::Error> {
                let target = find_commit(&repo, &commit)?;
                repo.checkout_tree(target.as_object(), Some(CheckoutBuilder::new().force()))?;
                repo.set_head_detached(target.id())
            };
            checkout().map_err(|e| VcsError::Checkout {
                path: local.clone(),
                commit: commit.clone(),
                reason: e.message().to_string(),
            })?;
            debug!(commit = %commit, "Checked out commit");
            Ok(())
        })
        .await
    }

    async fn diff(
        &self,
        local: &Path,
        before: &CommitSha,
        after: &CommitSha,
    ) -> Result<Vec<ChangeEntry>, VcsError> {
        if before == after {
            return Ok(Vec::new());
        }

        let local = local.to_path_buf();
        let before = before.clone();
        let after = after.clone();

        blocking(move || {
            let repo = open(&local)?;
            diff_entries(&repo, &before, &after).map_err(|e| VcsError::Diff {
                before: before.clone(),
                after: after.clone(),
                reason: e.message().to_string(),
            })
        })
        .await
    }

    async fn commit_message(&self, local: &Path, commit: &CommitSha) -> Result<String, VcsError> {
        let local = local.to_path_buf();
        let commit = commit.clone();

        blocking(move || {
            let repo = open(&local)?;
            find_commit(&repo, &commit)
                .map(|c| c.message().unwrap_or_default().to_string())
                .map_err(|e| VcsError::Commit {
                    commit: commit.clone(),
                    reason: e.message().to_string(),
                })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::fs;
    use tempfile::TempDir;

    fn commit_all(repo: &Repository, message: &str) -> CommitSha {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.update_all(["*"].iter(), None).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let signature = Signature::now("Monocrat Test", "test@monocrat.dev").unwrap();

        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        let oid = repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap();
        CommitSha::new(oid.to_string())
    }

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[tokio::test]
    async fn test_diff_reports_created_updated_and_deleted() {
        let origin = TempDir::new().unwrap();
        let repo = Repository::init(origin.path()).unwrap();
        write(origin.path(), "svc/main.go", "package main");
        write(origin.path(), "svc/old.go", "package main");
        let before = commit_all(&repo, "initial");

        write(origin.path(), "svc/main.go", "package main\n// changed");
        fs::remove_file(origin.path().join("svc/old.go")).unwrap();
        write(origin.path(), "lib/new.go", "package lib");
        let after = commit_all(&repo, "second");

        let vcs = GitVersionControl::new();
        let mut entries = vcs.diff(origin.path(), &before, &after).await.unwrap();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(
            entries,
            vec![
                ChangeEntry::new("lib/new.go", ChangeKind::Created),
                ChangeEntry::new("svc/main.go", ChangeKind::Updated),
                ChangeEntry::new("svc/old.go", ChangeKind::Deleted),
            ]
        );
    }

    #[tokio::test]
    async fn test_clone_checkout_and_commit_message() {
        let origin = TempDir::new().unwrap();
        let repo = Repository::init(origin.path()).unwrap();
        write(origin.path(), "go.mod", "module example.com/x");
        let first = commit_all(&repo, "initial");
        write(origin.path(), "main.go", "package main");
        let second = commit_all(&repo, "ship it, approve");

        let checkout = TempDir::new().unwrap();
        let vcs = GitVersionControl::new();
        vcs.clone_repository(origin.path().to_str().unwrap(), checkout.path())
            .await
            .unwrap();
        assert!(checkout.path().join("main.go").exists());

        vcs.checkout(checkout.path(), &first).await.unwrap();
        assert!(!checkout.path().join("main.go").exists());

        let message = vcs.commit_message(checkout.path(), &second).await.unwrap();
        assert!(message.contains("approve"));
    }

    #[tokio::test]
    async fn test_unknown_commit_is_a_checkout_error() {
        let origin = TempDir::new().unwrap();
        let repo = Repository::init(origin.path()).unwrap();
        write(origin.path(), "go.mod", "module x");
        commit_all(&repo, "initial");

        let err = GitVersionControl::new()
            .checkout(origin.path(), &CommitSha::new("0123456789abcdef0123456789abcdef01234567"))
            .await
            .unwrap_err();
        assert!(matches!(err, VcsError::Checkout { .. }));
    }
}
