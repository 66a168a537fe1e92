// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Lint Stage
//!
//! Clones the suite's head commit into a scoped [`Workspace`], indexes it and
//! runs the [`Linter`] once per module in directory order. Findings are
//! converted into annotations anchored at the repository root; an invocation
//! failure is a [`LintStageError`], never a finding.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Background work behind the `Lint` check run

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

use crate::application::workspace::Workspace;
use crate::domain::check_run::Annotation;
use crate::domain::lint::{LintError, Linter};
use crate::domain::vcs::{CommitSha, VcsError, VersionControl};
use crate::infrastructure::repository_scanner::{RepositoryScanner, ScanError};

#[derive(Debug, Error)]
pub enum LintStageError {
    #[error("Failed to create workspace: {0}")]
    Workspace(#[from] std::io::Error),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Lint(#[from] LintError),
}

impl LintStageError {
    /// The checkout's module layout is invalid; rerunning cannot help.
    pub fn is_topology(&self) -> bool {
        matches!(self, Self::Scan(ScanError::Topology(_)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintFindings {
    /// Every reported issue, including those without text.
    pub issue_count: usize,
    pub annotations: Vec<Annotation>,
}

impl LintFindings {
    pub fn is_clean(&self) -> bool {
        self.issue_count == 0
    }
}

pub struct LintPipeline {
    vcs: Arc<dyn VersionControl>,
    scanner: RepositoryScanner,
    linter: Arc<dyn Linter>,
}

impl LintPipeline {
    pub fn new(
        vcs: Arc<dyn VersionControl>,
        scanner: RepositoryScanner,
        linter: Arc<dyn Linter>,
    ) -> Self {
        Self {
            vcs,
            scanner,
            linter,
        }
    }

    #[instrument(skip(self), fields(head_sha = %head))]
    pub async fn run(&self, remote: &str, head: &CommitSha) -> Result<LintFindings, LintStageError> {
        let workspace = Workspace::create()?;
        self.vcs.clone_repository(remote, workspace.path()).await?;
        self.vcs.checkout(workspace.path(), head).await?;

        let index = self.scanner.scan(workspace.path()).await?;

        let mut findings = LintFindings::default();
        for module in index.modules() {
            let module_dir = index.relative_dir(module.dir());
            let report = self
                .linter
                .run(module.dir())
                .await
                .map_err(|e| e.in_module(module_dir.clone()))?;

            findings.issue_count += report.issues.len();
            findings.annotations.extend(
                report
                    .issues
                    .iter()
                    .filter_map(|issue| issue.to_annotation(&module_dir)),
            );
        }

        info!(
            issues = findings.issue_count,
            annotations = findings.annotations.len(),
            "Lint finished"
        );
        Ok(findings)
    }
}
