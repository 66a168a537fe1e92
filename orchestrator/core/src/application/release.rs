// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Release Pipeline
//!
//! clone → checkout target → index → diff → resolve → vendor → build, all
//! strictly sequential inside one scoped [`Workspace`].
//!
//! A range whose ends are the same commit releases nothing and touches no
//! collaborator at all.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Background work behind the `Release application` check run

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

use crate::application::build_orchestrator::{BuildOrchestrator, BuildOutcome, OrchestrationError};
use crate::application::workspace::Workspace;
use crate::domain::build::RegistryCredentials;
use crate::domain::build_plan::{BuildPlan, ImpactResolver};
use crate::domain::change_set::ChangeSet;
use crate::domain::vcs::{CommitRange, CommitSha, VcsError, VersionControl};
use crate::infrastructure::repository_scanner::{RepositoryScanner, ScanError};

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("missing commit range")]
    MissingRange,

    #[error("Failed to create workspace: {0}")]
    Workspace(#[from] std::io::Error),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Build(#[from] OrchestrationError),
}

impl ReleaseError {
    /// The checkout's module layout is invalid.
    pub fn is_topology(&self) -> bool {
        matches!(self, Self::Scan(ScanError::Topology(_)))
    }

    /// Topology problems need a repository fix, not another attempt.
    pub fn is_retryable(&self) -> bool {
        !self.is_topology()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    pub changed_files: usize,
    pub plan: BuildPlan,
    pub outcome: BuildOutcome,
}

pub struct ReleasePipeline {
    vcs: Arc<dyn VersionControl>,
    scanner: RepositoryScanner,
    orchestrator: BuildOrchestrator,
    credentials: RegistryCredentials,
    image_version: Option<String>,
}

impl ReleasePipeline {
    pub fn new(
        vcs: Arc<dyn VersionControl>,
        scanner: RepositoryScanner,
        orchestrator: BuildOrchestrator,
        credentials: RegistryCredentials,
        image_version: Option<String>,
    ) -> Self {
        Self {
            vcs,
            scanner,
            orchestrator,
            credentials,
            image_version,
        }
    }

    #[instrument(skip(self, before, after), fields(before = ?before, after = ?after))]
    pub async fn run(
        &self,
        remote: &str,
        before: Option<CommitSha>,
        after: Option<CommitSha>,
    ) -> Result<ReleaseReport, ReleaseError> {
        let range = CommitRange::from_parts(before, after).ok_or(ReleaseError::MissingRange)?;
        if range.is_empty() {
            info!(commit = %range.after, "Range is a single commit; nothing to release");
            return Ok(ReleaseReport::default());
        }

        let workspace = Workspace::create()?;
        self.vcs.clone_repository(remote, workspace.path()).await?;
        self.vcs.checkout(workspace.path(), &range.after).await?;

        let index = self.scanner.scan(workspace.path()).await?;
        let changes = ChangeSet::between(self.vcs.as_ref(), index.root(), &range).await?;
        let plan = ImpactResolver::resolve(&index, &changes);
        info!(
            changed_files = changes.len(),
            applications = plan.rebuild_apps().len(),
            modules = plan.vendor_modules().len(),
            "Resolved build plan"
        );

        let version = self
            .image_version
            .clone()
            .unwrap_or_else(|| range.after.short().to_string());
        let outcome = self
            .orchestrator
            .execute(&index, &plan, &self.credentials, &version)
            .await?;

        Ok(ReleaseReport {
            changed_files: changes.len(),
            plan,
            outcome,
        })
    }
}
