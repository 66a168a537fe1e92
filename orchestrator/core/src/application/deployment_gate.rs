// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

// Deployment protection gate: approve a deployment when the commit being
// deployed carries an "approve" sign-off in its message, reject otherwise.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

use crate::application::workspace::Workspace;
use crate::domain::status::{DeploymentReview, DeploymentReviewer, DeploymentState, StatusError};
use crate::domain::vcs::{VcsError, VersionControl};
use crate::domain::webhook::{DeploymentProtectionEvent, WebhookError};

pub const APPROVAL_MARKER: &str = "approve";
pub const REVIEW_COMMENT: &str = "signed-off by Monocrat";

#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    CallbackUrl(#[from] WebhookError),

    #[error("Failed to create workspace: {0}")]
    Workspace(#[from] std::io::Error),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error("review deployment: {0}")]
    Review(#[from] StatusError),
}

pub struct DeploymentGate {
    vcs: Arc<dyn VersionControl>,
}

impl DeploymentGate {
    pub fn new(vcs: Arc<dyn VersionControl>) -> Self {
        Self { vcs }
    }

    #[instrument(skip_all, fields(environment = %event.environment, sha = %event.sha))]
    pub async fn run(
        &self,
        reviewer: &dyn DeploymentReviewer,
        event: &DeploymentProtectionEvent,
    ) -> Result<DeploymentState, GateError> {
        let run_id = event.workflow_run_id()?;

        let workspace = Workspace::create()?;
        self.vcs
            .clone_repository(&event.installation.repository.clone_url, workspace.path())
            .await?;
        let message = self.vcs.commit_message(workspace.path(), &event.sha).await?;

        let state = if message.contains(APPROVAL_MARKER) {
            DeploymentState::Approved
        } else {
            DeploymentState::Rejected
        };
        info!(run_id, state = ?state, "Reviewing deployment");

        reviewer
            .review_deployment(&DeploymentReview {
                run_id,
                environment: event.environment.clone(),
                state,
                comment: REVIEW_COMMENT.to_string(),
            })
            .await?;

        Ok(state)
    }
}
