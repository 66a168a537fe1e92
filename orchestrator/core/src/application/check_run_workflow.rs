// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Check-Run Workflow
//!
//! Drives one check run per stage entry:
//!
//! 1. authenticate as the event's installation and open the run
//!    (`Lint` queued, the other stages in progress)
//! 2. spawn a supervisor task and return to the caller immediately
//! 3. the supervisor marks a queued run in progress, spawns the stage's
//!    work as its own task and awaits that task's [`JoinHandle`] exactly once
//! 4. the outcome (or the worker's panic) is folded into a single
//!    completion update carrying the stage's follow-on or retry action
//!
//! Stages never chain on their own. Moving from `Lint` to
//! `Release application` requires a user to press the offered action, which
//! arrives as a new `requested_action` event.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Check-run state transitions around detached stage work

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::deployment_gate::DeploymentGate;
use crate::application::lint_stage::{LintFindings, LintPipeline, LintStageError};
use crate::application::release::{ReleaseError, ReleasePipeline, ReleaseReport};
use crate::domain::check_run::{
    CheckRun, CheckRunAction, CheckRunHandle, CheckRunOutput, CheckRunStatus, Conclusion,
    CreateCheckRun,
};
use crate::domain::repo_path;
use crate::domain::stage::Stage;
use crate::domain::status::{DeploymentState, InstallationConnector, StatusError, StatusService};
use crate::domain::vcs::CommitSha;
use crate::domain::webhook::{DeploymentProtectionEvent, Installation, RunEvent, SuiteEvent};

pub const CHECK_RUNS_COMPLETED_METRIC: &str = "monocrat_check_runs_completed_total";
/// Title for runs failed by an invalid module layout.
pub const INVALID_TOPOLOGY_TITLE: &str = "Invalid repository topology";

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Failed to authenticate installation {installation}: {source}")]
    Connect {
        installation: u64,
        #[source]
        source: StatusError,
    },

    #[error("Failed to create {stage} check run: {source}")]
    CreateRun {
        stage: Stage,
        #[source]
        source: StatusError,
    },
}

/// What a stage's background work produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub conclusion: Conclusion,
    pub output: CheckRunOutput,
    /// Whether a failed stage should offer its retry action.
    pub retryable: bool,
}

impl StageOutcome {
    pub fn success(output: CheckRunOutput) -> Self {
        Self {
            conclusion: Conclusion::Success,
            output,
            retryable: false,
        }
    }

    pub fn failure(output: CheckRunOutput, retryable: bool) -> Self {
        Self {
            conclusion: Conclusion::Failure,
            output,
            retryable,
        }
    }
}

/// Final state of one supervised run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub run: CheckRunHandle,
    pub conclusion: Conclusion,
    pub output: CheckRunOutput,
    pub actions: Vec<CheckRunAction>,
    /// False when the completion update could not be delivered.
    pub reported: bool,
}

#[derive(Debug)]
pub enum Dispatch {
    Ignored {
        reason: String,
    },
    Launched {
        stage: Stage,
        run: CheckRunHandle,
        task: JoinHandle<StageReport>,
    },
}

impl Dispatch {
    pub fn ignored(reason: impl Into<String>) -> Self {
        Self::Ignored {
            reason: reason.into(),
        }
    }

    /// Wait for a launched stage to finish. `None` for ignored events or a
    /// supervisor that did not run to completion.
    pub async fn finished(self) -> Option<StageReport> {
        match self {
            Self::Ignored { .. } => None,
            Self::Launched { task, .. } => task.await.ok(),
        }
    }
}

pub struct CheckRunWorkflow {
    connector: Arc<dyn InstallationConnector>,
    lint: Arc<LintPipeline>,
    release: Arc<ReleasePipeline>,
    gate: Arc<DeploymentGate>,
}

impl CheckRunWorkflow {
    pub fn new(
        connector: Arc<dyn InstallationConnector>,
        lint: Arc<LintPipeline>,
        release: Arc<ReleasePipeline>,
        gate: Arc<DeploymentGate>,
    ) -> Self {
        Self {
            connector,
            lint,
            release,
            gate,
        }
    }

    pub async fn start_lint(
        &self,
        installation: &Installation,
        head_sha: &CommitSha,
    ) -> Result<Dispatch, WorkflowError> {
        let (status, run) = self.open(Stage::Lint, installation, head_sha).await?;

        let lint = self.lint.clone();
        let remote = installation.repository.clone_url.clone();
        let head = head_sha.clone();
        let work = async move { lint_outcome(lint.run(&remote, &head).await) };

        Ok(Self::supervise(Stage::Lint, status, run, work))
    }

    pub async fn start_release(
        &self,
        installation: &Installation,
        head_sha: &CommitSha,
        before: Option<CommitSha>,
        after: Option<CommitSha>,
    ) -> Result<Dispatch, WorkflowError> {
        let (status, run) = self.open(Stage::Release, installation, head_sha).await?;

        let release = self.release.clone();
        let remote = installation.repository.clone_url.clone();
        let work = async move { release_outcome(release.run(&remote, before, after).await) };

        Ok(Self::supervise(Stage::Release, status, run, work))
    }

    pub async fn start_deploy(
        &self,
        event: &DeploymentProtectionEvent,
    ) -> Result<Dispatch, WorkflowError> {
        let (status, run) = self.open(Stage::Deploy, &event.installation, &event.sha).await?;

        let gate = self.gate.clone();
        let connector = self.connector.clone();
        let event = event.clone();
        let work = async move {
            let reviewer = match connector.deployment_reviewer(&event.installation).await {
                Ok(reviewer) => reviewer,
                Err(e) => {
                    return StageOutcome::failure(
                        CheckRunOutput::new("Deployment review failed", e.to_string()),
                        false,
                    )
                }
            };
            let result = gate.run(reviewer.as_ref(), &event).await;
            deploy_outcome(&event.environment, result.map_err(|e| e.to_string()))
        };

        Ok(Self::supervise(Stage::Deploy, status, run, work))
    }

    async fn open(
        &self,
        stage: Stage,
        installation: &Installation,
        head_sha: &CommitSha,
    ) -> Result<(Arc<dyn StatusService>, CheckRun), WorkflowError> {
        let status = self
            .connector
            .status_service(installation)
            .await
            .map_err(|source| WorkflowError::Connect {
                installation: installation.id,
                source,
            })?;

        let request = CreateCheckRun {
            name: stage.run_name().to_string(),
            head_sha: head_sha.clone(),
            status: stage.initial_status(),
        };
        let handle = status
            .create_check_run(&request)
            .await
            .map_err(|source| WorkflowError::CreateRun { stage, source })?;

        info!(
            stage = %stage,
            run = %handle,
            head_sha = %head_sha,
            repository = %installation.repository.full_name(),
            "Opened check run"
        );
        Ok((status, CheckRun::opened(handle, request)))
    }

    fn supervise<W>(
        stage: Stage,
        status: Arc<dyn StatusService>,
        mut run: CheckRun,
        work: W,
    ) -> Dispatch
    where
        W: Future<Output = StageOutcome> + Send + 'static,
    {
        let handle = run.handle;
        let task = tokio::spawn(async move {
            if run.status() == CheckRunStatus::Created {
                match run.start() {
                    Ok(update) => {
                        if let Err(e) = status.update_check_run(run.handle, &update).await {
                            warn!(stage = %stage, run = %run.handle, error = %e, "Failed to mark check run in progress");
                        }
                    }
                    Err(e) => warn!(stage = %stage, error = %e, "Unexpected check run state"),
                }
            }

            let outcome = match tokio::spawn(work).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(stage = %stage, run = %run.handle, error = %e, "Stage task did not complete");
                    StageOutcome::failure(
                        CheckRunOutput::new("Stage aborted", format!("{stage} task aborted: {e}")),
                        true,
                    )
                }
            };

            finalize(stage, status.as_ref(), &mut run, outcome).await
        });

        Dispatch::Launched {
            stage,
            run: handle,
            task,
        }
    }
}

async fn finalize(
    stage: Stage,
    status: &dyn StatusService,
    run: &mut CheckRun,
    outcome: StageOutcome,
) -> StageReport {
    let actions: Vec<CheckRunAction> = match outcome.conclusion {
        Conclusion::Success => stage.follow_on_action().into_iter().collect(),
        Conclusion::Failure if outcome.retryable => stage.retry_action().into_iter().collect(),
        Conclusion::Failure => Vec::new(),
    };

    let reported = match run.complete(outcome.conclusion, outcome.output.clone(), actions.clone()) {
        Ok(update) => match status.update_check_run(run.handle, &update).await {
            Ok(()) => true,
            Err(e) => {
                error!(stage = %stage, run = %run.handle, error = %e, "Failed to complete check run");
                false
            }
        },
        Err(e) => {
            error!(stage = %stage, error = %e, "Check run already completed");
            false
        }
    };

    metrics::counter!(
        CHECK_RUNS_COMPLETED_METRIC,
        "stage" => stage.as_str(),
        "conclusion" => outcome.conclusion.as_str()
    )
    .increment(1);
    info!(
        stage = %stage,
        run = %run.handle,
        conclusion = outcome.conclusion.as_str(),
        "Check run completed"
    );

    StageReport {
        stage,
        run: run.handle,
        conclusion: outcome.conclusion,
        output: outcome.output,
        actions,
        reported,
    }
}

fn lint_outcome(result: Result<LintFindings, LintStageError>) -> StageOutcome {
    match result {
        Ok(findings) if findings.is_clean() => {
            StageOutcome::success(CheckRunOutput::new("Linter passed", "No issues found"))
        }
        Ok(findings) => StageOutcome::failure(
            CheckRunOutput::new("Linter failed", "Linter failed").with_annotations(findings.annotations),
            false,
        ),
        Err(e) if e.is_topology() => StageOutcome::failure(
            CheckRunOutput::new(INVALID_TOPOLOGY_TITLE, e.to_string()),
            false,
        ),
        Err(e) => StageOutcome::failure(
            CheckRunOutput::new(
                "Failed to run linters",
                format!("failed to run linters: {e}"),
            ),
            false,
        ),
    }
}

fn release_outcome(result: Result<ReleaseReport, ReleaseError>) -> StageOutcome {
    match result {
        Ok(report) if report.outcome.released.is_empty() => {
            StageOutcome::success(CheckRunOutput::new("Nothing to release", "nothing to release"))
        }
        Ok(report) => {
            let summary = report
                .outcome
                .released
                .iter()
                .map(|image| {
                    format!(
                        "- `{}` from `{}`",
                        image.reference,
                        repo_path::display_dir(&image.application)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            StageOutcome::success(CheckRunOutput::new(
                format!("Released {} application(s)", report.outcome.released.len()),
                summary,
            ))
        }
        Err(e) if e.is_topology() => StageOutcome::failure(
            CheckRunOutput::new(INVALID_TOPOLOGY_TITLE, e.to_string()),
            false,
        ),
        Err(e) => {
            let retryable = e.is_retryable();
            StageOutcome::failure(CheckRunOutput::new("Release failed", e.to_string()), retryable)
        }
    }
}

fn deploy_outcome(environment: &str, result: Result<DeploymentState, String>) -> StageOutcome {
    match result {
        Ok(DeploymentState::Approved) => StageOutcome::success(CheckRunOutput::new(
            "Deployment approved",
            format!("Deployment to {environment} approved"),
        )),
        Ok(DeploymentState::Rejected) => StageOutcome::failure(
            CheckRunOutput::new(
                "Deployment rejected",
                format!("Deployment to {environment} rejected: commit is not signed off"),
            ),
            false,
        ),
        Err(e) => StageOutcome::failure(CheckRunOutput::new("Deployment review failed", e), false),
    }
}

/// An inbound event that can move the workflow forward.
#[async_trait]
pub trait AdvanceWorkflow: Send + Sync {
    async fn advance(&self, workflow: &CheckRunWorkflow) -> Result<Dispatch, WorkflowError>;
}

#[async_trait]
impl AdvanceWorkflow for SuiteEvent {
    async fn advance(&self, workflow: &CheckRunWorkflow) -> Result<Dispatch, WorkflowError> {
        workflow.start_lint(&self.installation, &self.head_sha).await
    }
}

#[async_trait]
impl AdvanceWorkflow for RunEvent {
    async fn advance(&self, workflow: &CheckRunWorkflow) -> Result<Dispatch, WorkflowError> {
        let stage = match self.action.as_str() {
            "requested_action" => {
                let identifier = self.requested_action.as_deref().unwrap_or_default();
                match Stage::from_action(identifier) {
                    Some(stage) => stage,
                    None => return Ok(Dispatch::ignored(format!("unknown action '{identifier}'"))),
                }
            }
            "rerequested" => match Stage::from_run_name(&self.run_name) {
                Some(stage) => stage,
                None => return Ok(Dispatch::ignored(format!("unknown check run '{}'", self.run_name))),
            },
            other => return Ok(Dispatch::ignored(format!("check_run action '{other}'"))),
        };

        match stage {
            Stage::Lint => workflow.start_lint(&self.installation, &self.head_sha).await,
            Stage::Release => {
                workflow
                    .start_release(
                        &self.installation,
                        &self.head_sha,
                        self.before.clone(),
                        self.after.clone(),
                    )
                    .await
            }
            Stage::Deploy => Ok(Dispatch::ignored(
                "deployment reviews are only started by deployment_protection_rule events",
            )),
        }
    }
}

#[async_trait]
impl AdvanceWorkflow for DeploymentProtectionEvent {
    async fn advance(&self, workflow: &CheckRunWorkflow) -> Result<Dispatch, WorkflowError> {
        if self.action != "requested" {
            return Ok(Dispatch::ignored(format!(
                "deployment_protection_rule action '{}'",
                self.action
            )));
        }
        workflow.start_deploy(self).await
    }
}
