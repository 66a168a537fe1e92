// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Check Run
//!
//! The externally visible status entity for one CI stage, modelled as a
//! small state machine:
//!
//! ```text
//! created ──▶ in_progress ──▶ completed{conclusion}
//!    └───────────────────────────▲
//! ```
//!
//! A [`CheckRun`] only exists after the status backend has assigned it a
//! [`CheckRunHandle`]. Conclusion, output and offered actions are fixed at
//! completion; a completed run is terminal and rejects further transitions.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Check-run lifecycle and the wire-neutral create/update payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::vcs::CommitSha;

/// Backend-assigned identifier of a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CheckRunHandle(pub u64);

impl fmt::Display for CheckRunHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckRunStatus {
    /// Reported to the backend as `queued`.
    #[serde(rename = "queued")]
    Created,
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl CheckRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
}

impl Conclusion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// A button offered on a completed run. Invoking it produces a
/// `requested_action` event carrying `identifier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunAction {
    pub label: String,
    pub description: String,
    pub identifier: String,
}

impl CheckRunAction {
    pub fn new(
        identifier: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            identifier: identifier.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationLevel {
    Notice,
    Warning,
    Failure,
}

/// A file/line finding attached to a run's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Repository-relative path.
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
    pub annotation_level: AnnotationLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunOutput {
    pub title: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl CheckRunOutput {
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            annotations: Vec::new(),
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }
}

/// Request to open a new run on a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCheckRun {
    pub name: String,
    pub head_sha: CommitSha,
    pub status: CheckRunStatus,
}

/// Partial update of an existing run. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckRunUpdate {
    pub status: Option<CheckRunStatus>,
    pub conclusion: Option<Conclusion>,
    pub completed_at: Option<DateTime<Utc>>,
    pub output: Option<CheckRunOutput>,
    pub actions: Vec<CheckRunAction>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckRunError {
    #[error("Check run {0} is already completed")]
    AlreadyCompleted(CheckRunHandle),

    #[error("Check run {0} is already in progress")]
    AlreadyStarted(CheckRunHandle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRun {
    pub handle: CheckRunHandle,
    pub name: String,
    pub head_sha: CommitSha,
    status: CheckRunStatus,
    conclusion: Option<Conclusion>,
    output: Option<CheckRunOutput>,
    actions: Vec<CheckRunAction>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CheckRun {
    /// Local view of a run the backend has just created from `request`.
    pub fn opened(handle: CheckRunHandle, request: CreateCheckRun) -> Self {
        Self {
            handle,
            name: request.name,
            head_sha: request.head_sha,
            status: request.status,
            conclusion: None,
            output: None,
            actions: Vec::new(),
            completed_at: None,
        }
    }

    pub fn status(&self) -> CheckRunStatus {
        self.status
    }

    pub fn conclusion(&self) -> Option<Conclusion> {
        self.conclusion
    }

    pub fn output(&self) -> Option<&CheckRunOutput> {
        self.output.as_ref()
    }

    pub fn actions(&self) -> &[CheckRunAction] {
        &self.actions
    }

    pub fn is_completed(&self) -> bool {
        self.status == CheckRunStatus::Completed
    }

    pub fn start(&mut self) -> Result<CheckRunUpdate, CheckRunError> {
        match self.status {
            CheckRunStatus::Created => {
                self.status = CheckRunStatus::InProgress;
                Ok(CheckRunUpdate {
                    status: Some(CheckRunStatus::InProgress),
                    ..Default::default()
                })
            }
            CheckRunStatus::InProgress => Err(CheckRunError::AlreadyStarted(self.handle)),
            CheckRunStatus::Completed => Err(CheckRunError::AlreadyCompleted(self.handle)),
        }
    }

    /// Move to the terminal state and return the update to send.
    pub fn complete(
        &mut self,
        conclusion: Conclusion,
        output: CheckRunOutput,
        actions: Vec<CheckRunAction>,
    ) -> Result<CheckRunUpdate, CheckRunError> {
        if self.is_completed() {
            return Err(CheckRunError::AlreadyCompleted(self.handle));
        }

        let completed_at = Utc::now();
        self.status = CheckRunStatus::Completed;
        self.conclusion = Some(conclusion);
        self.output = Some(output.clone());
        self.actions = actions.clone();
        self.completed_at = Some(completed_at);

        Ok(CheckRunUpdate {
            status: Some(CheckRunStatus::Completed),
            conclusion: Some(conclusion),
            completed_at: Some(completed_at),
            output: Some(output),
            actions,
        })
    }
}
