// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Stage catalogue: run names, initial status and the actions each stage
//! offers when it completes.

use serde::Serialize;
use std::fmt;

use crate::domain::check_run::{CheckRunAction, CheckRunStatus};

pub const RELEASE_ACTION: &str = "release_image";
pub const RELEASE_RETRY_ACTION: &str = "release_image_retry";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Lint,
    Release,
    Deploy,
}

impl Stage {
    /// Check-run name shown by the status backend.
    pub fn run_name(&self) -> &'static str {
        match self {
            Self::Lint => "Lint",
            Self::Release => "Release application",
            Self::Deploy => "Deploy to production",
        }
    }

    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lint => "lint",
            Self::Release => "release",
            Self::Deploy => "deploy",
        }
    }

    pub fn from_run_name(name: &str) -> Option<Self> {
        [Self::Lint, Self::Release, Self::Deploy]
            .into_iter()
            .find(|stage| stage.run_name() == name)
    }

    /// Stage entered when a user invokes the action `identifier`.
    pub fn from_action(identifier: &str) -> Option<Self> {
        match identifier {
            RELEASE_ACTION | RELEASE_RETRY_ACTION => Some(Self::Release),
            _ => None,
        }
    }

    /// Lint runs are queued until they complete; the others start immediately.
    pub fn initial_status(&self) -> CheckRunStatus {
        match self {
            Self::Lint => CheckRunStatus::Created,
            Self::Release | Self::Deploy => CheckRunStatus::InProgress,
        }
    }

    pub fn follow_on_action(&self) -> Option<CheckRunAction> {
        match self {
            Self::Lint => Some(CheckRunAction::new(
                RELEASE_ACTION,
                "Release application",
                "Build and push",
            )),
            Self::Release | Self::Deploy => None,
        }
    }

    pub fn retry_action(&self) -> Option<CheckRunAction> {
        match self {
            Self::Release => Some(CheckRunAction::new(
                RELEASE_RETRY_ACTION,
                "Retry release",
                "Retry build and push",
            )),
            Self::Lint | Self::Deploy => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.run_name())
    }
}
