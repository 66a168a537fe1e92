// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Webhook Events
//!
//! Minimal named records for the fields the workflow consumes from
//! `check_suite`, `check_run` and `deployment_protection_rule` deliveries.
//! The provider's payload is decoded into private wire structs and then
//! flattened into these records, so nothing above this module depends on
//! the upstream JSON shape.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Closed set of inbound event variants

use serde::Deserialize;
use thiserror::Error;

use crate::domain::vcs::CommitSha;

pub const CHECK_SUITE_EVENT: &str = "check_suite";
pub const CHECK_RUN_EVENT: &str = "check_run";
pub const DEPLOYMENT_PROTECTION_RULE_EVENT: &str = "deployment_protection_rule";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Malformed {event} payload: {source}")]
    Malformed {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid deployment callback URL: {0}")]
    InvalidCallbackUrl(String),
}

/// Repository an event refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
    pub clone_url: String,
}

impl RepositoryRef {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Authorization context of one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub id: u64,
    pub repository: RepositoryRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteEvent {
    pub action: String,
    pub head_sha: CommitSha,
    pub installation: Installation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEvent {
    pub action: String,
    pub run_name: String,
    pub head_sha: CommitSha,
    pub before: Option<CommitSha>,
    pub after: Option<CommitSha>,
    pub requested_action: Option<String>,
    pub installation: Installation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentProtectionEvent {
    pub action: String,
    pub environment: String,
    pub callback_url: String,
    pub sha: CommitSha,
    pub installation: Installation,
}

impl DeploymentProtectionEvent {
    /// Workflow-run id taken from the segment after `runs/` in the callback URL.
    pub fn workflow_run_id(&self) -> Result<u64, WebhookError> {
        extract_run_id(&self.callback_url)
    }
}

fn extract_run_id(callback_url: &str) -> Result<u64, WebhookError> {
    let invalid = || WebhookError::InvalidCallbackUrl(callback_url.to_string());

    let (_, tail) = callback_url.split_once("runs/").ok_or_else(invalid)?;
    let segment = tail.split('/').next().ok_or_else(invalid)?;
    segment.parse::<u64>().map_err(|_| invalid())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    Suite(SuiteEvent),
    Run(RunEvent),
    DeploymentProtection(DeploymentProtectionEvent),
    /// Any event type the workflow has no handler for.
    Ignored { kind: String },
}

impl WebhookEvent {
    /// Decode a delivery given its `X-GitHub-Event` type.
    pub fn parse(event_type: &str, body: &[u8]) -> Result<Self, WebhookError> {
        let malformed = |source| WebhookError::Malformed {
            event: event_type.to_string(),
            source,
        };

        match event_type {
            CHECK_SUITE_EVENT => {
                let wire: wire::SuitePayload = serde_json::from_slice(body).map_err(malformed)?;
                Ok(Self::Suite(wire.into()))
            }
            CHECK_RUN_EVENT => {
                let wire: wire::RunPayload = serde_json::from_slice(body).map_err(malformed)?;
                Ok(Self::Run(wire.into()))
            }
            DEPLOYMENT_PROTECTION_RULE_EVENT => {
                let wire: wire::DeploymentProtectionPayload =
                    serde_json::from_slice(body).map_err(malformed)?;
                Ok(Self::DeploymentProtection(wire.into()))
            }
            other => Ok(Self::Ignored {
                kind: other.to_string(),
            }),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Suite(_) => CHECK_SUITE_EVENT,
            Self::Run(_) => CHECK_RUN_EVENT,
            Self::DeploymentProtection(_) => DEPLOYMENT_PROTECTION_RULE_EVENT,
            Self::Ignored { kind } => kind,
        }
    }

    pub fn action(&self) -> Option<&str> {
        match self {
            Self::Suite(e) => Some(&e.action),
            Self::Run(e) => Some(&e.action),
            Self::DeploymentProtection(e) => Some(&e.action),
            Self::Ignored { .. } => None,
        }
    }
}

mod wire {
    use super::*;

    #[derive(Deserialize)]
    pub(super) struct Owner {
        pub login: String,
    }

    #[derive(Deserialize)]
    pub(super) struct Repository {
        pub name: String,
        pub owner: Owner,
        pub clone_url: String,
    }

    #[derive(Deserialize)]
    pub(super) struct InstallationId {
        pub id: u64,
    }

    fn installation(id: InstallationId, repository: Repository) -> Installation {
        Installation {
            id: id.id,
            repository: RepositoryRef {
                owner: repository.owner.login,
                name: repository.name,
                clone_url: repository.clone_url,
            },
        }
    }

    #[derive(Deserialize)]
    pub(super) struct CheckSuite {
        pub head_sha: String,
        #[serde(default)]
        pub before: Option<String>,
        #[serde(default)]
        pub after: Option<String>,
    }

    #[derive(Deserialize)]
    pub(super) struct SuitePayload {
        pub action: String,
        pub check_suite: CheckSuite,
        pub repository: Repository,
        pub installation: InstallationId,
    }

    impl From<SuitePayload> for SuiteEvent {
        fn from(p: SuitePayload) -> Self {
            Self {
                action: p.action,
                head_sha: CommitSha::new(p.check_suite.head_sha),
                installation: installation(p.installation, p.repository),
            }
        }
    }

    #[derive(Deserialize)]
    pub(super) struct CheckRun {
        pub name: String,
        pub head_sha: String,
        pub check_suite: Option<CheckSuite>,
    }

    #[derive(Deserialize)]
    pub(super) struct RequestedAction {
        pub identifier: String,
    }

    #[derive(Deserialize)]
    pub(super) struct RunPayload {
        pub action: String,
        pub check_run: CheckRun,
        #[serde(default)]
        pub requested_action: Option<RequestedAction>,
        pub repository: Repository,
        pub installation: InstallationId,
    }

    impl From<RunPayload> for RunEvent {
        fn from(p: RunPayload) -> Self {
            let (before, after) = match p.check_run.check_suite {
                Some(suite) => (suite.before, suite.after),
                None => (None, None),
            };
            Self {
                action: p.action,
                run_name: p.check_run.name,
                head_sha: CommitSha::new(p.check_run.head_sha),
                before: before.map(CommitSha::new),
                after: after.map(CommitSha::new),
                requested_action: p.requested_action.map(|a| a.identifier),
                installation: installation(p.installation, p.repository),
            }
        }
    }

    #[derive(Deserialize)]
    pub(super) struct Deployment {
        pub sha: String,
    }

    #[derive(Deserialize)]
    pub(super) struct DeploymentProtectionPayload {
        pub action: String,
        pub environment: String,
        pub deployment_callback_url: String,
        pub deployment: Deployment,
        pub repository: Repository,
        pub installation: InstallationId,
    }

    impl From<DeploymentProtectionPayload> for DeploymentProtectionEvent {
        fn from(p: DeploymentProtectionPayload) -> Self {
            Self {
                action: p.action,
                environment: p.environment,
                callback_url: p.deployment_callback_url,
                sha: CommitSha::new(p.deployment.sha),
                installation: installation(p.installation, p.repository),
            }
        }
    }
}
