// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Status Backend Collaborators
//!
//! The workflow talks to the status backend through three narrow traits:
//!
//! - [`StatusService`] opens and updates check runs for one repository
//! - [`DeploymentReviewer`] answers a deployment protection rule
//! - [`InstallationConnector`] authenticates as one [`Installation`] and hands
//!   out the two services above, scoped to that installation's repository
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Ports implemented by the GitHub App client and by test fakes

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::check_run::{CheckRunHandle, CheckRunUpdate, CreateCheckRun};
use crate::domain::webhook::Installation;

#[derive(Debug, Error)]
pub enum StatusError {
    /// The backend answered with an error document.
    #[error("{}", render_api_error(.message, .errors))]
    Api {
        status: u16,
        message: String,
        errors: Vec<String>,
    },

    #[error("Status API request failed: {0}")]
    Transport(String),

    #[error("Status API authentication failed: {0}")]
    Auth(String),

    #[error("Unexpected status API response: {0}")]
    Decode(String),
}

fn render_api_error(message: &str, errors: &[String]) -> String {
    if errors.is_empty() {
        message.to_string()
    } else {
        format!("{}: {}", message, errors.join("; "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReview {
    pub run_id: u64,
    pub environment: String,
    pub state: DeploymentState,
    pub comment: String,
}

#[async_trait]
pub trait StatusService: Send + Sync {
    async fn create_check_run(&self, request: &CreateCheckRun)
        -> Result<CheckRunHandle, StatusError>;

    async fn update_check_run(
        &self,
        handle: CheckRunHandle,
        update: &CheckRunUpdate,
    ) -> Result<(), StatusError>;
}

#[async_trait]
pub trait DeploymentReviewer: Send + Sync {
    async fn review_deployment(&self, review: &DeploymentReview) -> Result<(), StatusError>;
}

#[async_trait]
pub trait InstallationConnector: Send + Sync {
    async fn status_service(
        &self,
        installation: &Installation,
    ) -> Result<Arc<dyn StatusService>, StatusError>;

    async fn deployment_reviewer(
        &self,
        installation: &Installation,
    ) -> Result<Arc<dyn DeploymentReviewer>, StatusError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_renders_message_and_sub_errors() {
        let err = StatusError::Api {
            status: 422,
            message: "Validation Failed".to_string(),
            errors: vec!["name is missing".to_string(), "head_sha is invalid".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Validation Failed: name is missing; head_sha is invalid"
        );

        let bare = StatusError::Api {
            status: 404,
            message: "Not Found".to_string(),
            errors: Vec::new(),
        };
        assert_eq!(bare.to_string(), "Not Found");
    }
}
