// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! GitHub REST Client
//!
//! Anti-corruption layer over the GitHub REST API:
//!
//! - installation token exchange (`POST /app/installations/{id}/access_tokens`)
//! - Checks API (`POST`/`PATCH /repos/{owner}/{repo}/check-runs`)
//! - deployment protection review
//!   (`POST /repos/{owner}/{repo}/actions/runs/{run_id}/deployment_protection_rule`)
//!
//! Every request is logged with method, URL, status and elapsed time.
//! Check-run updates carrying more than [`ANNOTATION_BATCH_SIZE`] annotations
//! are split across several requests; the terminal status, conclusion and
//! actions travel with the last one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, Response};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::domain::check_run::{
    Annotation, CheckRunAction, CheckRunHandle, CheckRunOutput, CheckRunStatus, CheckRunUpdate,
    Conclusion, CreateCheckRun,
};
use crate::domain::status::{
    DeploymentReview, DeploymentReviewer, DeploymentState, StatusError, StatusService,
};
use crate::domain::webhook::RepositoryRef;
use crate::infrastructure::github::error::api_error;

pub const ANNOTATION_BATCH_SIZE: usize = 50;
const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("monocrat/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP transport with request logging.
#[derive(Clone)]
pub struct GitHubHttp {
    client: reqwest::Client,
    base_url: String,
}

impl GitHubHttp {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Send `body` with `Authorization: <scheme> <credential>`, returning the
    /// response only when its status is a success.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        authorization: &str,
        body: Option<&B>,
    ) -> Result<Response, StatusError> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let start = Instant::now();
        let result = builder.send().await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                info!(method = %method, url = %url, elapsed_ms, error = %e, "GitHub request failed");
                return Err(StatusError::Transport(e.to_string()));
            }
        };

        let status = response.status();
        info!(method = %method, url = %url, status = status.as_u16(), elapsed_ms, "GitHub request");

        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(api_error(status.as_u16(), &body))
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    token: String,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

/// Exchange an app JWT for an installation access token.
pub async fn installation_token(
    http: &GitHubHttp,
    app_jwt: &str,
    installation_id: u64,
) -> Result<String, StatusError> {
    let response = http
        .send::<()>(
            Method::POST,
            &format!("/app/installations/{installation_id}/access_tokens"),
            &format!("Bearer {app_jwt}"),
            None,
        )
        .await?;

    let token: AccessToken = response
        .json()
        .await
        .map_err(|e| StatusError::Decode(e.to_string()))?;
    debug!(installation_id, expires_at = ?token.expires_at, "Obtained installation token");
    Ok(token.token)
}

#[derive(Serialize)]
struct CreateCheckRunBody<'a> {
    name: &'a str,
    head_sha: &'a str,
    status: CheckRunStatus,
}

#[derive(Serialize)]
struct OutputBody<'a> {
    title: &'a str,
    summary: &'a str,
    #[serde(skip_serializing_if = "is_empty_slice")]
    annotations: &'a [Annotation],
}

#[derive(Serialize)]
struct UpdateCheckRunBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<CheckRunStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    conclusion: Option<Conclusion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<OutputBody<'a>>,
    #[serde(skip_serializing_if = "is_empty_slice")]
    actions: &'a [CheckRunAction],
}

#[derive(Debug, Deserialize)]
struct CreatedCheckRun {
    id: u64,
}

#[derive(Serialize)]
struct ReviewBody<'a> {
    environment_name: &'a str,
    state: DeploymentState,
    comment: &'a str,
}

fn is_empty_slice<T>(items: &&[T]) -> bool {
    items.is_empty()
}

fn output_body<'a>(output: &'a CheckRunOutput, annotations: &'a [Annotation]) -> OutputBody<'a> {
    OutputBody {
        title: &output.title,
        summary: &output.summary,
        annotations,
    }
}

fn terminal_body<'a>(update: &'a CheckRunUpdate, output: Option<OutputBody<'a>>) -> UpdateCheckRunBody<'a> {
    UpdateCheckRunBody {
        status: update.status,
        conclusion: update.conclusion,
        completed_at: update.completed_at,
        output,
        actions: &update.actions,
    }
}

/// Split an update into the request bodies to send, in order.
fn update_bodies(update: &CheckRunUpdate) -> Vec<UpdateCheckRunBody<'_>> {
    let Some(output) = &update.output else {
        return vec![terminal_body(update, None)];
    };

    let chunks: Vec<&[Annotation]> = output.annotations.chunks(ANNOTATION_BATCH_SIZE).collect();
    if chunks.is_empty() {
        return vec![terminal_body(update, Some(output_body(output, &[])))];
    }

    let last = chunks.len() - 1;
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            if i == last {
                terminal_body(update, Some(output_body(output, chunk)))
            } else {
                UpdateCheckRunBody {
                    status: None,
                    conclusion: None,
                    completed_at: None,
                    output: Some(output_body(output, chunk)),
                    actions: &[],
                }
            }
        })
        .collect()
}

/// API access scoped to one installation and one repository.
pub struct InstallationClient {
    http: GitHubHttp,
    token: String,
    repository: RepositoryRef,
}

impl InstallationClient {
    pub fn new(http: GitHubHttp, token: impl Into<String>, repository: RepositoryRef) -> Self {
        Self {
            http,
            token: token.into(),
            repository,
        }
    }

    fn repo_path(&self, suffix: &str) -> String {
        format!("/repos/{}/{}{}", self.repository.owner, self.repository.name, suffix)
    }

    fn authorization(&self) -> String {
        format!("token {}", self.token)
    }
}

#[async_trait]
impl StatusService for InstallationClient {
    async fn create_check_run(
        &self,
        request: &CreateCheckRun,
    ) -> Result<CheckRunHandle, StatusError> {
        let body = CreateCheckRunBody {
            name: &request.name,
            head_sha: request.head_sha.as_str(),
            status: request.status,
        };
        let response = self
            .http
            .send(Method::POST, &self.repo_path("/check-runs"), &self.authorization(), Some(&body))
            .await?;

        let created: CreatedCheckRun = response
            .json()
            .await
            .map_err(|e| StatusError::Decode(e.to_string()))?;
        Ok(CheckRunHandle(created.id))
    }

    async fn update_check_run(
        &self,
        handle: CheckRunHandle,
        update: &CheckRunUpdate,
    ) -> Result<(), StatusError> {
        let path = self.repo_path(&format!("/check-runs/{handle}"));
        for body in update_bodies(update) {
            self.http
                .send(Method::PATCH, &path, &self.authorization(), Some(&body))
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DeploymentReviewer for InstallationClient {
    async fn review_deployment(&self, review: &DeploymentReview) -> Result<(), StatusError> {
        info!(
            environment = %review.environment,
            run_id = review.run_id,
            state = ?review.state,
            "Requesting deployment review"
        );
        let body = ReviewBody {
            environment_name: &review.environment,
            state: review.state,
            comment: &review.comment,
        };
        self.http
            .send(
                Method::POST,
                &self.repo_path(&format!(
                    "/actions/runs/{}/deployment_protection_rule",
                    review.run_id
                )),
                &self.authorization(),
                Some(&body),
            )
            .await?;
        Ok(())
    }
}
