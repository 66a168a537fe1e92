// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! GitHub App Integration
//!
//! [`GitHubApp`] is the production [`InstallationConnector`]. The app JWT
//! signer is built once from configuration and shared; an installation
//! token and client are obtained per event, scoped to that event's
//! repository.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Authenticated status backend for the check-run workflow

pub mod app_auth;
pub mod client;
pub mod error;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

pub use app_auth::AppJwtSigner;
pub use client::{GitHubHttp, InstallationClient};

use crate::domain::config::GitHubAppConfig;
use crate::domain::status::{DeploymentReviewer, InstallationConnector, StatusError, StatusService};
use crate::domain::webhook::Installation;

pub struct GitHubApp {
    http: GitHubHttp,
    signer: Arc<AppJwtSigner>,
}

impl GitHubApp {
    pub fn new(config: &GitHubAppConfig) -> Result<Self, StatusError> {
        Ok(Self {
            http: GitHubHttp::new(&config.api_url),
            signer: Arc::new(AppJwtSigner::new(config.app_id, &config.private_key)?),
        })
    }

    #[instrument(skip_all, fields(installation = installation.id, repository = %installation.repository.full_name()))]
    pub async fn installation_client(
        &self,
        installation: &Installation,
    ) -> Result<Arc<InstallationClient>, StatusError> {
        let jwt = self.signer.sign()?;
        let token = client::installation_token(&self.http, &jwt, installation.id).await?;
        Ok(Arc::new(InstallationClient::new(
            self.http.clone(),
            token,
            installation.repository.clone(),
        )))
    }
}

#[async_trait]
impl InstallationConnector for GitHubApp {
    async fn status_service(
        &self,
        installation: &Installation,
    ) -> Result<Arc<dyn StatusService>, StatusError> {
        let client: Arc<dyn StatusService> = self.installation_client(installation).await?;
        Ok(client)
    }

    async fn deployment_reviewer(
        &self,
        installation: &Installation,
    ) -> Result<Arc<dyn DeploymentReviewer>, StatusError> {
        let client: Arc<dyn DeploymentReviewer> = self.installation_client(installation).await?;
        Ok(client)
    }
}
