// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Build Orchestrator
//!
//! Executes a [`BuildPlan`] against a checked-out repository in two strictly
//! ordered phases:
//!
//! 1. vendor dependencies for every module in `vendor_modules`
//! 2. build and push an image for every application in `rebuild_apps`
//!
//! Both phases are fail-fast. A vendor failure stops execution before any
//! image is built, and the first image failure stops the batch; images
//! already pushed stay pushed.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Sequential execution of a resolved build plan

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::build::{
    BuildError, DependencyVendor, ImageBuildRequest, ImageBuilder, RegistryCredentials,
};
use crate::domain::build_plan::BuildPlan;
use crate::domain::repo_path;
use crate::domain::topology::RepositoryIndex;

pub const IMAGES_PUSHED_METRIC: &str = "monocrat_images_pushed_total";

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("vendor failed for module {}: {source}", repo_path::display_dir(.module))]
    Vendor {
        module: PathBuf,
        #[source]
        source: BuildError,
    },

    #[error("build failed for application {}: {source}", repo_path::display_dir(.application))]
    Image {
        application: PathBuf,
        #[source]
        source: BuildError,
    },

    #[error("application {} has no owning module", repo_path::display_dir(.0))]
    Unowned(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleasedImage {
    /// Application directory relative to the repository root.
    pub application: PathBuf,
    pub name: String,
    pub reference: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildOutcome {
    pub released: Vec<ReleasedImage>,
}

pub struct BuildOrchestrator {
    vendor: Arc<dyn DependencyVendor>,
    images: Arc<dyn ImageBuilder>,
    image_prefix: String,
}

impl BuildOrchestrator {
    pub fn new(
        vendor: Arc<dyn DependencyVendor>,
        images: Arc<dyn ImageBuilder>,
        image_prefix: impl Into<String>,
    ) -> Self {
        Self {
            vendor,
            images,
            image_prefix: image_prefix.into(),
        }
    }

    pub fn image_name(&self, display_name: &str) -> String {
        format!("{}-{}", self.image_prefix, display_name)
    }

    #[instrument(skip_all, fields(root = %index.root().display(), version = %version))]
    pub async fn execute(
        &self,
        index: &RepositoryIndex,
        plan: &BuildPlan,
        credentials: &RegistryCredentials,
        version: &str,
    ) -> Result<BuildOutcome, OrchestrationError> {
        for module in plan.vendor_modules() {
            info!(module = %module.dir().display(), "Vendoring module dependencies");
            self.vendor
                .vendor(module.dir())
                .await
                .map_err(|source| OrchestrationError::Vendor {
                    module: index.relative_dir(module.dir()),
                    source,
                })?;
        }

        let mut outcome = BuildOutcome::default();
        for app in plan.rebuild_apps() {
            let application = index.relative_dir(app.dir());
            let module = index
                .owner_of(app)
                .ok_or_else(|| OrchestrationError::Unowned(application.clone()))?;

            let name = self.image_name(&app.display_name());
            let request = ImageBuildRequest {
                repository_dir: index.root().to_path_buf(),
                module_dir: index.relative_dir(module.dir()),
                app_dir: repo_path::relative_to(app.dir(), module.dir()).unwrap_or_default(),
                registry_repository: credentials.repository_for(&name),
                version: version.to_string(),
            };

            info!(application = %application.display(), image = %request.reference(), "Building image");
            self.images
                .build_and_push(&request, credentials)
                .await
                .map_err(|source| OrchestrationError::Image {
                    application: application.clone(),
                    source,
                })?;

            metrics::counter!(IMAGES_PUSHED_METRIC).increment(1);
            outcome.released.push(ReleasedImage {
                application,
                name,
                reference: request.reference(),
            });
        }

        Ok(outcome)
    }
}
