// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Build collaborators: dependency vendoring per module and image
//! build-and-push per application.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::config::Secret;

/// Registry login used for every push of one release.
#[derive(Debug, Clone)]
pub struct RegistryCredentials {
    pub registry: String,
    pub username: String,
    pub password: Secret,
}

impl RegistryCredentials {
    /// `<registry>/<username>/<name>`
    pub fn repository_for(&self, name: &str) -> String {
        format!("{}/{}/{}", self.registry, self.username, name)
    }
}

/// Everything the image builder needs for one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuildRequest {
    /// Checkout root.
    pub repository_dir: PathBuf,
    /// Owning module, relative to `repository_dir`.
    pub module_dir: PathBuf,
    /// Application, relative to `module_dir`.
    pub app_dir: PathBuf,
    pub registry_repository: String,
    pub version: String,
}

impl ImageBuildRequest {
    pub fn reference(&self) -> String {
        format!("{}:{}", self.registry_repository, self.version)
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("{command} exited with status {code:?}: {output}")]
    Command {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Docker daemon error: {0}")]
    Daemon(String),

    #[error("Failed to package build context: {0}")]
    Context(String),

    #[error("Invalid build input: {0}")]
    Invalid(String),
}

#[async_trait]
pub trait DependencyVendor: Send + Sync {
    async fn vendor(&self, module_dir: &Path) -> Result<(), BuildError>;
}

#[async_trait]
pub trait ImageBuilder: Send + Sync {
    async fn build_and_push(
        &self,
        request: &ImageBuildRequest,
        credentials: &RegistryCredentials,
    ) -> Result<(), BuildError>;
}
