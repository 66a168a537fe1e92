// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

// Orchestrator Configuration
//
// Read once at process start from the environment and then shared
// read-only for the lifetime of the process:
// - GitHub App identity and signing key
// - registry credentials and image naming
// - external tool binaries and the Docker daemon socket
// Missing or malformed required values fail startup.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::build::RegistryCredentials;

pub const ENV_APP_ID: &str = "MONOCRAT_APP_ID";
pub const ENV_PRIVATE_KEY: &str = "MONOCRAT_PRIVATE_KEY";
pub const ENV_DOCKER_USERNAME: &str = "DOCKER_HUB_USERNAME";
pub const ENV_DOCKER_PASSWORD: &str = "DOCKER_HUB_PASSWORD";
pub const ENV_WEBHOOK_SECRET: &str = "MONOCRAT_WEBHOOK_SECRET";
pub const ENV_GITHUB_API_URL: &str = "MONOCRAT_GITHUB_API_URL";
pub const ENV_REGISTRY: &str = "MONOCRAT_REGISTRY";
pub const ENV_IMAGE_PREFIX: &str = "MONOCRAT_IMAGE_PREFIX";
pub const ENV_IMAGE_VERSION: &str = "MONOCRAT_IMAGE_VERSION";
pub const ENV_LINTER_BIN: &str = "MONOCRAT_LINTER_BIN";
pub const ENV_GO_BIN: &str = "MONOCRAT_GO_BIN";
pub const ENV_DOCKER_SOCKET: &str = "MONOCRAT_DOCKER_SOCKET";

/// A credential whose `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct GitHubAppConfig {
    pub app_id: u64,
    /// PEM-encoded RSA key.
    pub private_key: Secret,
    pub api_url: String,
    /// When `None`, webhook signatures are not checked.
    pub webhook_secret: Option<Secret>,
}

#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    pub image_prefix: String,
    /// Fixed version tag; defaults to the short released commit SHA.
    pub image_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainConfig {
    pub linter_bin: String,
    pub go_bin: String,
    /// Docker daemon socket; local defaults when `None`.
    pub docker_socket: Option<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            linter_bin: "golangci-lint".to_string(),
            go_bin: "go".to_string(),
            docker_socket: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub github: GitHubAppConfig,
    pub registry: RegistryCredentials,
    pub release: ReleaseConfig,
    pub toolchain: ToolchainConfig,
}

impl OrchestratorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any key lookup. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));
        let or_default = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let app_id = required(ENV_APP_ID)?;
        let app_id = app_id
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::Invalid {
                name: ENV_APP_ID,
                reason: e.to_string(),
            })?;

        let private_key = required(ENV_PRIVATE_KEY)?.replace("\\n", "\n");
        if !private_key.contains("-----BEGIN") {
            return Err(ConfigError::Invalid {
                name: ENV_PRIVATE_KEY,
                reason: "expected a PEM-encoded key".to_string(),
            });
        }

        let toolchain_defaults = ToolchainConfig::default();

        Ok(Self {
            github: GitHubAppConfig {
                app_id,
                private_key: Secret::new(private_key),
                api_url: or_default(ENV_GITHUB_API_URL, "https://api.github.com")
                    .trim_end_matches('/')
                    .to_string(),
                webhook_secret: get(ENV_WEBHOOK_SECRET).map(Secret::new),
            },
            registry: RegistryCredentials {
                registry: or_default(ENV_REGISTRY, "docker.io"),
                username: required(ENV_DOCKER_USERNAME)?,
                password: Secret::new(required(ENV_DOCKER_PASSWORD)?),
            },
            release: ReleaseConfig {
                image_prefix: or_default(ENV_IMAGE_PREFIX, "monocrat"),
                image_version: get(ENV_IMAGE_VERSION),
            },
            toolchain: ToolchainConfig {
                linter_bin: or_default(ENV_LINTER_BIN, &toolchain_defaults.linter_bin),
                go_bin: or_default(ENV_GO_BIN, &toolchain_defaults.go_bin),
                docker_socket: get(ENV_DOCKER_SOCKET),
            },
        })
    }
}
