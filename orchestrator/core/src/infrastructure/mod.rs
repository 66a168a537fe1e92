// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod docker_image;
pub mod git;
pub mod github;
pub mod go_toolchain;
pub mod golangci;
pub mod process;
pub mod repository_scanner;
pub mod webhook_signature;

pub use docker_image::DockerImageBuilder;
pub use git::GitVersionControl;
pub use github::GitHubApp;
pub use go_toolchain::GoModVendor;
pub use golangci::GolangciLinter;
pub use repository_scanner::{RepositoryScanner, ScanError, ScanRules};
pub use webhook_signature::{SignatureError, WebhookVerifier};
