// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Repository topology, change impact, check-run lifecycle and the
//! collaborator traits the application layer drives.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and ports; no I/O

pub mod repo_path;
pub mod topology;
pub mod vcs;
pub mod change_set;
pub mod build_plan;
pub mod check_run;
pub mod stage;
pub mod webhook;
pub mod lint;
pub mod build;
pub mod status;
pub mod config;
