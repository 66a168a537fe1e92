// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Monocrat Core
//!
//! Webhook-driven CI/CD orchestration for multi-module Go repositories:
//! change-impact resolution, image release and the check-run workflow.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Library consumed by the `monocrat` binary

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
