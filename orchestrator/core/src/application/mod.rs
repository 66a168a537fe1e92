// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod workspace;
pub mod build_orchestrator;
pub mod lint_stage;
pub mod release;
pub mod deployment_gate;
pub mod check_run_workflow;
pub mod event_router;

pub use build_orchestrator::{BuildOrchestrator, BuildOutcome, OrchestrationError, ReleasedImage};
pub use check_run_workflow::{AdvanceWorkflow, CheckRunWorkflow, Dispatch, StageReport, WorkflowError};
pub use event_router::EventRouter;
