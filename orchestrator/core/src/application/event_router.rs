// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

// Routes decoded webhook events to the workflow. `completed` deliveries are
// echoes of transitions this service made itself and are always dropped.

use std::sync::Arc;
use tracing::{debug, info};

use crate::application::check_run_workflow::{AdvanceWorkflow, CheckRunWorkflow, Dispatch, WorkflowError};
use crate::domain::webhook::WebhookEvent;

pub const COMPLETED_ACTION: &str = "completed";

pub struct EventRouter {
    workflow: Arc<CheckRunWorkflow>,
}

impl EventRouter {
    pub fn new(workflow: Arc<CheckRunWorkflow>) -> Self {
        Self { workflow }
    }

    pub async fn route(&self, event: &WebhookEvent) -> Result<Dispatch, WorkflowError> {
        if event.action() == Some(COMPLETED_ACTION) {
            debug!(event = event.kind(), "Ignoring completed event");
            return Ok(Dispatch::ignored(format!("{} completed", event.kind())));
        }

        let handler: &dyn AdvanceWorkflow = match event {
            WebhookEvent::Suite(e) => e,
            WebhookEvent::Run(e) => e,
            WebhookEvent::DeploymentProtection(e) => e,
            WebhookEvent::Ignored { kind } => {
                debug!(event = %kind, "Ignoring unsupported event");
                return Ok(Dispatch::ignored(format!("unsupported event '{kind}'")));
            }
        };

        let dispatch = handler.advance(&self.workflow).await?;
        match &dispatch {
            Dispatch::Ignored { reason } => {
                info!(event = event.kind(), action = ?event.action(), reason = %reason, "Event ignored")
            }
            Dispatch::Launched { stage, run, .. } => {
                info!(event = event.kind(), stage = %stage, run = %run, "Stage launched")
            }
        }
        Ok(dispatch)
    }
}
