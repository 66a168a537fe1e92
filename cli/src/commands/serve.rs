// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Webhook Service Command
//!
//! `monocrat serve` reads [`OrchestratorConfig`] from the environment once,
//! wires the production collaborators into the check-run workflow and
//! serves the webhook endpoint until Ctrl+C or SIGTERM.
//!
//! # Architecture
//!
//! - **Layer:** CLI/Presentation
//! - **Purpose:** Composition root for the webhook service
//! - **Integration:** CLI → EventRouter → CheckRunWorkflow → GitHub / git / docker

use anyhow::{Context, Result};
use clap::Args;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use monocrat_core::application::build_orchestrator::BuildOrchestrator;
use monocrat_core::application::deployment_gate::DeploymentGate;
use monocrat_core::application::lint_stage::LintPipeline;
use monocrat_core::application::release::ReleasePipeline;
use monocrat_core::application::{CheckRunWorkflow, EventRouter};
use monocrat_core::domain::config::OrchestratorConfig;
use monocrat_core::domain::vcs::VersionControl;
use monocrat_core::infrastructure::{
    DockerImageBuilder, GitHubApp, GitVersionControl, GoModVendor, GolangciLinter,
    RepositoryScanner, WebhookVerifier,
};
use monocrat_core::presentation::api::{app, AppState};

#[derive(Args)]
pub struct ServeCommand {
    /// HTTP port for webhook deliveries
    #[arg(long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Bind address
    #[arg(long, env = "MONOCRAT_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Expose Prometheus metrics on this port
    #[arg(long, env = "MONOCRAT_METRICS_PORT")]
    metrics_port: Option<u16>,
}

pub async fn execute(cmd: ServeCommand) -> Result<()> {
    let config = OrchestratorConfig::from_env().context("Failed to load configuration")?;
    info!(
        app_id = config.github.app_id,
        api_url = %config.github.api_url,
        registry = %config.registry.registry,
        "Configuration loaded"
    );

    if let Some(port) = cmd.metrics_port {
        let addr: SocketAddr = format!("{}:{}", cmd.host, port)
            .parse()
            .with_context(|| format!("Invalid metrics address {}:{}", cmd.host, port))?;
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Metrics listening on {}", addr);
    }

    let router = build_router(&config).await?;

    let verifier = WebhookVerifier::new(config.github.webhook_secret.clone());
    if !verifier.is_enabled() {
        warn!("No webhook secret configured; deliveries are not authenticated");
    }

    let app = app(AppState::new(router, verifier));

    let addr = format!("{}:{}", cmd.host, cmd.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Monocrat listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Monocrat shutting down");

    Ok(())
}

async fn build_router(config: &OrchestratorConfig) -> Result<Arc<EventRouter>> {
    let vcs: Arc<dyn VersionControl> = Arc::new(GitVersionControl::new());
    let scanner = RepositoryScanner::default();
    let toolchain = &config.toolchain;

    let lint = LintPipeline::new(
        vcs.clone(),
        scanner.clone(),
        Arc::new(GolangciLinter::new(&toolchain.linter_bin)),
    );

    let images = DockerImageBuilder::connect(toolchain.docker_socket.as_deref())
        .context("Failed to initialize Docker client")?;
    if let Err(e) = images.healthcheck().await {
        warn!("{}; releases will fail until the daemon is reachable", e);
    }

    let orchestrator = BuildOrchestrator::new(
        Arc::new(GoModVendor::new(&toolchain.go_bin)),
        Arc::new(images),
        config.release.image_prefix.clone(),
    );
    let release = ReleasePipeline::new(
        vcs.clone(),
        scanner,
        orchestrator,
        config.registry.clone(),
        config.release.image_version.clone(),
    );

    let connector = GitHubApp::new(&config.github).context("Failed to initialize GitHub App client")?;

    let workflow = CheckRunWorkflow::new(
        Arc::new(connector),
        Arc::new(lint),
        Arc::new(release),
        Arc::new(DeploymentGate::new(vcs)),
    );

    Ok(Arc::new(EventRouter::new(Arc::new(workflow))))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
