// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

//! In-process fakes for every collaborator the workflow talks to, plus a
//! harness wiring them into a real `CheckRunWorkflow` / `EventRouter`.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use monocrat_core::application::build_orchestrator::BuildOrchestrator;
use monocrat_core::application::deployment_gate::DeploymentGate;
use monocrat_core::application::lint_stage::LintPipeline;
use monocrat_core::application::release::ReleasePipeline;
use monocrat_core::application::{CheckRunWorkflow, EventRouter};
use monocrat_core::domain::build::{
    BuildError, DependencyVendor, ImageBuildRequest, ImageBuilder, RegistryCredentials,
};
use monocrat_core::domain::change_set::{ChangeEntry, ChangeKind};
use monocrat_core::domain::check_run::{CheckRunHandle, CheckRunUpdate, CreateCheckRun};
use monocrat_core::domain::config::Secret;
use monocrat_core::domain::lint::{IssuePosition, LintError, LintIssue, LintReport, Linter};
use monocrat_core::domain::status::{
    DeploymentReview, DeploymentReviewer, InstallationConnector, StatusError, StatusService,
};
use monocrat_core::domain::vcs::{CommitSha, VcsError, VersionControl};
use monocrat_core::domain::webhook::{Installation, RepositoryRef};
use monocrat_core::infrastructure::repository_scanner::RepositoryScanner;

pub const REMOTE: &str = "https://github.com/acme/platform.git";

pub fn installation() -> Installation {
    Installation {
        id: 7,
        repository: RepositoryRef {
            owner: "acme".to_string(),
            name: "platform".to_string(),
            clone_url: REMOTE.to_string(),
        },
    }
}

pub fn credentials() -> RegistryCredentials {
    RegistryCredentials {
        registry: "docker.io".to_string(),
        username: "acme".to_string(),
        password: Secret::new("hunter2"),
    }
}

pub fn sha(c: char) -> CommitSha {
    CommitSha::new(std::iter::repeat(c).take(40).collect::<String>())
}

pub fn issue(text: &str, filename: &str, line: u32) -> LintIssue {
    LintIssue {
        from_linter: "govet".to_string(),
        text: text.to_string(),
        severity: String::new(),
        pos: IssuePosition {
            filename: filename.to_string(),
            offset: 0,
            line,
            column: 0,
        },
    }
}

/// Version control that "clones" by writing a fixed file tree.
#[derive(Default)]
pub struct FakeVcs {
    files: Vec<(String, String)>,
    changes: Vec<ChangeEntry>,
    message: String,
    fail_clone: bool,
    pub calls: Mutex<Vec<String>>,
    workspaces: Mutex<Vec<PathBuf>>,
}

impl FakeVcs {
    pub fn with_files(files: &[&str]) -> Self {
        Self {
            files: files
                .iter()
                .map(|f| (f.to_string(), "package main\n".to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn changed(mut self, paths: &[&str]) -> Self {
        self.changes = paths
            .iter()
            .map(|p| ChangeEntry::new(*p, ChangeKind::Updated))
            .collect();
        self
    }

    pub fn commit_message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    pub fn failing_clone(mut self) -> Self {
        self.fail_clone = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Every directory a clone was written into, in call order.
    pub fn workspaces(&self) -> Vec<PathBuf> {
        self.workspaces.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl VersionControl for FakeVcs {
    async fn clone_repository(&self, remote: &str, into: &Path) -> Result<(), VcsError> {
        self.record(format!("clone {remote}"));
        self.workspaces.lock().unwrap().push(into.to_path_buf());
        if self.fail_clone {
            return Err(VcsError::Clone {
                remote: remote.to_string(),
                reason: "repository not found".to_string(),
            });
        }
        for (path, contents) in &self.files {
            let target = into.join(path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(target, contents).unwrap();
        }
        Ok(())
    }

    async fn checkout(&self, _local: &Path, commit: &CommitSha) -> Result<(), VcsError> {
        self.record(format!("checkout {}", commit.short()));
        Ok(())
    }

    async fn diff(
        &self,
        _local: &Path,
        before: &CommitSha,
        after: &CommitSha,
    ) -> Result<Vec<ChangeEntry>, VcsError> {
        self.record(format!("diff {}..{}", before.short(), after.short()));
        Ok(self.changes.clone())
    }

    async fn commit_message(&self, _local: &Path, commit: &CommitSha) -> Result<String, VcsError> {
        self.record(format!("message {}", commit.short()));
        Ok(self.message.clone())
    }
}

/// Linter returning the same report for every module.
#[derive(Default)]
pub struct FakeLinter {
    issues: Vec<LintIssue>,
    broken: bool,
    pub modules: Mutex<Vec<PathBuf>>,
}

impl FakeLinter {
    pub fn reporting(issues: Vec<LintIssue>) -> Self {
        Self {
            issues,
            ..Default::default()
        }
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Linter for FakeLinter {
    async fn run(&self, module_dir: &Path) -> Result<LintReport, LintError> {
        self.modules.lock().unwrap().push(module_dir.to_path_buf());
        if self.broken {
            return Err(LintError::Spawn {
                module_dir: module_dir.to_path_buf(),
                reason: "golangci-lint: not found".to_string(),
            });
        }
        Ok(LintReport {
            issues: self.issues.clone(),
        })
    }
}

#[derive(Default)]
pub struct FakeVendor {
    pub modules: Mutex<Vec<PathBuf>>,
    fail_on: Option<String>,
}

impl FakeVendor {
    /// Fails for any module directory ending in `name`.
    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn vendored(&self) -> Vec<PathBuf> {
        self.modules.lock().unwrap().clone()
    }
}

#[async_trait]
impl DependencyVendor for FakeVendor {
    async fn vendor(&self, module_dir: &Path) -> Result<(), BuildError> {
        self.modules.lock().unwrap().push(module_dir.to_path_buf());
        match &self.fail_on {
            Some(name) if module_dir.ends_with(name) => Err(BuildError::Command {
                command: "go mod vendor".to_string(),
                code: Some(1),
                output: "missing go.sum entry".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct FakeImages {
    pub requests: Mutex<Vec<ImageBuildRequest>>,
    fail_on: Option<String>,
}

impl FakeImages {
    /// Fails for any application directory ending in `name`.
    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn built(&self) -> Vec<ImageBuildRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageBuilder for FakeImages {
    async fn build_and_push(
        &self,
        request: &ImageBuildRequest,
        _credentials: &RegistryCredentials,
    ) -> Result<(), BuildError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.fail_on {
            Some(name) if request.module_dir.join(&request.app_dir).ends_with(name) => {
                Err(BuildError::Command {
                    command: format!("docker build --tag {}", request.reference()),
                    code: Some(1),
                    output: "compile error".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Status backend that records every call.
#[derive(Default)]
pub struct RecordingStatus {
    next_id: AtomicU64,
    pub created: Mutex<Vec<CreateCheckRun>>,
    pub updates: Mutex<Vec<(CheckRunHandle, CheckRunUpdate)>>,
    pub reviews: Mutex<Vec<DeploymentReview>>,
    reject_creates: bool,
}

impl RecordingStatus {
    pub fn rejecting_creates() -> Self {
        Self {
            reject_creates: true,
            ..Default::default()
        }
    }

    pub fn created(&self) -> Vec<CreateCheckRun> {
        self.created.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(CheckRunHandle, CheckRunUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn last_update(&self) -> CheckRunUpdate {
        self.updates().pop().map(|(_, u)| u).unwrap()
    }

    pub fn reviews(&self) -> Vec<DeploymentReview> {
        self.reviews.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusService for RecordingStatus {
    async fn create_check_run(&self, request: &CreateCheckRun) -> Result<CheckRunHandle, StatusError> {
        if self.reject_creates {
            return Err(StatusError::Api {
                status: 422,
                message: "Validation Failed".to_string(),
                errors: vec!["CheckRun head_sha is invalid".to_string()],
            });
        }
        self.created.lock().unwrap().push(request.clone());
        Ok(CheckRunHandle(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn update_check_run(
        &self,
        handle: CheckRunHandle,
        update: &CheckRunUpdate,
    ) -> Result<(), StatusError> {
        self.updates.lock().unwrap().push((handle, update.clone()));
        Ok(())
    }
}

#[async_trait]
impl DeploymentReviewer for RecordingStatus {
    async fn review_deployment(&self, review: &DeploymentReview) -> Result<(), StatusError> {
        self.reviews.lock().unwrap().push(review.clone());
        Ok(())
    }
}

pub struct FakeConnector {
    status: Arc<RecordingStatus>,
}

#[async_trait]
impl InstallationConnector for FakeConnector {
    async fn status_service(
        &self,
        _installation: &Installation,
    ) -> Result<Arc<dyn StatusService>, StatusError> {
        Ok(self.status.clone())
    }

    async fn deployment_reviewer(
        &self,
        _installation: &Installation,
    ) -> Result<Arc<dyn DeploymentReviewer>, StatusError> {
        Ok(self.status.clone())
    }
}

pub struct Harness {
    pub vcs: Arc<FakeVcs>,
    pub linter: Arc<FakeLinter>,
    pub vendor: Arc<FakeVendor>,
    pub images: Arc<FakeImages>,
    pub status: Arc<RecordingStatus>,
    pub workflow: Arc<CheckRunWorkflow>,
    pub router: Arc<EventRouter>,
}

impl Harness {
    pub fn new(vcs: FakeVcs) -> Self {
        HarnessBuilder::new(vcs).build()
    }

    pub fn builder(vcs: FakeVcs) -> HarnessBuilder {
        HarnessBuilder::new(vcs)
    }
}

pub struct HarnessBuilder {
    vcs: FakeVcs,
    linter: FakeLinter,
    vendor: FakeVendor,
    images: FakeImages,
    status: RecordingStatus,
}

impl HarnessBuilder {
    fn new(vcs: FakeVcs) -> Self {
        Self {
            vcs,
            linter: FakeLinter::default(),
            vendor: FakeVendor::default(),
            images: FakeImages::default(),
            status: RecordingStatus::default(),
        }
    }

    pub fn linter(mut self, linter: FakeLinter) -> Self {
        self.linter = linter;
        self
    }

    pub fn vendor(mut self, vendor: FakeVendor) -> Self {
        self.vendor = vendor;
        self
    }

    pub fn images(mut self, images: FakeImages) -> Self {
        self.images = images;
        self
    }

    pub fn status(mut self, status: RecordingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn build(self) -> Harness {
        let vcs = Arc::new(self.vcs);
        let linter = Arc::new(self.linter);
        let vendor = Arc::new(self.vendor);
        let images = Arc::new(self.images);
        let status = Arc::new(self.status);

        let lint = LintPipeline::new(vcs.clone(), RepositoryScanner::default(), linter.clone());
        let release = ReleasePipeline::new(
            vcs.clone(),
            RepositoryScanner::default(),
            BuildOrchestrator::new(vendor.clone(), images.clone(), "monocrat"),
            credentials(),
            Some("1.0.0".to_string()),
        );
        let gate = DeploymentGate::new(vcs.clone());
        let workflow = Arc::new(CheckRunWorkflow::new(
            Arc::new(FakeConnector {
                status: status.clone(),
            }),
            Arc::new(lint),
            Arc::new(release),
            Arc::new(gate),
        ));
        let router = Arc::new(EventRouter::new(workflow.clone()));

        Harness {
            vcs,
            linter,
            vendor,
            images,
            status,
            workflow,
            router,
        }
    }
}
