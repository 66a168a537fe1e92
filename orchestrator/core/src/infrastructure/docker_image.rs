// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Docker Image Builder
//!
//! Builds one Go application into a two-stage image and pushes it through
//! the Docker Engine API:
//!
//! 1. `golang` builder: copies the checkout, enters the owning module and
//!    runs `go build` for the application with `CGO_ENABLED=0 GOWORK=off`,
//!    stamping `main.version`
//! 2. `alpine` runtime: the static binary as entry point
//!
//! The Dockerfile is generated and packed into the tar build context next
//! to the checkout, so the repository needs no build files of its own.
//! Registry credentials travel with the push request only.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** `ImageBuilder` over the Docker daemon (`bollard`)

use async_trait::async_trait;
use bollard::auth::DockerCredentials;
use bollard::query_parameters::{
    BuildImageOptions, BuildImageOptionsBuilder, PushImageOptions, PushImageOptionsBuilder,
};
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use crate::domain::build::{BuildError, ImageBuildRequest, ImageBuilder, RegistryCredentials};

pub const BUILDER_IMAGE: &str = "golang:1.22";
pub const RUNTIME_IMAGE: &str = "alpine:3.19";
/// Name of the generated Dockerfile inside the build context.
pub const DOCKERFILE_NAME: &str = ".monocrat.Dockerfile";

const CONNECT_TIMEOUT_SECS: u64 = 120;

pub struct DockerImageBuilder {
    docker: Docker,
}

/// Forward-slash form of a relative path, `.` when empty.
fn slash_path(path: &Path) -> String {
    let joined = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

pub fn dockerfile(request: &ImageBuildRequest) -> String {
    format!(
        "FROM {builder} AS builder\n\
         ARG APP_VERSION\n\
         ENV CGO_ENABLED=0 GOWORK=off\n\
         WORKDIR /workspace\n\
         COPY . .\n\
         WORKDIR /workspace/{module}\n\
         RUN go build -ldflags \"-X main.version=${{APP_VERSION}}\" -o /out/app ./{app}\n\
         \n\
         FROM {runtime}\n\
         COPY --from=builder /out/app /bin/app\n\
         ENTRYPOINT [\"/bin/app\"]\n",
        builder = BUILDER_IMAGE,
        runtime = RUNTIME_IMAGE,
        module = slash_path(&request.module_dir),
        app = slash_path(&request.app_dir),
    )
}

/// Tar archive of the checkout without `.git`, plus the generated Dockerfile.
pub fn build_context(request: &ImageBuildRequest) -> io::Result<Vec<u8>> {
    let root = &request.repository_dir;
    let mut archive = tar::Builder::new(Vec::new());
    archive.follow_symlinks(false);

    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");
    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        archive.append_path_with_name(entry.path(), relative)?;
    }

    let contents = dockerfile(request);
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    archive.append_data(&mut header, DOCKERFILE_NAME, contents.as_bytes())?;

    archive.into_inner()
}

/// Per-request registry auth for the push.
pub fn registry_auth(credentials: &RegistryCredentials) -> DockerCredentials {
    DockerCredentials {
        username: Some(credentials.username.clone()),
        password: Some(credentials.password.expose().to_string()),
        serveraddress: Some(credentials.registry.clone()),
        ..Default::default()
    }
}

fn build_options(request: &ImageBuildRequest) -> BuildImageOptions {
    let buildargs = HashMap::from([("APP_VERSION".to_string(), request.version.clone())]);
    BuildImageOptionsBuilder::default()
        .dockerfile(DOCKERFILE_NAME)
        .t(&request.reference())
        .buildargs(&buildargs)
        .rm(true)
        .forcerm(true)
        .build()
}

fn push_options(request: &ImageBuildRequest) -> PushImageOptions {
    PushImageOptionsBuilder::default()
        .tag(&request.version)
        .build()
}

impl DockerImageBuilder {
    /// Client for the daemon at `socket`, or the local defaults
    /// (`DOCKER_HOST`, then the platform socket) when `None`.
    pub fn connect(socket: Option<&str>) -> Result<Self, BuildError> {
        let docker = match socket {
            Some(path) => {
                #[cfg(unix)]
                let result =
                    Docker::connect_with_unix(path, CONNECT_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION);

                #[cfg(windows)]
                let result = Docker::connect_with_named_pipe(
                    path,
                    CONNECT_TIMEOUT_SECS,
                    bollard::API_DEFAULT_VERSION,
                );

                result.map_err(|e| {
                    BuildError::Daemon(format!("failed to connect to Docker at {path}: {e}"))
                })?
            }
            None => Docker::connect_with_local_defaults()
                .map_err(|e| BuildError::Daemon(format!("failed to connect to Docker: {e}")))?,
        };

        Ok(Self { docker })
    }

    /// Verify the daemon answers.
    pub async fn healthcheck(&self) -> Result<(), BuildError> {
        self.docker
            .ping()
            .await
            .map_err(|e| BuildError::Daemon(format!("cannot reach Docker daemon: {e}")))?;
        Ok(())
    }

    async fn build(&self, request: &ImageBuildRequest) -> Result<(), BuildError> {
        let context_request = request.clone();
        let context = tokio::task::spawn_blocking(move || build_context(&context_request))
            .await
            .map_err(|e| BuildError::Context(e.to_string()))?
            .map_err(|e| BuildError::Context(e.to_string()))?;

        let reference = request.reference();
        let mut stream = self.docker.build_image(
            build_options(request),
            None,
            Some(bollard::body_full(context.into())),
        );
        while let Some(item) = stream.next().await {
            let info = item
                .map_err(|e| BuildError::Daemon(format!("build of {reference} failed: {e}")))?;
            if let Some(message) = info.error_detail.and_then(|detail| detail.message) {
                return Err(BuildError::Daemon(format!(
                    "build of {reference} failed: {message}"
                )));
            }
            if let Some(line) = info.stream {
                let line = line.trim_end();
                if !line.is_empty() {
                    debug!(image = %reference, "{line}");
                }
            }
        }
        Ok(())
    }

    async fn push(
        &self,
        request: &ImageBuildRequest,
        credentials: &RegistryCredentials,
    ) -> Result<(), BuildError> {
        let reference = request.reference();
        let mut stream = self.docker.push_image(
            &request.registry_repository,
            Some(push_options(request)),
            Some(registry_auth(credentials)),
        );
        while let Some(item) = stream.next().await {
            item.map_err(|e| BuildError::Daemon(format!("push of {reference} failed: {e}")))?;
        }
        Ok(())
    }
}

#[async_trait]
impl ImageBuilder for DockerImageBuilder {
    #[instrument(skip_all, fields(image = %request.reference()))]
    async fn build_and_push(
        &self,
        request: &ImageBuildRequest,
        credentials: &RegistryCredentials,
    ) -> Result<(), BuildError> {
        if request.version.trim().is_empty() {
            return Err(BuildError::Invalid("empty image version".to_string()));
        }

        self.build(request).await?;
        self.push(request, credentials).await?;

        info!("Image pushed");
        Ok(())
    }
}
