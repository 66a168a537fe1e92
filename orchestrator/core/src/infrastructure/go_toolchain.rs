// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

// Dependency vendoring with `go mod vendor`, run on the host so private
// modules resolve with the host's credentials before the image build.

use async_trait::async_trait;
use std::path::Path;
use tracing::{info, instrument};

use crate::domain::build::{BuildError, DependencyVendor};
use crate::infrastructure::process::{self, Invocation};

pub struct GoModVendor {
    go_bin: String,
}

impl GoModVendor {
    pub fn new(go_bin: impl Into<String>) -> Self {
        Self {
            go_bin: go_bin.into(),
        }
    }

    fn invocation(&self, module_dir: &Path) -> Invocation {
        Invocation::new(&self.go_bin)
            .args(["mod", "vendor"])
            .workdir(module_dir)
            .env("GOWORK", "off")
    }
}

#[async_trait]
impl DependencyVendor for GoModVendor {
    #[instrument(skip(self), fields(module = %module_dir.display()))]
    async fn vendor(&self, module_dir: &Path) -> Result<(), BuildError> {
        let invocation = self.invocation(module_dir);
        let output = process::run(&invocation)
            .await
            .map_err(|e| BuildError::Spawn {
                program: self.go_bin.clone(),
                reason: e.to_string(),
            })?;

        if !output.success() {
            return Err(BuildError::Command {
                command: invocation.display(),
                code: output.code,
                output: output.combined(),
            });
        }

        info!(duration_ms = output.duration_ms, "Vendored module dependencies");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_invocation() {
        let invocation = GoModVendor::new("go").invocation(Path::new("/repo/billing"));
        assert_eq!(invocation.display(), "go mod vendor");
        assert_eq!(invocation.workdir.as_deref(), Some(Path::new("/repo/billing")));
        assert_eq!(invocation.env, vec![("GOWORK".to_string(), "off".to_string())]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_vendor_carries_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = GoModVendor::new("false").vendor(tmp.path()).await.unwrap_err();
        assert!(matches!(err, BuildError::Command { code: Some(1), .. }));
    }
}
