// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

// golangci-lint adapter. Issues are signalled with a dedicated exit code so
// "found issues" and "could not run" stay distinguishable.

use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

use crate::domain::lint::{LintError, LintReport, Linter};
use crate::infrastructure::process::{self, Invocation};

pub const ISSUES_EXIT_CODE: i32 = 42;

pub struct GolangciLinter {
    binary: String,
}

impl GolangciLinter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn invocation(&self, module_dir: &Path) -> Invocation {
        Invocation::new(&self.binary)
            .args([
                "run".to_string(),
                "--out-format".to_string(),
                "json".to_string(),
                "--issues-exit-code".to_string(),
                ISSUES_EXIT_CODE.to_string(),
            ])
            .workdir(module_dir)
    }
}

fn parse_report(module_dir: &Path, code: Option<i32>, stdout: &str, stderr: &str) -> Result<LintReport, LintError> {
    if !matches!(code, Some(0) | Some(ISSUES_EXIT_CODE)) {
        return Err(LintError::Exit {
            module_dir: module_dir.to_path_buf(),
            code,
            output: format!("{}\n{}", stdout.trim(), stderr.trim()).trim().to_string(),
        });
    }

    serde_json::from_str(stdout).map_err(|e| LintError::Report {
        module_dir: module_dir.to_path_buf(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl Linter for GolangciLinter {
    #[instrument(skip(self), fields(module = %module_dir.display()))]
    async fn run(&self, module_dir: &Path) -> Result<LintReport, LintError> {
        let output = process::run(&self.invocation(module_dir))
            .await
            .map_err(|e| LintError::Spawn {
                module_dir: module_dir.to_path_buf(),
                reason: e.to_string(),
            })?;

        let report = parse_report(module_dir, output.code, &output.stdout, &output.stderr)?;
        debug!(issues = report.issues.len(), "Linter report parsed");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"{
        "Issues": [
            {"FromLinter": "errcheck", "Text": "Error return value is not checked", "Severity": "",
             "SourceLines": ["f()"], "Pos": {"Filename": "main.go", "Offset": 40, "Line": 5, "Column": 2}}
        ],
        "Report": {"Linters": []}
    }"#;

    #[test]
    fn test_issues_exit_code_is_a_successful_invocation() {
        let report = parse_report(Path::new("/m"), Some(ISSUES_EXIT_CODE), REPORT, "").unwrap();
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].pos.filename, "main.go");
    }

    #[test]
    fn test_other_exit_codes_are_errors() {
        let err = parse_report(Path::new("/m"), Some(1), "", "level=error msg=\"no go files\"").unwrap_err();
        assert!(matches!(err, LintError::Exit { code: Some(1), .. }));
        assert!(err.to_string().contains("no go files"));
    }

    #[test]
    fn test_invocation_arguments() {
        let invocation = GolangciLinter::new("golangci-lint").invocation(Path::new("/repo/svc"));
        assert_eq!(
            invocation.display(),
            "golangci-lint run --out-format json --issues-exit-code 42"
        );
        assert_eq!(invocation.workdir.as_deref(), Some(Path::new("/repo/svc")));
    }
}
