// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Lint issue model and the `Linter` collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::check_run::{Annotation, AnnotationLevel};
use crate::domain::repo_path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IssuePosition {
    /// Relative to the directory the linter ran in.
    pub filename: String,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LintIssue {
    pub from_linter: String,
    pub text: String,
    #[serde(default)]
    pub severity: String,
    pub pos: IssuePosition,
}

impl LintIssue {
    /// Annotation for this issue, or `None` when its text is empty.
    ///
    /// `module_dir` is the module's directory relative to the repository root.
    pub fn to_annotation(&self, module_dir: &Path) -> Option<Annotation> {
        if self.text.is_empty() {
            return None;
        }

        let level = match self.severity.as_str() {
            "warning" => AnnotationLevel::Warning,
            "info" => AnnotationLevel::Notice,
            _ => AnnotationLevel::Failure,
        };
        let line = self.pos.line.max(1);
        let column = (self.pos.column > 0).then_some(self.pos.column);

        Some(Annotation {
            path: module_dir
                .join(&self.pos.filename)
                .to_string_lossy()
                .into_owned(),
            start_line: line,
            end_line: line,
            start_column: column,
            end_column: column,
            annotation_level: level,
            title: Some(self.text.clone()),
            message: format!("{} ({})", self.text, self.from_linter),
        })
    }
}

/// Linter output for one module. `Issues` is `null` when the run is clean.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LintReport {
    #[serde(default, deserialize_with = "nullable_issues")]
    pub issues: Vec<LintIssue>,
}

fn nullable_issues<'de, D>(deserializer: D) -> Result<Vec<LintIssue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<LintIssue>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Error)]
pub enum LintError {
    #[error("Linter could not be started in {}: {reason}", repo_path::display_dir(.module_dir))]
    Spawn { module_dir: PathBuf, reason: String },

    #[error("Linter exited with status {code:?} in {}: {output}", repo_path::display_dir(.module_dir))]
    Exit {
        module_dir: PathBuf,
        code: Option<i32>,
        output: String,
    },

    #[error("Unreadable linter report for {}: {reason}", repo_path::display_dir(.module_dir))]
    Report { module_dir: PathBuf, reason: String },
}

impl LintError {
    /// The same failure, attributed to `dir` instead of the directory the
    /// linter ran in.
    pub fn in_module(mut self, dir: PathBuf) -> Self {
        match &mut self {
            Self::Spawn { module_dir, .. }
            | Self::Exit { module_dir, .. }
            | Self::Report { module_dir, .. } => *module_dir = dir,
        }
        self
    }
}

#[async_trait]
pub trait Linter: Send + Sync {
    /// Lint one module directory.
    async fn run(&self, module_dir: &Path) -> Result<LintReport, LintError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(text: &str, severity: &str, column: u32) -> LintIssue {
        LintIssue {
            from_linter: "errcheck".to_string(),
            text: text.to_string(),
            severity: severity.to_string(),
            pos: IssuePosition {
                filename: "cmd/api/main.go".to_string(),
                offset: 120,
                line: 14,
                column,
            },
        }
    }

    #[test]
    fn test_annotation_is_anchored_at_repository_root() {
        let annotation = issue("Error return value is not checked", "", 3)
            .to_annotation(Path::new("services/billing"))
            .unwrap();

        assert_eq!(annotation.path, "services/billing/cmd/api/main.go");
        assert_eq!(annotation.start_line, 14);
        assert_eq!(annotation.end_line, 14);
        assert_eq!(annotation.start_column, Some(3));
        assert_eq!(annotation.annotation_level, AnnotationLevel::Failure);
        assert_eq!(
            annotation.message,
            "Error return value is not checked (errcheck)"
        );
    }

    #[test]
    fn test_empty_text_produces_no_annotation() {
        assert!(issue("", "warning", 0).to_annotation(Path::new("")).is_none());
    }

    #[test]
    fn test_whitespace_text_still_produces_annotation() {
        let annotation = issue("  ", "warning", 0).to_annotation(Path::new("")).unwrap();
        assert_eq!(annotation.title.as_deref(), Some("  "));
    }

    #[test]
    fn test_severity_mapping_and_zero_column() {
        let warning = issue("x", "warning", 0).to_annotation(Path::new("")).unwrap();
        assert_eq!(warning.annotation_level, AnnotationLevel::Warning);
        assert_eq!(warning.start_column, None);
        assert_eq!(warning.path, "cmd/api/main.go");

        let info = issue("x", "info", 0).to_annotation(Path::new("")).unwrap();
        assert_eq!(info.annotation_level, AnnotationLevel::Notice);
    }

    #[test]
    fn test_error_reattributed_to_relative_module() {
        let err = LintError::Exit {
            module_dir: PathBuf::from("/tmp/monocrat-abc/services/billing"),
            code: Some(3),
            output: "typecheck failed".to_string(),
        };
        assert_eq!(
            err.in_module(PathBuf::from("services/billing")).to_string(),
            "Linter exited with status Some(3) in services/billing: typecheck failed"
        );

        let root = LintError::Spawn {
            module_dir: PathBuf::from("/tmp/monocrat-abc"),
            reason: "not found".to_string(),
        };
        assert_eq!(
            root.in_module(PathBuf::new()).to_string(),
            "Linter could not be started in .: not found"
        );
    }

    #[test]
    fn test_report_decodes_null_issues() {
        let report: LintReport = serde_json::from_str(r#"{"Issues":null,"Report":{}}"#).unwrap();
        assert!(report.issues.is_empty());

        let report: LintReport = serde_json::from_str(
            r#"{"Issues":[{"FromLinter":"govet","Text":"shadow","Severity":"","Pos":{"Filename":"a.go","Offset":1,"Line":2,"Column":3}}]}"#,
        )
        .unwrap();
        assert_eq!(report.issues[0].from_linter, "govet");
        assert_eq!(report.issues[0].pos.line, 2);
    }
}
