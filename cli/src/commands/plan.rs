// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

// `monocrat plan`: resolve what a release between two commits would vendor
// and rebuild, against a local checkout. Nothing is cloned, built or pushed.

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;

use monocrat_core::domain::build_plan::ImpactResolver;
use monocrat_core::domain::change_set::ChangeSet;
use monocrat_core::domain::vcs::{CommitRange, CommitSha};
use monocrat_core::infrastructure::{GitVersionControl, RepositoryScanner};

#[derive(Args)]
pub struct PlanCommand {
    /// Local repository checkout
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Base commit of the range
    #[arg(long)]
    before: String,

    /// Target commit of the range
    #[arg(long)]
    after: String,
}

pub async fn execute(cmd: PlanCommand) -> Result<()> {
    let Some(range) = CommitRange::from_parts(
        Some(CommitSha::new(cmd.before)),
        Some(CommitSha::new(cmd.after)),
    ) else {
        bail!("Both --before and --after must name a commit");
    };

    let index = RepositoryScanner::default()
        .scan(&cmd.repo)
        .await
        .with_context(|| format!("Failed to index {}", cmd.repo.display()))?;

    let changes = ChangeSet::between(&GitVersionControl::new(), index.root(), &range)
        .await
        .context("Failed to compute changes")?;
    debug!(changed_files = changes.len(), "Computed change set");

    let plan = ImpactResolver::resolve(&index, &changes);

    let output = json!({
        "before": range.before.to_string(),
        "after": range.after.to_string(),
        "changed_files": changes.len(),
        "rebuild_apps": plan
            .rebuild_apps()
            .iter()
            .map(|app| json!({
                "name": app.display_name(),
                "dir": index.relative_dir(app.dir()),
            }))
            .collect::<Vec<_>>(),
        "vendor_modules": plan
            .vendor_modules()
            .iter()
            .map(|module| index.relative_dir(module.dir()))
            .collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
