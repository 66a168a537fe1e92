// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Build Plan & Impact Resolution
//!
//! Maps a [`ChangeSet`] onto a [`RepositoryIndex`] and yields the minimal set
//! of applications to rebuild plus the modules that need their dependencies
//! vendored first.
//!
//! Each changed path is bucketed into the module that contains it by walking
//! the path's ancestors against the ordered module map (`O(depth · log m)`
//! per change). Every application owned by a touched module is then
//! rebuilt, and only those modules are vendored, so `vendor_modules` is
//! always exactly the owner set of `rebuild_apps`.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure change-impact resolution

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::domain::change_set::ChangeSet;
use crate::domain::topology::{Application, Module, RepositoryIndex};

/// Applications to rebuild and the modules to vendor for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    rebuild_apps: BTreeSet<Application>,
    vendor_modules: BTreeSet<Module>,
}

impl BuildPlan {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rebuild_apps.is_empty()
    }

    pub fn rebuild_apps(&self) -> &BTreeSet<Application> {
        &self.rebuild_apps
    }

    pub fn vendor_modules(&self) -> &BTreeSet<Module> {
        &self.vendor_modules
    }
}

pub struct ImpactResolver;

impl ImpactResolver {
    pub fn resolve(index: &RepositoryIndex, changes: &ChangeSet) -> BuildPlan {
        let touched: BTreeSet<&Module> = changes
            .iter()
            .filter_map(|change| index.module_containing(&change.path))
            .collect();

        let mut plan = BuildPlan::empty();
        for module in touched {
            let mut owns_any = false;
            for app in index.applications_owned_by(module) {
                plan.rebuild_apps.insert(app.clone());
                owns_any = true;
            }

            if owns_any {
                plan.vendor_modules.insert(module.clone());
            } else {
                debug!(module = %module.dir().display(), "Changed module has no applications");
            }
        }

        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::change_set::{ChangeEntry, ChangeKind};
    use std::path::{Path, PathBuf};

    fn index(modules: &[&str], apps: &[&str]) -> RepositoryIndex {
        RepositoryIndex::new(
            Path::new("/repo"),
            modules.iter().map(PathBuf::from),
            apps.iter().map(PathBuf::from),
        )
        .unwrap()
    }

    fn changes(paths: &[&str]) -> ChangeSet {
        ChangeSet::anchored(
            Path::new("/"),
            paths
                .iter()
                .map(|p| ChangeEntry::new(p.trim_start_matches('/'), ChangeKind::Updated))
                .collect(),
        )
    }

    fn dirs<'a, T: 'a>(items: impl IntoIterator<Item = &'a T>, dir: fn(&T) -> &Path) -> Vec<PathBuf> {
        items.into_iter().map(|i| dir(i).to_path_buf()).collect()
    }

    #[test]
    fn test_single_module_single_application() {
        let plan = ImpactResolver::resolve(
            &index(&["/repo"], &["/repo/svc"]),
            &changes(&["/repo/svc/x.go"]),
        );

        assert_eq!(dirs(plan.rebuild_apps(), Application::dir), vec![PathBuf::from("/repo/svc")]);
        assert_eq!(dirs(plan.vendor_modules(), Module::dir), vec![PathBuf::from("/repo")]);
    }

    #[test]
    fn test_untouched_module_is_left_alone() {
        let plan = ImpactResolver::resolve(
            &index(&["/repo/a", "/repo/b"], &["/repo/a/cmd", "/repo/b/cmd"]),
            &changes(&["/repo/a/lib.go"]),
        );

        assert_eq!(dirs(plan.rebuild_apps(), Application::dir), vec![PathBuf::from("/repo/a/cmd")]);
        assert_eq!(dirs(plan.vendor_modules(), Module::dir), vec![PathBuf::from("/repo/a")]);
    }

    #[test]
    fn test_prefix_sibling_module_is_not_touched() {
        let plan = ImpactResolver::resolve(
            &index(&["/repo/foo", "/repo/foo2"], &["/repo/foo/app", "/repo/foo2/app"]),
            &changes(&["/repo/foo2/main.go"]),
        );

        assert_eq!(dirs(plan.rebuild_apps(), Application::dir), vec![PathBuf::from("/repo/foo2/app")]);
    }

    #[test]
    fn test_changes_outside_modules_produce_empty_plan() {
        let plan = ImpactResolver::resolve(
            &index(&["/repo/a"], &["/repo/a/cmd"]),
            &changes(&["/repo/docs/README.md"]),
        );
        assert!(plan.is_empty());
        assert!(plan.vendor_modules().is_empty());
    }

    #[test]
    fn test_module_without_applications_is_not_vendored() {
        let plan = ImpactResolver::resolve(
            &index(&["/repo/lib", "/repo/svc"], &["/repo/svc/cmd"]),
            &changes(&["/repo/lib/util.go"]),
        );
        assert_eq!(plan, BuildPlan::empty());
    }

    #[test]
    fn test_orphan_application_is_never_rebuilt() {
        let plan = ImpactResolver::resolve(
            &index(&["/repo/a"], &["/repo/a/cmd", "/repo/tools/gen"]),
            &changes(&["/repo/a/x.go", "/repo/tools/gen/main.go"]),
        );
        assert_eq!(dirs(plan.rebuild_apps(), Application::dir), vec![PathBuf::from("/repo/a/cmd")]);
    }

    #[test]
    fn test_resolution_is_order_independent() {
        let idx = index(&["/repo/a", "/repo/b"], &["/repo/a/x", "/repo/b/y"]);
        let forward = ImpactResolver::resolve(&idx, &changes(&["/repo/a/1.go", "/repo/b/2.go"]));
        let backward = ImpactResolver::resolve(&idx, &changes(&["/repo/b/2.go", "/repo/a/1.go"]));
        assert_eq!(forward, backward);
        assert_eq!(forward, ImpactResolver::resolve(&idx, &changes(&["/repo/a/1.go", "/repo/b/2.go"])));
    }

    #[test]
    fn test_vendor_modules_match_owners_of_rebuilt_apps() {
        let idx = index(
            &["/repo/a", "/repo/b", "/repo/c"],
            &["/repo/a/x", "/repo/a/y", "/repo/b/z"],
        );
        let plan = ImpactResolver::resolve(&idx, &changes(&["/repo/a/1.go", "/repo/c/2.go"]));

        let owners: BTreeSet<Module> = plan
            .rebuild_apps()
            .iter()
            .filter_map(|app| idx.owner_of(app).cloned())
            .collect();
        assert_eq!(&owners, plan.vendor_modules());
        assert_eq!(plan.rebuild_apps().len(), 2);
    }
}
