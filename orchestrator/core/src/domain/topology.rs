// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Repository Topology
//!
//! The build units (modules) and build targets (applications) of one
//! checked-out repository, plus the ownership relation between them.
//!
//! A [`RepositoryIndex`] is only ever constructed through
//! [`RepositoryIndex::new`], which enforces the topology rules:
//!
//! - module directories are unique (directory identity is the key)
//! - modules never nest; a nested pair is a [`TopologyError::NestedModules`]
//! - every path is absolute, normalized and inside the repository root
//! - an application is owned by the module whose directory is its nearest
//!   ancestor-or-self, compared by whole path segments
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Validated module/application index consumed by the impact resolver

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::repo_path::{self, RepoPathError};

/// A directory subtree with its own dependency manifest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Module {
    dir: PathBuf,
}

impl Module {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True when `path` lies under this module's directory.
    pub fn contains(&self, path: &Path) -> bool {
        repo_path::is_within(path, &self.dir)
    }
}

/// A directory holding a runnable entry point.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Application {
    dir: PathBuf,
}

impl Application {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Last path segment with underscores normalized to hyphens.
    pub fn display_name(&self) -> String {
        self.dir
            .file_name()
            .map(|name| name.to_string_lossy().replace('_', "-"))
            .unwrap_or_default()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    /// Both directories are relative to the repository root.
    #[error(
        "Nested modules are not supported: {} is inside {}",
        repo_path::display_dir(.inner),
        repo_path::display_dir(.outer)
    )]
    NestedModules { outer: PathBuf, inner: PathBuf },

    #[error("{0} lies outside the repository root")]
    OutsideRoot(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(#[from] RepoPathError),
}

/// Validated set of modules and applications found in one repository tree.
#[derive(Debug, Clone)]
pub struct RepositoryIndex {
    root: PathBuf,
    modules: BTreeMap<PathBuf, Module>,
    applications: BTreeMap<PathBuf, Application>,
    owners: BTreeMap<PathBuf, PathBuf>,
}

impl RepositoryIndex {
    pub fn new(
        root: &Path,
        module_dirs: impl IntoIterator<Item = PathBuf>,
        application_dirs: impl IntoIterator<Item = PathBuf>,
    ) -> Result<Self, TopologyError> {
        let root = repo_path::normalize(root)?;

        let mut modules = BTreeMap::new();
        for dir in module_dirs {
            let dir = Self::checked(&root, &dir)?;
            modules.insert(dir.clone(), Module { dir });
        }

        for dir in modules.keys() {
            if let Some(outer) = dir.ancestors().skip(1).find(|a| modules.contains_key(*a)) {
                return Err(TopologyError::NestedModules {
                    outer: repo_path::relative_to(outer, &root).unwrap_or_default(),
                    inner: repo_path::relative_to(dir, &root).unwrap_or_default(),
                });
            }
        }

        let mut applications = BTreeMap::new();
        let mut owners = BTreeMap::new();
        for dir in application_dirs {
            let dir = Self::checked(&root, &dir)?;
            match dir.ancestors().find(|a| modules.contains_key(*a)) {
                Some(owner) => {
                    owners.insert(dir.clone(), owner.to_path_buf());
                }
                None => {
                    tracing::warn!(application = %dir.display(), "Application has no owning module");
                }
            }
            applications.insert(dir.clone(), Application { dir });
        }

        Ok(Self {
            root,
            modules,
            applications,
            owners,
        })
    }

    fn checked(root: &Path, dir: &Path) -> Result<PathBuf, TopologyError> {
        let dir = repo_path::normalize(dir)?;
        if !repo_path::is_within(&dir, root) {
            return Err(TopologyError::OutsideRoot(dir));
        }
        Ok(dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn applications(&self) -> impl Iterator<Item = &Application> {
        self.applications.values()
    }

    pub fn owner_of(&self, application: &Application) -> Option<&Module> {
        self.owners
            .get(application.dir())
            .and_then(|dir| self.modules.get(dir))
    }

    /// The module whose subtree holds `path`, found by walking up its ancestors.
    ///
    /// Modules do not nest, so the first hit is the only one.
    pub fn module_containing(&self, path: &Path) -> Option<&Module> {
        path.ancestors()
            .take_while(|a| repo_path::is_within(a, &self.root))
            .find_map(|a| self.modules.get(a))
    }

    pub fn applications_owned_by<'a>(
        &'a self,
        module: &'a Module,
    ) -> impl Iterator<Item = &'a Application> + 'a {
        self.owners
            .iter()
            .filter(move |(_, owner)| owner.as_path() == module.dir())
            .filter_map(move |(app, _)| self.applications.get(app))
    }

    /// Application directory relative to the repository root.
    pub fn relative_dir(&self, path: &Path) -> PathBuf {
        repo_path::relative_to(path, &self.root).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn test_application_owned_by_nearest_ancestor_module() {
        let index = RepositoryIndex::new(
            Path::new("/repo"),
            vec![p("/repo/foo"), p("/repo/bar")],
            vec![p("/repo/foo/cmd/api")],
        )
        .unwrap();

        let app = index.applications().next().unwrap();
        assert_eq!(index.owner_of(app).unwrap().dir(), Path::new("/repo/foo"));
    }

    #[test]
    fn test_sibling_prefix_does_not_claim_application() {
        let index = RepositoryIndex::new(
            Path::new("/repo"),
            vec![p("/repo/foo")],
            vec![p("/repo/foo2/app")],
        )
        .unwrap();

        let app = index.applications().next().unwrap();
        assert!(index.owner_of(app).is_none());
    }

    #[test]
    fn test_application_in_module_root_is_owned() {
        let index =
            RepositoryIndex::new(Path::new("/repo"), vec![p("/repo")], vec![p("/repo")]).unwrap();
        let app = index.applications().next().unwrap();
        assert_eq!(index.owner_of(app).unwrap().dir(), Path::new("/repo"));
    }

    #[test]
    fn test_nested_modules_are_rejected() {
        let err = RepositoryIndex::new(
            Path::new("/repo"),
            vec![p("/repo"), p("/repo/tools")],
            Vec::new(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            TopologyError::NestedModules {
                outer: p(""),
                inner: p("tools"),
            }
        );
        assert_eq!(
            err.to_string(),
            "Nested modules are not supported: tools is inside ."
        );
    }

    #[test]
    fn test_duplicate_module_directories_collapse() {
        let index = RepositoryIndex::new(
            Path::new("/repo"),
            vec![p("/repo/a"), p("/repo/./a")],
            Vec::new(),
        )
        .unwrap();
        assert_eq!(index.modules().count(), 1);
    }

    #[test]
    fn test_paths_outside_root_are_rejected() {
        let err = RepositoryIndex::new(Path::new("/repo"), vec![p("/other/a")], Vec::new())
            .unwrap_err();
        assert_eq!(err, TopologyError::OutsideRoot(p("/other/a")));
    }

    #[test]
    fn test_module_containing_uses_segment_boundaries() {
        let index = RepositoryIndex::new(
            Path::new("/repo"),
            vec![p("/repo/foo"), p("/repo/foo2")],
            Vec::new(),
        )
        .unwrap();

        assert_eq!(
            index.module_containing(Path::new("/repo/foo2/x.go")).unwrap().dir(),
            Path::new("/repo/foo2")
        );
        assert!(index.module_containing(Path::new("/repo/README.md")).is_none());
    }

    #[test]
    fn test_display_name_normalizes_underscores() {
        let index = RepositoryIndex::new(
            Path::new("/repo"),
            vec![p("/repo")],
            vec![p("/repo/cmd/billing_worker")],
        )
        .unwrap();
        let app = index.applications().next().unwrap();
        assert_eq!(app.display_name(), "billing-worker");
        assert_eq!(index.relative_dir(app.dir()), p("cmd/billing_worker"));
    }
}
