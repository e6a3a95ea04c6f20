//! Release orchestration
//!
//! Runs the per-package release pipeline. Within one package the steps are
//! strictly sequential; across packages the pipelines run concurrently and
//! are joined as a set, so one package's failure never short-circuits its
//! siblings. A failed pre-flight check is the only abort point before any
//! mutation happens.

use crate::builder::build_release;
use crate::changelog::ChangelogStrategy;
use crate::domain::{PackageMeta, Release, RepoMeta};
use crate::error::{ReleaseError, Result};
use crate::git::{BranchStatus, GitRepository};
use crate::registry::RegistryClient;
use rayon::prelude::*;
use std::fmt;
use std::fs;

const CHANGELOG_FILE_NAME: &str = "CHANGELOG.md";

/// Where a package's pipeline stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PackageState {
    Idle,
    ChangelogWritten,
    Committed,
    Tagged,
    Published,
    Done,
}

impl fmt::Display for PackageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PackageState::Idle => "idle",
            PackageState::ChangelogWritten => "changelog written",
            PackageState::Committed => "committed",
            PackageState::Tagged => "tagged",
            PackageState::Published => "published",
            PackageState::Done => "done",
        };
        f.write_str(s)
    }
}

/// Result of one package's pipeline.
#[derive(Debug)]
pub struct PackageOutcome {
    pub package: String,
    pub new_tag: Option<String>,
    pub state: PackageState,
    pub error: Option<String>,
}

impl PackageOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-package outcomes of a whole run, available even when some packages
/// failed (partial success).
#[derive(Debug)]
pub struct RunSummary {
    pub outcomes: Vec<PackageOutcome>,
    pub push_error: Option<String>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.push_error.is_none() && self.outcomes.iter().all(PackageOutcome::succeeded)
    }
}

pub struct Orchestrator<'a> {
    repo: &'a dyn GitRepository,
    registry: &'a dyn RegistryClient,
    strategy: Box<dyn ChangelogStrategy>,
    remote: String,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        repo: &'a dyn GitRepository,
        registry: &'a dyn RegistryClient,
        strategy: Box<dyn ChangelogStrategy>,
        remote: impl Into<String>,
    ) -> Self {
        Orchestrator {
            repo,
            registry,
            strategy,
            remote: remote.into(),
        }
    }

    /// Checks that must pass before any package starts; a failure here is
    /// fatal for the whole run.
    pub fn preflight(&self) -> Result<()> {
        match self.repo.branch_status()? {
            BranchStatus::Behind => {
                return Err(ReleaseError::remote("your branch is behind its upstream"))
            }
            BranchStatus::Diverged => {
                return Err(ReleaseError::remote(
                    "your branch has diverged from its upstream",
                ))
            }
            BranchStatus::Exact | BranchStatus::Ahead => {}
        }

        if !self.registry.ensure_auth(self.repo.workdir())? {
            return Err(ReleaseError::RegistryAuth(
                "npm authentication not set up".to_string(),
            ));
        }
        Ok(())
    }

    /// Run the full release pipeline for every package, then push once.
    pub fn run_release(&self, packages: &[PackageMeta], repo_meta: &RepoMeta) -> RunSummary {
        let outcomes: Vec<PackageOutcome> = packages
            .par_iter()
            .map(|package| self.release_package(package, repo_meta))
            .collect();

        // Push only after every package has resolved or rejected; nothing
        // to push when none of them got anywhere.
        let push_error = if outcomes.iter().any(PackageOutcome::succeeded) {
            self.repo.push(&self.remote).err().map(|e| e.to_string())
        } else {
            None
        };

        RunSummary {
            outcomes,
            push_error,
        }
    }

    /// Write changelogs only; no commit, tag, publish or push.
    pub fn run_changelog(&self, packages: &[PackageMeta], repo_meta: &RepoMeta) -> RunSummary {
        let outcomes: Vec<PackageOutcome> = packages
            .par_iter()
            .map(|package| {
                let mut state = PackageState::Idle;
                let mut new_tag = None;
                let error = self
                    .changelog_step(package, repo_meta, &mut state, &mut new_tag)
                    .err()
                    .map(|e| e.to_string());
                PackageOutcome {
                    package: package.name.clone(),
                    new_tag,
                    state,
                    error,
                }
            })
            .collect();

        RunSummary {
            outcomes,
            push_error: None,
        }
    }

    fn release_package(&self, package: &PackageMeta, repo_meta: &RepoMeta) -> PackageOutcome {
        let mut state = PackageState::Idle;
        let mut new_tag = None;
        let error = self
            .release_steps(package, repo_meta, &mut state, &mut new_tag)
            .err()
            .map(|e| e.to_string());
        if error.is_none() {
            state = PackageState::Done;
        }
        PackageOutcome {
            package: package.name.clone(),
            new_tag,
            state,
            error,
        }
    }

    fn release_steps(
        &self,
        package: &PackageMeta,
        repo_meta: &RepoMeta,
        state: &mut PackageState,
        new_tag: &mut Option<String>,
    ) -> Result<()> {
        let release = build_release(self.repo, repo_meta, package)?;
        let tag_string = release.new_tag.to_string();
        *new_tag = Some(tag_string.clone());

        self.write_changelog(&release)?;
        *state = PackageState::ChangelogWritten;

        self.repo.create_commit(&format!(
            "chore(release): release {} [skip ci]",
            tag_string
        ))?;
        *state = PackageState::Committed;

        self.repo
            .create_annotated_tag(&tag_string, &self.strategy.release_notes(&release))?;
        *state = PackageState::Tagged;

        let package_dir = self.repo.workdir().join(&package.directory);
        self.registry
            .set_version(&package_dir, &release.new_tag.version_string())?;
        self.registry.publish(&package_dir)?;
        *state = PackageState::Published;

        Ok(())
    }

    fn changelog_step(
        &self,
        package: &PackageMeta,
        repo_meta: &RepoMeta,
        state: &mut PackageState,
        new_tag: &mut Option<String>,
    ) -> Result<()> {
        let release = build_release(self.repo, repo_meta, package)?;
        *new_tag = Some(release.new_tag.to_string());
        self.write_changelog(&release)?;
        *state = PackageState::ChangelogWritten;
        Ok(())
    }

    fn write_changelog(&self, release: &Release) -> Result<()> {
        let path = self
            .repo
            .workdir()
            .join(&release.package.directory)
            .join(CHANGELOG_FILE_NAME);
        // A missing changelog is the first release, not an error
        let existing = fs::read_to_string(&path).unwrap_or_default();
        let updated = self.strategy.generate(&existing, release);
        fs::write(&path, updated)?;
        Ok(())
    }
}
