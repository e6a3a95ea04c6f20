//! Release data builder
//!
//! Pure transformation from a package's previous tag and commit range to its
//! release record: parsed commits, aggregate bump, new tag. All I/O has
//! already happened behind the [GitRepository] trait by the time data lands
//! here.

use crate::domain::{get_version_bump, ConventionalCommit, PackageMeta, Release, RepoMeta};
use crate::error::{ReleaseError, Result};
use crate::git::{github_repo_from_url, GitRepository};

/// Resolve the hosting repository from the remote URL, once per run.
///
/// Changelog rendering needs the host/owner/repository triple, so an
/// unresolvable remote is fatal.
pub fn resolve_repo_meta(repo: &dyn GitRepository, remote: &str) -> Result<RepoMeta> {
    let url = repo.remote_url(remote)?;
    github_repo_from_url(&url).ok_or_else(|| {
        ReleaseError::metadata(format!(
            "cannot determine repository host from remote URL '{}'",
            url
        ))
    })
}

/// Build the release record for one package.
///
/// Fetches commits strictly after the previous tag (newest first), parses
/// each one, reduces their bumps, and computes the new tag. A grammar error
/// in any commit aborts this package's release: a release description cannot
/// be partial.
pub fn build_release(
    repo: &dyn GitRepository,
    repo_meta: &RepoMeta,
    package: &PackageMeta,
) -> Result<Release> {
    let previous = package.previous_tag.to_string();
    let raw_commits = repo.commits_after(Some(&previous))?;

    let commits = raw_commits
        .iter()
        .map(ConventionalCommit::parse)
        .collect::<Result<Vec<_>>>()?;

    let aggregate = get_version_bump(commits.iter().map(|commit| commit.version_bump));
    let new_tag = package.previous_tag.bump(aggregate);

    Ok(Release {
        package: package.clone(),
        repo: repo_meta.clone(),
        new_tag,
        commits,
    })
}
