//! Git operations abstraction layer
//!
//! Provides a trait-based abstraction over the repository operations the
//! release pipeline needs, with a real implementation backed by the `git2`
//! crate and a mock implementation for testing. Most code should depend on
//! the [GitRepository] trait rather than a concrete implementation.

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::{RawCommit, RepoMeta};
use crate::error::Result;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Sync status of the current branch against its upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStatus {
    Exact,
    Ahead,
    Behind,
    Diverged,
}

/// Common git operation trait for abstraction.
///
/// Implementors must be `Send + Sync`: package pipelines run concurrently
/// and share one repository handle.
pub trait GitRepository: Send + Sync {
    /// Sync status of the current branch against its upstream counterpart.
    fn branch_status(&self) -> Result<BranchStatus>;

    /// Paths of all files tracked at HEAD, relative to the repository root,
    /// optionally restricted to a subpath.
    fn tracked_files(&self, subpath: Option<&Path>) -> Result<Vec<PathBuf>>;

    /// Commits strictly after the given tag up to HEAD, following first
    /// parents, in reverse-chronological order (newest first).
    ///
    /// `None` - or a tag that does not exist as a ref, which happens for the
    /// assumed initial tag of a never-released package - yields the full
    /// history.
    fn commits_after(&self, tag: Option<&str>) -> Result<Vec<RawCommit>>;

    /// All tag names, version-sorted descending.
    fn tag_names(&self) -> Result<Vec<String>>;

    /// The configured URL of the given remote.
    fn remote_url(&self, remote: &str) -> Result<String>;

    /// Create a commit of the current working tree changes on HEAD.
    fn create_commit(&self, message: &str) -> Result<()>;

    /// Create an annotated tag on HEAD.
    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()>;

    /// Push the current branch and all tags to the given remote.
    fn push(&self, remote: &str) -> Result<()>;

    /// The repository working directory.
    fn workdir(&self) -> &Path;
}

/// Extract {host, owner, repository} from a GitHub remote URL.
///
/// Accepts the SSH, HTTPS and git-protocol shapes
/// (`git@github.com:owner/repo.git`, `https://github.com/owner/repo`,
/// `git://github.com/owner/repo.git#branch`). Returns `None` for anything
/// else.
pub fn github_repo_from_url(url: &str) -> Option<RepoMeta> {
    let re = Regex::new(
        r"github\.com[:/](?P<owner>[\w-]+)/(?P<repository>[\w-]+)(?:\.git)?(?:#[\w.-]+)?$",
    )
    .ok()?;
    let captures = re.captures(url)?;
    Some(RepoMeta {
        host: "https://github.com".to_string(),
        owner: captures["owner"].to_string(),
        repository: captures["repository"].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_url_ssh() {
        let meta = github_repo_from_url("git@github.com:ones-io/committed.git").unwrap();
        assert_eq!(meta.host, "https://github.com");
        assert_eq!(meta.owner, "ones-io");
        assert_eq!(meta.repository, "committed");
    }

    #[test]
    fn test_github_url_https() {
        let meta = github_repo_from_url("https://github.com/ones-io/committed").unwrap();
        assert_eq!(meta.owner, "ones-io");
        assert_eq!(meta.repository, "committed");
    }

    #[test]
    fn test_github_url_https_with_git_suffix() {
        let meta = github_repo_from_url("https://github.com/ones-io/committed.git").unwrap();
        assert_eq!(meta.repository, "committed");
    }

    #[test]
    fn test_github_url_git_protocol_with_branch() {
        let meta = github_repo_from_url("git://github.com/ones-io/committed.git#v1.2").unwrap();
        assert_eq!(meta.owner, "ones-io");
        assert_eq!(meta.repository, "committed");
    }

    #[test]
    fn test_non_github_url() {
        assert!(github_repo_from_url("https://gitlab.com/owner/repo").is_none());
        assert!(github_repo_from_url("not a url").is_none());
    }
}
