use crate::domain::commit::ConventionalCommit;
use crate::domain::tag::SemanticVersionTag;
use std::path::PathBuf;

/// One discovered package manifest, paired with its previous release tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMeta {
    /// Directory of the manifest, relative to the repository root.
    pub directory: PathBuf,
    pub name: String,
    pub manifest_version: Option<String>,
    pub is_private: bool,
    pub previous_tag: SemanticVersionTag,
}

/// The hosting repository, resolved once per run from the remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoMeta {
    pub host: String,
    pub owner: String,
    pub repository: String,
}

/// The computed release for one package in one run.
///
/// Built fresh per invocation and never persisted; only its side effects
/// (tag, CHANGELOG.md, manifest, registry state) outlive the run.
#[derive(Debug, Clone)]
pub struct Release {
    pub package: PackageMeta,
    pub repo: RepoMeta,
    pub new_tag: SemanticVersionTag,
    pub commits: Vec<ConventionalCommit>,
}
