//! Domain logic - pure business rules independent of git operations

pub mod commit;
pub mod package;
pub mod tag;

pub use commit::{
    group_by_type, CommitGroup, CommitMeta, CommitType, ConventionalCommit, RawCommit,
};
pub use package::{PackageMeta, Release, RepoMeta};
pub use tag::{get_version_bump, SemanticVersionTag, VersionBump};
