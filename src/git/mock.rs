use crate::domain::RawCommit;
use crate::error::Result;
use crate::git::{BranchStatus, GitRepository};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Mock repository for testing without actual git operations.
///
/// Read operations serve whatever the test seeded; mutations are recorded
/// and can be inspected afterwards.
pub struct MockRepository {
    workdir: PathBuf,
    branch_status: BranchStatus,
    files: Vec<PathBuf>,
    default_commits: Vec<RawCommit>,
    commits_by_tag: HashMap<String, Vec<RawCommit>>,
    tags: Vec<String>,
    remote_url: String,
    created_commits: Mutex<Vec<String>>,
    created_tags: Mutex<Vec<(String, String)>>,
    pushes: Mutex<Vec<String>>,
}

impl MockRepository {
    /// Create a mock rooted at the given working directory
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        MockRepository {
            workdir: workdir.into(),
            branch_status: BranchStatus::Exact,
            files: Vec::new(),
            default_commits: Vec::new(),
            commits_by_tag: HashMap::new(),
            tags: Vec::new(),
            remote_url: "git@github.com:ones-io/committed.git".to_string(),
            created_commits: Mutex::new(Vec::new()),
            created_tags: Mutex::new(Vec::new()),
            pushes: Mutex::new(Vec::new()),
        }
    }

    pub fn set_branch_status(&mut self, status: BranchStatus) {
        self.branch_status = status;
    }

    /// Add a tracked file path (relative to the repository root)
    pub fn add_file(&mut self, path: impl Into<PathBuf>) {
        self.files.push(path.into());
    }

    /// Commits served when no per-tag range was registered
    pub fn set_commits(&mut self, commits: Vec<RawCommit>) {
        self.default_commits = commits;
    }

    /// Commits served for the range strictly after the given tag
    pub fn set_commits_for_tag(&mut self, tag: impl Into<String>, commits: Vec<RawCommit>) {
        self.commits_by_tag.insert(tag.into(), commits);
    }

    /// Add a tag name; tests seed the list already version-sorted descending
    pub fn add_tag_name(&mut self, name: impl Into<String>) {
        self.tags.push(name.into());
    }

    pub fn set_remote_url(&mut self, url: impl Into<String>) {
        self.remote_url = url.into();
    }

    /// Messages of commits created through the trait
    pub fn created_commits(&self) -> Vec<String> {
        self.created_commits.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// (name, message) pairs of annotated tags created through the trait
    pub fn created_tags(&self) -> Vec<(String, String)> {
        self.created_tags.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Remotes pushed to through the trait
    pub fn pushes(&self) -> Vec<String> {
        self.pushes.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl GitRepository for MockRepository {
    fn branch_status(&self) -> Result<BranchStatus> {
        Ok(self.branch_status)
    }

    fn tracked_files(&self, subpath: Option<&Path>) -> Result<Vec<PathBuf>> {
        let mut files = self.files.clone();
        if let Some(subpath) = subpath {
            files.retain(|file| file.starts_with(subpath));
        }
        Ok(files)
    }

    fn commits_after(&self, tag: Option<&str>) -> Result<Vec<RawCommit>> {
        let commits = tag
            .and_then(|tag| self.commits_by_tag.get(tag))
            .unwrap_or(&self.default_commits);
        Ok(commits.clone())
    }

    fn tag_names(&self) -> Result<Vec<String>> {
        Ok(self.tags.clone())
    }

    fn remote_url(&self, _remote: &str) -> Result<String> {
        Ok(self.remote_url.clone())
    }

    fn create_commit(&self, message: &str) -> Result<()> {
        self.created_commits.lock().unwrap_or_else(|p| p.into_inner()).push(message.to_string());
        Ok(())
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()> {
        self.created_tags
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((name.to_string(), message.to_string()));
        Ok(())
    }

    fn push(&self, remote: &str) -> Result<()> {
        self.pushes.lock().unwrap_or_else(|p| p.into_inner()).push(remote.to_string());
        Ok(())
    }

    fn workdir(&self) -> &Path {
        &self.workdir
    }
}
