use crate::domain::{CommitMeta, RawCommit, SemanticVersionTag};
use crate::error::{ReleaseError, Result};
use crate::git::{BranchStatus, GitRepository};
use git2::Repository as Git2Repo;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Wrapper around git2::Repository with our trait interface.
///
/// The inner handle sits behind a mutex so one repository instance can be
/// shared by the concurrently running package pipelines.
pub struct Git2Repository {
    repo: Mutex<Git2Repo>,
    workdir: PathBuf,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| ReleaseError::metadata("repository has no working directory"))?
            .to_path_buf();

        Ok(Git2Repository {
            repo: Mutex::new(repo),
            workdir,
        })
    }

    fn repo(&self) -> MutexGuard<'_, Git2Repo> {
        self.repo.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl GitRepository for Git2Repository {
    fn branch_status(&self) -> Result<BranchStatus> {
        let repo = self.repo();
        let head = repo.head()?;
        let local_oid = head
            .target()
            .ok_or_else(|| ReleaseError::remote("HEAD is not a direct reference"))?;
        let branch_name = head
            .shorthand()
            .ok_or_else(|| ReleaseError::remote("HEAD is not on a branch"))?
            .to_string();

        let branch = repo.find_branch(&branch_name, git2::BranchType::Local)?;
        let upstream = branch.upstream().map_err(|_| {
            ReleaseError::remote(format!("branch '{}' has no upstream", branch_name))
        })?;
        let upstream_oid = upstream.get().target().ok_or_else(|| {
            ReleaseError::remote(format!("upstream of '{}' has no target", branch_name))
        })?;

        if local_oid == upstream_oid {
            return Ok(BranchStatus::Exact);
        }
        let base = repo.merge_base(local_oid, upstream_oid)?;
        if base == local_oid {
            Ok(BranchStatus::Behind)
        } else if base == upstream_oid {
            Ok(BranchStatus::Ahead)
        } else {
            Ok(BranchStatus::Diverged)
        }
    }

    fn tracked_files(&self, subpath: Option<&Path>) -> Result<Vec<PathBuf>> {
        let repo = self.repo();
        let tree = repo.head()?.peel_to_tree()?;

        let mut files = Vec::new();
        tree.walk(git2::TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(git2::ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    files.push(PathBuf::from(format!("{}{}", root, name)));
                }
            }
            git2::TreeWalkResult::Ok
        })?;

        if let Some(subpath) = subpath {
            files.retain(|file| file.starts_with(subpath));
        }
        Ok(files)
    }

    fn commits_after(&self, tag: Option<&str>) -> Result<Vec<RawCommit>> {
        let repo = self.repo();
        let mut revwalk = repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(git2::Sort::TIME)?;
        revwalk.simplify_first_parent()?;

        // A missing ref means the tag was never actually created (the
        // assumed initial tag); the whole history is the release range.
        if let Some(tag) = tag {
            if let Ok(obj) = repo.revparse_single(&format!("refs/tags/{}", tag)) {
                if let Ok(commit) = obj.peel_to_commit() {
                    revwalk.hide(commit.id())?;
                }
            }
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = repo.find_commit(oid)?;
            commits.push(RawCommit {
                meta: CommitMeta {
                    hash: oid.to_string(),
                    author: commit.author().name().unwrap_or("unknown").to_string(),
                    timestamp_seconds: commit.time().seconds(),
                },
                message: commit.message().unwrap_or("").to_string(),
            });
        }
        Ok(commits)
    }

    fn tag_names(&self) -> Result<Vec<String>> {
        let repo = self.repo();
        let names = repo.tag_names(None)?;

        let mut keyed: Vec<(Option<SemanticVersionTag>, String)> = names
            .iter()
            .flatten()
            .map(|name| (SemanticVersionTag::parse(name).ok(), name.to_string()))
            .collect();

        // Version-sorted descending; unparseable names sink to the end
        // (the resolver rejects them with a fatal error anyway).
        keyed.sort_by(|(a, a_name), (b, b_name)| match (a, b) {
            (Some(a), Some(b)) => b.cmp_precedence(a).then_with(|| b_name.cmp(a_name)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b_name.cmp(a_name),
        });

        Ok(keyed.into_iter().map(|(_, name)| name).collect())
    }

    fn remote_url(&self, remote: &str) -> Result<String> {
        let repo = self.repo();
        let remote = repo
            .find_remote(remote)
            .map_err(|e| ReleaseError::remote(format!("cannot find remote: {}", e)))?;
        remote
            .url()
            .map(|url| url.to_string())
            .ok_or_else(|| ReleaseError::remote("remote URL is not valid UTF-8"))
    }

    fn create_commit(&self, message: &str) -> Result<()> {
        let repo = self.repo();
        let mut index = repo.index()?;
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
        index.write()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        let signature = repo.signature()?;
        let parent = repo.head()?.peel_to_commit()?;
        repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;
        Ok(())
    }

    fn create_annotated_tag(&self, name: &str, message: &str) -> Result<()> {
        let repo = self.repo();
        let signature = repo.signature()?;
        let target = repo.head()?.peel(git2::ObjectType::Commit)?;
        repo.tag(name, &target, &signature, message, false)?;
        Ok(())
    }

    fn push(&self, remote_name: &str) -> Result<()> {
        let repo = self.repo();
        let mut remote = repo
            .find_remote(remote_name)
            .map_err(|_| ReleaseError::remote(format!("no remote named '{}' found", remote_name)))?;

        let head = repo.head()?;
        let branch_name = head
            .shorthand()
            .ok_or_else(|| ReleaseError::remote("HEAD is not on a branch"))?;

        let mut push_options = git2::PushOptions::new();
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed_types| {
            // SSH key authentication, then agent, then defaults
            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                for key_name in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let key_path = PathBuf::from(&home).join(".ssh").join(key_name);
                    if key_path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(
                            username_from_url.unwrap_or("git"),
                            None,
                            &key_path,
                            None,
                        ) {
                            return Ok(cred);
                        }
                    }
                }
                if let Ok(cred) =
                    git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
                {
                    return Ok(cred);
                }
            }
            git2::Cred::default()
        });
        push_options.remote_callbacks(callbacks);

        let refspecs = [
            format!("refs/heads/{0}:refs/heads/{0}", branch_name),
            "refs/tags/*:refs/tags/*".to_string(),
        ];
        let refspec_strs: Vec<&str> = refspecs.iter().map(|s| s.as_str()).collect();
        remote
            .push(&refspec_strs, Some(&mut push_options))
            .map_err(|e| ReleaseError::remote(format!("push failed: {}", e)))?;
        Ok(())
    }

    fn workdir(&self) -> &Path {
        &self.workdir
    }
}
