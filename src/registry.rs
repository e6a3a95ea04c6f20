//! npm registry collaborator
//!
//! Credentials, version-set and publish all go through the `npm` binary, the
//! same way the VCS layer is reached through a trait: the orchestrator only
//! sees [RegistryClient], and tests swap in [MockRegistry].

use crate::error::{ReleaseError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

const NPMRC_FILE_NAME: &str = ".npmrc";
const NPM_TOKEN_VAR: &str = "NPM_TOKEN";

/// Registry operations the release pipeline needs.
pub trait RegistryClient: Send + Sync {
    /// Check that credentials resolve, provisioning the rc file from the
    /// token environment variable when needed. Returns false when neither
    /// source is available.
    fn ensure_auth(&self, repo_root: &Path) -> Result<bool>;

    /// Write the given version into the manifest in `dir`.
    fn set_version(&self, dir: &Path, version: &str) -> Result<()>;

    /// Publish the package in `dir`.
    fn publish(&self, dir: &Path) -> Result<()>;
}

/// Registry client backed by the system `npm`.
pub struct NpmRegistry {
    registry_url: Option<String>,
    dry_run: bool,
}

impl NpmRegistry {
    pub fn new(registry_url: Option<String>, dry_run: bool) -> Self {
        NpmRegistry {
            registry_url,
            dry_run,
        }
    }

    fn run_npm(&self, args: &[&str], dir: Option<&Path>) -> Result<()> {
        let mut command = Command::new(npm_program());
        command.args(args);
        if let Some(dir) = dir {
            command.current_dir(dir);
        }
        let output = command
            .output()
            .map_err(|e| ReleaseError::registry(format!("cannot run npm: {}", e)))?;
        if !output.status.success() {
            return Err(ReleaseError::registry(format!(
                "npm {} failed: {}",
                args.first().unwrap_or(&""),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl RegistryClient for NpmRegistry {
    fn ensure_auth(&self, repo_root: &Path) -> Result<bool> {
        let npmrc_path = repo_root.join(NPMRC_FILE_NAME);
        if npmrc_path.exists() {
            return Ok(true);
        }

        match std::env::var(NPM_TOKEN_VAR) {
            Ok(token) if !token.is_empty() => {
                // npm expands the variable itself; the literal placeholder is
                // what belongs in the rc file
                fs::write(&npmrc_path, "//registry.npmjs.org/:_authToken=${NPM_TOKEN}")?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn set_version(&self, dir: &Path, version: &str) -> Result<()> {
        self.run_npm(
            &[
                "version",
                version,
                "--no-git-tag-version",
                "--allow-same-version",
            ],
            Some(dir),
        )
    }

    fn publish(&self, dir: &Path) -> Result<()> {
        let dir_str = dir.to_string_lossy();
        let mut args = vec!["publish", dir_str.as_ref()];
        if let Some(url) = &self.registry_url {
            args.push("--registry");
            args.push(url);
        }
        if self.dry_run {
            args.push("--dry-run");
        }
        self.run_npm(&args, None)
    }
}

fn npm_program() -> &'static str {
    if cfg!(windows) {
        "npm.cmd"
    } else {
        "npm"
    }
}

/// Mock registry that records calls for tests.
pub struct MockRegistry {
    authed: bool,
    fail_publish_for: Option<PathBuf>,
    versions: Mutex<Vec<(PathBuf, String)>>,
    published: Mutex<Vec<PathBuf>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        MockRegistry {
            authed: true,
            fail_publish_for: None,
            versions: Mutex::new(Vec::new()),
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn set_authed(&mut self, authed: bool) {
        self.authed = authed;
    }

    /// Make publishing fail for the given package directory
    pub fn fail_publish_for(&mut self, dir: impl Into<PathBuf>) {
        self.fail_publish_for = Some(dir.into());
    }

    /// (dir, version) pairs set through the trait
    pub fn versions(&self) -> Vec<(PathBuf, String)> {
        self.versions.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Directories published through the trait
    pub fn published(&self) -> Vec<PathBuf> {
        self.published.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryClient for MockRegistry {
    fn ensure_auth(&self, _repo_root: &Path) -> Result<bool> {
        Ok(self.authed)
    }

    fn set_version(&self, dir: &Path, version: &str) -> Result<()> {
        self.versions
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((dir.to_path_buf(), version.to_string()));
        Ok(())
    }

    fn publish(&self, dir: &Path) -> Result<()> {
        if self.fail_publish_for.as_deref() == Some(dir) {
            return Err(ReleaseError::registry(format!(
                "publish rejected for {}",
                dir.display()
            )));
        }
        self.published
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(dir.to_path_buf());
        Ok(())
    }
}
