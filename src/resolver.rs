//! Package metadata resolver
//!
//! Discovers package manifests in the repository's tracked file listing and
//! pairs each package with its previous release tag. A single manifest means
//! single-package mode (unscoped tags); several manifests mean mono-repo
//! mode, where every tag must be name-scoped.

use crate::domain::{PackageMeta, SemanticVersionTag};
use crate::error::{ReleaseError, Result};
use crate::git::GitRepository;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST_FILE_NAME: &str = "package.json";

/// The subset of a package manifest this tool reads.
#[derive(Debug, Deserialize)]
struct Manifest {
    name: Option<String>,
    version: Option<String>,
    #[serde(default)]
    private: bool,
}

/// Discover all packages and pair each with its previous tag.
///
/// Fatal when no manifest is found, when a manifest has no name, or when any
/// tag in the repository fails to parse (silently skipping a malformed tag
/// would under-version a package). Packages that have no matching tag get
/// the initial `0.1.0` default.
pub fn resolve_packages(
    repo: &dyn GitRepository,
    subpath: Option<&Path>,
) -> Result<Vec<PackageMeta>> {
    let files = repo.tracked_files(subpath)?;

    let mut discovered: Vec<(PathBuf, Manifest)> = Vec::new();
    for file in files {
        if file.file_name().and_then(|name| name.to_str()) != Some(MANIFEST_FILE_NAME) {
            continue;
        }
        let content = fs::read_to_string(repo.workdir().join(&file))?;
        let manifest: Manifest = serde_json::from_str(&content)
            .map_err(|e| ReleaseError::metadata(format!("cannot parse {}: {}", file.display(), e)))?;
        let directory = match file.parent() {
            Some(parent) if parent != Path::new("") => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        discovered.push((directory, manifest));
    }

    if discovered.is_empty() {
        return Err(ReleaseError::metadata("no package.json file found"));
    }

    // Tags arrive version-sorted descending, so for each package the first
    // matching entry is its latest release.
    let raw_tags = repo.tag_names()?;
    let tags = raw_tags
        .iter()
        .map(|raw| SemanticVersionTag::parse(raw))
        .collect::<Result<Vec<_>>>()?;

    let is_mono_repo = discovered.len() > 1;
    let mut tag_by_name: HashMap<&str, &SemanticVersionTag> = HashMap::new();
    if is_mono_repo {
        for tag in &tags {
            let tag_name = tag
                .name
                .as_deref()
                .ok_or_else(|| {
                    ReleaseError::metadata(format!(
                        "tag '{}' has no package name; mono-repo tags must be name-scoped",
                        tag
                    ))
                })?;
            tag_by_name.entry(tag_name).or_insert(tag);
        }
    }

    let mut packages = Vec::with_capacity(discovered.len());
    for (directory, manifest) in discovered {
        let name = match manifest.name {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(ReleaseError::metadata(format!(
                    "no package name found in {}",
                    directory.join(MANIFEST_FILE_NAME).display()
                )))
            }
        };

        let previous_tag = if is_mono_repo {
            tag_by_name.get(name.as_str()).map(|tag| (*tag).clone())
        } else {
            tags.first().cloned()
        };

        packages.push(PackageMeta {
            directory,
            name,
            manifest_version: manifest.version,
            is_private: manifest.private,
            previous_tag: previous_tag.unwrap_or_else(SemanticVersionTag::initial),
        });
    }

    Ok(packages)
}
