use std::fs;
use std::path::PathBuf;

use git_release::builder::resolve_repo_meta;
use git_release::changelog::ConventionalChangelog;
use git_release::domain::{CommitMeta, RawCommit};
use git_release::git::MockRepository;
use git_release::orchestrator::{Orchestrator, PackageState};
use git_release::registry::MockRegistry;
use git_release::resolver::resolve_packages;

fn raw_commit(hash: &str, author: &str, message: &str) -> RawCommit {
    RawCommit {
        meta: CommitMeta {
            hash: hash.to_string(),
            author: author.to_string(),
            timestamp_seconds: 123123121,
        },
        message: message.to_string(),
    }
}

fn write_manifest(root: &std::path::Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn today() -> String {
    chrono::Utc::now().format("%b %-d, %Y").to_string()
}

#[test]
fn test_single_package_release_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(
        dir.path(),
        "package.json",
        r#"{"name": "committed", "version": "0.1.0"}"#,
    );

    let mut repo = MockRepository::new(dir.path());
    repo.add_file("package.json");
    repo.add_tag_name("0.1.0");
    repo.set_commits_for_tag(
        "0.1.0",
        vec![
            raw_commit("bbbbbbbbbbbbb", "b", "fix: commit b"),
            raw_commit("aaaaaaaaaaaaa", "a", "feat: commit a"),
        ],
    );
    let registry = MockRegistry::new();

    let packages = resolve_packages(&repo, None).unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].previous_tag.to_string(), "0.1.0");

    let repo_meta = resolve_repo_meta(&repo, "origin").unwrap();
    let orchestrator =
        Orchestrator::new(&repo, &registry, Box::new(ConventionalChangelog), "origin");
    orchestrator.preflight().unwrap();
    let summary = orchestrator.run_release(&packages, &repo_meta);

    assert!(summary.all_succeeded());
    let outcome = &summary.outcomes[0];
    assert_eq!(outcome.new_tag.as_deref(), Some("0.2.0"));
    assert_eq!(outcome.state, PackageState::Done);

    // The changelog carries a dated section and both grouped commits
    let changelog = fs::read_to_string(dir.path().join("CHANGELOG.md")).unwrap();
    assert!(changelog.contains(&format!("## 0.2.0 - {}", today())));
    let feature = changelog.find("### Feature").unwrap();
    let fixes = changelog.find("### Bug Fixes").unwrap();
    assert!(feature < fixes);
    assert!(changelog.contains("commit a (aaaaaaa)"));
    assert!(changelog.contains("commit b (bbbbbbb)"));

    // Release commit, annotated tag with the commit notes, then push
    assert_eq!(
        repo.created_commits(),
        vec!["chore(release): release 0.2.0 [skip ci]".to_string()]
    );
    let tags = repo.created_tags();
    assert_eq!(tags[0].0, "0.2.0");
    assert!(tags[0].1.starts_with("## 0.2.0 - "));
    assert!(tags[0].1.contains("### Feature"));
    assert_eq!(repo.pushes(), vec!["origin"]);

    // Manifest bump and publish went to the registry collaborator
    assert_eq!(registry.versions()[0].1, "0.2.0");
    assert_eq!(registry.published().len(), 1);
}

#[test]
fn test_mono_repo_packages_release_independently() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(
        dir.path(),
        "packages/a/package.json",
        r#"{"name": "pkg-a", "version": "1.0.0"}"#,
    );
    write_manifest(
        dir.path(),
        "packages/b/package.json",
        r#"{"name": "pkg-b", "version": "2.0.0"}"#,
    );

    let mut repo = MockRepository::new(dir.path());
    repo.add_file("packages/a/package.json");
    repo.add_file("packages/b/package.json");
    repo.add_tag_name("pkg-b@2.0.0");
    repo.add_tag_name("pkg-a@1.0.0");
    repo.set_commits_for_tag(
        "pkg-a@1.0.0",
        vec![raw_commit("aaaaaaaaaaaaa", "a", "feat: new feature for a")],
    );
    repo.set_commits_for_tag(
        "pkg-b@2.0.0",
        vec![raw_commit("bbbbbbbbbbbbb", "b", "fix: bug fix for b")],
    );
    let registry = MockRegistry::new();

    let packages = resolve_packages(&repo, None).unwrap();
    let repo_meta = resolve_repo_meta(&repo, "origin").unwrap();
    let orchestrator =
        Orchestrator::new(&repo, &registry, Box::new(ConventionalChangelog), "origin");
    let summary = orchestrator.run_release(&packages, &repo_meta);

    assert!(summary.all_succeeded());
    let tag_of = |name: &str| {
        summary
            .outcomes
            .iter()
            .find(|o| o.package == name)
            .and_then(|o| o.new_tag.clone())
            .unwrap()
    };
    // Each package bumps from its own previous tag, without cross-assignment
    assert_eq!(tag_of("pkg-a"), "pkg-a@1.1.0");
    assert_eq!(tag_of("pkg-b"), "pkg-b@2.0.1");

    let changelog_a =
        fs::read_to_string(dir.path().join("packages/a/CHANGELOG.md")).unwrap();
    let changelog_b =
        fs::read_to_string(dir.path().join("packages/b/CHANGELOG.md")).unwrap();
    assert!(changelog_a.contains("new feature for a"));
    assert!(!changelog_a.contains("bug fix for b"));
    assert!(changelog_b.contains("bug fix for b"));

    // Both packages published; exactly one push for the whole run
    assert_eq!(registry.published().len(), 2);
    assert_eq!(repo.pushes(), vec!["origin"]);
}

#[test]
fn test_package_failure_is_isolated_from_siblings() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "packages/a/package.json", r#"{"name": "pkg-a"}"#);
    write_manifest(dir.path(), "packages/b/package.json", r#"{"name": "pkg-b"}"#);

    let mut repo = MockRepository::new(dir.path());
    repo.add_file("packages/a/package.json");
    repo.add_file("packages/b/package.json");
    repo.set_commits(vec![raw_commit("ccccccccccccc", "c", "feat: shared history")]);

    let mut registry = MockRegistry::new();
    registry.fail_publish_for(dir.path().join("packages/a"));

    let packages = resolve_packages(&repo, None).unwrap();
    let repo_meta = resolve_repo_meta(&repo, "origin").unwrap();
    let orchestrator =
        Orchestrator::new(&repo, &registry, Box::new(ConventionalChangelog), "origin");
    let summary = orchestrator.run_release(&packages, &repo_meta);

    assert!(!summary.all_succeeded());
    let outcome_of = |name: &str| {
        summary
            .outcomes
            .iter()
            .find(|o| o.package == name)
            .unwrap()
    };
    let failed = outcome_of("pkg-a");
    assert!(!failed.succeeded());
    assert_eq!(failed.state, PackageState::Tagged);

    let survived = outcome_of("pkg-b");
    assert!(survived.succeeded());
    assert_eq!(survived.state, PackageState::Done);

    // The sibling's publish still happened, and so did the final push
    assert_eq!(registry.published(), vec![dir.path().join("packages/b")]);
    assert_eq!(repo.pushes(), vec!["origin"]);
}

#[test]
fn test_changelog_regeneration_keeps_one_header() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "package.json", r#"{"name": "pkg"}"#);

    let mut repo = MockRepository::new(dir.path());
    repo.add_file("package.json");
    repo.set_commits(vec![raw_commit("aaaaaaaaaaaaa", "a", "feat: commit a")]);
    let registry = MockRegistry::new();

    let packages = resolve_packages(&repo, None).unwrap();
    let repo_meta = resolve_repo_meta(&repo, "origin").unwrap();
    let orchestrator =
        Orchestrator::new(&repo, &registry, Box::new(ConventionalChangelog), "origin");

    orchestrator.run_changelog(&packages, &repo_meta);
    orchestrator.run_changelog(&packages, &repo_meta);

    let changelog = fs::read_to_string(dir.path().join("CHANGELOG.md")).unwrap();
    assert_eq!(changelog.matches("# Changelog").count(), 1);
}

#[test]
fn test_first_release_without_any_tag() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "package.json", r#"{"name": "pkg"}"#);

    let mut repo = MockRepository::new(dir.path());
    repo.add_file("package.json");
    // No tags at all: the initial 0.1.0 is assumed and the full history used
    repo.set_commits(vec![raw_commit("aaaaaaaaaaaaa", "a", "feat: first feature")]);
    let registry = MockRegistry::new();

    let packages = resolve_packages(&repo, None).unwrap();
    assert_eq!(packages[0].previous_tag.to_string(), "0.1.0");

    let repo_meta = resolve_repo_meta(&repo, "origin").unwrap();
    let orchestrator =
        Orchestrator::new(&repo, &registry, Box::new(ConventionalChangelog), "origin");
    let summary = orchestrator.run_release(&packages, &repo_meta);

    assert!(summary.all_succeeded());
    assert_eq!(summary.outcomes[0].new_tag.as_deref(), Some("0.2.0"));
}

#[test]
fn test_subpath_scoping_limits_discovery() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "packages/a/package.json", r#"{"name": "pkg-a"}"#);
    write_manifest(dir.path(), "packages/b/package.json", r#"{"name": "pkg-b"}"#);

    let mut repo = MockRepository::new(dir.path());
    repo.add_file("packages/a/package.json");
    repo.add_file("packages/b/package.json");

    let packages = resolve_packages(&repo, Some(&PathBuf::from("packages/a"))).unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].name, "pkg-a");
}
