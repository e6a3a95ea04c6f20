use crate::changelog::formatter::format_markdown;
use crate::changelog::{merge_document, release_date, ChangelogStrategy};
use crate::domain::{group_by_type, ConventionalCommit, Release, SemanticVersionTag};

const UNRELEASED_HEADER: &str = "## Unreleased";

/// The default strategy: commits grouped by type with breaking changes
/// pulled to the front.
pub struct ConventionalChangelog;

impl ChangelogStrategy for ConventionalChangelog {
    fn generate(&self, existing: &str, release: &Release) -> String {
        let section = render_release_section(Some(&release.new_tag), &release.commits);
        format_markdown(&merge_document(existing, &section))
    }

    fn release_notes(&self, release: &Release) -> String {
        render_release_section(Some(&release.new_tag), &release.commits)
    }
}

/// Render one release section.
///
/// Section order is fixed: Breaking Changes, Feature, Bug Fixes, then the
/// remaining types alphabetically. Each commit renders as
/// `[**scope:** ]<description> (<first 7 chars of hash>)`.
pub fn render_release_section(
    version: Option<&SemanticVersionTag>,
    commits: &[ConventionalCommit],
) -> String {
    let mut section = match version {
        Some(version) => format!("## {} - {}", version.version_string(), release_date()),
        None => UNRELEASED_HEADER.to_string(),
    };

    for (group, commits) in group_by_type(commits, true) {
        let body = commits
            .iter()
            .map(|commit| {
                let scope = match &commit.scope {
                    Some(scope) => format!("**{}:** ", scope),
                    None => String::new(),
                };
                format!("{}{} ({})", scope, commit.description, short_hash(commit))
            })
            .collect::<Vec<_>>()
            .join("\n");
        section = format!("{}\n{}\n{}", section, group.heading(), body);
    }

    section
}

fn short_hash(commit: &ConventionalCommit) -> &str {
    let hash = commit.meta.hash.as_str();
    hash.get(..7).unwrap_or(hash)
}
