use crate::changelog::formatter::format_markdown;
use crate::changelog::{merge_document, release_date, ChangelogStrategy};
use crate::domain::Release;

/// A flat strategy: one line per commit, no grouping.
pub struct SimpleChangelog;

impl ChangelogStrategy for SimpleChangelog {
    fn generate(&self, existing: &str, release: &Release) -> String {
        format_markdown(&merge_document(existing, &render_section(release)))
    }

    fn release_notes(&self, release: &Release) -> String {
        render_section(release)
    }
}

fn render_section(release: &Release) -> String {
    let mut section = format!(
        "## [{}] - {}",
        release.new_tag.version_string(),
        release_date()
    );
    for commit in &release.commits {
        section.push_str(&format!("\n- {} [{}]", commit.description, commit.meta.author));
    }
    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changelog::CHANGELOG_HEADER;
    use crate::domain::{
        CommitMeta, ConventionalCommit, PackageMeta, RawCommit, RepoMeta, SemanticVersionTag,
    };
    use std::path::PathBuf;

    fn release() -> Release {
        let commit = ConventionalCommit::parse(&RawCommit {
            meta: CommitMeta {
                hash: "asdfasdfasdfa".to_string(),
                author: "a".to_string(),
                timestamp_seconds: 123123121,
            },
            message: "feat: commit a".to_string(),
        })
        .unwrap();

        Release {
            package: PackageMeta {
                directory: PathBuf::from("."),
                name: "pkg".to_string(),
                manifest_version: None,
                is_private: false,
                previous_tag: SemanticVersionTag::initial(),
            },
            repo: RepoMeta {
                host: "https://github.com".to_string(),
                owner: "ones-io".to_string(),
                repository: "committed".to_string(),
            },
            new_tag: SemanticVersionTag::parse("0.2.0").unwrap(),
            commits: vec![commit],
        }
    }

    #[test]
    fn test_simple_section_lists_authors() {
        let generated = SimpleChangelog.generate("", &release());
        assert!(generated.starts_with(CHANGELOG_HEADER));
        assert!(generated.contains("## [0.2.0] - "));
        assert!(generated.contains("- commit a [a]"));
    }

    #[test]
    fn test_simple_notes_have_no_document_header() {
        let notes = SimpleChangelog.release_notes(&release());
        assert!(notes.starts_with("## [0.2.0] - "));
        assert!(!notes.contains(CHANGELOG_HEADER));
    }
}
