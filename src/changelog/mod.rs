//! Changelog generation
//!
//! A changelog strategy turns the existing CHANGELOG.md text plus a computed
//! release into the new document. The strategy is selected at startup from
//! an enumerated configuration option; there is no user-supplied template
//! code.

pub mod conventional;
pub mod formatter;
pub mod simple;

pub use conventional::ConventionalChangelog;
pub use simple::SimpleChangelog;

use crate::domain::Release;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// The fixed document header every generated changelog starts with.
pub const CHANGELOG_HEADER: &str = "# Changelog";

/// Renders changelog documents and tag notes for a release.
pub trait ChangelogStrategy: Send + Sync {
    /// Merge a new release section into the existing document text.
    fn generate(&self, existing: &str, release: &Release) -> String;

    /// The release section alone, used as the annotated tag body.
    fn release_notes(&self, release: &Release) -> String;
}

/// Which changelog strategy to use, from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangelogStrategyKind {
    #[default]
    Conventional,
    Simple,
}

impl ChangelogStrategyKind {
    /// Resolve the configured kind into its strategy implementation.
    pub fn strategy(self) -> Box<dyn ChangelogStrategy> {
        match self {
            ChangelogStrategyKind::Conventional => Box::new(ConventionalChangelog),
            ChangelogStrategyKind::Simple => Box::new(SimpleChangelog),
        }
    }
}

/// Splice a new release section into the document.
///
/// The previous document contributes everything after its first
/// `# Changelog`-length run of characters. This is a character-count trim of
/// the fixed literal, not a structural parse; a prior document with a
/// different header loses its first eleven characters all the same.
pub fn merge_document(existing: &str, section: &str) -> String {
    let remainder = existing
        .char_indices()
        .nth(CHANGELOG_HEADER.chars().count())
        .map(|(idx, _)| &existing[idx..])
        .unwrap_or("");
    format!("{}\n{}{}", CHANGELOG_HEADER, section, remainder)
}

/// Today's date the way release sections print it, e.g. `Jan 1, 1970`.
pub(crate) fn release_date() -> String {
    Utc::now().format("%b %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_into_empty_document() {
        let merged = merge_document("", "## 0.2.0 - Jan 1, 1970");
        assert_eq!(merged, "# Changelog\n## 0.2.0 - Jan 1, 1970");
    }

    #[test]
    fn test_merge_replaces_existing_header() {
        let merged = merge_document("# Changelog", "## 0.2.0 - Jan 1, 1970");
        assert_eq!(merged.matches("# Changelog").count(), 1);
    }

    #[test]
    fn test_merge_keeps_previous_sections() {
        let existing = "# Changelog\n## 0.1.0 - Jan 1, 1970\n### Feature\nold (abc1234)";
        let merged = merge_document(existing, "## 0.2.0 - Feb 1, 1970");
        assert!(merged.starts_with("# Changelog\n## 0.2.0 - Feb 1, 1970\n## 0.1.0"));
    }

    #[test]
    fn test_merge_is_a_character_trim_not_a_parse() {
        // A prior document with a different header is corrupted by exactly
        // the header length; this behavior is pinned on purpose
        let merged = merge_document("## History\nentry", "## 0.2.0");
        assert_eq!(merged, "# Changelog\n## 0.2.0entry");
    }

    #[test]
    fn test_strategy_kind_default() {
        assert_eq!(
            ChangelogStrategyKind::default(),
            ChangelogStrategyKind::Conventional
        );
    }
}
