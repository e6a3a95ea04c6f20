use crate::domain::tag::VersionBump;
use crate::error::{ReleaseError, Result};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Commit metadata as reported by the VCS, one per commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMeta {
    pub hash: String,
    pub author: String,
    pub timestamp_seconds: i64,
}

/// A commit with its raw, unparsed message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommit {
    pub meta: CommitMeta,
    pub message: String,
}

/// The closed set of conventional commit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommitType {
    Build,
    Chore,
    Ci,
    Docs,
    Feat,
    Fix,
    Perf,
    Refactor,
    Revert,
    Style,
    Test,
}

impl CommitType {
    /// Match a header keyword against the whitelist, case-sensitively.
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "build" => Some(CommitType::Build),
            "chore" => Some(CommitType::Chore),
            "ci" => Some(CommitType::Ci),
            "docs" => Some(CommitType::Docs),
            "feat" => Some(CommitType::Feat),
            "fix" => Some(CommitType::Fix),
            "perf" => Some(CommitType::Perf),
            "refactor" => Some(CommitType::Refactor),
            "revert" => Some(CommitType::Revert),
            "style" => Some(CommitType::Style),
            "test" => Some(CommitType::Test),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Build => "build",
            CommitType::Chore => "chore",
            CommitType::Ci => "ci",
            CommitType::Docs => "docs",
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Perf => "perf",
            CommitType::Refactor => "refactor",
            CommitType::Revert => "revert",
            CommitType::Style => "style",
            CommitType::Test => "test",
        }
    }

    /// The type keyword with its first letter upper-cased, for headings.
    pub fn capitalized(&self) -> &'static str {
        match self {
            CommitType::Build => "Build",
            CommitType::Chore => "Chore",
            CommitType::Ci => "Ci",
            CommitType::Docs => "Docs",
            CommitType::Feat => "Feat",
            CommitType::Fix => "Fix",
            CommitType::Perf => "Perf",
            CommitType::Refactor => "Refactor",
            CommitType::Revert => "Revert",
            CommitType::Style => "Style",
            CommitType::Test => "Test",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structurally valid conventional commit.
///
/// Construction via [ConventionalCommit::parse] fails with
/// [ReleaseError::Grammar] when the header does not match the grammar
/// `<type>[(<scope>)]: <description>`; a malformed commit is never coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalCommit {
    pub meta: CommitMeta,
    pub commit_type: CommitType,
    pub scope: Option<String>,
    pub description: String,
    pub body: Option<String>,
    pub footer: Option<String>,
    pub version_bump: VersionBump,
}

struct ParsedParts {
    commit_type: CommitType,
    scope: Option<String>,
    description: String,
    body: Option<String>,
    footer: Option<String>,
    version_bump: VersionBump,
}

impl ConventionalCommit {
    /// Parse a raw commit into its conventional structure.
    ///
    /// The bump defaults to patch, `feat` escalates to minor, and a
    /// `BREAKING CHANGE: ` marker in body or footer escalates to major.
    /// Escalation is one-directional: once major is set nothing lowers it.
    pub fn parse(raw: &RawCommit) -> Result<Self> {
        let parts = parse_parts(&raw.message)?;
        Ok(ConventionalCommit {
            meta: raw.meta.clone(),
            commit_type: parts.commit_type,
            scope: parts.scope,
            description: parts.description,
            body: parts.body,
            footer: parts.footer,
            version_bump: parts.version_bump,
        })
    }

    /// Check a message against the grammar without building a commit.
    ///
    /// This is the lint entry point; it applies exactly the release parser's
    /// policy (lines beyond the body/footer positions are ignored).
    pub fn validate(message: &str) -> Result<()> {
        parse_parts(message).map(|_| ())
    }

    pub fn has_breaking_change(&self) -> bool {
        self.version_bump == VersionBump::Major
    }
}

fn parse_parts(message: &str) -> Result<ParsedParts> {
    let normalized = message.replace("\r\n", "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();

    let (commit_type, scope, description) = parse_header(lines[0])?;

    let mut version_bump = if commit_type == CommitType::Feat {
        VersionBump::Minor
    } else {
        VersionBump::Patch
    };

    // Body sits on physical line 3, footer on physical line 5; anything
    // beyond those positions is ignored.
    let mut body = None;
    let mut footer = None;
    if lines.len() >= 3 {
        let (breaking, content) = parse_content(lines[2])?;
        if breaking {
            version_bump = VersionBump::Major;
        }
        body = Some(content);
    }
    if lines.len() >= 5 {
        let (breaking, content) = parse_content(lines[4])?;
        if breaking {
            version_bump = VersionBump::Major;
        }
        footer = Some(content);
    }

    Ok(ParsedParts {
        commit_type,
        scope,
        description,
        body,
        footer,
        version_bump,
    })
}

/// Parse a header line `<type>[(<scope>)]: <description>`.
fn parse_header(header: &str) -> Result<(CommitType, Option<String>, String)> {
    let type_len = header
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .count();
    let (type_str, after_type) = header.split_at(type_len);
    let commit_type = CommitType::from_keyword(type_str).ok_or_else(|| {
        ReleaseError::grammar(format!(
            "'{}' is not a conventional commit type in header '{}'",
            type_str, header
        ))
    })?;

    let mut rest = after_type;
    let mut scope = None;
    if let Some(after_paren) = rest.strip_prefix('(') {
        let close = after_paren.find(')').ok_or_else(|| {
            ReleaseError::grammar(format!("unclosed scope in header '{}'", header))
        })?;
        let scope_str = &after_paren[..close];
        let valid = scope_str
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if !valid {
            return Err(ReleaseError::grammar(format!(
                "invalid scope '{}' in header '{}'",
                scope_str, header
            )));
        }
        if !scope_str.is_empty() {
            scope = Some(scope_str.to_string());
        }
        rest = &after_paren[close + 1..];
    }

    let description = rest.strip_prefix(": ").ok_or_else(|| {
        ReleaseError::grammar(format!(
            "missing ': ' separator after type in header '{}'",
            header
        ))
    })?;
    let starts_with_word_char = description
        .bytes()
        .next()
        .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_');
    if !starts_with_word_char {
        return Err(ReleaseError::grammar(format!(
            "description must start with a word character in header '{}'",
            header
        )));
    }

    Ok((commit_type, scope, description.to_string()))
}

/// Parse a body/footer line: an optional `BREAKING CHANGE: ` marker
/// followed by non-empty content. The marker is stripped from the content.
fn parse_content(line: &str) -> Result<(bool, String)> {
    let (breaking, content) = match line.strip_prefix("BREAKING CHANGE: ") {
        Some(rest) => (true, rest),
        None => (false, line),
    };
    if content.is_empty() {
        return Err(ReleaseError::grammar("empty body or footer line"));
    }
    Ok((breaking, content.to_string()))
}

/// Grouping key for changelog sections.
///
/// Orders as the rendered sections do: Breaking Changes first, then feat,
/// then fix, then every remaining type alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitGroup {
    BreakingChanges,
    Type(CommitType),
}

impl CommitGroup {
    fn rank(&self) -> (u8, &'static str) {
        match self {
            CommitGroup::BreakingChanges => (0, ""),
            CommitGroup::Type(CommitType::Feat) => (1, ""),
            CommitGroup::Type(CommitType::Fix) => (2, ""),
            CommitGroup::Type(t) => (3, t.as_str()),
        }
    }

    /// The markdown section heading for this group.
    pub fn heading(&self) -> String {
        match self {
            CommitGroup::BreakingChanges => "### Breaking Changes".to_string(),
            CommitGroup::Type(CommitType::Feat) => "### Feature".to_string(),
            CommitGroup::Type(CommitType::Fix) => "### Bug Fixes".to_string(),
            CommitGroup::Type(t) => format!("#### {}", t.capitalized()),
        }
    }
}

impl Ord for CommitGroup {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for CommitGroup {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Group commits by their natural type.
///
/// With `breaking_first`, any major-bump commit is re-keyed into the
/// reserved [CommitGroup::BreakingChanges] bucket instead of its natural
/// one. This is presentation-only: the commit's own type is not touched.
pub fn group_by_type(
    commits: &[ConventionalCommit],
    breaking_first: bool,
) -> BTreeMap<CommitGroup, Vec<&ConventionalCommit>> {
    let mut groups: BTreeMap<CommitGroup, Vec<&ConventionalCommit>> = BTreeMap::new();
    for commit in commits {
        let key = if breaking_first && commit.has_breaking_change() {
            CommitGroup::BreakingChanges
        } else {
            CommitGroup::Type(commit.commit_type)
        };
        groups.entry(key).or_default().push(commit);
    }
    groups
}
