use crate::error::{ReleaseError, Result};
use std::cmp::Ordering;
use std::fmt;

/// Version bump magnitude proposed by a commit or commit set.
///
/// The derived ordering is the reduction order: Patch < Minor < Major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VersionBump {
    Patch,
    Minor,
    Major,
}

/// Returns the largest bump in the sequence, short-circuiting on Major.
///
/// An empty sequence reduces to Patch.
pub fn get_version_bump(bumps: impl IntoIterator<Item = VersionBump>) -> VersionBump {
    let mut max_bump = VersionBump::Patch;
    for bump in bumps {
        if bump == VersionBump::Major {
            return VersionBump::Major;
        }
        if bump == VersionBump::Minor {
            max_bump = VersionBump::Minor;
        }
    }
    max_bump
}

/// A semantic version tag, optionally scoped by a package name.
///
/// Wire format: `[<name>@]<major>.<minor>.<patch>[-<preid>[.<prenum>]]`
/// (e.g. `1.2.3`, `pkg@0.4.0`, `@scope/pkg@2.0.0-beta.3`). The string form
/// round-trips exactly through [SemanticVersionTag::parse] and [fmt::Display].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticVersionTag {
    pub name: Option<String>,
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release_name: Option<String>,
    pub pre_release_version: Option<u64>,
}

impl SemanticVersionTag {
    /// The default tag assumed for a package that has never been released.
    pub fn initial() -> Self {
        SemanticVersionTag {
            name: None,
            major: 0,
            minor: 1,
            patch: 0,
            pre_release_name: None,
            pre_release_version: None,
        }
    }

    /// Parse a tag string.
    ///
    /// The package name, when present, is the longest prefix up to the final
    /// `@` (so scoped names like `@scope/pkg` survive). Any mismatch in the
    /// version portion is a hard [ReleaseError::Tag].
    pub fn parse(s: &str) -> Result<Self> {
        let (name, version_part) = match s.rsplit_once('@') {
            Some((name, rest)) if !name.is_empty() => (Some(name.to_string()), rest),
            _ => (None, s),
        };

        let (numbers, pre_release) = match version_part.split_once('-') {
            Some((numbers, pre)) => (numbers, Some(pre)),
            None => (version_part, None),
        };

        let parts: Vec<&str> = numbers.split('.').collect();
        if parts.len() != 3 {
            return Err(ReleaseError::tag(format!(
                "invalid tag '{}': expected <major>.<minor>.<patch>",
                s
            )));
        }
        let major = parse_component(parts[0], s)?;
        let minor = parse_component(parts[1], s)?;
        let patch = parse_component(parts[2], s)?;

        let (pre_release_name, pre_release_version) = match pre_release {
            Some(pre) => parse_pre_release(pre, s)?,
            None => (None, None),
        };

        Ok(SemanticVersionTag {
            name,
            major,
            minor,
            patch,
            pre_release_name,
            pre_release_version,
        })
    }

    pub fn is_pre_release(&self) -> bool {
        self.pre_release_name.is_some()
    }

    /// The version portion only, without the package name scope.
    pub fn version_string(&self) -> String {
        let mut s = format!("{}.{}.{}", self.major, self.minor, self.patch);
        if let Some(pre_name) = &self.pre_release_name {
            s.push('-');
            s.push_str(pre_name);
            if let Some(pre_version) = self.pre_release_version {
                s.push('.');
                s.push_str(&pre_version.to_string());
            }
        }
        s
    }

    /// Returns a new tag increased by the given bump.
    ///
    /// Pre-release tags only increment their pre-release counter and ignore
    /// the requested bump. Otherwise the bumped component is incremented and
    /// every trailing component reset to zero. The name scope is preserved.
    pub fn bump(&self, bump: VersionBump) -> Self {
        let mut next = self.clone();
        if self.is_pre_release() {
            next.pre_release_version = Some(self.pre_release_version.unwrap_or(0) + 1);
            return next;
        }
        match bump {
            VersionBump::Major => {
                next.major += 1;
                next.minor = 0;
                next.patch = 0;
            }
            VersionBump::Minor => {
                next.minor += 1;
                next.patch = 0;
            }
            VersionBump::Patch => {
                next.patch += 1;
            }
        }
        next
    }

    /// Version precedence comparison, ignoring the package name.
    ///
    /// A pre-release sorts below its release (`1.0.0-rc < 1.0.0`); a missing
    /// pre-release counter sorts below any numbered one.
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre_release_name, &other.pre_release_name) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a
                    .cmp(b)
                    .then(self.pre_release_version.cmp(&other.pre_release_version)),
            })
    }
}

impl fmt::Display for SemanticVersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{}@", name)?;
        }
        write!(f, "{}", self.version_string())
    }
}

fn parse_component(part: &str, tag: &str) -> Result<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReleaseError::tag(format!(
            "invalid tag '{}': '{}' is not a non-negative integer",
            tag, part
        )));
    }
    part.parse::<u64>()
        .map_err(|_| ReleaseError::tag(format!("invalid tag '{}': '{}' out of range", tag, part)))
}

fn parse_pre_release(pre: &str, tag: &str) -> Result<(Option<String>, Option<u64>)> {
    let (pre_name, pre_version) = match pre.split_once('.') {
        Some((name, version)) => (name, Some(version)),
        None => (pre, None),
    };

    let valid_name = !pre_name.is_empty()
        && pre_name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if !valid_name {
        return Err(ReleaseError::tag(format!(
            "invalid tag '{}': bad pre-release identifier '{}'",
            tag, pre_name
        )));
    }

    let pre_version = match pre_version {
        Some(v) => Some(parse_component(v, tag)?),
        None => None,
    };

    Ok((Some(pre_name.to_string()), pre_version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_versions() {
        let tag = SemanticVersionTag::parse("0.0.1").unwrap();
        assert_eq!((tag.major, tag.minor, tag.patch), (0, 0, 1));
        assert_eq!(tag.name, None);
        assert_eq!(tag.pre_release_name, None);

        let tag = SemanticVersionTag::parse("1.0.0").unwrap();
        assert_eq!((tag.major, tag.minor, tag.patch), (1, 0, 0));
    }

    #[test]
    fn test_parse_package_names() {
        let tag = SemanticVersionTag::parse("committed@0.0.0").unwrap();
        assert_eq!(tag.name.as_deref(), Some("committed"));

        let tag = SemanticVersionTag::parse("@ones-io/committed@0.0.0").unwrap();
        assert_eq!(tag.name.as_deref(), Some("@ones-io/committed"));
    }

    #[test]
    fn test_parse_pre_release_versions() {
        let tag = SemanticVersionTag::parse("0.0.0-rc").unwrap();
        assert_eq!(tag.pre_release_name.as_deref(), Some("rc"));
        assert_eq!(tag.pre_release_version, None);

        let tag = SemanticVersionTag::parse("0.0.0-beta.32").unwrap();
        assert_eq!(tag.pre_release_name.as_deref(), Some("beta"));
        assert_eq!(tag.pre_release_version, Some(32));
    }

    #[test]
    fn test_parse_invalid_tags() {
        assert!(SemanticVersionTag::parse("0.0-rc").is_err());
        assert!(SemanticVersionTag::parse("@sd0.0.0").is_err());
        assert!(SemanticVersionTag::parse("sd0-alphaweuir#(").is_err());
        assert!(SemanticVersionTag::parse("-1..0.0").is_err());
        assert!(SemanticVersionTag::parse("1.2.3.4").is_err());
        assert!(SemanticVersionTag::parse("1.2.3-").is_err());
        assert!(SemanticVersionTag::parse("1.2.3-rc.1.2").is_err());
        assert!(SemanticVersionTag::parse("1.2.+3").is_err());
    }

    #[test]
    fn test_round_trip() {
        let strings = [
            "0.0.0",
            "1.2.3",
            "committed@0.0.0",
            "@ones-io/committed@0.0.0",
            "@ones-io/committed@0.0.0-alpha.32",
            "10.20.30-rc.1",
            "0.1.0-beta",
            "0.1.0-beta.0",
        ];
        for s in strings {
            assert_eq!(SemanticVersionTag::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_version_string_drops_name() {
        let tag = SemanticVersionTag::parse("@ones-io/committed@0.0.0-alpha.32").unwrap();
        assert_eq!(tag.version_string(), "0.0.0-alpha.32");
    }

    #[test]
    fn test_bump_major() {
        let tag = SemanticVersionTag::parse("1.2.3").unwrap();
        let bumped = tag.bump(VersionBump::Major);
        assert_eq!((bumped.major, bumped.minor, bumped.patch), (2, 0, 0));
    }

    #[test]
    fn test_bump_minor_zeroes_patch() {
        let tag = SemanticVersionTag::parse("1.2.3").unwrap();
        let bumped = tag.bump(VersionBump::Minor);
        assert_eq!((bumped.major, bumped.minor, bumped.patch), (1, 3, 0));
    }

    #[test]
    fn test_bump_patch() {
        let tag = SemanticVersionTag::parse("1.2.3").unwrap();
        let bumped = tag.bump(VersionBump::Patch);
        assert_eq!((bumped.major, bumped.minor, bumped.patch), (1, 2, 4));
    }

    #[test]
    fn test_bump_preserves_name() {
        let tag = SemanticVersionTag::parse("pkg@1.0.0").unwrap();
        assert_eq!(tag.bump(VersionBump::Minor).to_string(), "pkg@1.1.0");
    }

    #[test]
    fn test_bump_pre_release_ignores_requested_type() {
        let tag = SemanticVersionTag::parse("0.0.0-alpha").unwrap();
        for bump in [VersionBump::Major, VersionBump::Minor, VersionBump::Patch] {
            let bumped = tag.bump(bump);
            assert_eq!((bumped.major, bumped.minor, bumped.patch), (0, 0, 0));
            assert_eq!(bumped.pre_release_version, Some(1));
        }

        let tag = SemanticVersionTag::parse("0.0.0-beta.32").unwrap();
        assert_eq!(tag.bump(VersionBump::Major).pre_release_version, Some(33));
    }

    #[test]
    fn test_get_version_bump_reduction() {
        use VersionBump::*;
        assert_eq!(get_version_bump([]), Patch);
        assert_eq!(get_version_bump([Patch, Patch]), Patch);
        assert_eq!(get_version_bump([Patch, Minor, Patch]), Minor);
        assert_eq!(get_version_bump([Patch, Minor, Major, Minor]), Major);
    }

    #[test]
    fn test_version_bump_ordering() {
        assert!(VersionBump::Patch < VersionBump::Minor);
        assert!(VersionBump::Minor < VersionBump::Major);
    }

    #[test]
    fn test_initial_tag() {
        let tag = SemanticVersionTag::initial();
        assert_eq!(tag.to_string(), "0.1.0");
    }

    #[test]
    fn test_precedence() {
        let parse = |s| SemanticVersionTag::parse(s).unwrap();
        assert_eq!(
            parse("1.0.0").cmp_precedence(&parse("0.9.9")),
            Ordering::Greater
        );
        assert_eq!(
            parse("1.0.0-rc").cmp_precedence(&parse("1.0.0")),
            Ordering::Less
        );
        assert_eq!(
            parse("1.0.0-rc.2").cmp_precedence(&parse("1.0.0-rc.1")),
            Ordering::Greater
        );
        // Names are ignored: only the version portion participates
        assert_eq!(
            parse("a@1.0.0").cmp_precedence(&parse("b@1.0.0")),
            Ordering::Equal
        );
    }
}
