//! GitLab issue references (`group/project#123`).
//!
//! References are typed by hand into an Asana custom field, so parsing is
//! lenient: anything that does not look like `<path>#<digits>` is skipped
//! rather than reported as an error.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^#]+)#([0-9]+)").expect("valid regex"))
}

/// A parsed `<project-path>#<issue-iid>` reference.
///
/// Equality, ordering and hashing follow the canonical string form since both
/// parts are stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IssueReference {
    project_path: String,
    issue_id: String,
}

impl IssueReference {
    /// Parse a single reference fragment. Returns `None` when the fragment
    /// does not start with `<non-# characters>#<digits>`.
    pub fn parse(fragment: &str) -> Option<Self> {
        let caps = reference_regex().captures(fragment.trim())?;
        let project_path = caps.get(1)?.as_str().trim();
        let issue_id = caps.get(2)?.as_str();

        if project_path.is_empty() {
            return None;
        }

        Some(Self {
            project_path: project_path.to_string(),
            issue_id: issue_id.to_string(),
        })
    }

    pub fn project_path(&self) -> &str {
        &self.project_path
    }

    pub fn issue_id(&self) -> &str {
        &self.issue_id
    }

    /// Project path escaped for use as a single GitLab API path segment.
    pub fn api_path(&self) -> String {
        self.project_path.replace('/', "%2F")
    }

    /// Project path as it appears in browser URLs.
    pub fn display_path(&self) -> &str {
        &self.project_path
    }

    /// `<project-path>#<issue-iid>`
    pub fn canonical(&self) -> String {
        format!("{}#{}", self.project_path, self.issue_id)
    }
}

impl fmt::Display for IssueReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.project_path, self.issue_id)
    }
}

impl FromStr for IssueReference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!("Invalid issue reference: '{s}'. Expected: group/project#123")
        })
    }
}

/// Parse a comma-separated custom field value into references.
///
/// Empty and unparseable fragments are dropped. Exact duplicates collapse to
/// their first occurrence so one field never yields the same reference twice.
pub fn parse_reference_list(value: &str) -> Vec<IssueReference> {
    let mut refs: Vec<IssueReference> = Vec::new();

    for fragment in value.split(',') {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }

        match IssueReference::parse(fragment) {
            Some(reference) => {
                if !refs.contains(&reference) {
                    refs.push(reference);
                }
            }
            None => debug!("Skipping unparseable issue reference '{fragment}'"),
        }
    }

    refs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_reference() {
        let r = IssueReference::parse("grp/proj#12").unwrap();
        assert_eq!(r.project_path(), "grp/proj");
        assert_eq!(r.issue_id(), "12");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let r = IssueReference::parse("  grp/sub/proj#7  ").unwrap();
        assert_eq!(r.canonical(), "grp/sub/proj#7");
    }

    #[test]
    fn test_parse_ignores_trailing_text() {
        let r = IssueReference::parse("grp/proj#12 (backend)").unwrap();
        assert_eq!(r.issue_id(), "12");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(IssueReference::parse("").is_none());
        assert!(IssueReference::parse("grp/proj").is_none());
        assert!(IssueReference::parse("grp/proj#").is_none());
        assert!(IssueReference::parse("grp/proj#abc").is_none());
        assert!(IssueReference::parse("#12").is_none());
        assert!(IssueReference::parse("   #12").is_none());
    }

    #[test]
    fn test_parse_rejects_non_ascii_digits() {
        assert!(IssueReference::parse("grp/proj#１２").is_none());
        assert!(IssueReference::parse("grp/proj#١٢").is_none());
        assert_eq!(parse_reference_list("grp/proj#١٢, grp/proj#3").len(), 1);
    }

    #[test]
    fn test_api_path_escapes_slashes() {
        let r = IssueReference::parse("grp/sub/proj#3").unwrap();
        assert_eq!(r.api_path(), "grp%2Fsub%2Fproj");
        assert_eq!(r.display_path(), "grp/sub/proj");
    }

    #[test]
    fn test_canonical_round_trip() {
        for input in ["grp/proj#12", "a#1", "deep/nested/group/project-name#98765"] {
            let r = IssueReference::parse(input).unwrap();
            assert_eq!(IssueReference::parse(&r.canonical()), Some(r.clone()));
            assert_eq!(r.to_string(), r.canonical());
        }
    }

    #[test]
    fn test_equality_after_trimming() {
        assert_eq!(
            IssueReference::parse(" grp/proj#12"),
            IssueReference::parse("grp/proj#12 ")
        );
    }

    #[test]
    fn test_from_str_error_message() {
        let err = "nonsense".parse::<IssueReference>().unwrap_err();
        assert!(err.contains("nonsense"));
    }

    #[test]
    fn test_parse_reference_list_splits_and_trims() {
        let refs = parse_reference_list("grp/proj#12, grp/proj#7");
        let canon: Vec<String> = refs.iter().map(IssueReference::canonical).collect();
        assert_eq!(canon, vec!["grp/proj#12", "grp/proj#7"]);
    }

    #[test]
    fn test_parse_reference_list_drops_empty_and_invalid() {
        let refs = parse_reference_list(" , grp/proj#1,,not-a-ref, other/x#2 ,");
        let canon: Vec<String> = refs.iter().map(IssueReference::canonical).collect();
        assert_eq!(canon, vec!["grp/proj#1", "other/x#2"]);
    }

    #[test]
    fn test_parse_reference_list_dedupes_within_field() {
        let refs = parse_reference_list("grp/proj#1, grp/proj#1 ,grp/proj#2");
        assert_eq!(refs.len(), 2);
    }
}
