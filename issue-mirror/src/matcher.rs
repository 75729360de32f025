//! Finds the existing mirror subtask for a reference.
//!
//! The join key is the subtask's copy of the tracking custom field, which the
//! mirror sets to the canonical reference when it creates the subtask.

use crate::reference::IssueReference;
use crate::types::ChildTask;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Unmatched,
    Matched(ChildTask),
    /// More than one subtask claims the reference
    Ambiguous(Vec<ChildTask>),
}

pub fn find_matching_subtask(
    children: &[ChildTask],
    target: &IssueReference,
    field_id: &str,
) -> MatchOutcome {
    let mut matches: Vec<ChildTask> = children
        .iter()
        .filter(|child| child.references(field_id).contains(target))
        .cloned()
        .collect();

    match matches.len() {
        0 => MatchOutcome::Unmatched,
        1 => MatchOutcome::Matched(matches.remove(0)),
        _ => MatchOutcome::Ambiguous(matches),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CustomFieldValue;

    const FIELD: &str = "gl";

    fn child(id: &str, value: Option<&str>) -> ChildTask {
        ChildTask {
            id: id.to_string(),
            title: format!("child {id}"),
            custom_fields: vec![CustomFieldValue {
                field_id: FIELD.to_string(),
                display_value: value.map(str::to_string),
            }],
            completed: false,
        }
    }

    fn target() -> IssueReference {
        IssueReference::parse("grp/proj#12").unwrap()
    }

    #[test]
    fn test_unmatched_when_no_child_has_reference() {
        let children = vec![child("1", None), child("2", Some("grp/proj#7"))];
        assert_eq!(
            find_matching_subtask(&children, &target(), FIELD),
            MatchOutcome::Unmatched
        );
        assert_eq!(
            find_matching_subtask(&[], &target(), FIELD),
            MatchOutcome::Unmatched
        );
    }

    #[test]
    fn test_matches_exact_reference_not_prefix() {
        let children = vec![child("1", Some("grp/proj#123")), child("2", Some("grp/proj#12"))];
        match find_matching_subtask(&children, &target(), FIELD) {
            MatchOutcome::Matched(c) => assert_eq!(c.id, "2"),
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn test_matches_within_list_and_whitespace() {
        let children = vec![child("1", Some(" grp/proj#7 ,  grp/proj#12 "))];
        assert!(matches!(
            find_matching_subtask(&children, &target(), FIELD),
            MatchOutcome::Matched(_)
        ));
    }

    #[test]
    fn test_other_field_is_ignored() {
        let mut c = child("1", None);
        c.custom_fields.push(CustomFieldValue {
            field_id: "other".to_string(),
            display_value: Some("grp/proj#12".to_string()),
        });
        assert_eq!(
            find_matching_subtask(&[c], &target(), FIELD),
            MatchOutcome::Unmatched
        );
    }

    #[test]
    fn test_multiple_claims_are_ambiguous() {
        let children = vec![child("1", Some("grp/proj#12")), child("2", Some("grp/proj#12"))];
        match find_matching_subtask(&children, &target(), FIELD) {
            MatchOutcome::Ambiguous(found) => {
                let ids: Vec<&str> = found.iter().map(|c| c.id.as_str()).collect();
                assert_eq!(ids, vec!["1", "2"]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }
}
