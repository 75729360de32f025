use crate::reference::{parse_reference_list, IssueReference};

/// Display value of one custom field on a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFieldValue {
    pub field_id: String,
    pub display_value: Option<String>,
}

fn find_field_value<'a>(fields: &'a [CustomFieldValue], field_id: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|f| f.field_id == field_id)
        .and_then(|f| f.display_value.as_deref())
        .filter(|v| !v.trim().is_empty())
}

/// A task returned by the custom-field search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSummary {
    pub id: String,
    pub title: String,
    pub custom_fields: Vec<CustomFieldValue>,
}

impl TaskSummary {
    /// Non-blank display value of the given custom field.
    pub fn field_value(&self, field_id: &str) -> Option<&str> {
        find_field_value(&self.custom_fields, field_id)
    }
}

/// A task that tracks one or more GitLab issues through its custom field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwningTask {
    pub id: String,
    pub title: String,
    pub references: Vec<IssueReference>,
}

impl OwningTask {
    pub fn from_summary(summary: &TaskSummary, field_id: &str) -> Self {
        Self {
            id: summary.id.clone(),
            title: summary.title.clone(),
            references: summary
                .field_value(field_id)
                .map(parse_reference_list)
                .unwrap_or_default(),
        }
    }
}

/// An existing subtask of an owning task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildTask {
    pub id: String,
    pub title: String,
    pub custom_fields: Vec<CustomFieldValue>,
    pub completed: bool,
}

impl ChildTask {
    pub fn field_value(&self, field_id: &str) -> Option<&str> {
        find_field_value(&self.custom_fields, field_id)
    }

    /// References encoded in this subtask's copy of the tracking field.
    pub fn references(&self, field_id: &str) -> Vec<IssueReference> {
        self.field_value(field_id)
            .map(parse_reference_list)
            .unwrap_or_default()
    }
}

/// A story on an Asana task as returned by the stories endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryComment {
    pub handle: String,
    pub html_text: String,
    /// `false` for system stories (assignment changes, field edits, ...)
    pub is_comment: bool,
}

/// A story that carries a parseable `[Comment <id>]` marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorComment {
    pub handle: String,
    pub origin_id: u64,
    pub body: String,
}

/// Input for creating a mirror subtask
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChildTask {
    pub parent_id: String,
    pub title: String,
    pub html_notes: String,
    pub field_id: String,
    pub field_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(id: &str, value: Option<&str>) -> CustomFieldValue {
        CustomFieldValue {
            field_id: id.to_string(),
            display_value: value.map(str::to_string),
        }
    }

    #[test]
    fn test_field_value_picks_matching_field() {
        let summary = TaskSummary {
            id: "1".to_string(),
            title: "Owner".to_string(),
            custom_fields: vec![
                field("other", Some("x#1")),
                field("gl", Some("grp/proj#12")),
            ],
        };
        assert_eq!(summary.field_value("gl"), Some("grp/proj#12"));
        assert_eq!(summary.field_value("missing"), None);
    }

    #[test]
    fn test_field_value_ignores_blank() {
        let summary = TaskSummary {
            id: "1".to_string(),
            title: "Owner".to_string(),
            custom_fields: vec![field("gl", Some("   ")), field("x", None)],
        };
        assert_eq!(summary.field_value("gl"), None);
        assert_eq!(summary.field_value("x"), None);
    }

    #[test]
    fn test_owning_task_from_summary_parses_references() {
        let summary = TaskSummary {
            id: "42".to_string(),
            title: "Owner".to_string(),
            custom_fields: vec![field("gl", Some("grp/proj#12, grp/proj#7"))],
        };
        let owner = OwningTask::from_summary(&summary, "gl");
        assert_eq!(owner.id, "42");
        assert_eq!(owner.references.len(), 2);
        assert_eq!(owner.references[1].canonical(), "grp/proj#7");
    }

    #[test]
    fn test_child_task_references() {
        let child = ChildTask {
            id: "9".to_string(),
            title: "[GitLab Issue: grp/proj#12] Bug".to_string(),
            custom_fields: vec![field("gl", Some("grp/proj#12"))],
            completed: false,
        };
        let refs = child.references("gl");
        assert_eq!(refs.len(), 1);
        assert!(child.references("other").is_empty());
    }
}
