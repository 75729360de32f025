//! Rendering of mirrored content and the `[Comment <id>]` marker contract.
//!
//! A mirrored comment is recognised on later runs only through the marker at
//! the very start of its HTML body, so the format below must stay stable.
//! Rendering is a pure function of its inputs: re-rendering an unchanged
//! GitLab note yields byte-identical output, which is what makes the comment
//! reconciler idempotent.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::reference::IssueReference;
use crate::types::{IssueMetadata, TrackerComment};

/// Title prefix of every subtask created by the mirror.
pub const MIRROR_TITLE_PREFIX: &str = "[GitLab Issue";

const UNKNOWN_TIME: &str = "Unknown Time";
const UNKNOWN_USER: &str = "Unknown User";
const NO_DESCRIPTION: &str = "No description provided";

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^<body><a href="[^"]*">\[Comment ([0-9]+)\]"#).expect("valid regex")
    })
}

fn escape(text: &str, quotes: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quotes => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text node content. Quotes stay raw, as Asana returns them.
pub fn escape_text(text: &str) -> String {
    escape(text, false)
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(text: &str) -> String {
    escape(text, true)
}

/// `Tue, Mar 05, 2024 at 2:07 PM UTC`, or `Unknown Time`.
pub fn format_timestamp(ts: Option<&DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%a, %b %d, %Y at %-I:%M %p UTC").to_string(),
        None => UNKNOWN_TIME.to_string(),
    }
}

/// Browser permalink of a note.
pub fn comment_url(gitlab_base: &str, reference: &IssueReference, origin_id: u64) -> String {
    format!(
        "{}/{}/-/issues/{}#note_{}",
        gitlab_base.trim_end_matches('/'),
        reference.display_path(),
        reference.issue_id(),
        origin_id
    )
}

/// Render the body of the mirror comment for one GitLab note.
pub fn render_comment(
    gitlab_base: &str,
    reference: &IssueReference,
    comment: &TrackerComment,
) -> String {
    let author = comment.author.as_deref().unwrap_or(UNKNOWN_USER);
    format!(
        "<body><a href=\"{url}\">[Comment {id}] From {author} in GitLab on {ts}:</a>\n\n<pre>{body}</pre></body>",
        url = escape_attr(&comment_url(gitlab_base, reference, comment.origin_id)),
        id = comment.origin_id,
        author = escape_text(author),
        ts = format_timestamp(comment.updated_at.as_ref()),
        body = escape_text(&comment.body),
    )
}

/// Extract the GitLab note id from a mirror comment body.
pub fn parse_comment_marker(html_text: &str) -> Option<u64> {
    marker_regex()
        .captures(html_text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Title of a new mirror subtask.
pub fn subtask_title(reference: &IssueReference, metadata: &IssueMetadata) -> String {
    format!("{MIRROR_TITLE_PREFIX}: {reference}] {}", metadata.title)
}

/// Whether a task title marks it as one of our own mirror subtasks.
pub fn is_mirror_title(title: &str) -> bool {
    title.starts_with(MIRROR_TITLE_PREFIX)
}

/// HTML notes of a new mirror subtask.
pub fn subtask_notes(metadata: &IssueMetadata) -> String {
    let description = metadata
        .description
        .as_deref()
        .map(escape_text)
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    format!(
        "<body>This subtask is synced from GitLab.\n\
         <b><u>Do not make changes in Asana, they will be overwritten</u></b>\n\n<hr>\n\
         <b>GitLab URL:</b> <a href=\"{href}\">{url}</a>\n\
         <b>Author:</b> {author}\n\
         <b>Created at:</b> {created}\n\
         <b>Description:</b>\n<pre>{description}</pre></body>",
        href = escape_attr(&metadata.web_url),
        url = escape_text(&metadata.web_url),
        author = escape_text(metadata.author.as_deref().unwrap_or(UNKNOWN_USER)),
        created = format_timestamp(metadata.created_at.as_ref()),
    )
}
