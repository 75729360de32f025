use std::fmt;
use std::str::FromStr;

/// Open/closed state of a GitLab issue.
///
/// GitLab reports `opened`, `reopened` and `closed`; anything other than
/// `closed` counts as open so an unexpected value never completes a subtask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IssueState {
    #[default]
    Open,
    Closed,
}

impl IssueState {
    /// Map a raw GitLab `state` string.
    pub fn from_gitlab(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("closed") {
            IssueState::Closed
        } else {
            IssueState::Open
        }
    }

    pub fn is_closed(self) -> bool {
        self == IssueState::Closed
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueState::Open => write!(f, "open"),
            IssueState::Closed => write!(f, "closed"),
        }
    }
}

/// Log output format for the tracing subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: '{s}'. Expected: text, json")),
        }
    }
}

/// Outcome of a single doctor check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
    Warn,
}
