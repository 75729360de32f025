use serde::{Deserialize, Serialize};

pub const DEFAULT_ASANA_API_BASE_URL: &str = "https://app.asana.com/api/1.0";
pub const DEFAULT_GITLAB_BASE_URL: &str = "https://gitlab.com";
pub const DEFAULT_CUSTOM_FIELD: &str = "Gitlab Issues";

/// Asana side of the mirror
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsanaConfig {
    /// Workspace name, resolved to a gid at the start of every run
    #[serde(default)]
    pub workspace: Option<String>,
    /// Name of the text custom field holding `group/project#123` references
    #[serde(default = "default_custom_field")]
    pub custom_field: String,
    #[serde(default = "default_asana_api_base_url")]
    pub api_base_url: String,
}

impl Default for AsanaConfig {
    fn default() -> Self {
        Self {
            workspace: None,
            custom_field: default_custom_field(),
            api_base_url: default_asana_api_base_url(),
        }
    }
}

/// GitLab side of the mirror
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// Instance root, e.g. `https://gitlab.example.com` (no `/api/v4`)
    #[serde(default = "default_gitlab_base_url")]
    pub base_url: String,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            base_url: default_gitlab_base_url(),
        }
    }
}

/// HTTP transport settings shared by both clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Top-level configuration (`issue-mirror.config.yaml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MirrorConfig {
    #[serde(default)]
    pub asana: AsanaConfig,
    #[serde(default)]
    pub gitlab: GitLabConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// API tokens. Only ever read from the environment, never from the config file.
#[derive(Clone)]
pub struct Credentials {
    pub asana_pat: String,
    pub gitlab_pat: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("asana_pat", &"[REDACTED]")
            .field(
                "gitlab_pat",
                &self.gitlab_pat.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

// Default value helpers
fn default_custom_field() -> String {
    DEFAULT_CUSTOM_FIELD.to_string()
}

fn default_asana_api_base_url() -> String {
    DEFAULT_ASANA_API_BASE_URL.to_string()
}

fn default_gitlab_base_url() -> String {
    DEFAULT_GITLAB_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}
