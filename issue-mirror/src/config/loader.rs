use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::ConfigError;
use super::paths::{find_local_config, global_config_path};
use crate::types::{Credentials, MirrorConfig};

pub const ENV_ASANA_PAT: &str = "ASANA_PAT";
pub const ENV_GITLAB_PAT: &str = "GITLAB_PAT";
pub const ENV_WORKSPACE: &str = "ASANA_WORKSPACE_NAME";
pub const ENV_CUSTOM_FIELD: &str = "ASANA_GITLAB_FIELD";
pub const ENV_ASANA_API_BASE_URL: &str = "ASANA_API_BASE_URL";
pub const ENV_GITLAB_BASE_URL: &str = "GITLAB_BASE_URL";

/// Effective configuration plus the file it came from, if any
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: MirrorConfig,
    pub source: Option<PathBuf>,
}

/// Read and parse a YAML config file. An empty file yields defaults.
pub fn read_config(path: &Path) -> Result<MirrorConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    if contents.trim().is_empty() {
        return Ok(MirrorConfig::default());
    }

    serde_yaml::from_str(&contents).map_err(|e| ConfigError::parse(path, e))
}

/// Apply environment overrides. `lookup` is `std::env::var` outside tests.
pub fn apply_env_overrides<F>(config: &mut MirrorConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(workspace) = non_empty(ENV_WORKSPACE) {
        config.asana.workspace = Some(workspace);
    }
    if let Some(field) = non_empty(ENV_CUSTOM_FIELD) {
        config.asana.custom_field = field;
    }
    if let Some(url) = non_empty(ENV_ASANA_API_BASE_URL) {
        config.asana.api_base_url = url;
    }
    if let Some(url) = non_empty(ENV_GITLAB_BASE_URL) {
        config.gitlab.base_url = url;
    }
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Read a config file and apply environment overrides on top.
pub fn read_config_with_env(path: &Path) -> Result<MirrorConfig, ConfigError> {
    let mut config = read_config(path)?;
    apply_env_overrides(&mut config, process_env);
    Ok(config)
}

fn locate_config(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Some(local) = find_local_config(None) {
        return Ok(Some(local));
    }

    let global = global_config_path();
    Ok(global.is_file().then_some(global))
}

/// Resolve the effective configuration.
///
/// Priority: `--config` path > local file (walk up) > global file > defaults,
/// then environment overrides on top.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let source = locate_config(explicit)?;

    let config = match &source {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            read_config_with_env(path)?
        }
        None => {
            debug!("No config file found, using defaults and environment");
            let mut config = MirrorConfig::default();
            apply_env_overrides(&mut config, process_env);
            config
        }
    };

    Ok(LoadedConfig { config, source })
}

/// Read API tokens. `ASANA_PAT` is required; `GITLAB_PAT` is optional.
pub fn load_credentials_from<F>(lookup: F) -> Result<Credentials, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let asana_pat = read(ENV_ASANA_PAT)
        .ok_or_else(|| ConfigError::MissingCredential(ENV_ASANA_PAT))?;

    let gitlab_pat = read(ENV_GITLAB_PAT);
    if gitlab_pat.is_none() {
        warn!("{ENV_GITLAB_PAT} is not set; GitLab requests will be unauthenticated");
    }

    Ok(Credentials {
        asana_pat,
        gitlab_pat,
    })
}

pub fn load_credentials() -> Result<Credentials, ConfigError> {
    load_credentials_from(process_env)
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Validate the effective configuration, collecting every problem.
pub fn validate_config(config: &MirrorConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    match config.asana.workspace.as_deref().map(str::trim) {
        None => errors.push(format!(
            "asana.workspace is required (or set {ENV_WORKSPACE}, or pass --workspace)"
        )),
        Some("") => errors.push("asana.workspace must not be empty".to_string()),
        Some(_) => {}
    }

    if config.asana.custom_field.trim().is_empty() {
        errors.push("asana.custom_field must not be empty".to_string());
    }

    if !is_http_url(&config.asana.api_base_url) {
        errors.push(format!(
            "asana.api_base_url must be an http(s) URL, got '{}'",
            config.asana.api_base_url
        ));
    }

    if !is_http_url(&config.gitlab.base_url) {
        errors.push(format!(
            "gitlab.base_url must be an http(s) URL, got '{}'",
            config.gitlab.base_url
        ));
    }

    if config.http.timeout_secs == 0 {
        errors.push("http.timeout_secs must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors))
    }
}
