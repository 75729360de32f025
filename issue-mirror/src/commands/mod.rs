pub mod config;
pub mod doctor;
pub mod index;
pub mod sync;

use std::path::Path;

use anyhow::Context;
use clap::Args;

use crate::asana::AsanaClient;
use crate::config::{load_config, validate_config, LoadedConfig};
use crate::gitlab::GitLabClient;
use crate::sync::SyncSettings;
use crate::types::{Credentials, MirrorConfig};

/// Overrides for which workspace and field a run targets
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Asana workspace name (overrides config and ASANA_WORKSPACE_NAME)
    #[arg(long, value_name = "NAME")]
    pub workspace: Option<String>,

    /// Name of the custom field holding GitLab references
    #[arg(long, value_name = "NAME")]
    pub field: Option<String>,
}

/// Apply command-line overrides last, after file and environment.
pub fn apply_cli_overrides(config: &mut MirrorConfig, target: &TargetArgs) {
    if let Some(workspace) = target.workspace.as_deref().filter(|w| !w.trim().is_empty()) {
        config.asana.workspace = Some(workspace.to_string());
    }
    if let Some(field) = target.field.as_deref().filter(|f| !f.trim().is_empty()) {
        config.asana.custom_field = field.to_string();
    }
}

/// Load, override and validate the configuration for a command.
pub fn resolve_config(
    config_path: Option<&Path>,
    target: &TargetArgs,
) -> anyhow::Result<LoadedConfig> {
    let mut loaded = load_config(config_path)?;
    apply_cli_overrides(&mut loaded.config, target);
    validate_config(&loaded.config)?;
    Ok(loaded)
}

pub fn sync_settings(config: &MirrorConfig) -> SyncSettings {
    SyncSettings {
        workspace: config
            .asana
            .workspace
            .clone()
            .unwrap_or_default()
            .trim()
            .to_string(),
        custom_field: config.asana.custom_field.trim().to_string(),
    }
}

pub fn asana_client(config: &MirrorConfig, creds: &Credentials) -> anyhow::Result<AsanaClient> {
    AsanaClient::new(&config.asana, &config.http, &creds.asana_pat)
        .context("Failed to build Asana client")
}

pub fn gitlab_client(config: &MirrorConfig, creds: &Credentials) -> anyhow::Result<GitLabClient> {
    GitLabClient::new(&config.gitlab, &config.http, creds.gitlab_pat.as_deref())
        .context("Failed to build GitLab client")
}

pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to create tokio runtime")
}
