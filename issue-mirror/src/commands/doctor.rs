//! Doctor command - Check configuration, credentials and Asana lookups

use std::path::Path;

use colored::Colorize;

use super::{apply_cli_overrides, asana_client, runtime, sync_settings, TargetArgs};
use crate::backend::TaskTracker;
use crate::config::loader::{ENV_ASANA_PAT, ENV_GITLAB_PAT};
use crate::config::{load_config, load_credentials, validate_config, ConfigError};
use crate::types::enums::CheckStatus;
use crate::types::{Credentials, MirrorConfig};

struct CheckResult {
    name: String,
    status: CheckStatus,
    message: String,
    required: bool,
    details: Option<String>,
}

impl CheckResult {
    fn pass(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Pass,
            message: message.into(),
            required: true,
            details: None,
        }
    }

    fn fail(name: &str, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Fail,
            message: message.into(),
            required: true,
            details,
        }
    }
}

fn format_result(result: &CheckResult) -> String {
    let icon = match result.status {
        CheckStatus::Pass => "✓".green().to_string(),
        CheckStatus::Fail => "✗".red().to_string(),
        CheckStatus::Warn => "!".yellow().to_string(),
    };

    let required_str = if result.required { "" } else { " (optional)" };
    let required_suffix = required_str.dimmed().to_string();

    let message = match result.status {
        CheckStatus::Fail => result.message.red().to_string(),
        _ => result.message.clone(),
    };

    let mut line = format!("  {} {}: {}{}", icon, result.name, message, required_suffix);

    if let Some(ref details) = result.details {
        if result.status != CheckStatus::Pass {
            line += &format!("\n      {}", details.dimmed());
        }
    }

    line
}

fn check_config_file(source: Option<&Path>) -> CheckResult {
    match source {
        Some(path) => CheckResult::pass("Config file", format!("Found at {}", path.display())),
        None => CheckResult {
            name: "Config file".into(),
            status: CheckStatus::Warn,
            message: "Not found, using defaults and environment".into(),
            required: false,
            details: Some("Create issue-mirror.config.yaml to pin the workspace".into()),
        },
    }
}

fn check_settings(config: &MirrorConfig) -> CheckResult {
    match validate_config(config) {
        Ok(()) => CheckResult::pass("Settings", "Valid"),
        Err(ConfigError::ValidationError(errors)) => {
            CheckResult::fail("Settings", "Invalid", Some(errors.join("; ")))
        }
        Err(e) => CheckResult::fail("Settings", "Invalid", Some(e.to_string())),
    }
}

fn check_asana_token(creds: &Result<Credentials, ConfigError>) -> CheckResult {
    match creds {
        Ok(_) => CheckResult::pass("Asana token", format!("{ENV_ASANA_PAT} set")),
        Err(_) => CheckResult::fail(
            "Asana token",
            format!("{ENV_ASANA_PAT} not set"),
            Some("Create a personal access token in Asana developer settings".into()),
        ),
    }
}

fn check_gitlab_token(creds: &Result<Credentials, ConfigError>) -> CheckResult {
    match creds {
        Ok(c) if c.gitlab_pat.is_some() => {
            CheckResult::pass("GitLab token", format!("{ENV_GITLAB_PAT} set"))
        }
        _ => CheckResult {
            name: "GitLab token".into(),
            status: CheckStatus::Warn,
            message: format!("{ENV_GITLAB_PAT} not set"),
            required: false,
            details: Some("Only public projects can be read without a token".into()),
        },
    }
}

/// Resolve the workspace and custom field against the live API.
fn check_lookups(config: &MirrorConfig, creds: &Credentials) -> Vec<CheckResult> {
    let settings = sync_settings(config);
    let client = match asana_client(config, creds) {
        Ok(c) => c,
        Err(e) => return vec![CheckResult::fail("Asana client", "Error", Some(e.to_string()))],
    };
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(e) => return vec![CheckResult::fail("Runtime", "Error", Some(e.to_string()))],
    };

    let mut results = Vec::new();
    let workspace_id = match rt.block_on(client.resolve_workspace_id(&settings.workspace)) {
        Ok(id) => {
            results.push(CheckResult::pass(
                "Asana workspace",
                format!("\"{}\" ({id})", settings.workspace),
            ));
            id
        }
        Err(e) => {
            results.push(CheckResult::fail(
                "Asana workspace",
                format!("\"{}\" not resolved", settings.workspace),
                Some(e.to_string()),
            ));
            return results;
        }
    };

    match rt.block_on(client.resolve_custom_field_id(&workspace_id, &settings.custom_field)) {
        Ok(id) => results.push(CheckResult::pass(
            "Custom field",
            format!("\"{}\" ({id})", settings.custom_field),
        )),
        Err(e) => results.push(CheckResult::fail(
            "Custom field",
            format!("\"{}\" not resolved", settings.custom_field),
            Some(e.to_string()),
        )),
    }

    results
}

pub fn run(config_path: Option<&Path>, target: &TargetArgs) -> anyhow::Result<()> {
    println!("{}", "\nissue-mirror doctor\n".bold());

    let mut results = Vec::new();

    println!("{}", "Configuration:".bold());
    let loaded = match load_config(config_path) {
        Ok(loaded) => Some(loaded),
        Err(e) => {
            let result = CheckResult::fail("Config file", "Unreadable", Some(e.to_string()));
            println!("{}", format_result(&result));
            results.push(result);
            None
        }
    };

    let creds = load_credentials();
    if let Some(mut loaded) = loaded {
        apply_cli_overrides(&mut loaded.config, target);

        for result in [
            check_config_file(loaded.source.as_deref()),
            check_settings(&loaded.config),
            check_asana_token(&creds),
            check_gitlab_token(&creds),
        ] {
            println!("{}", format_result(&result));
            results.push(result);
        }

        let ready = results.iter().all(|r| r.status != CheckStatus::Fail);
        if let (true, Ok(creds)) = (ready, &creds) {
            println!("{}", "\nAsana:".bold());
            for result in check_lookups(&loaded.config, creds) {
                println!("{}", format_result(&result));
                results.push(result);
            }
        }
    }

    println!();
    let failed = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail && r.required)
        .count();
    let warnings = results
        .iter()
        .filter(|r| r.status == CheckStatus::Warn)
        .count();

    if failed > 0 {
        eprintln!(
            "{}",
            format!("✗ {failed} required check(s) failed").red()
        );
        std::process::exit(1);
    } else if warnings > 0 {
        println!(
            "{}",
            format!("! All required checks passed ({warnings} warning(s))").yellow()
        );
    } else {
        println!("{}", "✓ All checks passed".green());
    }

    Ok(())
}
