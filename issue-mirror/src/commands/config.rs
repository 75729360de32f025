//! Config command - Show the effective configuration

use std::path::Path;

use colored::Colorize;

use crate::config::loader::{
    ENV_ASANA_API_BASE_URL, ENV_ASANA_PAT, ENV_CUSTOM_FIELD, ENV_GITLAB_BASE_URL, ENV_GITLAB_PAT,
    ENV_WORKSPACE,
};
use crate::config::{global_config_path, load_config, validate_config};

pub fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let loaded = load_config(config_path)?;
    let config = &loaded.config;

    println!("{}", "\nissue-mirror configuration\n".bold());

    println!("{}", "Config location:".dimmed());
    match &loaded.source {
        Some(path) => println!("  {} {}", "●".green(), path.display()),
        None => {
            println!(
                "  {} no config file (looked for issue-mirror.config.yaml and {})",
                "○".yellow(),
                global_config_path().display()
            );
        }
    }

    println!("{}", "\nCurrent settings:".dimmed());
    println!(
        "  asana.workspace:     {}",
        config
            .asana
            .workspace
            .as_deref()
            .unwrap_or("(not set)")
            .cyan()
    );
    println!("  asana.custom_field:  {}", config.asana.custom_field.cyan());
    println!("  asana.api_base_url:  {}", config.asana.api_base_url.cyan());
    println!("  gitlab.base_url:     {}", config.gitlab.base_url.cyan());
    println!(
        "  http.timeout_secs:   {}",
        config.http.timeout_secs.to_string().cyan()
    );

    println!("{}", "\nEnvironment:".dimmed());
    for var in [
        ENV_WORKSPACE,
        ENV_CUSTOM_FIELD,
        ENV_ASANA_API_BASE_URL,
        ENV_GITLAB_BASE_URL,
    ] {
        match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => println!("  {var}: {}", value.cyan()),
            _ => println!("  {var}: {}", "(not set)".dimmed()),
        }
    }
    for var in [ENV_ASANA_PAT, ENV_GITLAB_PAT] {
        println!("  {var}: {}", secret_status(std::env::var(var).ok().as_deref()));
    }

    if let Err(e) = validate_config(config) {
        println!("\n{}", e.to_string().yellow());
    }

    println!();
    Ok(())
}

fn secret_status(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => "set (redacted)".green().to_string(),
        _ => "(not set)".dimmed().to_string(),
    }
}
