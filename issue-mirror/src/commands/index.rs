//! Index command - run discovery only and print which tasks own which issues

use std::path::Path;

use colored::Colorize;

use super::{asana_client, resolve_config, runtime, sync_settings, TargetArgs};
use crate::config::load_credentials;
use crate::discovery::DiscoveryIndex;
use crate::sync::discover;

pub fn run(config_path: Option<&Path>, target: &TargetArgs) -> anyhow::Result<()> {
    let loaded = resolve_config(config_path, target)?;
    let creds = load_credentials()?;
    let settings = sync_settings(&loaded.config);
    let asana = asana_client(&loaded.config, &creds)?;

    let rt = runtime()?;
    let discovery = rt.block_on(discover(&asana, &settings))?;

    println!(
        "{}",
        format!(
            "\nGitLab issues referenced in \"{}\" ({})\n",
            settings.workspace, settings.custom_field
        )
        .bold()
    );
    for line in format_index(&discovery.index) {
        println!("{line}");
    }
    println!(
        "\n  {} tasks searched, {} issues, {} task pairs",
        discovery.tasks_searched,
        discovery.index.len(),
        discovery.index.pair_count()
    );

    Ok(())
}

fn format_index(index: &DiscoveryIndex) -> Vec<String> {
    if index.is_empty() {
        return vec![format!("  {}", "No references found".dimmed())];
    }

    index
        .entries()
        .iter()
        .map(|entry| {
            format!(
                "  {} {} {}",
                "●".cyan(),
                entry.reference,
                format!("→ {}", entry.owning_tasks.join(", ")).dimmed()
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::IssueReference;

    #[test]
    fn test_format_index_lists_owners() {
        let mut index = DiscoveryIndex::new();
        index.insert(IssueReference::parse("grp/proj#12").unwrap(), "100");
        index.insert(IssueReference::parse("grp/proj#12").unwrap(), "101");

        let lines = format_index(&index);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("grp/proj#12"));
        assert!(lines[0].contains("100, 101"));
    }

    #[test]
    fn test_format_index_empty() {
        let lines = format_index(&DiscoveryIndex::new());
        assert!(lines[0].contains("No references found"));
    }
}
