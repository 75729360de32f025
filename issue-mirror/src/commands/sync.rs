//! Sync command - one full reconciliation pass

use std::path::Path;

use anyhow::bail;
use clap::Args;
use colored::Colorize;
use tracing::info;

use super::{asana_client, gitlab_client, resolve_config, runtime, sync_settings, TargetArgs};
use crate::config::load_credentials;
use crate::dry_run::DryRunTracker;
use crate::sync::{run_sync, PairOutcome, SyncReport};

#[derive(Args, Debug, Clone, Default)]
pub struct SyncArgs {
    /// Perform every read, log the writes that would happen, write nothing
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub target: TargetArgs,
}

pub fn run(config_path: Option<&Path>, args: &SyncArgs) -> anyhow::Result<()> {
    let loaded = resolve_config(config_path, &args.target)?;
    let creds = load_credentials()?;
    let settings = sync_settings(&loaded.config);

    let asana = asana_client(&loaded.config, &creds)?;
    let gitlab = gitlab_client(&loaded.config, &creds)?;

    if args.dry_run {
        info!("Dry run: no changes will be written to Asana");
    }

    let rt = runtime()?;
    let result = if args.dry_run {
        let tracker = DryRunTracker::new(asana);
        rt.block_on(run_sync(&tracker, &gitlab, &settings))
    } else {
        rt.block_on(run_sync(&asana, &gitlab, &settings))
    };
    let report = match result {
        Ok(report) => report,
        Err(e) if e.is_lookup() => bail!("{e}. Run 'issue-mirror doctor' to check the names"),
        Err(e) => return Err(e.into()),
    };

    print_report(&report, args.dry_run);

    if report.has_failures() {
        bail!(
            "{} issue fetch(es) and {} task pair(s) failed",
            report.fetch_failures.len(),
            report.pair_failures()
        );
    }

    Ok(())
}

fn format_pair(pair: &PairOutcome) -> String {
    let target = format!("{} → task {}", pair.reference, pair.owning_task);

    if let Some(ref error) = pair.error {
        return format!("  {} {}: {}", "✗".red(), target, error.red());
    }

    let mut parts = Vec::new();
    if let Some(ref subtask) = pair.subtask {
        if pair.created_subtask {
            parts.push(format!("created subtask {subtask}"));
        } else {
            parts.push(format!("subtask {subtask}"));
        }
    }
    parts.push(format!(
        "comments +{} ~{} ={}",
        pair.comments.created, pair.comments.updated, pair.comments.unchanged
    ));
    if let Some(action) = pair.lifecycle {
        parts.push(format!("{action}"));
    }

    format!("  {} {}: {}", "✓".green(), target, parts.join(", ").dimmed())
}

fn print_report(report: &SyncReport, dry_run: bool) {
    let title = if dry_run {
        "\nSync summary (dry run)\n"
    } else {
        "\nSync summary\n"
    };
    println!("{}", title.bold());

    if report.pairs.is_empty() && report.fetch_failures.is_empty() {
        println!(
            "  {}",
            "No tasks reference GitLab issues. Nothing to do.".dimmed()
        );
        return;
    }

    for pair in &report.pairs {
        println!("{}", format_pair(pair));
    }
    for failure in &report.fetch_failures {
        println!(
            "  {} {}: {}",
            "✗".red(),
            failure.reference,
            format!("fetch failed: {}", failure.error).red()
        );
    }

    let comments = report.comments();
    println!();
    println!(
        "  {} tasks searched, {} issues referenced",
        report.tasks_searched, report.references
    );
    println!(
        "  {} subtasks created, {} comments created, {} updated, {} unchanged, {} completion changes",
        report.subtasks_created().to_string().cyan(),
        comments.created.to_string().cyan(),
        comments.updated.to_string().cyan(),
        comments.unchanged,
        report.completion_flips().to_string().cyan()
    );

    if report.has_failures() {
        eprintln!(
            "{}",
            format!(
                "\n✗ {} fetch failure(s), {} pair failure(s)",
                report.fetch_failures.len(),
                report.pair_failures()
            )
            .red()
        );
    } else {
        println!("{}", "\n✓ All pairs in sync".green());
    }
}
