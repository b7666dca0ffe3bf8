//! Status command: pending changes without applying them

use colored::Colorize;
use serde::Serialize;

use dirsync_core::{
    ChangeCounts, DirectoryReport, NullReporter, SyncConfig, SyncEngine, SyncMode, SyncOptions,
    SyncReport,
};

use crate::error::Result;

#[derive(Serialize)]
struct StatusView<'a> {
    missing_dirs: &'a [String],
    directories: Vec<DirectoryStatus<'a>>,
    totals: ChangeCounts,
}

#[derive(Serialize)]
struct DirectoryStatus<'a> {
    name: &'a str,
    #[serde(flatten)]
    changes: &'a dirsync_core::ChangeSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// Run the status command
///
/// Diffs source against target and prints what a sync would do.
pub fn run_status(config: SyncConfig, json: bool, merged: bool) -> Result<()> {
    let options = SyncOptions {
        mode: merged.then_some(SyncMode::Merged),
        ..SyncOptions::default()
    };
    let engine = SyncEngine::new(config, options)?;
    let report = engine.plan(&NullReporter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status_view(&report))?);
        return Ok(());
    }

    for name in &report.created_dirs {
        println!("{} {} is missing on the target", "NEW".yellow().bold(), name.cyan());
    }
    for directory in &report.directories {
        print_changes(directory);
    }

    if report.is_noop() && report.directory_errors().next().is_none() {
        println!("{} Target is up to date.", "OK".green().bold());
    } else {
        let counts = report.counts();
        println!(
            "{} {} to add, {} to update, {} to remove",
            "=>".blue().bold(),
            counts.added,
            counts.updated,
            counts.removed
        );
        println!("Run {} to apply.", "dirsync sync".cyan());
    }
    Ok(())
}

fn status_view(report: &SyncReport) -> StatusView<'_> {
    StatusView {
        missing_dirs: &report.created_dirs,
        directories: report
            .directories
            .iter()
            .map(|d| DirectoryStatus {
                name: &d.name,
                changes: &d.changes,
                error: d.error.as_deref(),
            })
            .collect(),
        totals: report.counts(),
    }
}

/// Print one directory's change set, or the reason it could not be read.
pub(crate) fn print_changes(directory: &DirectoryReport) {
    if let Some(error) = &directory.error {
        println!(
            "{} {}: {}",
            "ERROR".red().bold(),
            directory.name.cyan(),
            error
        );
        return;
    }

    let changes = &directory.changes;
    if changes.is_empty() {
        println!("   {} {} unchanged", "=".dimmed(), directory.name.cyan());
        return;
    }

    println!("   {}", directory.name.cyan().bold());
    for path in &changes.added {
        println!("   {} {}", "+".green(), path);
    }
    for path in &changes.updated {
        println!("   {} {}", "~".yellow(), path);
    }
    for path in &changes.removed {
        println!("   {} {}", "-".red(), path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirsync_test_utils::tree::SyncFixture;

    fn config(fixture: &SyncFixture) -> SyncConfig {
        SyncConfig::new(fixture.source_root(), fixture.target_root(), ["music"])
    }

    #[test]
    fn test_status_does_not_mutate_target() {
        let fixture = SyncFixture::new();
        fixture.write_source("music/a.mp3", "a", 10);
        fixture.write_target("music/old.mp3", "o", 10);

        run_status(config(&fixture), false, false).unwrap();

        assert_eq!(fixture.target_files(), vec!["music/old.mp3"]);
    }

    #[test]
    fn test_status_view_totals() {
        let fixture = SyncFixture::new();
        fixture.write_source("music/a.mp3", "a", 10);
        let engine = SyncEngine::new(config(&fixture), SyncOptions::default()).unwrap();
        let report = engine.plan(&NullReporter).unwrap();

        let value = serde_json::to_value(status_view(&report)).unwrap();

        assert_eq!(value["missing_dirs"][0], "music");
        assert_eq!(value["totals"]["added"], 1);
        assert_eq!(value["directories"][0]["added"][0], "music/a.mp3");
    }

    #[test]
    fn test_status_fails_without_target() {
        let fixture = SyncFixture::without_target();
        assert!(run_status(config(&fixture), true, false).is_err());
    }
}
