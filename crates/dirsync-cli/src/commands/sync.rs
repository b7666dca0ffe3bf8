//! Sync command implementation
//!
//! Runs one pass and prints a summary. Per-file failures are listed but do
//! not make the command fail; only errors that stop the pass do.

use colored::Colorize;

use dirsync_core::{
    CancelToken, SyncConfig, SyncEngine, SyncMode, SyncOptions, SyncReport, TracingReporter,
};

use super::console::ConsoleReporter;
use super::status::print_changes;
use crate::error::Result;

/// Flags of the sync command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncArgs {
    pub dry_run: bool,
    pub json: bool,
    pub jobs: Option<usize>,
    pub merged: bool,
}

impl SyncArgs {
    fn options(&self) -> SyncOptions {
        SyncOptions {
            dry_run: self.dry_run,
            mode: self.merged.then_some(SyncMode::Merged),
            jobs: self.jobs,
            retry: None,
        }
    }
}

/// Run the sync command
///
/// With `--json` the report is the only thing written to stdout and
/// progress goes to the log instead.
pub fn run_sync(config: SyncConfig, args: &SyncArgs, verbose: bool) -> Result<SyncReport> {
    let engine = SyncEngine::new(config, args.options())?;
    let cancel = CancelToken::new();

    if args.json {
        let report = engine.run(&TracingReporter, &cancel)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(report);
    }

    println!(
        "{} Synchronizing {} -> {}",
        "=>".blue().bold(),
        engine.config().source_path.display(),
        engine.config().target_path.display()
    );
    let report = engine.run(&ConsoleReporter::new(verbose), &cancel)?;
    print_summary(&report);
    Ok(report)
}

fn print_summary(report: &SyncReport) {
    if report.dry_run {
        println!("{} Dry run, nothing was changed.", "DRY RUN".yellow().bold());
        for name in &report.created_dirs {
            println!("   {} would create {}", "+".green(), name.cyan());
        }
        for directory in &report.directories {
            print_changes(directory);
        }
    } else {
        for (name, error) in report.directory_errors() {
            println!("{} {}: {}", "ERROR".red().bold(), name.cyan(), error);
        }
    }

    let counts = report.counts();
    let status = if report.has_failures() {
        "DONE".yellow().bold()
    } else {
        "OK".green().bold()
    };

    if report.is_noop() && !report.has_failures() {
        println!("{status} Already synchronized. No changes needed.");
    } else {
        println!(
            "{status} {} added, {} updated, {} removed",
            counts.added, counts.updated, counts.removed
        );
    }

    if !report.dry_run && !report.is_noop() {
        println!(
            "   copied {}, deleted {}, pruned {} directories in {} ms",
            report.copied_count(),
            report.deleted_count(),
            report.pruned_count(),
            report.elapsed().num_milliseconds()
        );
    }

    if report.failure_count() > 0 {
        println!(
            "{} {} operation(s) failed:",
            "FAILED".red().bold(),
            report.failure_count()
        );
        for failure in report.failures() {
            println!("   {} {}", "!".red(), failure);
        }
    }

    if report.cancelled {
        println!("{} Pass was cancelled before it finished.", "CANCELLED".yellow().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirsync_test_utils::tree::SyncFixture;

    fn config(fixture: &SyncFixture) -> SyncConfig {
        SyncConfig::new(fixture.source_root(), fixture.target_root(), ["music", "books"])
    }

    #[test]
    fn test_run_sync_mirrors_source() {
        let fixture = SyncFixture::new();
        fixture.write_source("music/rock/a.mp3", "a", 100);
        fixture.write_source("books/b.epub", "b", 100);
        fixture.write_target("music/rock/stale.mp3", "s", 100);

        let report = run_sync(config(&fixture), &SyncArgs::default(), false).unwrap();

        assert_eq!(report.copied_count(), 2);
        assert_eq!(report.deleted_count(), 1);
        assert_eq!(fixture.target_files(), fixture.source_files());
    }

    #[test]
    fn test_run_sync_dry_run_leaves_target() {
        let fixture = SyncFixture::new();
        fixture.write_source("music/a.mp3", "a", 100);
        fixture.mkdir_source("books");
        let args = SyncArgs {
            dry_run: true,
            ..SyncArgs::default()
        };

        let report = run_sync(config(&fixture), &args, true).unwrap();

        assert_eq!(report.added_count(), 1);
        assert!(fixture.target_files().is_empty());
        fixture.assert_target_missing("music");
    }

    #[test]
    fn test_run_sync_json_merged() {
        let fixture = SyncFixture::new();
        fixture.write_source("music/a.mp3", "a", 100);
        fixture.write_source("books/b.epub", "b", 100);
        let args = SyncArgs {
            json: true,
            merged: true,
            jobs: Some(2),
            ..SyncArgs::default()
        };

        let report = run_sync(config(&fixture), &args, false).unwrap();

        assert_eq!(report.directories.len(), 1);
        assert_eq!(report.copied_count(), 2);
    }

    #[test]
    fn test_run_sync_missing_target_is_error() {
        let fixture = SyncFixture::without_target();
        fixture.write_source("music/a.mp3", "a", 100);

        let result = run_sync(config(&fixture), &SyncArgs::default(), false);

        assert!(result.is_err());
        assert!(!fixture.target_root().exists());
    }
}
