//! Colored progress output

use std::path::Path;

use colored::Colorize;

use dirsync_core::{Phase, Reporter, SyncPath};

/// Prints progress to stdout as the pass runs.
///
/// Per-file lines are only shown when `verbose` is set; failures are left to
/// the summary printed after the pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn phase_started(&self, phase: Phase, scope: &str) {
        if phase == Phase::Snapshot {
            println!("{} Scanning {}", "=>".blue().bold(), scope.cyan());
        }
    }

    fn directory_created(&self, name: &str) {
        println!("   {} created {} on target", "+".green(), name.cyan());
    }

    fn file_copied(&self, path: &SyncPath) {
        if self.verbose {
            println!("   {} {}", "+".green(), path);
        }
    }

    fn file_deleted(&self, path: &SyncPath) {
        if self.verbose {
            println!("   {} {}", "-".red(), path);
        }
    }

    fn directory_pruned(&self, path: &Path) {
        if self.verbose {
            println!("   {} {}", "-".red(), path.display().to_string().dimmed());
        }
    }
}
