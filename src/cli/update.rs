//! Run updates for one package or the whole configuration.
//!
//! Outcomes go to stdout and failures to stderr, one line per package,
//! followed by the batch summary. The returned flag feeds the exit code.
//!
//! # Examples
//!
//! ```bash
//! aur-updater --package linuxqq
//! aur-updater --all --jobs 2
//! ```

use crate::config::{PackageDescriptor, PackagesConfig};
use crate::fetcher::Fetcher;
use crate::updater::{PackageUpdater, UpdateFailure, UpdateOutcome};
use colored::Colorize;

fn print_outcome(outcome: &UpdateOutcome) {
    match outcome {
        UpdateOutcome::UpToDate { package, version } => {
            println!("✅ {} is up to date ({})", package.bold(), version);
        }
        UpdateOutcome::Updated {
            package,
            previous,
            version,
            architectures,
            skipped,
        } => {
            let architectures: Vec<String> = architectures.iter().map(ToString::to_string).collect();
            println!(
                "📦 {}: {} -> {} [{}]",
                package.bold(),
                previous.as_deref().unwrap_or("none").yellow(),
                version.green(),
                architectures.join(", ")
            );
            if !skipped.is_empty() {
                let skipped: Vec<String> = skipped.iter().map(ToString::to_string).collect();
                println!("   {} {}", "no upstream artifact for:".yellow(), skipped.join(", "));
            }
        }
    }
}

fn print_failure(failure: &UpdateFailure) {
    eprintln!(
        "❌ {}: {} {}",
        failure.package.bold(),
        format!("{} failed:", failure.stage).red(),
        failure.cause
    );
}

/// Update one package; returns whether it succeeded.
pub async fn run_one<F: Fetcher>(
    updater: &PackageUpdater<F>,
    package: &PackageDescriptor,
    quiet: bool,
) -> bool {
    match updater.update_package(package).await {
        Ok(outcome) => {
            if !quiet {
                print_outcome(&outcome);
            }
            true
        }
        Err(failure) => {
            print_failure(&failure);
            false
        }
    }
}

/// Update every package; returns whether all of them succeeded.
pub async fn run_all<F: Fetcher>(
    updater: &PackageUpdater<F>,
    packages: &PackagesConfig,
    quiet: bool,
) -> bool {
    let report = updater.update_all(packages).await;

    for result in &report.results {
        match result {
            Ok(outcome) if !quiet => print_outcome(outcome),
            Ok(_) => {}
            Err(failure) => print_failure(failure),
        }
    }

    if !quiet {
        let summary = report.summary();
        if report.all_succeeded() {
            println!("\n{}", summary.green());
        } else {
            println!("\n{}", summary.yellow());
        }
    }
    report.all_succeeded()
}
