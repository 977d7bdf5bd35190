//! `--list`: show configured packages and where their PKGBUILDs live.

use crate::config::PackagesConfig;
use colored::Colorize;
use std::path::Path;

/// Print one block per configured package.
pub fn print_packages(packages: &PackagesConfig, recipe_root: &Path) {
    if packages.is_empty() {
        println!("No packages configured.");
        return;
    }

    println!("{}", format!("Configured packages ({}):", packages.len()).bold());
    for (key, package) in packages.names().zip(packages.iter()) {
        let architectures: Vec<String> =
            package.architectures.iter().map(ToString::to_string).collect();
        let architectures = if architectures.is_empty() {
            "none".yellow().to_string()
        } else {
            architectures.join(", ")
        };

        println!("  {}", key.green());
        println!("    parser:   {}", package.parser);
        println!("    arch:     {architectures}");
        println!("    upstream: {}", package.fetch_url);
        println!("    pkgbuild: {}", package.recipe_path(recipe_root).display());
    }
}
