use std::path::Path;

use console::style;
use miette::Result;

use slypress::check::check_tree;

pub fn run(source: String) -> Result<()> {
    let source_dir = Path::new(&source);

    println!(
        "{} {}",
        style("Checking templates under").bold(),
        style(source_dir.display()).cyan()
    );

    let result = check_tree(source_dir)?;

    println!("  Templates: {}", result.units.len());
    for unit in &result.units {
        println!("  {}", unit.display());
    }

    if !result.warnings.is_empty() {
        println!("\n{}", style("Warnings:").yellow().bold());
        for w in &result.warnings {
            println!("  {} {}", style("⚠").yellow(), w);
        }
    }

    if !result.errors.is_empty() {
        println!("\n{}", style("Errors:").red().bold());
        for e in &result.errors {
            println!("  {} {}", style("✗").red(), e);
        }
        println!(
            "\n{} Source tree has {} error(s)",
            style("✗").red().bold(),
            result.errors.len()
        );
        std::process::exit(1);
    }

    println!("\n{} Source tree is valid!", style("✓").green().bold());
    Ok(())
}
