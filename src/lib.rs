pub mod check;
pub mod config;
pub mod discover;
pub mod engine;
pub mod error;
pub mod mock;
pub mod queue;
pub mod rewrite;
pub mod stage;

use std::path::{Path, PathBuf};
use std::time::Duration;

use console::style;

use crate::engine::TeraEngine;
use crate::error::{Result, SlypressError};
use crate::queue::{Expander, UnitFailure};

/// Options for the `expand` operation.
pub struct ExpandOptions {
    /// Source tree containing templates with sidecar mock directories.
    pub source: String,
    /// Target tree that receives staged copies and compiled output.
    pub target: String,
    /// Overrides the configured per-file recompile ceiling.
    pub max_passes: Option<u32>,
}

/// Summary of one expansion run.
pub struct ExpandReport {
    pub units_discovered: usize,
    pub passes_completed: usize,
    pub failures: Vec<UnitFailure>,
    pub elapsed: Duration,
}

/// Main entry point: discover, stage, and expand a source tree of templates
/// into the target tree, draining the work queue until nothing is pending.
pub fn expand(options: ExpandOptions) -> Result<ExpandReport> {
    let start = std::time::Instant::now();

    // All paths are absolute from here on; nothing consults the working
    // directory again.
    let source_dir = absolutize(Path::new(&options.source))?;
    let target_dir = absolutize(Path::new(&options.target))?;

    let mut config = config::load_config(&source_dir)?;
    if let Some(limit) = options.max_passes {
        config.max_passes = limit;
    }

    println!(
        "{} {} {} {}",
        style("Expanding").bold(),
        style(source_dir.display()).cyan(),
        style("into").bold(),
        style(target_dir.display()).cyan()
    );

    let units = discover::find_templates(&source_dir, &config)?;
    if units.is_empty() {
        println!("{} no eligible templates found", style("✓").green().bold());
        return Ok(ExpandReport {
            units_discovered: 0,
            passes_completed: 0,
            failures: Vec::new(),
            elapsed: start.elapsed(),
        });
    }

    println!("{} {} template(s):", style("Found").bold(), units.len());
    for unit in &units {
        println!("  {}", unit.path.display());
    }

    let staged = stage::stage_units(&units, &source_dir, &target_dir)?;

    let engine = TeraEngine;
    let mut expander = Expander::new(&config, &engine, &target_dir);
    for path in staged {
        expander.enqueue(path);
    }
    let outcome = expander.drain();

    let elapsed = start.elapsed();
    if outcome.failures.is_empty() {
        println!(
            "\n{} Expanded {} template(s) in {} pass(es) ({}ms)",
            style("✓").green().bold(),
            units.len(),
            outcome.passes_completed,
            elapsed.as_millis()
        );
    } else {
        println!(
            "\n{} Expanded with {} failure(s) over {} pass(es) ({}ms)",
            style("⚠").yellow().bold(),
            outcome.failures.len(),
            outcome.passes_completed,
            elapsed.as_millis()
        );
    }

    Ok(ExpandReport {
        units_discovered: units.len(),
        passes_completed: outcome.passes_completed,
        failures: outcome.failures,
        elapsed,
    })
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir().map_err(|e| SlypressError::Io {
            context: "getting current directory".into(),
            source: e,
        })?;
        Ok(cwd.join(path))
    }
}
