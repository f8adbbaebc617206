use std::path::Path;

use console::style;
use miette::Result;

use slypress::{expand, ExpandOptions};

pub fn run(source: String, target: String, max_passes: Option<u32>, dry_run: bool) -> Result<()> {
    if dry_run {
        let source_dir = Path::new(&source);
        let config = slypress::config::load_config(source_dir)?;
        let units = slypress::discover::find_templates(source_dir, &config)?;

        println!(
            "\n{} Dry run \u{2014} templates that would be expanded:",
            style("==>").cyan().bold()
        );
        for unit in &units {
            println!("  {}", unit.path.display());
        }
        println!("\nSummary: {} eligible template(s)", units.len());
        println!(
            "\n{} Dry run \u{2014} no files written.",
            style("\u{2139}").blue().bold()
        );
        return Ok(());
    }

    expand(ExpandOptions {
        source,
        target,
        max_passes,
    })?;

    Ok(())
}
