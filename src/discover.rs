use std::path::{Path, PathBuf};

use console::style;
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::config::BuildConfig;
use crate::error::{Result, SlypressError};

/// A markup file eligible for compilation because of its adjacent mock
/// directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateUnit {
    /// Absolute path of the template file in the source tree.
    pub path: PathBuf,
    /// The sibling mock directory that made the file eligible.
    pub mock_dir: PathBuf,
}

/// Recursively collect all markup files under `source_dir` whose containing
/// directory has a sibling mock directory. A missing source root is
/// non-fatal: it is logged and yields zero units.
pub fn find_templates(source_dir: &Path, config: &BuildConfig) -> Result<Vec<TemplateUnit>> {
    if !source_dir.is_dir() {
        eprintln!(
            "{} no such directory: {}",
            style("error:").red().bold(),
            source_dir.display()
        );
        return Ok(Vec::new());
    }

    let exclude_set = build_glob_set(&config.exclude)?;
    let mut units = Vec::new();

    for entry in WalkDir::new(source_dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !path.to_string_lossy().ends_with(&config.markup_ext) {
            continue;
        }

        let rel_path = path
            .strip_prefix(source_dir)
            .expect("entry must be under source_dir");
        if exclude_set.is_match(rel_path.to_string_lossy().as_ref()) {
            continue;
        }

        let Some(parent) = path.parent() else {
            continue;
        };
        let mock_dir = parent.join(&config.mock_dir);
        if mock_dir.is_dir() {
            units.push(TemplateUnit {
                path: path.to_path_buf(),
                mock_dir,
            });
        }
    }

    Ok(units)
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| SlypressError::GlobPattern {
            pattern: pattern.clone(),
            source: e,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| SlypressError::GlobPattern {
        pattern: "<combined>".into(),
        source: e,
    })
}
