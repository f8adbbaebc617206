use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::discover::TemplateUnit;
use crate::error::{Result, SlypressError};

/// Copy every eligible template and the full contents of its mock directory
/// into the target tree, preserving relative structure. Returns the staged
/// template paths, in unit order — these seed the expansion queue.
pub fn stage_units(
    units: &[TemplateUnit],
    source_dir: &Path,
    target_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut staged = Vec::new();

    for unit in units {
        let staged_path = copy_into_target(&unit.path, source_dir, target_dir)?;

        for entry in WalkDir::new(&unit.mock_dir)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() {
                copy_into_target(entry.path(), source_dir, target_dir)?;
            }
        }

        staged.push(staged_path);
    }

    Ok(staged)
}

fn copy_into_target(file: &Path, source_dir: &Path, target_dir: &Path) -> Result<PathBuf> {
    let rel_path = file
        .strip_prefix(source_dir)
        .expect("staged file must be under source_dir");
    let dest = target_dir.join(rel_path);

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SlypressError::Io {
            context: format!("creating directory {}", parent.display()),
            source: e,
        })?;
    }

    std::fs::copy(file, &dest).map_err(|e| SlypressError::Io {
        context: format!("copying {} to {}", file.display(), dest.display()),
        source: e,
    })?;

    Ok(dest)
}
