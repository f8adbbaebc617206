use std::path::{Path, PathBuf};

use crate::config::load_config;
use crate::discover::find_templates;
use crate::engine::{Engine, TeraEngine};
use crate::error::Result;
use crate::mock::load_mock_context;

/// Result of validating a source tree.
pub struct CheckResult {
    pub units: Vec<PathBuf>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Validate a source tree without writing anything: discover eligible
/// templates, parse their mock data, and compile each template's raw text.
pub fn check_tree(source_dir: &Path) -> Result<CheckResult> {
    let config = load_config(source_dir)?;
    let units = find_templates(source_dir, &config)?;

    let engine = TeraEngine;
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    for unit in &units {
        let rel = unit.path.strip_prefix(source_dir).unwrap_or(&unit.path);

        if let Err(e) = load_mock_context(&unit.mock_dir, &config.mock_file) {
            errors.push(format!("{}: {e}", rel.display()));
        }

        match std::fs::read_to_string(&unit.path) {
            Ok(text) => {
                if let Err(e) = engine.compile(&text) {
                    errors.push(format!("{}: {e}", rel.display()));
                }
            }
            Err(e) => {
                warnings.push(format!("could not read {}: {e}", rel.display()));
            }
        }
    }

    Ok(CheckResult {
        units: units.into_iter().map(|u| u.path).collect(),
        warnings,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_clean_tree_checks_out() {
        let dir = tempfile::tempdir().unwrap();
        let comp = dir.path().join("comp");
        fs::create_dir_all(comp.join("htlmock")).unwrap();
        fs::write(comp.join("page.html"), "<h1>${properties.title}</h1>").unwrap();
        fs::write(comp.join("htlmock/mock.json"), r#"{"properties": {}}"#).unwrap();

        let result = check_tree(dir.path()).unwrap();
        assert_eq!(result.units.len(), 1);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_bad_mock_and_bad_expression_reported() {
        let dir = tempfile::tempdir().unwrap();

        let bad_mock = dir.path().join("a");
        fs::create_dir_all(bad_mock.join("htlmock")).unwrap();
        fs::write(bad_mock.join("page.html"), "<p>ok</p>").unwrap();
        fs::write(bad_mock.join("htlmock/mock.json"), "{broken").unwrap();

        let bad_expr = dir.path().join("b");
        fs::create_dir_all(bad_expr.join("htlmock")).unwrap();
        fs::write(bad_expr.join("page.html"), "<p>${unclosed</p>").unwrap();

        let result = check_tree(dir.path()).unwrap();
        assert_eq!(result.units.len(), 2);
        assert_eq!(result.errors.len(), 2);
    }
}
