use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SlypressError};

pub const CONFIG_FILE: &str = "slypress.toml";

/// Knobs for one expansion run, read from an optional slypress.toml at the
/// source root.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Extension that marks a file as a template candidate.
    #[serde(default = "default_markup_ext")]
    pub markup_ext: String,

    /// Name of the sibling directory that makes a template eligible.
    #[serde(default = "default_mock_dir")]
    pub mock_dir: String,

    /// Name of the optional data file inside the mock directory.
    #[serde(default = "default_mock_file")]
    pub mock_file: String,

    /// Cap on how many times a single file may be recompiled in one run.
    #[serde(default = "default_max_passes")]
    pub max_passes: u32,

    /// Glob patterns (relative to the source root) excluded from discovery.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_markup_ext() -> String {
    ".html".to_string()
}

fn default_mock_dir() -> String {
    "htlmock".to_string()
}

fn default_mock_file() -> String {
    "mock.json".to_string()
}

fn default_max_passes() -> u32 {
    8
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            markup_ext: default_markup_ext(),
            mock_dir: default_mock_dir(),
            mock_file: default_mock_file(),
            max_passes: default_max_passes(),
            exclude: Vec::new(),
        }
    }
}

/// Load the build config from `<source_dir>/slypress.toml`, falling back to
/// defaults when the file is absent.
pub fn load_config(source_dir: &Path) -> Result<BuildConfig> {
    let config_path = source_dir.join(CONFIG_FILE);

    if !config_path.exists() {
        return Ok(BuildConfig::default());
    }

    let content = std::fs::read_to_string(&config_path).map_err(|e| SlypressError::Io {
        context: format!("reading {}", config_path.display()),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| SlypressError::ConfigParse { source: e })
}
