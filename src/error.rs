use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SlypressError {
    #[error("Failed to parse slypress.toml")]
    #[diagnostic(help("Check the TOML syntax in your slypress.toml file"))]
    ConfigParse {
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to parse mock data at {path}")]
    #[diagnostic(help("Check the JSON syntax in the mock file"))]
    MockParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Mock data at {path} is not a JSON object")]
    #[diagnostic(help("The mock file must contain a top-level JSON object"))]
    MockNotObject { path: PathBuf },

    #[error("Template compilation failed")]
    #[diagnostic(help("Check the ${{...}} expression syntax in the template"))]
    Compile {
        #[source]
        source: tera::Error,
    },

    #[error("Unterminated ${{ expression at byte {offset}")]
    #[diagnostic(help("Every ${{ must be closed with a matching }}"))]
    UnterminatedExpression { offset: usize },

    #[error("Template execution failed")]
    Render {
        #[source]
        source: tera::Error,
    },

    #[error("Cannot resolve resource {path}")]
    #[diagnostic(help("The referenced template must exist in the target tree"))]
    ResourceUnresolved {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Resource inclusions nested deeper than {limit} levels")]
    #[diagnostic(help("Check for resources that include each other"))]
    ResourceDepth { limit: usize },

    #[error("Include cycle detected: {path} was recompiled more than {limit} times")]
    #[diagnostic(help("Check for self-referential or mutually-referential includes"))]
    CycleDetected { path: PathBuf, limit: u32 },

    #[error("Directive rewriting did not settle for {path}")]
    #[diagnostic(help("Check for include directives that expand into further includes"))]
    RewriteLimit { path: PathBuf },

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Glob pattern error: {pattern}")]
    GlobPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

pub type Result<T> = std::result::Result<T, SlypressError>;
