use std::path::{Path, PathBuf};

use regex_lite::Regex;
use tera::{Context, Tera};

use crate::error::{Result, SlypressError};
use crate::mock::MockContext;

/// Maximum nesting of resource inclusions during a single execution.
const RESOURCE_DEPTH_LIMIT: usize = 16;

/// Output of executing a compiled unit.
pub struct RenderOutput {
    pub body: String,
}

/// A template compiled into an executable form.
pub trait CompiledUnit {
    /// Execute with a data context, producing the rendered body.
    fn run(&self, context: &MockContext) -> Result<RenderOutput>;
}

/// Compiles template text into an executable unit.
pub trait Engine {
    fn compile(&self, text: &str) -> Result<Box<dyn CompiledUnit>>;
}

/// The default engine: `${ expr }` expressions are evaluated through Tera
/// against the mock context, and empty elements carrying a resolvable
/// resource attribute are replaced by the rendered body of the referenced
/// file.
#[derive(Default)]
pub struct TeraEngine;

impl Engine for TeraEngine {
    fn compile(&self, text: &str) -> Result<Box<dyn CompiledUnit>> {
        let segments = parse_segments(text)?;

        // surface expression syntax errors at compile time, not mid-render
        for segment in &segments {
            if let Segment::Expr(expr) = segment {
                let mut tera = Tera::default();
                tera.add_raw_template("__expr__", &expr_template(expr))
                    .map_err(|e| SlypressError::Compile { source: e })?;
            }
        }

        Ok(Box::new(TeraUnit { segments }))
    }
}

struct TeraUnit {
    segments: Vec<Segment>,
}

impl CompiledUnit for TeraUnit {
    fn run(&self, context: &MockContext) -> Result<RenderOutput> {
        let tera_context = build_tera_context(context);
        let body = render_segments(&self.segments, &tera_context)?;
        let body = resolve_resources(&body, &tera_context, 1)?;
        Ok(RenderOutput { body })
    }
}

enum Segment {
    Literal(String),
    Expr(String),
}

/// Split template text into literal runs and `${ ... }` expressions. An
/// `@ options` suffix inside the expression belongs to the engine, not the
/// expression, and is dropped.
fn parse_segments(text: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut rest = text;
    let mut consumed = 0;

    while let Some(start) = rest.find("${") {
        let Some(end_rel) = rest[start + 2..].find('}') else {
            return Err(SlypressError::UnterminatedExpression {
                offset: consumed + start,
            });
        };
        let end = start + 2 + end_rel;

        if start > 0 {
            segments.push(Segment::Literal(rest[..start].to_string()));
        }

        let raw = &rest[start + 2..end];
        let expr = match raw.find('@') {
            Some(at) => &raw[..at],
            None => raw,
        };
        segments.push(Segment::Expr(expr.trim().to_string()));

        consumed += end + 1;
        rest = &rest[end + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }

    Ok(segments)
}

fn expr_template(expr: &str) -> String {
    format!("{{{{ {expr} }}}}")
}

fn render_segments(segments: &[Segment], context: &Context) -> Result<String> {
    let mut body = String::new();

    for segment in segments {
        match segment {
            Segment::Literal(text) => body.push_str(text),
            Segment::Expr(expr) => {
                let mut tera = Tera::default();
                tera.add_raw_template("__expr__", &expr_template(expr))
                    .map_err(|e| SlypressError::Compile { source: e })?;
                let rendered = tera
                    .render("__expr__", context)
                    .map_err(|e| SlypressError::Render { source: e })?;
                body.push_str(&rendered);
            }
        }
    }

    Ok(body)
}

/// Build a Tera context by inserting each top-level mock key.
pub fn build_tera_context(context: &MockContext) -> Context {
    let mut tera_context = Context::new();
    for (key, value) in context {
        tera_context.insert(key, value);
    }
    tera_context
}

/// Replace each empty resource element with the rendered body of the file it
/// references. Included files may include further resources, bounded by
/// depth.
fn resolve_resources(body: &str, context: &Context, depth: usize) -> Result<String> {
    if depth > RESOURCE_DEPTH_LIMIT {
        return Err(SlypressError::ResourceDepth {
            limit: RESOURCE_DEPTH_LIMIT,
        });
    }

    let re = Regex::new(
        r#"<(?:div|sly)\s[^>]*data-sly-resource="([^"$][^"]*)"[^>]*>\s*</(?:div|sly)>"#,
    )
    .expect("valid regex");

    let mut current = body.to_string();
    while let Some(caps) = re.captures(&current) {
        let element = caps.get(0).expect("matched element");
        let path = PathBuf::from(caps.get(1).expect("resource path").as_str());

        let rendered = render_resource(&path, context, depth)?;
        let range = element.start()..element.end();
        current.replace_range(range, &rendered);
    }

    Ok(current)
}

fn render_resource(path: &Path, context: &Context, depth: usize) -> Result<String> {
    let text = std::fs::read_to_string(path).map_err(|e| SlypressError::ResourceUnresolved {
        path: path.to_path_buf(),
        source: e,
    })?;

    let segments = parse_segments(&text)?;
    let rendered = render_segments(&segments, context)?;
    resolve_resources(&rendered, context, depth + 1)
}
