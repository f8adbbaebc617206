use std::path::Path;

use regex_lite::{Captures, Regex};

use crate::error::{Result, SlypressError};
use crate::mock::{resource_override, MockContext};

/// Placeholder attribute standing in for a cross-template inclusion. It is
/// promoted to the engine's native resource attribute one pass later, once
/// the referenced path physically exists in the target tree.
pub const DELAYED_RESOURCE_ATTR: &str = "data-delayed-sly-resource";

/// The engine's native resource-inclusion attribute.
pub const RESOURCE_ATTR: &str = "data-sly-resource";

/// Rounds of substitution before a non-settling rewrite is rejected.
const SETTLE_LIMIT: usize = 64;

/// Rewrite the include/resource directives in raw template text.
///
/// Include directives become a delayed-resource marker wrapped in a synthetic
/// child element, so the single-pass engine sees an independent resource
/// boundary. Markers left by a prior pass are promoted to the native
/// attribute, which the engine can now resolve against the target tree.
pub fn rewrite_directives(
    text: &str,
    template_path: &Path,
    target_dir: &Path,
    context: &MockContext,
    markup_ext: &str,
) -> Result<String> {
    let promoted = text.replace(DELAYED_RESOURCE_ATTR, RESOURCE_ATTR);
    let local = rewrite_local_includes(&promoted, template_path, markup_ext)?;
    let pathed = rewrite_path_includes(&local, template_path, target_dir, markup_ext)?;
    Ok(rewrite_typed_resources(&pathed, target_dir, context, markup_ext))
}

/// `data-sly-include="name"` — a bare sibling reference. Resolves against
/// the directory of the current template.
fn rewrite_local_includes(text: &str, template_path: &Path, markup_ext: &str) -> Result<String> {
    let re = Regex::new(r#"data-sly-include="([^/"]+)""#).expect("valid regex");
    let dir = template_path
        .parent()
        .expect("template path has a parent")
        .to_path_buf();

    replace_until_settled(text, &re, template_path, |caps| {
        let name = caps.get(1).expect("include name").as_str();
        delayed_element(&format!("{}/{}{}", dir.display(), name, markup_ext))
    })
}

/// `data-sly-include="some/path"` — resolves against the target root, with
/// the component file named after the final path segment.
fn rewrite_path_includes(
    text: &str,
    template_path: &Path,
    target_dir: &Path,
    markup_ext: &str,
) -> Result<String> {
    let re = Regex::new(r#"data-sly-include="([^"]*/([^/"]*))""#).expect("valid regex");

    replace_until_settled(text, &re, template_path, |caps| {
        let full = caps.get(1).expect("include path").as_str();
        let name = caps.get(2).expect("include segment").as_str();
        delayed_element(&format!(
            "{}/{}/{}{}",
            target_dir.display(),
            full.trim_matches('/'),
            name,
            markup_ext
        ))
    })
}

/// `data-sly-resource="${'path' @ resourceType='type'}"` — a type descriptor.
/// A mock `resources` override wins verbatim; otherwise the path is
/// synthesized under the target root using the type's final segment.
fn rewrite_typed_resources(
    text: &str,
    target_dir: &Path,
    context: &MockContext,
    markup_ext: &str,
) -> String {
    let re = Regex::new(
        r#"data-sly-resource="\$\{\s*'([^']+)'\s*@\s*resourceType\s*=\s*'([^']+)'\s*\}""#,
    )
    .expect("valid regex");

    re.replace_all(text, |caps: &Captures| {
        let path = caps.get(1).expect("resource path").as_str();
        let resource_type = caps.get(2).expect("resource type").as_str();

        let resolved = match resource_override(context, path) {
            Some(custom) => custom.to_string(),
            None => {
                let type_name = resource_type.rsplit('/').next().unwrap_or(resource_type);
                format!(
                    "{}/{}/{}{}",
                    target_dir.display(),
                    path.trim_matches('/'),
                    type_name,
                    markup_ext
                )
            }
        };

        format!(r#"{DELAYED_RESOURCE_ATTR}="{resolved}""#)
    })
    .into_owned()
}

/// The synthetic child element. The leading `>` closes the host tag and the
/// trailing `<sly></sly` reuses the host tag's own closer, so the directive
/// ends up on an element of its own.
fn delayed_element(resolved: &str) -> String {
    format!(r#"><div {DELAYED_RESOURCE_ATTR}="{resolved}"></div><sly></sly"#)
}

/// Apply `replacer` globally and repeatedly until the pattern no longer
/// matches, bounded so pathological input fails instead of looping.
fn replace_until_settled<F>(
    text: &str,
    re: &Regex,
    template_path: &Path,
    mut replacer: F,
) -> Result<String>
where
    F: FnMut(&Captures) -> String,
{
    let mut current = text.to_string();
    for _ in 0..SETTLE_LIMIT {
        if !re.is_match(&current) {
            return Ok(current);
        }
        current = re
            .replace_all(&current, |caps: &Captures| replacer(caps))
            .into_owned();
    }

    if re.is_match(&current) {
        return Err(SlypressError::RewriteLimit {
            path: template_path.to_path_buf(),
        });
    }
    Ok(current)
}
