use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use slypress::config::BuildConfig;
use slypress::engine::{CompiledUnit, Engine, RenderOutput, TeraEngine};
use slypress::mock::MockContext;
use slypress::queue::Expander;
use slypress::{discover, expand, stage, ExpandOptions};

fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn options(source: &Path, target: &Path) -> ExpandOptions {
    ExpandOptions {
        source: source.to_string_lossy().into_owned(),
        target: target.to_string_lossy().into_owned(),
        max_passes: None,
    }
}

#[test]
fn test_only_templates_with_mock_sibling_are_expanded() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    write_file(&source.path().join("good/page.html"), "<p>${wcmmode}</p>");
    write_file(&source.path().join("good/htlmock/mock.json"), "{}");
    write_file(&source.path().join("bare/page.html"), "<p>never</p>");

    let report = expand(options(source.path(), target.path())).unwrap();

    assert_eq!(report.units_discovered, 1);
    assert!(target.path().join("good/page.html").exists());
    assert!(!target.path().join("bare/page.html").exists());
}

#[test]
fn test_plain_template_compiles_exactly_once() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    write_file(
        &source.path().join("comp/page.html"),
        "<h1>${properties.title}</h1>",
    );
    write_file(
        &source.path().join("comp/htlmock/mock.json"),
        r#"{"properties": {"title": "Hello"}}"#,
    );

    let report = expand(options(source.path(), target.path())).unwrap();

    assert_eq!(report.passes_completed, 1);
    assert!(report.failures.is_empty());

    let out = fs::read_to_string(target.path().join("comp/page.html")).unwrap();
    assert_eq!(out, "<h1>Hello</h1>");

    // one intermediate artifact for the single pass, and no second pass
    assert!(target.path().join("comp/page.html.0").exists());
    assert!(!target.path().join("comp/page.html.1").exists());
}

#[test]
fn test_include_by_name_resolves_over_two_passes() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    write_file(
        &source.path().join("comp/main.html"),
        r#"<main data-sly-include="header"></main>"#,
    );
    write_file(
        &source.path().join("comp/header.html"),
        "<header>${properties.site}</header>",
    );
    write_file(
        &source.path().join("comp/htlmock/mock.json"),
        r#"{"properties": {"site": "Acme"}}"#,
    );

    let report = expand(options(source.path(), target.path())).unwrap();

    // header once, main twice
    assert_eq!(report.passes_completed, 3);
    assert!(report.failures.is_empty());

    let main_out = fs::read_to_string(target.path().join("comp/main.html")).unwrap();
    assert!(main_out.contains("<header>Acme</header>"), "got: {main_out}");
    assert!(!main_out.contains("data-delayed-sly-resource"));
    assert!(!main_out.contains("data-sly-include"));

    // the first pass left the marker at an absolute target path
    let first_pass = fs::read_to_string(target.path().join("comp/main.html.0"))
        .or_else(|_| fs::read_to_string(target.path().join("comp/main.html.1")))
        .unwrap();
    assert!(first_pass.contains("data-delayed-sly-resource=\""));
    assert!(first_pass.contains(
        target
            .path()
            .join("comp/header.html")
            .to_string_lossy()
            .as_ref()
    ));
}

#[test]
fn test_typed_resource_resolves_against_target_root() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    write_file(&target.path().join("foo/teaser.html"), "<em>Teaser</em>");
    write_file(
        &source.path().join("comp/page.html"),
        r#"<div data-sly-resource="${'/foo' @ resourceType='myapp/teaser'}"></div>"#,
    );
    write_file(&source.path().join("comp/htlmock/mock.json"), "{}");

    let report = expand(options(source.path(), target.path())).unwrap();

    assert_eq!(report.passes_completed, 2);
    let out = fs::read_to_string(target.path().join("comp/page.html")).unwrap();
    assert!(out.contains("<em>Teaser</em>"), "got: {out}");
    assert!(!out.contains("data-delayed-sly-resource"));
}

#[test]
fn test_typed_resource_honors_mock_override() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    let custom = target.path().join("custom/override.html");
    write_file(&custom, "<b>Custom</b>");
    write_file(
        &source.path().join("comp/page.html"),
        r#"<div data-sly-resource="${'/foo' @ resourceType='whatever'}"></div>"#,
    );
    write_file(
        &source.path().join("comp/htlmock/mock.json"),
        &format!(r#"{{"resources": {{"/foo": "{}"}}}}"#, custom.display()),
    );

    let report = expand(options(source.path(), target.path())).unwrap();

    assert!(report.failures.is_empty());
    let out = fs::read_to_string(target.path().join("comp/page.html")).unwrap();
    assert!(out.contains("<b>Custom</b>"), "got: {out}");
}

#[test]
fn test_malformed_mock_skips_unit_but_run_continues() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    write_file(&source.path().join("bad/page.html"), "<p>bad</p>");
    write_file(&source.path().join("bad/htlmock/mock.json"), "{broken");
    write_file(&source.path().join("good/page.html"), "<p>${wcmmode}</p>");
    write_file(&source.path().join("good/htlmock/mock.json"), "{}");

    let report = expand(options(source.path(), target.path())).unwrap();

    assert_eq!(report.units_discovered, 2);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].path.ends_with("bad/page.html"));

    let good = fs::read_to_string(target.path().join("good/page.html")).unwrap();
    assert_eq!(good, "<p>false</p>");
}

#[test]
fn test_self_include_hits_pass_ceiling() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    write_file(
        &source.path().join("comp/main.html"),
        r#"<div data-sly-include="main"></div>"#,
    );
    write_file(&source.path().join("comp/htlmock/mock.json"), "{}");

    let mut opts = options(source.path(), target.path());
    opts.max_passes = Some(3);
    let report = expand(opts).unwrap();

    assert_eq!(report.passes_completed, 3);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].message.contains("cycle"));
}

#[test]
fn test_missing_source_root_completes_trivially() {
    let target = tempfile::tempdir().unwrap();

    let report = expand(options(
        Path::new("/nonexistent/source/tree"),
        target.path(),
    ))
    .unwrap();

    assert_eq!(report.units_discovered, 0);
    assert_eq!(report.passes_completed, 0);
    assert!(report.failures.is_empty());
}

#[test]
fn test_config_exclude_is_honored() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    write_file(
        &source.path().join("slypress.toml"),
        r#"exclude = ["vendor/**"]"#,
    );
    write_file(&source.path().join("comp/page.html"), "<p>${wcmmode}</p>");
    write_file(&source.path().join("comp/htlmock/mock.json"), "{}");
    write_file(&source.path().join("vendor/comp/page.html"), "<p>no</p>");
    write_file(&source.path().join("vendor/comp/htlmock/mock.json"), "{}");

    let report = expand(options(source.path(), target.path())).unwrap();

    assert_eq!(report.units_discovered, 1);
    assert!(!target.path().join("vendor/comp/page.html").exists());
}

// --- Sequential invariant -------------------------------------------------

struct ProbeEngine {
    inner: TeraEngine,
    active: Arc<AtomicBool>,
    overlapped: Arc<AtomicBool>,
}

struct ProbeUnit {
    inner: Box<dyn CompiledUnit>,
    active: Arc<AtomicBool>,
    overlapped: Arc<AtomicBool>,
}

impl Engine for ProbeEngine {
    fn compile(&self, text: &str) -> slypress::error::Result<Box<dyn CompiledUnit>> {
        if self.active.load(Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        let inner = self.inner.compile(text)?;
        Ok(Box::new(ProbeUnit {
            inner,
            active: Arc::clone(&self.active),
            overlapped: Arc::clone(&self.overlapped),
        }))
    }
}

impl CompiledUnit for ProbeUnit {
    fn run(&self, context: &MockContext) -> slypress::error::Result<RenderOutput> {
        if self.active.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        let result = self.inner.run(context);
        self.active.store(false, Ordering::SeqCst);
        result
    }
}

#[test]
fn test_cycles_never_overlap() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    write_file(
        &source.path().join("comp/main.html"),
        r#"<main data-sly-include="header"></main>"#,
    );
    write_file(&source.path().join("comp/header.html"), "<header></header>");
    write_file(&source.path().join("comp/htlmock/mock.json"), "{}");

    let config = BuildConfig::default();
    let units = discover::find_templates(source.path(), &config).unwrap();
    let staged = stage::stage_units(&units, source.path(), target.path()).unwrap();

    let overlapped = Arc::new(AtomicBool::new(false));
    let probe = ProbeEngine {
        inner: TeraEngine,
        active: Arc::new(AtomicBool::new(false)),
        overlapped: Arc::clone(&overlapped),
    };

    let mut expander = Expander::new(&config, &probe, target.path());
    for path in staged {
        expander.enqueue(path);
    }
    let outcome = expander.drain();

    assert_eq!(outcome.passes_completed, 3);
    assert!(outcome.failures.is_empty());
    assert!(!overlapped.load(Ordering::SeqCst));
}
