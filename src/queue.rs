use std::collections::{HashMap, VecDeque};
use std::error::Error as _;
use std::path::{Path, PathBuf};
use std::time::Instant;

use console::style;

use crate::config::BuildConfig;
use crate::engine::Engine;
use crate::error::{Result, SlypressError};
use crate::mock::load_mock_context;
use crate::rewrite::{rewrite_directives, DELAYED_RESOURCE_ATTR};

/// One failed compile/render/write cycle. The run continues past these.
#[derive(Debug)]
pub struct UnitFailure {
    pub path: PathBuf,
    pub message: String,
}

/// What a fully drained queue produced.
pub struct DrainOutcome {
    pub passes_completed: usize,
    pub failures: Vec<UnitFailure>,
}

/// The expansion queue driver. Pops one pending path at a time and runs its
/// full compile/render/write cycle to completion before touching the next,
/// re-enqueueing any output that still carries a delayed-resource marker.
pub struct Expander<'a> {
    config: &'a BuildConfig,
    engine: &'a dyn Engine,
    target_dir: PathBuf,
    queue: VecDeque<PathBuf>,
    pass_counts: HashMap<PathBuf, u32>,
    artifact_counter: usize,
    passes_completed: usize,
    failures: Vec<UnitFailure>,
}

impl<'a> Expander<'a> {
    pub fn new(config: &'a BuildConfig, engine: &'a dyn Engine, target_dir: &Path) -> Self {
        Self {
            config,
            engine,
            target_dir: target_dir.to_path_buf(),
            queue: VecDeque::new(),
            pass_counts: HashMap::new(),
            artifact_counter: 0,
            passes_completed: 0,
            failures: Vec::new(),
        }
    }

    pub fn enqueue(&mut self, path: PathBuf) {
        self.queue.push_back(path);
    }

    /// Drain the queue. The run is complete exactly when the queue is empty;
    /// per-unit failures are logged and recorded, never fatal.
    pub fn drain(mut self) -> DrainOutcome {
        while let Some(path) = self.queue.pop_front() {
            let started = Instant::now();
            match self.process_unit(&path) {
                Ok(()) => {
                    self.passes_completed += 1;
                    println!(
                        "  {} {}ms",
                        style(path.display()).dim(),
                        started.elapsed().as_millis()
                    );
                }
                Err(e) => {
                    eprintln!(
                        "{} {}: {}",
                        style("error:").red().bold(),
                        path.display(),
                        render_error(&e)
                    );
                    self.failures.push(UnitFailure {
                        path: path.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        DrainOutcome {
            passes_completed: self.passes_completed,
            failures: self.failures,
        }
    }

    /// One compile/render/write pass over a single queued path.
    fn process_unit(&mut self, path: &Path) -> Result<()> {
        let passes = self.pass_counts.entry(path.to_path_buf()).or_insert(0);
        *passes += 1;
        if *passes > self.config.max_passes {
            return Err(SlypressError::CycleDetected {
                path: path.to_path_buf(),
                limit: self.config.max_passes,
            });
        }

        // recomputed fresh on every pass, never cached
        let mock_dir = path
            .parent()
            .expect("unit path has a parent")
            .join(&self.config.mock_dir);
        let context = load_mock_context(&mock_dir, &self.config.mock_file)?;

        let text = std::fs::read_to_string(path).map_err(|e| SlypressError::Io {
            context: format!("reading {}", path.display()),
            source: e,
        })?;

        let rewritten = rewrite_directives(
            &text,
            path,
            &self.target_dir,
            &context,
            &self.config.markup_ext,
        )?;

        self.write_artifact(path, &rewritten);

        let unit = self.engine.compile(&rewritten)?;
        let output = unit.run(&context)?;

        // A failed write is logged but the unit is still checked for
        // re-queue eligibility against the content we tried to write.
        if let Err(e) = write_output(path, &output.body) {
            eprintln!(
                "{} {}: {}",
                style("error:").red().bold(),
                path.display(),
                render_error(&e)
            );
            self.failures.push(UnitFailure {
                path: path.to_path_buf(),
                message: e.to_string(),
            });
        }

        if output.body.contains(DELAYED_RESOURCE_ATTR) {
            self.queue.push_back(path.to_path_buf());
        }

        Ok(())
    }

    /// Keep the rewritten source of each pass next to the template as
    /// `<path>.<n>`. Disposable; failure to write one is not a unit failure.
    fn write_artifact(&mut self, path: &Path, rewritten: &str) {
        let artifact = artifact_path(path, self.artifact_counter);
        self.artifact_counter += 1;

        if let Err(e) = std::fs::write(&artifact, rewritten) {
            eprintln!(
                "{} writing intermediate {}: {e}",
                style("warning:").yellow().bold(),
                artifact.display()
            );
        }
    }
}

fn write_output(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SlypressError::Io {
            context: format!("creating directory {}", parent.display()),
            source: e,
        })?;
    }
    std::fs::write(path, body).map_err(|e| SlypressError::Io {
        context: format!("writing {}", path.display()),
        source: e,
    })
}

fn artifact_path(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

/// Render an error with its source chain on one line.
fn render_error(error: &SlypressError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    message
}
