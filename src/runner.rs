//! Feature runner
//!
//! Discovers `.feature` files in a directory, runs each one through an
//! [`Engine`], and collects per-file reports.

use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::engine::Engine;
use crate::report::Report;

/// Configuration for the feature runner
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory containing feature files, or a single feature file
    pub dir: PathBuf,
    /// Only run files whose name contains this string
    pub filter: Option<String>,
    /// File extensions to scan (default: [".feature"])
    pub extensions: Vec<String>,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Capture the per-step trace of each file
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("features"),
            filter: None,
            extensions: vec![".feature".into()],
            recursive: false,
            verbose: false,
        }
    }
}

/// Result of running all feature files
#[derive(Debug)]
pub struct RunResult {
    /// Individual feature results
    pub features: Vec<FeatureResult>,
    /// Total duration
    pub duration: Duration,
}

impl RunResult {
    /// Sum of every file's report
    pub fn total(&self) -> Report {
        self.features.iter().map(|f| f.report).sum()
    }

    /// No file errored and no step failed or was undefined
    pub fn all_passed(&self) -> bool {
        self.features.iter().all(|f| f.passed())
    }

    /// Count files that errored or had failing steps
    pub fn failed_count(&self) -> usize {
        self.features.iter().filter(|f| !f.passed()).count()
    }

    /// Format a summary line
    pub fn summary(&self) -> String {
        format!(
            "{} feature(s), {} ({}ms)",
            self.features.len(),
            self.total(),
            self.duration.as_millis(),
        )
    }
}

/// Result of a single feature file
#[derive(Debug)]
pub struct FeatureResult {
    /// File name without extension
    pub name: String,
    /// Source file path
    pub file: PathBuf,
    /// Step counts for the file; all zero when the run aborted
    pub report: Report,
    /// Fatal error that aborted this file, if any
    pub error: Option<String>,
    /// Trace output (only captured in verbose mode)
    pub trace: String,
    /// Duration
    pub duration: Duration,
}

impl FeatureResult {
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.report.is_success()
    }
}

/// Trace sink shared between the engine and the runner
#[derive(Clone, Default)]
struct TraceBuf(Rc<RefCell<Vec<u8>>>);

impl TraceBuf {
    fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.0.borrow_mut());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for TraceBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// The feature runner
pub struct FeatureRunner {
    engine: Engine,
    config: RunConfig,
}

impl FeatureRunner {
    /// Create a new runner with an empty engine
    pub fn new(config: RunConfig) -> Self {
        Self {
            engine: Engine::new(),
            config,
        }
    }

    /// Create a new runner with a custom engine
    pub fn with_engine(engine: Engine, config: RunConfig) -> Self {
        Self { engine, config }
    }

    /// Get mutable reference to the engine (for registering step definitions)
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Discover feature files in the configured directory
    pub fn discover(&self) -> Result<Vec<PathBuf>, std::io::Error> {
        let mut files = Vec::new();
        let dir = &self.config.dir;

        if !dir.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("feature directory not found: {}", dir.display()),
            ));
        }

        if dir.is_file() {
            files.push(dir.clone());
            return Ok(files);
        }

        self.scan_dir(dir, &mut files)?;

        files.sort();
        Ok(files)
    }

    fn scan_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), std::io::Error> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                if self.config.recursive {
                    self.scan_dir(&path, files)?;
                }
            } else if self.is_feature_file(&path) {
                if let Some(ref filter) = self.config.filter {
                    let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
                    if !name.contains(filter.as_str()) {
                        continue;
                    }
                }
                files.push(path);
            }
        }
        Ok(())
    }

    fn is_feature_file(&self, path: &Path) -> bool {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            self.config.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
        } else {
            false
        }
    }

    /// Run all discovered feature files
    pub fn run_all(&mut self) -> Result<RunResult, std::io::Error> {
        let start = Instant::now();
        let files = self.discover()?;

        let mut features = Vec::new();
        for file in &files {
            features.push(self.run_one(file));
        }

        Ok(RunResult {
            features,
            duration: start.elapsed(),
        })
    }

    /// Run a single feature file
    pub fn run_one(&mut self, file: &Path) -> FeatureResult {
        let start = Instant::now();
        let name = file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        let filename = file.to_string_lossy().to_string();

        let trace = TraceBuf::default();
        if self.config.verbose {
            self.engine.set_output(trace.clone());
        }

        let (report, error) = match std::fs::read_to_string(file) {
            Ok(text) => match self.engine.execute_named(&text, &filename) {
                Ok(report) => (report, None),
                Err(e) => (Report::default(), Some(e.to_string())),
            },
            Err(e) => (Report::default(), Some(format!("failed to read file: {}", e))),
        };

        if self.config.verbose {
            self.engine.clear_output();
        }

        match error {
            Some(ref e) => tracing::info!(file = %filename, error = %e, "feature aborted"),
            None => tracing::info!(file = %filename, %report, "feature finished"),
        }

        FeatureResult {
            name,
            file: file.to_path_buf(),
            report,
            error,
            trace: trace.take(),
            duration: start.elapsed(),
        }
    }
}

/// Builder API for convenient runner construction
pub struct FeatureRunnerBuilder {
    config: RunConfig,
    engine: Option<Engine>,
}

impl FeatureRunnerBuilder {
    /// Start building a runner for the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            config: RunConfig {
                dir: dir.into(),
                ..Default::default()
            },
            engine: None,
        }
    }

    /// Set the file name filter
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.config.filter = Some(filter.into());
        self
    }

    /// Descend into subdirectories
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.config.recursive = recursive;
        self
    }

    /// Capture per-step traces
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Set file extensions to scan
    pub fn extensions(mut self, exts: Vec<String>) -> Self {
        self.config.extensions = exts;
        self
    }

    /// Use a custom engine
    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Build and return the runner
    pub fn build(self) -> FeatureRunner {
        match self.engine {
            Some(engine) => FeatureRunner::with_engine(engine, self.config),
            None => FeatureRunner::new(self.config),
        }
    }

    /// Build and run all feature files
    pub fn run(self) -> Result<RunResult, std::io::Error> {
        self.build().run_all()
    }
}

/// Convenience function: create a runner builder for a directory
pub fn run(dir: impl Into<PathBuf>) -> FeatureRunnerBuilder {
    FeatureRunnerBuilder::new(dir)
}

/// Run feature files and integrate with `#[test]` by panicking on failure.
///
/// Usage in cargo tests:
/// ```rust,ignore
/// #[test]
/// fn features() {
///     emx_gherkin::run_and_assert_with("tests/features", |engine| {
///         engine.given("^a user$", |_| Ok(())).unwrap();
///     });
/// }
/// ```
pub fn run_and_assert(dir: impl Into<PathBuf>) {
    run_and_assert_with(dir, |_| {});
}

/// Like `run_and_assert` but allows registering step definitions.
pub fn run_and_assert_with(dir: impl Into<PathBuf>, customize: impl FnOnce(&mut Engine)) {
    let mut engine = Engine::new();
    customize(&mut engine);

    let config = RunConfig {
        dir: dir.into(),
        verbose: std::env::var("EMX_GHERKIN_VERBOSE").is_ok(),
        ..Default::default()
    };

    let mut runner = FeatureRunner::with_engine(engine, config);
    let result = runner.run_all().expect("failed to run features");

    for feature in &result.features {
        if feature.passed() {
            eprintln!("PASS  {} ({}ms)", feature.name, feature.duration.as_millis());
        } else {
            eprintln!("FAIL  {}", feature.name);
            if let Some(ref err) = feature.error {
                eprintln!("  {}", err);
            }
            eprintln!("  {}", feature.report);
        }
        if !feature.trace.is_empty() {
            for line in feature.trace.lines() {
                eprintln!("  {}", line);
            }
        }
    }

    eprintln!("\n{}", result.summary());

    if !result.all_passed() {
        panic!("{} feature(s) failed", result.failed_count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn test_discover_top_level_only_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "b.feature", "");
        write(tmp.path(), "a.feature", "");
        write(tmp.path(), "notes.txt", "");
        fs::create_dir(tmp.path().join("nested")).unwrap();
        write(&tmp.path().join("nested"), "c.feature", "");

        let runner = run(tmp.path()).build();
        let names: Vec<String> = runner
            .discover()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.feature", "b.feature"]);

        let runner = run(tmp.path()).recursive(true).build();
        assert_eq!(runner.discover().unwrap().len(), 3);
    }

    #[test]
    fn test_discover_filter_and_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "login.feature", "");
        write(tmp.path(), "logout.feature", "");
        let runner = run(tmp.path()).filter("logout").build();
        assert_eq!(runner.discover().unwrap().len(), 1);

        let missing = run(tmp.path().join("nope")).build();
        assert!(missing.discover().is_err());
    }

    #[test]
    fn test_fatal_file_does_not_stop_others() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "bad.feature", "Scenario:\n  Given x\n  |a|b|\n  |1|\n");
        write(tmp.path(), "good.feature", "Scenario:\n  Given x\n");

        let mut engine = Engine::new();
        engine.given("^x$", |_| Ok(())).unwrap();
        let result = run(tmp.path()).engine(engine).verbose(true).run().unwrap();

        assert_eq!(result.features.len(), 2);
        let bad = &result.features[0];
        assert!(bad.error.as_deref().unwrap().contains("expected 2 fields but found 1"));
        assert_eq!(bad.report, Report::default());
        let good = &result.features[1];
        assert!(good.passed());
        assert_eq!(good.trace, "Scenario:\n        - Given x\n");
        assert_eq!(result.total().passed_steps, 1);
        assert_eq!(result.failed_count(), 1);
        assert!(!result.all_passed());
    }
}
