//! Feature engine
//!
//! The Engine holds the step registry, the per-scenario setup and teardown
//! hooks, and an optional trace sink. One engine can run many documents;
//! there is no global default instance.

use std::io::Write;

use crate::error::FeatureError;
use crate::model::{parse_feature, Feature, Scenario, Step, StepStatus};
use crate::registry::{StepRegistry, World};
use crate::report::Report;

/// A zero-argument setup or teardown hook
pub type Hook = Box<dyn Fn()>;

/// Runs feature documents against registered step definitions
#[derive(Default)]
pub struct Engine {
    registry: StepRegistry,
    setup: Option<Hook>,
    teardown: Option<Hook>,
    output: Option<Box<dyn Write>>,
}

impl Engine {
    /// Create an engine with no step definitions and no trace sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step definition. First match wins, in registration order.
    pub fn register_step<F>(&mut self, pattern: &str, handler: F) -> Result<(), FeatureError>
    where
        F: Fn(&mut World<'_>) -> Result<(), FeatureError> + 'static,
    {
        self.registry.register(pattern, handler)
    }

    pub fn given<F>(&mut self, pattern: &str, handler: F) -> Result<(), FeatureError>
    where
        F: Fn(&mut World<'_>) -> Result<(), FeatureError> + 'static,
    {
        self.register_step(pattern, handler)
    }

    pub fn when<F>(&mut self, pattern: &str, handler: F) -> Result<(), FeatureError>
    where
        F: Fn(&mut World<'_>) -> Result<(), FeatureError> + 'static,
    {
        self.register_step(pattern, handler)
    }

    pub fn then<F>(&mut self, pattern: &str, handler: F) -> Result<(), FeatureError>
    where
        F: Fn(&mut World<'_>) -> Result<(), FeatureError> + 'static,
    {
        self.register_step(pattern, handler)
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Called at the start of every scenario, before the background
    pub fn set_setup(&mut self, setup: impl Fn() + 'static) {
        self.setup = Some(Box::new(setup));
    }

    /// Called at the end of every scenario, whatever its outcome
    pub fn set_teardown(&mut self, teardown: impl Fn() + 'static) {
        self.teardown = Some(Box::new(teardown));
    }

    /// Send per-step trace lines to `output`
    pub fn set_output(&mut self, output: impl Write + 'static) {
        self.output = Some(Box::new(output));
    }

    /// Stop emitting trace lines
    pub fn clear_output(&mut self) {
        self.output = None;
    }

    /// Parse and run one feature document.
    ///
    /// Parse errors are raised before any step runs. Pending, failed and
    /// undefined steps are counted in the report; any other handler error
    /// aborts the run.
    pub fn execute(&mut self, text: &str) -> Result<Report, FeatureError> {
        let mut feature = parse_feature(text)?;
        self.run_feature(&mut feature)
    }

    /// Like [`Engine::execute`], tagging errors with `filename`
    pub fn execute_named(&mut self, text: &str, filename: &str) -> Result<Report, FeatureError> {
        self.execute(text).map_err(|e| e.with_file(filename))
    }

    /// Run every scenario of a parsed feature, recording outcomes on its steps
    pub fn run_feature(&mut self, feature: &mut Feature) -> Result<Report, FeatureError> {
        let mut report = Report::new();
        let background = feature.background.clone();
        for scenario in &mut feature.scenarios {
            report += self.run_scenario(scenario, background.as_ref())?;
        }
        tracing::debug!(%report, "feature finished");
        Ok(report)
    }

    /// Run one scenario: setup, background replay, own steps, teardown.
    pub fn run_scenario(
        &mut self,
        scenario: &mut Scenario,
        background: Option<&Scenario>,
    ) -> Result<Report, FeatureError> {
        let _span = tracing::debug_span!("scenario", heading = %scenario.heading).entered();
        let mut report = Report {
            scenario_count: 1,
            ..Report::default()
        };

        if let Some(ref setup) = self.setup {
            setup();
        }
        let result = self.run_steps(scenario, background, &mut report);
        if let Some(ref teardown) = self.teardown {
            teardown();
        }

        result?;
        Ok(report)
    }

    fn run_steps(
        &mut self,
        scenario: &mut Scenario,
        background: Option<&Scenario>,
        report: &mut Report,
    ) -> Result<(), FeatureError> {
        let mut pending = false;

        // Background steps all run; a pending one makes this scenario pending.
        if let Some(bg) = background {
            let mut bg = bg.clone();
            self.trace(&bg.heading)?;
            for step in &mut bg.steps {
                let status = self.run_step(step)?;
                pending |= status == StepStatus::Pending;
                report.record(status);
                self.trace_step(step, status)?;
            }
        }

        self.trace(&scenario.heading)?;
        for step in &mut scenario.steps {
            let status = if pending {
                step.status = Some(StepStatus::Skipped);
                StepStatus::Skipped
            } else {
                self.run_step(step)?
            };
            pending |= status == StepStatus::Pending;
            report.record(status);
            self.trace_step(step, status)?;
        }
        Ok(())
    }

    /// Dispatch a single step and record its outcome on it.
    fn run_step(&mut self, step: &mut Step) -> Result<StepStatus, FeatureError> {
        step.errors.clear();
        let status = match self.registry.dispatch(&step.text, &step.table) {
            None => {
                step.errors = format!("Could not find step definition for \"{}\"\n", step.orig);
                StepStatus::Undefined
            }
            Some(invocation) => {
                step.errors.push_str(&invocation.errors);
                match invocation.result {
                    Err(e) if e.is_pending() => StepStatus::Pending,
                    Err(e) => {
                        tracing::debug!(step = %step.text, error = %e, "step aborted the run");
                        return Err(if e.line.is_none() { e.with_line(step.line) } else { e });
                    }
                    Ok(()) if invocation.failed => StepStatus::Failed,
                    Ok(()) => StepStatus::Passed,
                }
            }
        };
        tracing::debug!(step = %step.text, %status, "step finished");
        step.status = Some(status);
        Ok(status)
    }

    fn trace(&mut self, line: &str) -> Result<(), FeatureError> {
        if let Some(ref mut out) = self.output {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }

    fn trace_step(&mut self, step: &Step, status: StepStatus) -> Result<(), FeatureError> {
        let Some(ref mut out) = self.output else {
            return Ok(());
        };
        match status {
            StepStatus::Pending => writeln!(out, "PENDING - {}", step.orig)?,
            StepStatus::Skipped => writeln!(out, "Skipped - {}", step.orig)?,
            _ => writeln!(out, "        - {}", step.orig)?,
        }
        if !step.errors.is_empty() {
            write!(out, "{}", step.errors)?;
            if !step.errors.ends_with('\n') {
                writeln!(out)?;
            }
        }
        Ok(())
    }
}
