//! emx-gherkin: a line-oriented Gherkin interpreter
//!
//! Parses feature documents (features, scenarios, scenario outlines with
//! examples, backgrounds and step tables) and runs each scenario's steps
//! against regex-matched step definitions, producing a pass / fail /
//! pending / skipped / undefined report.
//!
//! # Feature Syntax
//!
//! ```text
//! Feature: Cucumbers
//!   Background:
//!     Given a basket
//!
//!   Scenario: eating
//!     Given there are 12 cucumbers
//!     When I eat 5 cucumbers
//!     Then I should have 7 cucumbers
//!
//!   Scenario Outline: eating many
//!     Given there are <start> cucumbers
//!     Then I should have <left> cucumbers
//!   Examples:
//!     | start | left |
//!     | 12    | 7    |
//!
//!   Scenario: people
//!     Given these people
//!       | name | email       |
//!       | Bob  | bob@bob.com |
//! ```
//!
//! # Step outcomes
//!
//! | Outcome | Meaning |
//! |---------|---------|
//! | passed | Handler returned `Ok` without writing diagnostics |
//! | failed | Handler wrote to its error buffer |
//! | pending | Handler returned [`pending()`]; the rest of the scenario is skipped |
//! | skipped | Not run because an earlier step went pending |
//! | undefined | No step definition matched |
//!
//! Any other handler error aborts the run.
//!
//! # Example
//!
//! ```rust
//! use emx_gherkin::Engine;
//!
//! let mut engine = Engine::new();
//! engine.given(r"^there are (\d+) cucumbers$", |w| {
//!     let n: u32 = w.capture()?.parse().map_err(|e| format!("{}", e))?;
//!     w.check_eq(n, 12);
//!     Ok(())
//! }).unwrap();
//!
//! let report = engine.execute("Scenario: x\n  Given there are 12 cucumbers").unwrap();
//! assert_eq!(report.passed_steps, 1);
//! ```

mod engine;
mod error;
pub mod logging;
mod model;
mod parser;
mod registry;
mod report;
mod runner;

pub use engine::{Engine, Hook};
pub use error::{pending, ErrorKind, FeatureError};
pub use model::{
    parse_feature, substitute, Feature, Scenario, ScenarioNode, ScenarioOutline, Step, StepStatus,
    TableRow,
};
pub use parser::{classify_line, parse_step, parse_table_row, LineKind, StepLine};
pub use registry::{Invocation, StepDef, StepHandler, StepRegistry, World};
pub use report::Report;
pub use runner::{FeatureResult, FeatureRunner, FeatureRunnerBuilder, RunConfig, RunResult};

// Convenience functions for cargo test integration
pub use runner::{run, run_and_assert, run_and_assert_with};
