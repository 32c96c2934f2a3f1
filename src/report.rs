//! Run report
//!
//! Field-wise counters summed across scenarios. Addition is associative and
//! commutative, so per-scenario reports can be folded in any order.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use crate::model::StepStatus;

/// Aggregate counts for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    pub scenario_count: usize,
    pub passed_steps: usize,
    pub failed_steps: usize,
    pub pending_steps: usize,
    pub skipped_steps: usize,
    pub undefined_steps: usize,
}

impl Report {
    /// The zero report
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one step outcome
    pub fn record(&mut self, status: StepStatus) {
        match status {
            StepStatus::Passed => self.passed_steps += 1,
            StepStatus::Failed => self.failed_steps += 1,
            StepStatus::Pending => self.pending_steps += 1,
            StepStatus::Skipped => self.skipped_steps += 1,
            StepStatus::Undefined => self.undefined_steps += 1,
        }
    }

    pub fn total_steps(&self) -> usize {
        self.passed_steps
            + self.failed_steps
            + self.pending_steps
            + self.skipped_steps
            + self.undefined_steps
    }

    /// True when no step failed and every step had a definition
    pub fn is_success(&self) -> bool {
        self.failed_steps == 0 && self.undefined_steps == 0
    }
}

impl Add for Report {
    type Output = Report;

    fn add(self, rhs: Report) -> Report {
        Report {
            scenario_count: self.scenario_count + rhs.scenario_count,
            passed_steps: self.passed_steps + rhs.passed_steps,
            failed_steps: self.failed_steps + rhs.failed_steps,
            pending_steps: self.pending_steps + rhs.pending_steps,
            skipped_steps: self.skipped_steps + rhs.skipped_steps,
            undefined_steps: self.undefined_steps + rhs.undefined_steps,
        }
    }
}

impl AddAssign for Report {
    fn add_assign(&mut self, rhs: Report) {
        *self = *self + rhs;
    }
}

impl Sum for Report {
    fn sum<I: Iterator<Item = Report>>(iter: I) -> Report {
        iter.fold(Report::default(), Add::add)
    }
}

impl<'a> Sum<&'a Report> for Report {
    fn sum<I: Iterator<Item = &'a Report>>(iter: I) -> Report {
        iter.copied().sum()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scenario(s), {} step(s): {} passed, {} failed, {} pending, {} skipped, {} undefined",
            self.scenario_count,
            self.total_steps(),
            self.passed_steps,
            self.failed_steps,
            self.pending_steps,
            self.skipped_steps,
            self.undefined_steps,
        )
    }
}
