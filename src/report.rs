//! Per-dependency results collected over a run.
//!
//! Every dependency is processed in its own failure domain: its result is
//! recorded in a [`BatchReport`] and the run carries on (unless the caller
//! asked to stop at the first failure). The process exit status is derived
//! from the whole batch.

use crate::error::Error;

/// Outcome of processing one dependency successfully at the git level.
///
/// Some outcomes still count as failures (an apply run that ended in a
/// conflict), so success is asked of the outcome itself.
pub trait RunOutcome {
    fn succeeded(&self) -> bool {
        true
    }

    /// One-line human description.
    fn summary(&self) -> String;
}

#[derive(Debug)]
pub struct DependencyReport<T> {
    pub dependency: String,
    pub result: Result<T, Error>,
}

impl<T: RunOutcome> DependencyReport<T> {
    pub fn succeeded(&self) -> bool {
        matches!(&self.result, Ok(outcome) if outcome.succeeded())
    }

    pub fn summary(&self) -> String {
        match &self.result {
            Ok(outcome) => outcome.summary(),
            Err(e) => e.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct BatchReport<T> {
    pub reports: Vec<DependencyReport<T>>,
    /// Set when the run stopped early; dependencies after the failing one
    /// were not attempted.
    pub stopped_early: bool,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            reports: Vec::new(),
            stopped_early: false,
        }
    }
}

impl<T: RunOutcome> BatchReport<T> {
    pub fn push(&mut self, dependency: impl Into<String>, result: Result<T, Error>) {
        self.reports.push(DependencyReport {
            dependency: dependency.into(),
            result,
        });
    }

    pub fn is_success(&self) -> bool {
        self.reports.iter().all(DependencyReport::succeeded)
    }

    pub fn failures(&self) -> impl Iterator<Item = &DependencyReport<T>> {
        self.reports.iter().filter(|r| !r.succeeded())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn get(&self, dependency: &str) -> Option<&DependencyReport<T>> {
        self.reports.iter().find(|r| r.dependency == dependency)
    }

    /// 0 when every dependency succeeded, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Plain-text summary, one line per dependency.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for report in &self.reports {
            let status = if report.succeeded() { "ok" } else { "FAILED" };
            out.push_str(&format!(
                "{}: {} ({})\n",
                report.dependency,
                status,
                report.summary()
            ));
        }
        if self.stopped_early {
            out.push_str("stopped after the first failure\n");
        }
        out
    }
}
