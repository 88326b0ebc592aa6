use std::fmt;

use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Done,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub step: &'static str,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl StepOutcome {
    pub fn done(step: &'static str) -> Self {
        Self {
            step,
            outcome: Outcome::Done,
        }
    }

    pub fn skipped(step: &'static str, reason: impl Into<String>) -> Self {
        Self {
            step,
            outcome: Outcome::Skipped(reason.into()),
        }
    }

    /// Converts a fallible step into an outcome, never propagating the error.
    pub fn from_result(step: &'static str, result: Result<Outcome>) -> Self {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("{step} failed: {e}");
                Outcome::Failed(e.to_string())
            }
        };
        Self { step, outcome }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Done => write!(f, "{}: done", self.step),
            Outcome::Skipped(reason) => write!(f, "{}: skipped ({reason})", self.step),
            Outcome::Failed(message) => write!(f, "{}: FAILED ({message})", self.step),
        }
    }
}

/// Ordered outcomes of a multi-step operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub steps: Vec<StepOutcome>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: StepOutcome) {
        self.steps.push(step);
    }

    pub fn extend(&mut self, steps: impl IntoIterator<Item = StepOutcome>) {
        self.steps.extend(steps);
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| s.is_failed())
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.step).collect()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "  {step}")?;
        }
        Ok(())
    }
}
