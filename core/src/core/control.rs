// vanik-saga/src/core/control.rs

//! Flow signals returned by handlers and the outcome of a whole run.

/// Returned by a handler to tell the runner what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  /// Keep going with the remaining handlers and steps.
  Continue,
  /// Stop the saga here. This is a normal exit, so nothing is compensated.
  Halt,
}

/// How a run that did not error ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaOutcome {
  Completed,
  Halted,
}

impl SagaOutcome {
  pub fn is_completed(self) -> bool {
    matches!(self, SagaOutcome::Completed)
  }
}
