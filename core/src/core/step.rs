// vanik-saga/src/core/step.rs

use super::ContextData;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::core::control::StepControl;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Evaluated right before a step runs; `true` skips the step entirely.
pub type SkipCondition<TData> = Arc<dyn Fn(ContextData<TData>) -> bool + Send + Sync + 'static>;

/// A forward action attached to one phase of a step.
///
/// Handlers receive their own clone of the context handle and must release
/// any lock guard before awaiting.
pub type Handler<TData, Err> =
  Box<dyn Fn(ContextData<TData>) -> BoxFuture<Result<StepControl, Err>> + Send + Sync>;

/// Undo action for a step that already finished. Failures are reported
/// through `anyhow` because they are logged, never returned to the caller.
pub type Compensator<TData> = Box<dyn Fn(ContextData<TData>) -> BoxFuture<anyhow::Result<()>> + Send + Sync>;

#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
