// vanik-saga/src/saga/hooks.rs

//! Registration of forward handlers and compensators.

use crate::core::context_data::ContextData;
use crate::core::control::StepControl;
use crate::core::step::{Compensator, Handler};
use crate::error::SagaError;
use crate::saga::definition::Saga;
use std::future::Future;
use tracing::{event, Level};

#[derive(Clone, Copy, Debug)]
enum Phase {
  Before,
  On,
  After,
}

impl<TData, Err> Saga<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  #[track_caller]
  fn push_handler<F, E>(&mut self, phase: Phase, step_name: &str, handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<StepControl, E>> + Send + 'static,
    E: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler: Handler<TData, Err> = Box::new(move |ctx| {
      let fut = handler_fn(ctx);
      Box::pin(async move { fut.await.map_err(Into::into) })
    });
    let slot = match phase {
      Phase::Before => &mut self.before,
      Phase::On => &mut self.on,
      Phase::After => &mut self.after,
    };
    slot.entry(step_name.to_string()).or_default().push(handler);
    event!(Level::TRACE, %step_name, ?phase, "Handler registered.");
  }

  /// Adds a handler that runs before the step's `on` handlers.
  #[track_caller]
  pub fn before_step<F, E>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<StepControl, E>> + Send + 'static,
    E: Into<Err> + Send + Sync + 'static,
  {
    self.push_handler(Phase::Before, step_name, handler_fn);
  }

  /// Adds a main handler for the step. Multiple handlers run in registration order.
  #[track_caller]
  pub fn on_step<F, E>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<StepControl, E>> + Send + 'static,
    E: Into<Err> + Send + Sync + 'static,
  {
    self.push_handler(Phase::On, step_name, handler_fn);
  }

  #[track_caller]
  pub fn after_step<F, E>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<StepControl, E>> + Send + 'static,
    E: Into<Err> + Send + Sync + 'static,
  {
    self.push_handler(Phase::After, step_name, handler_fn);
  }

  /// Sets the undo action for a step. Only one compensator per step; a second
  /// call replaces the first.
  ///
  /// The compensator runs when a later step fails, after the step itself ran
  /// all of its phases successfully.
  #[track_caller]
  pub fn compensate_step<F>(&mut self, step_name: &str, compensator_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = anyhow::Result<()>> + Send + 'static,
  {
    self.ensure_step_exists(step_name);
    let compensator: Compensator<TData> = Box::new(move |ctx| Box::pin(compensator_fn(ctx)));
    if self.compensators.insert(step_name.to_string(), compensator).is_some() {
      event!(Level::WARN, %step_name, "Compensator replaced.");
    }
  }
}
