// vanik-saga/src/saga/execution.rs

//! `Saga::run()`: forward execution and the compensation sweep.

use crate::core::context_data::ContextData;
use crate::core::control::{SagaOutcome, StepControl};
use crate::core::step::{Handler, StepDef};
use crate::error::SagaError;
use crate::saga::definition::Saga;
use tracing::{event, info_span, instrument, Instrument, Level};

enum StepRun {
  Done,
  Skipped,
  Halted,
}

impl<TData, Err> Saga<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  ///
  /// If any handler fails, compensators of the steps that already finished are
  /// invoked newest first and the handler's error is returned as is. A
  /// compensator that itself fails is logged and the sweep moves on. A handler
  /// returning [`StepControl::Halt`] ends the run without compensating.
  #[instrument(
    name = "Saga::run",
    skip_all,
    fields(
      saga_context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<SagaOutcome, Err> {
    let mut finished: Vec<&str> = Vec::with_capacity(self.steps.len());

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let span = info_span!(
        "saga_step",
        step_name = step_def.name.as_str(),
        step_index = step_idx,
        optional = step_def.optional
      );

      match self.run_step(step_def, &ctx_data).instrument(span).await {
        Ok(StepRun::Done) => finished.push(step_def.name.as_str()),
        Ok(StepRun::Skipped) => {}
        Ok(StepRun::Halted) => {
          event!(Level::INFO, step_name = %step_def.name, "Saga halted by handler.");
          return Ok(SagaOutcome::Halted);
        }
        Err(e) => {
          event!(Level::WARN, step_name = %step_def.name, error = %e, "Step failed; compensating finished steps.");
          self.compensate(&finished, &ctx_data).await;
          return Err(e);
        }
      }
    }

    event!(Level::DEBUG, "Saga completed.");
    Ok(SagaOutcome::Completed)
  }

  async fn run_step(&self, step_def: &StepDef<TData>, ctx_data: &ContextData<TData>) -> Result<StepRun, Err> {
    let step_name = step_def.name.as_str();

    if let Some(skip_if) = &step_def.skip_if {
      if skip_if(ctx_data.clone()) {
        event!(Level::DEBUG, "Step skipped by condition.");
        return Ok(StepRun::Skipped);
      }
    }

    let phases = [
      ("before", self.before.get(step_name)),
      ("on", self.on.get(step_name)),
      ("after", self.after.get(step_name)),
    ];

    if phases.iter().all(|(_, hs)| hs.map_or(true, |v| v.is_empty())) {
      if step_def.optional {
        event!(Level::DEBUG, "Optional step has no handlers.");
        return Ok(StepRun::Skipped);
      }
      event!(Level::ERROR, "Required step has no handlers.");
      return Err(Err::from(SagaError::HandlerMissing {
        step_name: step_def.name.clone(),
      }));
    }

    for (phase, handlers) in phases {
      let Some(handlers) = handlers else { continue };
      if let StepControl::Halt = Self::run_phase(phase, handlers, ctx_data).await? {
        return Ok(StepRun::Halted);
      }
    }
    Ok(StepRun::Done)
  }

  async fn run_phase(
    phase: &'static str,
    handlers: &[Handler<TData, Err>],
    ctx_data: &ContextData<TData>,
  ) -> Result<StepControl, Err> {
    for (handler_idx, handler) in handlers.iter().enumerate() {
      let span = info_span!("saga_handler", phase, handler_index = handler_idx);
      match handler(ctx_data.clone()).instrument(span).await {
        Ok(StepControl::Continue) => {}
        Ok(StepControl::Halt) => return Ok(StepControl::Halt),
        Err(e) => {
          event!(Level::ERROR, phase, error = %e, "Handler failed.");
          return Err(e);
        }
      }
    }
    Ok(StepControl::Continue)
  }

  async fn compensate(&self, finished: &[&str], ctx_data: &ContextData<TData>) {
    for step_name in finished.iter().rev() {
      let Some(compensator) = self.compensators.get(*step_name) else {
        continue;
      };
      let span = info_span!("saga_compensation", step_name = *step_name);
      match compensator(ctx_data.clone()).instrument(span).await {
        Ok(()) => event!(Level::INFO, step_name = *step_name, "Step compensated."),
        Err(e) => event!(Level::ERROR, step_name = *step_name, error = %e, "Compensation failed."),
      }
    }
  }
}
