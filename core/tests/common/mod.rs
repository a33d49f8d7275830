// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::Level;
use vanik_saga::{Compensator, ContextData, Handler, SagaError, StepControl};

#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  /// Forward handlers push `name`, compensators push `undo:name`.
  pub trail: Vec<String>,
  pub halt_at: Option<String>,
  pub skip_optional: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("saga engine error: {0}")]
  Saga(String),

  #[error("test handler failed: {0}")]
  Handler(String),
}

impl From<SagaError> for TestError {
  fn from(e: SagaError) -> Self {
    TestError::Saga(format!("{:?}", e))
  }
}

pub fn recording_handler(step_name: &'static str) -> Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.trail.push(step_name.to_string());
      if guard.halt_at.as_deref() == Some(step_name) {
        return Ok(StepControl::Halt);
      }
      Ok(StepControl::Continue)
    })
  })
}

pub fn failing_handler(step_name: &'static str, message: &'static str) -> Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().trail.push(step_name.to_string());
      Err(TestError::Handler(message.to_string()))
    })
  })
}

pub fn recording_compensator(step_name: &'static str) -> Compensator<TestContext> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.update(|c| {
        c.counter -= 1;
        c.trail.push(format!("undo:{}", step_name));
      });
      COMPENSATIONS.fetch_add(1, Ordering::SeqCst);
      Ok(())
    })
  })
}

pub fn failing_compensator(step_name: &'static str) -> Compensator<TestContext> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().trail.push(format!("undo-failed:{}", step_name));
      Err(anyhow::anyhow!("compensation for {} refused", step_name))
    })
  })
}

pub fn trail(ctx: &ContextData<TestContext>) -> Vec<String> {
  ctx.read().trail.clone()
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub static COMPENSATIONS: AtomicUsize = AtomicUsize::new(0);

pub fn reset_counters() {
  COMPENSATIONS.store(0, Ordering::SeqCst);
}
