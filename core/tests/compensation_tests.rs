// tests/compensation_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::sync::atomic::Ordering;
use vanik_saga::{ContextData, Saga, SagaOutcome};

fn three_step_saga() -> Saga<TestContext, TestError> {
  let mut saga = Saga::<TestContext, TestError>::new(&[("reserve", false, None), ("charge", false, None), ("ship", false, None)]);
  saga.on_step("reserve", recording_handler("reserve"));
  saga.compensate_step("reserve", recording_compensator("reserve"));
  saga.on_step("charge", recording_handler("charge"));
  saga.compensate_step("charge", recording_compensator("charge"));
  saga
}

#[tokio::test]
#[serial]
async fn failure_compensates_finished_steps_newest_first() {
  setup_tracing();
  reset_counters();
  let mut saga = three_step_saga();
  saga.on_step("ship", failing_handler("ship", "carrier down"));

  let ctx = ContextData::new(TestContext::default());
  let err = saga.run(ctx.clone()).await.unwrap_err();

  assert_eq!(err, TestError::Handler("carrier down".to_string()));
  assert_eq!(trail(&ctx), vec!["reserve", "charge", "ship", "undo:charge", "undo:reserve"]);
  assert_eq!(ctx.read().counter, 0);
  assert_eq!(COMPENSATIONS.load(Ordering::SeqCst), 2);
}

#[tokio::test]
#[serial]
async fn failing_step_itself_is_not_compensated() {
  setup_tracing();
  reset_counters();
  let mut saga = Saga::<TestContext, TestError>::new(&[("reserve", false, None), ("charge", false, None)]);
  saga.on_step("reserve", recording_handler("reserve"));
  saga.compensate_step("reserve", recording_compensator("reserve"));
  saga.on_step("charge", recording_handler("charge"));
  saga.after_step("charge", failing_handler("charge_after", "receipt rejected"));
  saga.compensate_step("charge", recording_compensator("charge"));

  let ctx = ContextData::new(TestContext::default());
  saga.run(ctx.clone()).await.unwrap_err();

  assert_eq!(trail(&ctx), vec!["reserve", "charge", "charge_after", "undo:reserve"]);
}

#[tokio::test]
#[serial]
async fn halt_does_not_compensate() {
  setup_tracing();
  reset_counters();
  let mut saga = three_step_saga();
  saga.on_step("ship", recording_handler("ship"));

  let ctx = ContextData::new(TestContext {
    halt_at: Some("charge".to_string()),
    ..Default::default()
  });
  let outcome = saga.run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, SagaOutcome::Halted);
  assert_eq!(trail(&ctx), vec!["reserve", "charge"]);
  assert_eq!(COMPENSATIONS.load(Ordering::SeqCst), 0);
}

#[tokio::test]
#[serial]
async fn compensator_failure_does_not_stop_the_sweep() {
  setup_tracing();
  reset_counters();
  let mut saga = Saga::<TestContext, TestError>::new(&[("a", false, None), ("b", false, None), ("c", false, None)]);
  saga.on_step("a", recording_handler("a"));
  saga.compensate_step("a", recording_compensator("a"));
  saga.on_step("b", recording_handler("b"));
  saga.compensate_step("b", failing_compensator("b"));
  saga.on_step("c", failing_handler("c", "nope"));

  let ctx = ContextData::new(TestContext::default());
  let err = saga.run(ctx.clone()).await.unwrap_err();

  assert_eq!(err, TestError::Handler("nope".to_string()));
  assert_eq!(trail(&ctx), vec!["a", "b", "c", "undo-failed:b", "undo:a"]);
}

#[tokio::test]
#[serial]
async fn skipped_steps_are_not_compensated() {
  setup_tracing();
  reset_counters();
  let mut saga = Saga::<TestContext, TestError>::new(&[
    ("a", false, None),
    ("b", false, Some(std::sync::Arc::new(|_ctx: ContextData<TestContext>| true))),
    ("c", false, None),
  ]);
  saga.on_step("a", recording_handler("a"));
  saga.compensate_step("a", recording_compensator("a"));
  saga.on_step("b", recording_handler("b"));
  saga.compensate_step("b", recording_compensator("b"));
  saga.on_step("c", failing_handler("c", "late failure"));

  let ctx = ContextData::new(TestContext::default());
  saga.run(ctx.clone()).await.unwrap_err();

  assert_eq!(trail(&ctx), vec!["a", "c", "undo:a"]);
  assert!(saga.has_compensator("b"));
}
