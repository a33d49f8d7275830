// tests/saga_execution_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::sync::Arc;
use vanik_saga::{ContextData, Saga, SagaError, SagaOutcome, StepControl};

#[tokio::test]
#[serial]
async fn steps_run_in_declared_order() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new(&[("load", false, None), ("claim", false, None), ("record", false, None)]);
  saga.on_step("load", recording_handler("load"));
  saga.on_step("claim", recording_handler("claim"));
  saga.on_step("record", recording_handler("record"));

  let ctx = ContextData::new(TestContext::default());
  let outcome = saga.run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, SagaOutcome::Completed);
  assert_eq!(trail(&ctx), vec!["load", "claim", "record"]);
  assert_eq!(ctx.read().counter, 3);
}

#[tokio::test]
#[serial]
async fn before_on_after_phases_run_in_sequence() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new(&[("only", false, None)]);
  saga.after_step("only", recording_handler("after"));
  saga.on_step("only", recording_handler("on_1"));
  saga.before_step("only", recording_handler("before"));
  saga.on_step("only", recording_handler("on_2"));

  let ctx = ContextData::new(TestContext::default());
  saga.run(ctx.clone()).await.unwrap();

  assert_eq!(trail(&ctx), vec!["before", "on_1", "on_2", "after"]);
}

#[tokio::test]
#[serial]
async fn halt_stops_remaining_handlers_and_steps() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new(&[("first", false, None), ("second", false, None)]);
  saga.on_step("first", recording_handler("first"));
  saga.after_step("first", recording_handler("first_after"));
  saga.on_step("second", recording_handler("second"));

  let ctx = ContextData::new(TestContext {
    halt_at: Some("first".to_string()),
    ..Default::default()
  });
  let outcome = saga.run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, SagaOutcome::Halted);
  assert_eq!(trail(&ctx), vec!["first"]);
}

#[tokio::test]
#[serial]
async fn handler_error_is_returned_unchanged() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new(&[("ok", false, None), ("boom", false, None), ("never", false, None)]);
  saga.on_step("ok", recording_handler("ok"));
  saga.on_step("boom", failing_handler("boom", "disk on fire"));
  saga.on_step("never", recording_handler("never"));

  let ctx = ContextData::new(TestContext::default());
  let err = saga.run(ctx.clone()).await.unwrap_err();

  assert_eq!(err, TestError::Handler("disk on fire".to_string()));
  assert_eq!(trail(&ctx), vec!["ok", "boom"]);
}

#[tokio::test]
#[serial]
async fn skip_condition_bypasses_step() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new(&[
    ("always", false, None),
    (
      "conditional",
      false,
      Some(Arc::new(|ctx: ContextData<TestContext>| ctx.read().counter > 0)),
    ),
  ]);
  saga.on_step("always", recording_handler("always"));
  saga.on_step("conditional", recording_handler("conditional"));

  let ctx = ContextData::new(TestContext::default());
  saga.run(ctx.clone()).await.unwrap();

  assert_eq!(trail(&ctx), vec!["always"]);
}

#[tokio::test]
#[serial]
async fn required_step_without_handlers_fails() {
  setup_tracing();
  let saga = Saga::<TestContext, TestError>::new(&[("missing", false, None)]);

  let err = saga.run(ContextData::new(TestContext::default())).await.unwrap_err();

  match err {
    TestError::Saga(s) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("missing"));
    }
    other => panic!("expected engine error, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn optional_step_without_handlers_is_passed_over() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new(&[("maybe", true, None), ("real", false, None)]);
  saga.on_step("real", recording_handler("real"));

  let ctx = ContextData::new(TestContext::default());
  let outcome = saga.run(ctx.clone()).await.unwrap();

  assert_eq!(outcome, SagaOutcome::Completed);
  assert_eq!(trail(&ctx), vec!["real"]);
}

#[tokio::test]
#[serial]
async fn set_optional_and_skip_condition_after_construction() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new(&[("a", false, None), ("b", false, None)]);
  saga.on_step("a", recording_handler("a"));
  saga.set_optional("b", true);

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(saga.run(ctx.clone()).await.unwrap(), SagaOutcome::Completed);

  saga.on_step("b", recording_handler("b"));
  saga.set_skip_condition("b", Some(Arc::new(|ctx: ContextData<TestContext>| ctx.read().skip_optional)));

  let skipping = ContextData::new(TestContext {
    skip_optional: true,
    ..Default::default()
  });
  saga.run(skipping.clone()).await.unwrap();
  assert_eq!(trail(&skipping), vec!["a"]);
}

#[tokio::test]
#[serial]
async fn saga_with_engine_error_type() {
  setup_tracing();
  let mut saga = Saga::<TestContext, SagaError>::new(&[("task", false, None)]);
  saga.on_step("task", |_ctx: ContextData<TestContext>| async move {
    Err::<StepControl, anyhow::Error>(anyhow::anyhow!("upstream said no"))
  });

  let err = saga.run(ContextData::new(TestContext::default())).await.unwrap_err();
  match err {
    SagaError::HandlerError { source } => assert_eq!(source.to_string(), "upstream said no"),
    other => panic!("expected HandlerError, got {:?}", other),
  }
}

#[test]
#[should_panic(expected = "step 'ghost' is not defined")]
fn wiring_unknown_step_panics() {
  let mut saga = Saga::<TestContext, TestError>::new(&[("real", false, None)]);
  saga.on_step("ghost", recording_handler("ghost"));
}
