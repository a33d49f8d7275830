// vanik-saga/src/registry.rs

//! `SagaRegistry<E>`: sagas keyed by the type of context they run on.
//!
//! Callers build a `ContextData<T>` and hand it to [`SagaRegistry::run`]; the
//! registry finds the saga registered for `T` and runs it, mapping both the
//! saga's error type and engine errors into the application error `E`.

use crate::core::context_data::ContextData;
use crate::core::control::SagaOutcome;
use crate::error::SagaError;
use crate::saga::Saga;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, Level};

#[async_trait]
trait ErasedSaga<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  fn name(&self) -> &'static str;
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<SagaOutcome, AppErr>;
}

struct SagaSlot<TData, SagaErr, AppErr>
where
  TData: 'static + Send + Sync,
  SagaErr: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  saga: Arc<Saga<TData, SagaErr>>,
  _app_err: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<TData, SagaErr, AppErr> ErasedSaga<AppErr> for SagaSlot<TData, SagaErr, AppErr>
where
  TData: 'static + Send + Sync,
  SagaErr: std::error::Error + From<SagaError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<SagaErr> + From<SagaError> + Send + Sync + 'static,
{
  fn name(&self) -> &'static str {
    std::any::type_name::<TData>()
  }

  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<SagaOutcome, AppErr> {
    let ctx_data = match ctx_obj.downcast::<ContextData<TData>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        let expected_type = std::any::type_name::<ContextData<TData>>().to_string();
        event!(Level::ERROR, %expected_type, "Context type mismatch in saga dispatch.");
        return Err(AppErr::from(SagaError::TypeMismatch { expected_type }));
      }
    };
    self.saga.run(ctx_data).await.map_err(AppErr::from)
  }
}

pub struct SagaRegistry<AppErr = SagaError>
where
  AppErr: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  sagas: RwLock<HashMap<TypeId, Arc<dyn ErasedSaga<AppErr>>>>,
}

impl<AppErr> Default for SagaRegistry<AppErr>
where
  AppErr: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<AppErr> SagaRegistry<AppErr>
where
  AppErr: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      sagas: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `saga` for context type `TData`, replacing any earlier one.
  pub fn register<TData, SagaErr>(&self, saga: Saga<TData, SagaErr>)
  where
    TData: 'static + Send + Sync,
    SagaErr: std::error::Error + From<SagaError> + Send + Sync + 'static,
    AppErr: From<SagaErr>,
  {
    event!(Level::DEBUG, context_type = %std::any::type_name::<TData>(), steps = ?saga.step_names(), "Registering saga.");
    let slot = SagaSlot::<TData, SagaErr, AppErr> {
      saga: Arc::new(saga),
      _app_err: PhantomData,
    };
    self.sagas.write().insert(TypeId::of::<TData>(), Arc::new(slot));
  }

  pub fn is_registered<TData: 'static>(&self) -> bool {
    self.sagas.read().contains_key(&TypeId::of::<TData>())
  }

  /// Runs the saga registered for `TData`.
  pub async fn run<TData>(&self, ctx_data: ContextData<TData>) -> Result<SagaOutcome, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    let runner = self.sagas.read().get(&TypeId::of::<TData>()).cloned();
    let Some(runner) = runner else {
      let type_name = std::any::type_name::<TData>();
      event!(Level::ERROR, context_type = %type_name, "No saga registered.");
      return Err(AppErr::from(SagaError::ConfigurationError {
        step_name: "SagaRegistry::run".to_string(),
        message: format!("no saga registered for context type {}", type_name),
      }));
    };
    event!(Level::DEBUG, saga = runner.name(), "Dispatching saga.");
    runner.run_erased(Box::new(ctx_data)).await
  }
}
