// apps/marketplace/src/state.rs

use std::sync::Arc;
use vanik_saga::SagaRegistry;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines;
use crate::realtime::ChatRelay;
use crate::services::identity::{IdentityProvider, JwtIdentityProvider};
use crate::services::ledger::ProductLedger;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn DocumentStore>,
  pub sagas: Arc<SagaRegistry<AppError>>,
  pub identity: Arc<dyn IdentityProvider>,
  pub relay: Arc<ChatRelay>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires the shared services and registers every saga.
  pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
    let identity: Arc<dyn IdentityProvider> = Arc::new(JwtIdentityProvider::from_config(&config));
    Self::with_identity(config, store, identity)
  }

  pub fn with_identity(config: AppConfig, store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
    let sagas = Arc::new(SagaRegistry::<AppError>::new());
    pipelines::register_all_pipelines(&sagas);
    let relay = Arc::new(ChatRelay::new(store.clone(), config.chat_strict_rooms));
    Self {
      store,
      sagas,
      identity,
      relay,
      config: Arc::new(config),
    }
  }

  pub fn ledger(&self) -> ProductLedger {
    ProductLedger::new(self.store.clone())
  }
}
