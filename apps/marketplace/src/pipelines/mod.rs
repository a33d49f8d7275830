// apps/marketplace/src/pipelines/mod.rs

//! Sagas behind the multi-document writes of the marketplace.

use tracing::info;
use vanik_saga::SagaRegistry;

use crate::errors::AppError;

pub mod contexts;
pub mod order_pipeline;
pub mod review_pipeline;

/// Registers every saga the HTTP layer dispatches to. Called once at startup.
pub fn register_all_pipelines(registry: &SagaRegistry<AppError>) {
  order_pipeline::register_order_pipeline(registry);
  review_pipeline::register_review_pipeline(registry);
  info!("Marketplace sagas registered.");
}
