// vanik-saga/src/lib.rs

//! Async saga runner.
//!
//! A [`Saga`] is an ordered list of named steps. Each step has `before`, `on`
//! and `after` handler phases and may carry a compensator. Steps run in order;
//! when a handler fails, every step that had already finished is compensated
//! in reverse order and the failure is returned to the caller. This gives
//! multi-document updates on a store without transactions an explicit undo
//! path.
//!
//! Typical wiring:
//!  1. Define a context struct for the process.
//!  2. `Saga::<Ctx, AppError>::new(&[("load", false, None), ("claim", false, None)])`.
//!  3. Attach handlers with `on_step` and undo actions with `compensate_step`.
//!  4. Register the saga in a [`SagaRegistry`] and call `registry.run(ContextData::new(ctx))`.

pub mod core;
pub mod error;
pub mod registry;
pub mod saga;

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{SagaOutcome, StepControl};
pub use crate::core::step::{Compensator, Handler, SkipCondition, StepDef};
pub use crate::error::{SagaError, SagaResult};
pub use crate::registry::SagaRegistry;
pub use crate::saga::Saga;
