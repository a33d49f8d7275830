// apps/marketplace/src/lib.rs

//! Campus marketplace backend: listings, orders, reviews and product-scoped
//! chat on top of a document store without multi-key transactions.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod realtime;
pub mod services;
pub mod state;
pub mod store;
pub mod web;

pub use state::AppState;
