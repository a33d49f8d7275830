// apps/marketplace/src/services/mod.rs

pub mod admin;
pub mod catalog;
pub mod chat;
pub mod identity;
pub mod ledger;
pub mod orders;
pub mod reviews;
pub mod seed;
pub mod users;
