#![doc = "The `tasktrail` library crate."]
#![doc = ""]
#![doc = "Per-user task tracking: credential checking, bearer tokens, and task"]
#![doc = "operations that are always scoped to the authenticated owner. The binary"]
#![doc = "(`main.rs`) only loads configuration, picks a store backend and serves"]
#![doc = "`routes::app_config`."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use crate::error::AppError;
pub use crate::state::AppState;
