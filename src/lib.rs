#![doc = "The `tasktrack` library crate."]
#![doc = ""]
#![doc = "Configuration, domain models, token authentication, the ownership-scoped"]
#![doc = "task operations, storage backends, routing and error handling for the"]
#![doc = "task tracking service. The binary (`main.rs`) only wires them together."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod tasks;

pub use crate::config::Config;
pub use crate::error::AppError;
pub use crate::state::AppState;
