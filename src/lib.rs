#![doc = "The `taskkeeper` library crate."]
#![doc = ""]
#![doc = "This crate contains the domain models, the store backends, authentication,"]
#![doc = "the task service, routing configuration and error handling of the taskkeeper"]
#![doc = "API. It is used by the main binary (`main.rs`) to construct and run the server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;
pub mod tasks;

pub use crate::error::AppError;
pub use crate::tasks::TaskService;
