pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod types;
pub mod validation;

#[doc(hidden)]
pub mod testing;
