//! HTTP API handlers for tunebridge-server

pub mod auth;
pub mod health;
pub mod profile;
pub mod recommendations;

pub use auth::{require_session, CurrentSession};
