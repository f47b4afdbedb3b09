//! MAAS 2.0 REST API controller.
//!
//! Implements the [`Controller`](crate::controller::Controller) trait over
//! the `/api/2.0/` endpoints, authenticating with an OAuth1 PLAINTEXT
//! signature derived from a MAAS API key.

mod auth;
mod client;
mod models;

pub use auth::Credentials;
pub use client::{ControllerArgs, MaasController, REQUIRED_CAPABILITY};
