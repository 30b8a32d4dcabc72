//! REST API client module for the Agente MAWDSLEYS backend.
//!
//! This module provides the `ApiClient` used for every call to the
//! backend, plus the adapter that normalizes authentication payloads.
//!
//! The API uses JWT bearer token authentication obtained through the
//! `/auth/login` endpoint.

pub mod client;
pub mod error;
pub mod wire;

pub use client::ApiClient;
pub use error::ApiError;
pub use wire::AuthPayload;
