//! Core library for the Agente MAWDSLEYS dashboard client.
//!
//! This crate provides:
//! - `SessionStore`: login, signup, logout and token verification
//! - `SessionContext`: the shared session state and its force-logout path
//! - `ApiClient`: the authenticated HTTP gateway to the dashboard backend
//! - `SessionStorage`: durable key-value backends for the persisted session
//! - `Config`: on-disk client configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod storage;

pub use api::{ApiClient, ApiError};
pub use auth::{
    AuthError, AuthState, Navigator, Session, SessionContext, SessionData, SessionStore, User,
};
pub use config::{Config, StorageBackend};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, SessionStorage};
