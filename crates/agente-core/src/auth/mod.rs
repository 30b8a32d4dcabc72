//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionStore`: login, signup, logout and token verification
//! - `SessionContext`: shared session state with the force-logout path
//! - `Session`, `SessionData`, `User`: the session data model
//!
//! Sessions are persisted through a `SessionStorage` backend and restored
//! once at startup. Expiry is only discovered when the backend rejects a token.

pub mod context;
pub mod error;
pub mod session;
pub mod store;

pub use context::{Credential, Navigator, NoopNavigator, SessionContext};
pub use error::AuthError;
pub use session::{AuthState, Session, SessionData, User, DEFAULT_ROLE};
pub use store::SessionStore;
