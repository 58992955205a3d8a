//! Auth feature: token store, session manager, route guard and the provider
//! that wires them together. This module sits on a security boundary and
//! must never log tokens, passwords or profile payloads.
//!
//! Flow Overview: login stores `{access, refresh, user}` atomically; the
//! request client refreshes on 401 and replays once; a failed refresh clears
//! the whole session and redirects to the login path, preserving the page the
//! user was on.

pub(crate) mod client;
pub mod errors;
pub mod guards;
pub mod session;
pub mod state;
pub mod store;
pub mod types;

pub use errors::AuthError;
pub use guards::{GuardDecision, History, Navigator, RouteGuard};
pub use session::SessionManager;
pub use state::{AuthProvider, AuthState};
pub use store::{FileStore, MemoryStore, StoreError, TokenStore};
pub use types::{Session, UserProfile};
