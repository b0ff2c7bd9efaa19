//! Authentication module: who is signed in, and which views they may reach.
//!
//! This module provides:
//! - `Session` / `SessionStore`: the persisted login, rehydrated at startup
//! - `SessionGuard`: the redirect transition table for navigation requests
//! - `AuthContext`: the owned context combining both with a profile memo
//! - `KeyValueStorage` backends: file, OS keychain, or in-memory
//!
//! Sessions have no client-side expiry; they last until logout.

pub mod backend;
pub mod context;
pub mod guard;
pub mod session;
pub mod storage;

pub use backend::AuthBackend;
pub use context::{AuthContext, LoginError};
pub use guard::{GuardEvent, GuardState, Navigation, Route, SessionGuard};
pub use session::{Session, SessionStore, SESSION_KEY};
pub use storage::{FileStorage, KeyValueStorage, KeyringStorage, MemoryStorage, Storage, StorageError};
