//! Session Management Module
//!
//! The session context (in-memory copy), its durable token storage, and the
//! store operations that create and destroy sessions.

pub mod context;
pub mod storage;
pub mod store;

pub use context::SessionContext;
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
pub use store::SessionStore;
