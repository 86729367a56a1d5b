//! Per-resource API calls
//!
//! Thin wrappers that fix the backend path and parameter names; all
//! envelope handling and failure reporting happens in [`crate::http`].

pub mod admin;
pub mod auth;
pub mod logs;

pub use admin::{AdminApi, AdminQuery};
pub use auth::AuthApi;
pub use logs::{ExportScope, LogKind, LogQuery, SystemLogApi, SPREADSHEET_MIME};

/// Default page size the backend applies when none is given
pub const DEFAULT_PAGE_SIZE: u32 = 10;
