//! Portal Client - session lifecycle and request pipeline for the exam portal
//!
//! Layers, leaf first:
//!
//! - [`http`]: the request wrapper. Attaches the session token, unwraps the
//!   response envelope and turns every failure into a classified error plus
//!   a user notification.
//! - [`session`]: the injectable session context, its durable token storage
//!   and the store operations (login, logout, current user, impersonation).
//! - [`routes`]: the static route table, the pre-navigation guard and a
//!   resolver that follows redirects to a final destination.
//! - [`api`]: per-resource calls with fixed backend paths.

pub mod api;
pub mod http;
pub mod navigation;
pub mod notify;
pub mod routes;
pub mod session;

pub use api::{AdminApi, AdminQuery, AuthApi, ExportScope, LogKind, LogQuery, SystemLogApi};
pub use http::{
    ApiClient, ApiRequest, ApiResponse, BinaryPayload, NoticeKind, QueryValue, ResponseKind,
};
pub use navigation::{NavigationRecorder, Navigator};
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier};
pub use routes::{
    intended_destination, landing_route, GuardContext, GuardDecision, GuardMode,
    NavigationGuard, RouteEntry, RouteTable, Router,
};
pub use session::{FileTokenStore, MemoryTokenStore, SessionContext, SessionStore, TokenStore};
