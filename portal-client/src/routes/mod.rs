//! Routing
//!
//! The route table is static data; the guard is a pure decision over a
//! snapshot of the session; [`Router`] ties both to the live session and
//! performs the resulting navigation.

pub mod guard;
pub mod table;

pub use guard::{GuardContext, GuardDecision, GuardMode, NavigationGuard};
pub use table::{RouteEntry, RouteMatch, RouteRedirect, RouteTable};

use crate::navigation::Navigator;
use crate::session::SessionContext;
use portal_core::{ErrorContext, GuardConfig, PortalError, PortalResult, Role, UserProfile};
use std::sync::Arc;
use tracing::debug;

pub const HOME: &str = "/";
pub const LOGIN: &str = "/login";
pub const REGISTER: &str = "/register";

/// Redirects followed before giving up
pub const MAX_REDIRECTS: usize = 8;

/// Fixed dashboard path for a role
pub fn landing_route(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin/dashboard",
        Role::Teacher => "/teacher/dashboard",
        Role::Student => "/student/dashboard",
    }
}

/// Where a freshly authenticated user should land; `None` for a role the
/// portal does not know
pub fn intended_destination(user: &UserProfile) -> Option<&'static str> {
    user.role().map(landing_route)
}

fn navigation_error(message: String, path: &str) -> PortalError {
    PortalError::Navigation {
        message,
        context: ErrorContext::new("router")
            .with_operation("resolve")
            .with_metadata("path", path),
    }
}

/// Resolves destinations against the table and guard, then navigates
pub struct Router {
    table: RouteTable,
    guard: NavigationGuard,
    session: Arc<SessionContext>,
    navigator: Arc<dyn Navigator>,
}

impl Router {
    pub fn new(
        table: RouteTable,
        guard: NavigationGuard,
        session: Arc<SessionContext>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            table,
            guard,
            session,
            navigator,
        }
    }

    /// Portal route table with the configured guard mode
    pub fn from_config(
        config: &GuardConfig,
        session: Arc<SessionContext>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::new(
            RouteTable::portal(),
            NavigationGuard::from_config(config),
            session,
            navigator,
        )
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    /// Follow route and guard redirects to the final destination
    pub async fn resolve(&self, path: &str) -> PortalResult<String> {
        let session = self.session.snapshot().await;
        let context = GuardContext {
            has_token: session.is_some(),
            role: session
                .as_ref()
                .and_then(|s| s.user.as_ref())
                .and_then(UserProfile::role),
        };

        let mut current = path.to_string();
        for hop in 0..=MAX_REDIRECTS {
            let found = self
                .table
                .find(&current)
                .ok_or_else(|| navigation_error(format!("No route matches {}", current), &current))?;

            let next = match found.entry.redirect {
                Some(RouteRedirect::To(target)) => target.to_string(),
                Some(RouteRedirect::Home) => match &session {
                    None => LOGIN.to_string(),
                    Some(session) => match &session.user {
                        None => {
                            return Err(navigation_error(
                                "Session has no user profile yet, fetch the current user first"
                                    .to_string(),
                                &current,
                            ))
                        }
                        Some(user) => match intended_destination(user) {
                            Some(landing) => landing.to_string(),
                            None => {
                                return Err(navigation_error(
                                    format!("Unknown user role {}", user.role),
                                    &current,
                                ))
                            }
                        },
                    },
                },
                None => match self.guard.check(&current, Some(found.entry), &context) {
                    GuardDecision::Allow => {
                        debug!(from = path, to = %current, hops = hop, "Route resolved");
                        return Ok(current);
                    }
                    GuardDecision::Redirect(target) => target,
                },
            };

            debug!(from = %current, to = %next, "Redirect");
            current = next;
        }

        Err(navigation_error(
            format!("Too many redirects resolving {}", path),
            path,
        ))
    }

    /// Resolve and navigate; returns the final destination
    pub async fn navigate(&self, path: &str) -> PortalResult<String> {
        let destination = self.resolve(path).await?;
        self.navigator.navigate(&destination);
        Ok(destination)
    }
}
