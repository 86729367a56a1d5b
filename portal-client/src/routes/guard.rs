//! Pre-navigation guard

use super::table::RouteEntry;
use super::{landing_route, HOME, LOGIN, REGISTER};
use portal_core::{GuardConfig, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardMode {
    /// Only the presence of a token is checked
    #[default]
    TokenOnly,
    /// Entries that declare roles also require the session role to match
    EnforceRoles,
}

impl From<&GuardConfig> for GuardMode {
    fn from(config: &GuardConfig) -> Self {
        if config.enforce_roles {
            GuardMode::EnforceRoles
        } else {
            GuardMode::TokenOnly
        }
    }
}

/// The slice of session state the guard looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuardContext {
    pub has_token: bool,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationGuard {
    mode: GuardMode,
}

impl NavigationGuard {
    pub fn new(mode: GuardMode) -> Self {
        Self { mode }
    }

    pub fn from_config(config: &GuardConfig) -> Self {
        Self::new(GuardMode::from(config))
    }

    pub fn mode(&self) -> GuardMode {
        self.mode
    }

    pub fn check(
        &self,
        destination: &str,
        entry: Option<&RouteEntry>,
        context: &GuardContext,
    ) -> GuardDecision {
        let path = super::table::strip_query(destination);

        if path == LOGIN || path == REGISTER {
            return if context.has_token {
                GuardDecision::Redirect(HOME.to_string())
            } else {
                GuardDecision::Allow
            };
        }

        if !context.has_token {
            return GuardDecision::Redirect(LOGIN.to_string());
        }

        if self.mode == GuardMode::EnforceRoles {
            if let Some(entry) = entry.filter(|e| !e.is_unrestricted()) {
                return match context.role {
                    Some(role) if entry.allows(role) => GuardDecision::Allow,
                    Some(role) => GuardDecision::Redirect(landing_route(role).to_string()),
                    None => GuardDecision::Redirect(HOME.to_string()),
                };
            }
        }

        GuardDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::RouteTable;

    fn with_token(role: Option<Role>) -> GuardContext {
        GuardContext {
            has_token: true,
            role,
        }
    }

    #[test]
    fn test_token_presence_rules() {
        let guard = NavigationGuard::default();
        let anonymous = GuardContext::default();

        assert_eq!(
            guard.check("/login", None, &with_token(None)),
            GuardDecision::Redirect("/".to_string())
        );
        assert_eq!(
            guard.check("/register", None, &with_token(None)),
            GuardDecision::Redirect("/".to_string())
        );
        assert_eq!(guard.check("/login", None, &anonymous), GuardDecision::Allow);
        assert_eq!(
            guard.check("/admin/logs", None, &anonymous),
            GuardDecision::Redirect("/login".to_string())
        );
        assert_eq!(
            guard.check("/admin/logs", None, &with_token(Some(Role::Student))),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_role_enforcement_is_opt_in() {
        let table = RouteTable::portal();
        let logs = table.get("/admin/logs");
        let teacher = with_token(Some(Role::Teacher));

        let token_only = NavigationGuard::from_config(&GuardConfig::default());
        assert_eq!(token_only.check("/admin/logs", logs, &teacher), GuardDecision::Allow);

        let enforcing = NavigationGuard::from_config(&GuardConfig {
            enforce_roles: true,
        });
        assert_eq!(
            enforcing.check("/admin/logs", logs, &teacher),
            GuardDecision::Redirect("/teacher/dashboard".to_string())
        );
        assert_eq!(
            enforcing.check("/admin/logs", logs, &with_token(Some(Role::Admin))),
            GuardDecision::Allow
        );
        assert_eq!(
            enforcing.check("/admin/logs", logs, &with_token(None)),
            GuardDecision::Redirect("/".to_string())
        );

        // unrestricted entries only need a token
        let dashboard = table.get("/admin/dashboard");
        assert_eq!(
            enforcing.check("/admin/dashboard", dashboard, &teacher),
            GuardDecision::Allow
        );
    }
}
