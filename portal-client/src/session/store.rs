//! Session store operations
//!
//! Every operation here catches failures at its boundary: callers get a
//! boolean, the user gets exactly one notice, diagnostics go to tracing.
//! Login, logout and impersonation are serialized through one FIFO lock so
//! they complete in the order they were issued.

use super::context::SessionContext;
use crate::api::{AdminApi, AuthApi};
use crate::http::ApiClient;
use crate::notify::Notice;
use crate::routes::{intended_destination, LOGIN};
use portal_core::{
    log_operation_error, log_operation_start, log_operation_success, validation_error, AuthGrant,
    Credentials, PortalError, PortalResult, StudentRegistration,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub struct SessionStore {
    client: Arc<ApiClient>,
    auth: AuthApi,
    admin: AdminApi,
    mutation: Mutex<()>,
}

impl SessionStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            auth: AuthApi::new(client.clone()),
            admin: AdminApi::new(client.clone()),
            client,
            mutation: Mutex::new(()),
        }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        self.client.session()
    }

    /// Load the durable token into memory at startup
    pub async fn restore(&self) -> bool {
        match self.session().restore().await {
            Ok(found) => found,
            Err(e) => {
                self.fail("restore", &e, false);
                false
            }
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> bool {
        let _turn = self.mutation.lock().await;
        log_operation_start!("login", username = %credentials.username);

        let result = match self.auth.login(credentials).await {
            Ok(grant) => self.adopt_grant(grant).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(landing) => {
                log_operation_success!("login", landing = landing);
                true
            }
            Err(e) => {
                self.fail("login", &e, true);
                false
            }
        }
    }

    /// Always ends logged out on the login route, whatever the backend says
    pub async fn logout(&self) -> bool {
        let _turn = self.mutation.lock().await;
        log_operation_start!("logout");

        let outcome = self.auth.logout().await;
        // a 401 teardown in the wrapper already requested the login route
        let already_redirected = matches!(&outcome, Err(e) if e.is_unauthorized());

        if let Err(e) = self.session().clear().await {
            e.log();
        }
        if !already_redirected {
            self.client.navigator().navigate(LOGIN);
        }

        match outcome {
            Ok(_) => {
                log_operation_success!("logout");
                self.client
                    .notifier()
                    .notify(Notice::success("Logged out successfully"));
                true
            }
            Err(e) => {
                log_operation_error!("logout", e);
                self.client.notifier().notify(Notice::error(format!(
                    "Logout failed: {}",
                    e.user_message()
                )));
                false
            }
        }
    }

    /// Refresh the stored profile from the backend
    pub async fn fetch_current_user(&self) -> bool {
        match self.auth.current_user().await {
            Ok(user) => {
                let user_id = user.user_id;
                if self.session().set_user(user).await {
                    debug!(user_id, "Current user refreshed");
                    true
                } else {
                    warn!(user_id, "Current user fetched without an active session");
                    self.client.notifier().notify(Notice::error(
                        "Session ended before the current user was loaded",
                    ));
                    false
                }
            }
            Err(e) => {
                self.fail("fetch_current_user", &e, true);
                false
            }
        }
    }

    /// Administrative impersonation: swap the session to `user_id`
    pub async fn simulate_login(&self, user_id: i64) -> bool {
        let _turn = self.mutation.lock().await;
        log_operation_start!("simulate_login", user_id = user_id);

        let result = match self.admin.simulate_login(user_id).await {
            Ok(grant) => {
                let username = grant.user.username.clone();
                self.adopt_grant(grant).await.map(|_| username)
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(username) => {
                log_operation_success!("simulate_login", username = %username);
                self.client
                    .notifier()
                    .notify(Notice::success(format!("Switched to user {}", username)));
                true
            }
            Err(e) => {
                log_operation_error!("simulate_login", e);
                self.client.notifier().notify(Notice::error(format!(
                    "Impersonation failed: {}",
                    e.user_message()
                )));
                false
            }
        }
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> bool {
        match self.auth.change_password(old_password, new_password).await {
            Ok(_) => {
                log_operation_success!("change_password");
                self.client
                    .notifier()
                    .notify(Notice::success("Password changed"));
                true
            }
            Err(e) => {
                self.fail("change_password", &e, true);
                false
            }
        }
    }

    pub async fn register_student(&self, form: &StudentRegistration) -> bool {
        match self.auth.register_student(form).await {
            Ok(_) => {
                log_operation_success!("register_student", username = %form.username);
                self.client
                    .notifier()
                    .notify(Notice::success("Registration successful, please log in"));
                true
            }
            Err(e) => {
                self.fail("register_student", &e, true);
                false
            }
        }
    }

    /// Install a granted session and move to its landing route. A session
    /// with an unknown role is still stored; only the navigation is skipped.
    async fn adopt_grant(&self, grant: AuthGrant) -> PortalResult<&'static str> {
        let landing = intended_destination(&grant.user);
        let role = grant.user.role.clone();

        self.session().establish(grant.token, grant.user).await?;

        match landing {
            Some(landing) => {
                self.client.navigator().navigate(landing);
                Ok(landing)
            }
            None => {
                warn!(role = %role, "Granted session has an unknown role");
                Err(validation_error!("Unknown user role", "role", "session_store"))
            }
        }
    }

    /// Log a failure and raise a notice unless the wrapper already did
    fn fail(&self, operation: &str, error: &PortalError, via_wrapper: bool) {
        log_operation_error!(operation, error);
        let wrapper_notified = via_wrapper
            && matches!(
                error,
                PortalError::Network { .. }
                    | PortalError::Server { .. }
                    | PortalError::Application { .. }
            );
        if !wrapper_notified {
            self.client
                .notifier()
                .notify(Notice::error(error.user_message()));
        }
    }
}
