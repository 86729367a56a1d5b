use crate::http::{ApiClient, ApiRequest};
use portal_core::{
    AuthGrant, Credentials, PortalResult, ResponseEnvelope, StaffRegistration,
    StudentRegistration, UserProfile,
};
use std::sync::Arc;

/// `/auth/*` endpoints
#[derive(Clone)]
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn login(&self, credentials: &Credentials) -> PortalResult<AuthGrant> {
        let request = ApiRequest::post("/auth/login").json(credentials)?;
        self.client.data(request).await
    }

    /// Silent: the session store reports logout outcomes itself
    pub async fn logout(&self) -> PortalResult<ResponseEnvelope> {
        self.client
            .envelope(ApiRequest::post("/auth/logout").silent())
            .await
    }

    pub async fn current_user(&self) -> PortalResult<UserProfile> {
        self.client.data(ApiRequest::get("/auth/current-user")).await
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> PortalResult<ResponseEnvelope> {
        let request = ApiRequest::post("/auth/change-password")
            .with_query("oldPassword", old_password)
            .with_query("newPassword", new_password);
        self.client.envelope(request).await
    }

    pub async fn register_student(
        &self,
        form: &StudentRegistration,
    ) -> PortalResult<ResponseEnvelope> {
        let request = ApiRequest::post("/auth/register/student").json(form)?;
        self.client.envelope(request).await
    }

    /// Create a teacher or admin account; requires an admin session
    pub async fn register_staff(&self, form: &StaffRegistration) -> PortalResult<ResponseEnvelope> {
        let request = ApiRequest::post("/auth/register/staff").json(form)?;
        self.client.envelope(request).await
    }

    /// College list offered by the registration form
    pub async fn colleges(&self) -> PortalResult<serde_json::Value> {
        self.client.data(ApiRequest::get("/auth/college")).await
    }
}
