use crate::http::{ApiClient, ApiRequest};
use portal_core::{AdminRecord, AdminUpdate, AuthGrant, Page, PortalResult, ResponseEnvelope};
use std::sync::Arc;

/// Filters for the admin list
#[derive(Debug, Clone, Default)]
pub struct AdminQuery {
    pub keyword: Option<String>,
    pub page_num: Option<u32>,
    pub page_size: Option<u32>,
}

impl AdminQuery {
    fn apply(&self, request: ApiRequest) -> ApiRequest {
        request
            .with_optional_query("keyword", self.keyword.as_deref())
            .with_optional_query("pageNum", self.page_num)
            .with_optional_query("pageSize", self.page_size)
    }
}

/// `/admin/*` account endpoints and impersonation
#[derive(Clone)]
pub struct AdminApi {
    client: Arc<ApiClient>,
}

impl AdminApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list_admins(&self, query: &AdminQuery) -> PortalResult<Page<AdminRecord>> {
        let request = query.apply(ApiRequest::get("/admin/admins"));
        self.client.data(request).await
    }

    pub async fn get_admin(&self, admin_id: i64) -> PortalResult<AdminRecord> {
        self.client
            .data(ApiRequest::get(format!("/admin/admins/{}", admin_id)))
            .await
    }

    pub async fn update_admin(
        &self,
        admin_id: i64,
        update: &AdminUpdate,
    ) -> PortalResult<ResponseEnvelope> {
        let request = ApiRequest::put(format!("/admin/admins/{}", admin_id)).json(update)?;
        self.client.envelope(request).await
    }

    pub async fn update_admin_status(
        &self,
        admin_id: i64,
        enabled: bool,
    ) -> PortalResult<ResponseEnvelope> {
        let request =
            ApiRequest::put(format!("/admin/admins/{}/status", admin_id)).with_query("status", enabled);
        self.client.envelope(request).await
    }

    pub async fn delete_admin(&self, admin_id: i64) -> PortalResult<ResponseEnvelope> {
        self.client
            .envelope(ApiRequest::delete(format!("/admin/admins/{}", admin_id)))
            .await
    }

    /// Obtain a session for another user. Silent: the session store owns
    /// the single failure notice for impersonation.
    pub async fn simulate_login(&self, user_id: i64) -> PortalResult<AuthGrant> {
        self.client
            .data(ApiRequest::post(format!("/admin/simulate/login/{}", user_id)).silent())
            .await
    }
}
