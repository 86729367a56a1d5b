use crate::http::{ApiClient, ApiRequest, BinaryPayload};
use portal_core::{LogRecord, Page, PortalResult, ResponseEnvelope};
use std::sync::Arc;

/// Content type of log exports
pub const SPREADSHEET_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// The three log families the backend keeps apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Operation,
    Login,
    Error,
}

impl LogKind {
    pub const ALL: [LogKind; 3] = [LogKind::Operation, LogKind::Login, LogKind::Error];

    pub fn segment(&self) -> &'static str {
        match self {
            LogKind::Operation => "operation",
            LogKind::Login => "login",
            LogKind::Error => "error",
        }
    }
}

impl std::str::FromStr for LogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "operation" | "op" => Ok(LogKind::Operation),
            "login" => Ok(LogKind::Login),
            "error" => Ok(LogKind::Error),
            _ => Err(format!("Unknown log kind: {}", s)),
        }
    }
}

/// Which logs a spreadsheet export covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    All,
    Error,
}

impl ExportScope {
    pub fn segment(&self) -> &'static str {
        match self {
            ExportScope::All => "all",
            ExportScope::Error => "error",
        }
    }
}

impl std::str::FromStr for ExportScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(ExportScope::All),
            "error" => Ok(ExportScope::Error),
            _ => Err(format!("Unknown export scope: {}", s)),
        }
    }
}

/// List filters. The backend ignores filters that do not apply to the
/// requested log family.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub username: Option<String>,
    pub operation: Option<i64>,
    pub action_type: Option<i64>,
    pub ip: Option<String>,
    pub error_info: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub page_num: Option<u32>,
    pub page_size: Option<u32>,
}

impl LogQuery {
    fn apply(&self, request: ApiRequest) -> ApiRequest {
        request
            .with_optional_query("username", self.username.as_deref())
            .with_optional_query("operation", self.operation)
            .with_optional_query("actionType", self.action_type)
            .with_optional_query("ip", self.ip.as_deref())
            .with_optional_query("errorInfo", self.error_info.as_deref())
            .with_optional_query("startTime", self.start_time.as_deref())
            .with_optional_query("endTime", self.end_time.as_deref())
            .with_optional_query("pageNum", self.page_num)
            .with_optional_query("pageSize", self.page_size)
    }
}

/// `/admin/logs/*` endpoints
#[derive(Clone)]
pub struct SystemLogApi {
    client: Arc<ApiClient>,
}

impl SystemLogApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self, kind: LogKind, query: &LogQuery) -> PortalResult<Page<LogRecord>> {
        let request = query.apply(ApiRequest::get(format!("/admin/logs/{}", kind.segment())));
        self.client.data(request).await
    }

    pub async fn clear(&self, kind: LogKind) -> PortalResult<ResponseEnvelope> {
        self.client
            .envelope(ApiRequest::delete(format!("/admin/logs/{}", kind.segment())))
            .await
    }

    /// Spreadsheet download; the body is returned untouched
    pub async fn export(
        &self,
        scope: ExportScope,
        start_time: Option<&str>,
        end_time: Option<&str>,
    ) -> PortalResult<BinaryPayload> {
        let request = ApiRequest::get(format!("/admin/logs/{}/export", scope.segment()))
            .with_optional_query("startTime", start_time)
            .with_optional_query("endTime", end_time)
            .with_header("Accept", SPREADSHEET_MIME);
        self.client.download(request).await
    }

    pub async fn operation_type_stats(&self) -> PortalResult<serde_json::Value> {
        self.client
            .data(ApiRequest::get("/admin/logs/stats/operation-types"))
            .await
    }

    pub async fn frequent_users(&self, limit: Option<u32>) -> PortalResult<serde_json::Value> {
        let request =
            ApiRequest::get("/admin/logs/stats/frequent-users").with_optional_query("limit", limit);
        self.client.data(request).await
    }

    pub async fn ip_access_stats(&self) -> PortalResult<serde_json::Value> {
        self.client.data(ApiRequest::get("/admin/logs/stats/ip-access")).await
    }

    pub async fn by_user(&self, user_id: i64) -> PortalResult<Vec<LogRecord>> {
        self.client
            .data(ApiRequest::get(format!("/admin/logs/user/{}", user_id)))
            .await
    }

    pub async fn by_ip(&self, ip: &str) -> PortalResult<Vec<LogRecord>> {
        self.client
            .data(ApiRequest::get(format!(
                "/admin/logs/ip/{}",
                urlencoding::encode(ip)
            )))
            .await
    }

    pub async fn by_type(&self, action_type: i64) -> PortalResult<Vec<LogRecord>> {
        self.client
            .data(ApiRequest::get(format!("/admin/logs/type/{}", action_type)))
            .await
    }

    pub async fn count_user_operations(&self, user_id: i64) -> PortalResult<i64> {
        self.client
            .data(ApiRequest::get(format!("/admin/logs/count/user/{}", user_id)))
            .await
    }
}
