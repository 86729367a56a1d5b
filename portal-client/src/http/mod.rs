//! HTTP client wrapper
//!
//! Every backend call goes through [`ApiClient::send`]. It attaches the
//! session token, unwraps the response envelope and turns each failure into
//! one classified [`PortalError`] plus at most one user notice. An
//! authentication failure (envelope code 401 or HTTP 401) tears the session
//! down and requests the login route before the error is returned.

pub mod classify;
pub mod request;

pub use classify::{NoticeKind, STATUS_TABLE};
pub use request::{ApiRequest, ApiResponse, BinaryPayload, QueryValue, ResponseKind};

use crate::navigation::Navigator;
use crate::notify::{Notice, Notifier};
use crate::routes::LOGIN;
use crate::session::SessionContext;
use portal_core::{
    validation_error, ApiConfig, ApplicationErrorKind, ErrorContext, PortalError, PortalResult,
    ResponseEnvelope, UNAUTHORIZED_CODE,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct ApiClient {
    client: reqwest::Client,
    config: ApiConfig,
    token_header: HeaderName,
    session: Arc<SessionContext>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
}

impl ApiClient {
    pub fn new(
        config: ApiConfig,
        session: Arc<SessionContext>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> PortalResult<Self> {
        let client = create_http_client(&config)?;
        let token_header = HeaderName::from_bytes(config.token_header.as_bytes()).map_err(|e| {
            PortalError::Config {
                message: format!("Invalid token header name '{}': {}", config.token_header, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client")
                    .with_operation("create_client")
                    .with_suggestion("Set api.token_header to a valid HTTP header name"),
            }
        })?;

        info!("Created portal API client for {}", config.base_url);

        Ok(Self {
            client,
            config,
            token_header,
            session,
            navigator,
            notifier,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Header value for the current session token, if any
    async fn token_value(&self) -> Option<HeaderValue> {
        let token = self.session.token().await?;
        let raw = match &self.config.token_scheme {
            Some(scheme) => format!("{} {}", scheme, token),
            None => token,
        };
        match HeaderValue::from_str(&raw) {
            Ok(mut value) => {
                value.set_sensitive(true);
                Some(value)
            }
            Err(_) => {
                warn!("Session token is not a valid header value, sending request without it");
                None
            }
        }
    }

    /// Caller-supplied headers, rejected before anything is sent
    fn extra_headers(&self, request: &ApiRequest) -> PortalResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let parsed = HeaderName::from_bytes(name.as_bytes())
                .ok()
                .zip(HeaderValue::from_str(value).ok());
            let Some((name, value)) = parsed else {
                let message = format!("Invalid request header '{}'", name);
                warn!(method = %request.method, path = %request.path, "{}", message);
                self.raise(request, &message);
                return Err(validation_error!(message, "headers", "http_client"));
            };
            headers.append(name, value);
        }
        Ok(headers)
    }

    /// Dispatch a request and classify the outcome
    pub async fn send(&self, request: ApiRequest) -> PortalResult<ApiResponse> {
        let url = self.url_for(&request.path);
        debug!(method = %request.method, path = %request.path, "Sending request");

        let mut builder = self.client.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            let query: Vec<(&str, String)> = request
                .query
                .iter()
                .map(|(key, value)| (key.as_str(), value.to_string()))
                .collect();
            builder = builder.query(&query);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder = builder.headers(self.extra_headers(&request)?);

        match self.token_value().await {
            Some(value) => builder = builder.header(self.token_header.clone(), value),
            None => debug!(path = %request.path, "No session token, sending unauthenticated"),
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return Err(self.transport_failure(&request, e)),
        };

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.transport_failure(&request, e)),
        };

        if request.kind == ResponseKind::Binary && status.is_success() {
            debug!(path = %request.path, status = status.as_u16(), size = bytes.len(), "Received download");
            return Ok(ApiResponse::Binary(BinaryPayload {
                status: status.as_u16(),
                bytes: bytes.to_vec(),
                headers,
            }));
        }

        let envelope = serde_json::from_slice::<ResponseEnvelope>(&bytes)
            .ok()
            .filter(|envelope| status.is_success() || !envelope.is_success());

        match envelope {
            Some(envelope) => self.handle_envelope(&request, status.as_u16(), envelope).await,
            None => Err(self.handle_status(&request, status.as_u16(), &bytes).await),
        }
    }

    /// Send and require an envelope
    pub async fn envelope(&self, request: ApiRequest) -> PortalResult<ResponseEnvelope> {
        self.send(request).await?.into_envelope()
    }

    /// Send and decode the envelope's `data` payload
    pub async fn data<T: DeserializeOwned>(&self, request: ApiRequest) -> PortalResult<T> {
        self.envelope(request).await?.into_data()
    }

    /// Send as a file download
    pub async fn download(&self, request: ApiRequest) -> PortalResult<BinaryPayload> {
        self.send(request.binary()).await?.into_binary()
    }

    async fn handle_envelope(
        &self,
        request: &ApiRequest,
        status: u16,
        envelope: ResponseEnvelope,
    ) -> PortalResult<ApiResponse> {
        if envelope.is_success() {
            debug!(path = %request.path, status, "Request succeeded");
            return Ok(ApiResponse::Envelope(envelope));
        }

        let unauthorized = envelope.code == UNAUTHORIZED_CODE;
        let fallback = if unauthorized {
            NoticeKind::SessionExpired
        } else {
            NoticeKind::RequestFailed
        };
        let message = envelope
            .message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.template().to_string());

        warn!(
            method = %request.method,
            path = %request.path,
            status,
            code = envelope.code,
            "Backend rejected request: {}",
            message
        );

        self.raise(request, &message);
        if unauthorized {
            self.teardown().await;
        }

        Err(PortalError::Application {
            kind: if unauthorized {
                ApplicationErrorKind::Unauthorized
            } else {
                ApplicationErrorKind::Other
            },
            code: envelope.code,
            message,
            context: ErrorContext::new("http_client")
                .with_operation("send")
                .with_metadata("path", &request.path),
        })
    }

    /// Response without a usable envelope: classify by transport status
    async fn handle_status(&self, request: &ApiRequest, status: u16, body: &[u8]) -> PortalError {
        let message = if (200..300).contains(&status) {
            "Unexpected response body from server".to_string()
        } else {
            let body_message = serde_json::from_slice::<serde_json::Value>(body)
                .ok()
                .and_then(|value| value.get("message").and_then(|m| m.as_str()).map(String::from));
            NoticeKind::status_message(status, body_message.as_deref())
        };

        warn!(
            method = %request.method,
            path = %request.path,
            status,
            "Request failed without a usable envelope: {}",
            message
        );

        self.raise(
            request,
            if (200..300).contains(&status) {
                NoticeKind::RequestFailed.template()
            } else {
                &message
            },
        );
        if status == 401 {
            self.teardown().await;
        }

        PortalError::Server {
            status,
            message,
            context: ErrorContext::new("http_client")
                .with_operation("send")
                .with_metadata("path", &request.path)
                .with_suggestion(match status {
                    401 => "Log in again",
                    403 => "Check that your account has access to this resource",
                    404 => "Check the backend base URL and version",
                    _ => "Check network connectivity and backend status",
                }),
        }
    }

    fn transport_failure(&self, request: &ApiRequest, e: reqwest::Error) -> PortalError {
        let message = if e.is_timeout() {
            format!("Request timed out after {} ms", self.config.timeout_ms)
        } else {
            format!("No response from {}: {}", request.path, e)
        };

        warn!(method = %request.method, path = %request.path, "Transport failure: {}", message);
        self.raise(request, NoticeKind::NoResponse.template());

        PortalError::Network {
            message,
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client")
                .with_operation("send")
                .with_metadata("path", &request.path)
                .with_suggestion("Check network connectivity and the api.base_url setting"),
        }
    }

    fn raise(&self, request: &ApiRequest, message: &str) {
        if request.notify {
            self.notifier.notify(Notice::error(message));
        }
    }

    /// Clear both session copies and send the user to the login route
    async fn teardown(&self) {
        info!("Authentication failed, tearing down session");
        if let Err(e) = self.session.clear().await {
            e.log();
        }
        self.navigator.navigate(LOGIN);
    }
}

/// Build the underlying reqwest client with the configured deadline
pub(crate) fn create_http_client(config: &ApiConfig) -> PortalResult<reqwest::Client> {
    let mut headers = HeaderMap::new();

    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent).map_err(|e| PortalError::Config {
            message: format!("Invalid user agent: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })?,
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .default_headers(headers)
        .build()
        .map_err(|e| PortalError::Config {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })?;

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::NavigationRecorder;
    use crate::notify::RecordingNotifier;
    use crate::session::MemoryTokenStore;

    fn client_with(config: ApiConfig) -> PortalResult<ApiClient> {
        ApiClient::new(
            config,
            Arc::new(SessionContext::new(Arc::new(MemoryTokenStore::new()))),
            Arc::new(NavigationRecorder::new()),
            Arc::new(RecordingNotifier::new()),
        )
    }

    #[test]
    fn test_url_join() {
        let client = client_with(ApiConfig {
            base_url: "http://localhost:8080/api/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            client.url_for("/auth/login"),
            "http://localhost:8080/api/auth/login"
        );
        assert_eq!(
            client.url_for("auth/login"),
            "http://localhost:8080/api/auth/login"
        );
    }

    #[test]
    fn test_invalid_token_header_is_config_error() {
        let result = client_with(ApiConfig {
            token_header: "bad header".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(PortalError::Config { .. })));
    }

    #[tokio::test]
    async fn test_token_value_applies_scheme() {
        let session = Arc::new(SessionContext::new(Arc::new(MemoryTokenStore::with_token(
            "abc",
        ))));
        session.restore().await.unwrap();

        let client = ApiClient::new(
            ApiConfig {
                token_scheme: Some("Bearer".to_string()),
                ..Default::default()
            },
            session,
            Arc::new(NavigationRecorder::new()),
            Arc::new(RecordingNotifier::new()),
        )
        .unwrap();

        let value = client.token_value().await.unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer abc");
        assert!(value.is_sensitive());
    }
}
