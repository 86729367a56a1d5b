//! Outbound request description and inbound response shapes

use portal_core::{validation_error, PortalResult, ResponseEnvelope};
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;

/// Query parameter value; the backend only takes strings and numbers
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Text(String),
    Number(i64),
}

impl std::fmt::Display for QueryValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryValue::Text(text) => f.write_str(text),
            QueryValue::Number(number) => write!(f, "{}", number),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<&String> for QueryValue {
    fn from(value: &String) -> Self {
        QueryValue::Text(value.clone())
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Number(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Number(value.into())
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Number(value.into())
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Text(value.to_string())
    }
}

/// What the caller expects back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseKind {
    /// `{code, message, data}` JSON envelope
    #[default]
    Envelope,
    /// Raw file download, returned untouched on 2xx
    Binary,
}

/// A request to the portal backend, relative to the configured base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, QueryValue)>,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
    pub kind: ResponseKind,
    /// Whether failures raise a user notification
    pub notify: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
            kind: ResponseKind::Envelope,
            notify: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: &str, value: impl Into<QueryValue>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Add the parameter only when a value is present
    pub fn with_optional_query<V: Into<QueryValue>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_query(key, value),
            None => self,
        }
    }

    /// Attach a JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> PortalResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Expect a raw file download instead of an envelope
    pub fn binary(mut self) -> Self {
        self.kind = ResponseKind::Binary;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Suppress wrapper notifications; the caller reports failures itself
    pub fn silent(mut self) -> Self {
        self.notify = false;
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&QueryValue> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Raw download body plus the response headers
#[derive(Debug, Clone)]
pub struct BinaryPayload {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub headers: HeaderMap,
}

impl BinaryPayload {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// File name from `Content-Disposition`, preferring the RFC 5987
    /// `filename*=UTF-8''...` form over the plain `filename=` one
    pub fn filename(&self) -> Option<String> {
        let disposition = self
            .headers
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())?;

        let mut plain = None;
        for part in disposition.split(';').map(str::trim) {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key.trim().to_ascii_lowercase().as_str() {
                "filename*" => {
                    let value = value.trim().trim_matches('"');
                    let encoded = match value.split_once("''") {
                        Some((_, encoded)) => encoded,
                        None => value,
                    };
                    if let Ok(decoded) = urlencoding::decode(encoded) {
                        return Some(decoded.into_owned());
                    }
                }
                "filename" => plain = Some(value.trim().trim_matches('"').to_string()),
                _ => {}
            }
        }
        plain.filter(|name| !name.is_empty())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// What the wrapper hands back on success
#[derive(Debug, Clone)]
pub enum ApiResponse {
    Envelope(ResponseEnvelope),
    Binary(BinaryPayload),
}

impl ApiResponse {
    pub fn into_envelope(self) -> PortalResult<ResponseEnvelope> {
        match self {
            ApiResponse::Envelope(envelope) => Ok(envelope),
            ApiResponse::Binary(_) => Err(validation_error!(
                "Expected a response envelope, got a file download",
                "response",
                "http_client"
            )),
        }
    }

    pub fn into_binary(self) -> PortalResult<BinaryPayload> {
        match self {
            ApiResponse::Binary(payload) => Ok(payload),
            ApiResponse::Envelope(_) => Err(validation_error!(
                "Expected a file download, got a response envelope",
                "response",
                "http_client"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn payload_with_disposition(value: &'static str) -> BinaryPayload {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_DISPOSITION, HeaderValue::from_static(value));
        BinaryPayload {
            status: 200,
            bytes: vec![1, 2, 3],
            headers,
        }
    }

    #[test]
    fn test_builder_collects_parts() {
        let request = ApiRequest::get("/admin/admins")
            .with_query("pageNum", 1)
            .with_optional_query("keyword", None::<String>)
            .with_optional_query("pageSize", Some(10))
            .silent();

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.query.len(), 2);
        assert_eq!(request.query_value("pageSize"), Some(&QueryValue::Number(10)));
        assert!(request.query_value("keyword").is_none());
        assert!(!request.notify);
        assert_eq!(request.kind, ResponseKind::Envelope);
    }

    #[test]
    fn test_filename_prefers_extended_form() {
        let payload = payload_with_disposition(
            "attachment; filename=\"logs.xlsx\"; filename*=UTF-8''%E7%B3%BB%E7%BB%9F%E6%97%A5%E5%BF%97.xlsx",
        );
        assert_eq!(payload.filename().as_deref(), Some("系统日志.xlsx"));

        let plain = payload_with_disposition("attachment; filename=\"errors.xlsx\"");
        assert_eq!(plain.filename().as_deref(), Some("errors.xlsx"));
    }

    #[test]
    fn test_filename_absent() {
        let payload = BinaryPayload {
            status: 200,
            bytes: Vec::new(),
            headers: HeaderMap::new(),
        };
        assert!(payload.filename().is_none());
        assert!(payload.content_type().is_none());
        assert!(payload.is_empty());
    }
}
