use http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::Value;

use crate::{Error, Result};

/// The response a handler chain accumulates on the request context.
#[derive(Debug, Clone)]
pub struct Response {
    pub version: String,
    pub status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            version: "HTTP/1.1".to_string(),
            status,
            headers: vec![(header::CONTENT_LENGTH, HeaderValue::from_static("0"))]
                .into_iter()
                .collect(),
            body: Vec::new(),
        }
    }

    pub fn error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Replace the body with plain text, updating the length and type headers.
    pub fn with_text(mut self, body: impl Into<String>) -> Self {
        self.set_body(
            body.into().into_bytes(),
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        self
    }

    /// Replace the body with a serialized JSON value.
    pub fn with_json(mut self, value: &Value) -> Result<Self> {
        let body = serde_json::to_vec(value).map_err(|e| Error::new(e.to_string()))?;
        self.set_body(body, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    fn set_body(&mut self, body: Vec<u8>, content_type: HeaderValue) {
        if let Ok(length) = HeaderValue::try_from(body.len().to_string()) {
            self.headers.insert(header::CONTENT_LENGTH, length);
        }
        self.headers.insert(header::CONTENT_TYPE, content_type);
        self.body = body;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn insert_header(&mut self, name: &str, value: &str) -> Result<()> {
        let name = HeaderName::try_from(name).map_err(|e| Error::new(e.to_string()))?;
        let value = HeaderValue::try_from(value).map_err(|e| Error::new(e.to_string()))?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}
