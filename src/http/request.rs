use http::{HeaderMap, HeaderName, HeaderValue, Method};

use crate::{Error, Result};

/// An incoming request as seen by the dispatch core.
///
/// The transport layer owns parsing and framing; this type only carries what
/// routing and handlers need. The `path` may include a query string, which is
/// split off before matching.
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub version: String,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            version: "HTTP/1.1".to_string(),
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
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

    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        self.insert_header(name, value)?;
        Ok(self)
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
