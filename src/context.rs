use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::http::{Request, Response};
use crate::{Error, Result};

/// A single bound path parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub value: String,
}

/// The ordered parameter list bound by a route match.
///
/// The first binding wins when two parameters share a name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<Param>);

impl Params {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(Param {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|param| param.name == name)
            .map(|param| param.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|param| (param.name.as_str(), param.value.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| Param { name, value })
                .collect(),
        )
    }
}

#[derive(Debug, Default)]
struct ResponseSlot {
    response: Option<Response>,
    finalized: bool,
}

/// Per-request state shared by every handler in a chain.
///
/// Handlers read the request through it and accumulate the response on it.
/// Query parameters and the JSON body are parsed lazily, exactly once, and
/// cached; re-reading yields the cached result rather than re-parsing.
pub struct Context {
    request: Request,
    path: String,
    raw_query: Option<String>,
    params: RwLock<Arc<Params>>,
    query: OnceLock<HashMap<String, String>>,
    json: OnceCell<Value>,
    response: Mutex<ResponseSlot>,
}

impl Context {
    pub fn new(request: Request) -> Self {
        let (path, raw_query) = match request.path.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (request.path.clone(), None),
        };
        Self {
            request,
            path,
            raw_query,
            params: RwLock::new(Arc::new(Params::new())),
            query: OnceLock::new(),
            json: OnceCell::new(),
            response: Mutex::new(ResponseSlot::default()),
        }
    }

    pub fn method(&self) -> &Method {
        &self.request.method
    }

    /// The request path with the query string stripped.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Bindings of the chain whose handler is currently executing.
    pub fn params(&self) -> Arc<Params> {
        self.params
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn param(&self, name: &str) -> Option<String> {
        self.params().get(name).map(str::to_string)
    }

    pub(crate) fn bind_params(&self, params: Arc<Params>) {
        if let Ok(mut guard) = self.params.write() {
            *guard = params;
        }
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_pairs().get(name).map(String::as_str)
    }

    /// Query parameters, parsed once on first access. The first occurrence
    /// wins when a key repeats.
    pub fn query_pairs(&self) -> &HashMap<String, String> {
        self.query.get_or_init(|| {
            let mut pairs = HashMap::new();
            let raw = self.raw_query.as_deref().unwrap_or("");
            for part in raw.split('&').filter(|part| !part.is_empty()) {
                let (name, value) = part.split_once('=').unwrap_or((part, ""));
                pairs
                    .entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
            pairs
        })
    }

    /// The request body parsed as JSON, exactly once; later calls return the
    /// cached value without touching the body again.
    pub async fn json(&self) -> Result<&Value> {
        self.json
            .get_or_try_init(|| async {
                serde_json::from_slice(self.request.body())
                    .map_err(|e| Error::new(format!("invalid JSON body: {e}")))
            })
            .await
    }

    /// Deserialize the cached JSON body into a concrete type.
    pub async fn body_as<T: DeserializeOwned>(&self) -> Result<T> {
        let value = self.json().await?;
        serde_json::from_value(value.clone()).map_err(|e| Error::new(e.to_string()))
    }

    pub fn has_response(&self) -> bool {
        self.response
            .lock()
            .map(|slot| slot.response.is_some())
            .unwrap_or(false)
    }

    /// Set or overwrite the pending response. Overwriting is allowed until
    /// some handler finalizes the context.
    pub fn respond(&self, response: Response) -> Result<()> {
        let mut slot = self
            .response
            .lock()
            .map_err(|_| Error::new("response slot poisoned"))?;
        if slot.finalized {
            return Err(Error::new("response already finalized"));
        }
        slot.response = Some(response);
        Ok(())
    }

    /// Lock the pending response against overwrites by deeper handlers.
    pub fn finalize(&self) -> Result<()> {
        let mut slot = self
            .response
            .lock()
            .map_err(|_| Error::new("response slot poisoned"))?;
        if slot.response.is_none() {
            return Err(Error::MissingResponse);
        }
        slot.finalized = true;
        Ok(())
    }

    pub fn status(&self, status: StatusCode) -> Result<()> {
        self.respond(Response::new(status))
    }

    pub fn text(&self, status: StatusCode, body: impl Into<String>) -> Result<()> {
        self.respond(Response::new(status).with_text(body))
    }

    pub(crate) fn take_response(&self) -> Option<Response> {
        self.response
            .lock()
            .ok()
            .and_then(|mut slot| slot.response.take())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn context(path: &str) -> Context {
        Context::new(Request::new(Method::GET, path))
    }

    #[test]
    fn splits_query_from_path() {
        let ctx = context("/shop/items?sort=price&page=2&sort=name");
        assert_eq!(ctx.path(), "/shop/items");
        assert_eq!(ctx.query("sort"), Some("price"));
        assert_eq!(ctx.query("page"), Some("2"));
        assert_eq!(ctx.query("missing"), None);
    }

    #[test]
    fn response_overwrite_until_finalized() {
        let ctx = context("/");
        ctx.status(StatusCode::ACCEPTED).unwrap();
        ctx.status(StatusCode::OK).unwrap();
        ctx.finalize().unwrap();
        assert!(ctx.status(StatusCode::IM_A_TEAPOT).is_err());
        assert_eq!(ctx.take_response().unwrap().status, StatusCode::OK);
    }

    #[test]
    fn finalize_without_response_is_an_error() {
        let ctx = context("/");
        assert!(matches!(ctx.finalize(), Err(Error::MissingResponse)));
    }

    #[tokio::test]
    async fn json_body_is_parsed_once_and_cached() {
        let request = Request::new(Method::POST, "/orders").with_body(r#"{"qty": 3}"#);
        let ctx = Context::new(request);
        let first = ctx.json().await.unwrap();
        assert_eq!(first["qty"], 3);
        let second = ctx.json().await.unwrap();
        assert!(std::ptr::eq(first, second));
    }
}
