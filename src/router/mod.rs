use std::sync::Arc;

use http::Method;
use log::debug;

use crate::context::{Context, Params};
use crate::dispatch;
use crate::error::{BuildError, Result};
use crate::handler::{ErrorHandlerService, HandlerService};
use crate::http::{Request, Response};

pub mod pattern;

mod regex;
mod strategy;
mod trie;
mod walk;

use pattern::Segment;

/// The method filter a route registers under. `Any` entries are merged into
/// every concrete method's table, preserving registration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Any,
    Only(Method),
}

impl From<Method> for RouteMethod {
    fn from(value: Method) -> Self {
        Self::Only(value)
    }
}

/// A buffered registration; nothing is compiled until [`RouterBuilder::build`].
struct Route {
    method: RouteMethod,
    template: String,
    chain: Vec<HandlerService>,
}

/// A registration replayed into the matcher strategies: the template parsed
/// into its expanded variants, the chain frozen.
pub(crate) struct ParsedRoute {
    pub order: usize,
    pub method: RouteMethod,
    pub template: String,
    pub variants: Vec<Vec<Segment>>,
    pub chain: Arc<[HandlerService]>,
}

/// One matched route: its handler chain and the values its pattern captured.
#[derive(Clone)]
pub struct RouteMatch {
    pub order: usize,
    pub chain: Arc<[HandlerService]>,
    pub params: Params,
}

/// Matching chains ordered ascending by registration priority.
pub type MatchResult = Vec<RouteMatch>;

/// A strategy converting `(method, path)` into matched chains and bindings.
pub trait Matcher: Send + Sync {
    fn find(&self, method: &Method, path: &str) -> MatchResult;

    fn name(&self) -> &'static str;
}

pub type MatcherService = Box<dyn Matcher>;

/// Per-method route tables with `Any` registrations merged in, plus the
/// `Any`-only table used for methods nothing registered explicitly.
pub(crate) struct MethodTables<'a> {
    pub tables: Vec<(Method, Vec<&'a ParsedRoute>)>,
    pub fallback: Vec<&'a ParsedRoute>,
}

pub(crate) fn method_tables(routes: &[ParsedRoute]) -> MethodTables<'_> {
    let mut methods: Vec<Method> = Vec::new();
    for route in routes {
        if let RouteMethod::Only(method) = &route.method {
            if !methods.contains(method) {
                methods.push(method.clone());
            }
        }
    }
    let tables = methods
        .into_iter()
        .map(|method| {
            let merged = routes
                .iter()
                .filter(|route| match &route.method {
                    RouteMethod::Any => true,
                    RouteMethod::Only(m) => *m == method,
                })
                .collect();
            (method, merged)
        })
        .collect();
    let fallback = routes
        .iter()
        .filter(|route| route.method == RouteMethod::Any)
        .collect();
    MethodTables { tables, fallback }
}

/// Create a new router builder.
pub fn builder() -> RouterBuilder {
    RouterBuilder::new()
}

/// Buffers route registrations and compiles them into a [`Router`].
#[derive(Default)]
pub struct RouterBuilder {
    routes: Vec<Route>,
    not_found: Option<HandlerService>,
    error_handler: Option<ErrorHandlerService>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler chain under a method filter and path template.
    pub fn route(
        mut self,
        method: impl Into<RouteMethod>,
        template: impl Into<String>,
        chain: Vec<HandlerService>,
    ) -> Self {
        self.routes.push(Route {
            method: method.into(),
            template: template.into(),
            chain,
        });
        self
    }

    pub fn get(self, template: &str, handler: HandlerService) -> Self {
        self.route(Method::GET, template, vec![handler])
    }

    pub fn post(self, template: &str, handler: HandlerService) -> Self {
        self.route(Method::POST, template, vec![handler])
    }

    pub fn put(self, template: &str, handler: HandlerService) -> Self {
        self.route(Method::PUT, template, vec![handler])
    }

    pub fn patch(self, template: &str, handler: HandlerService) -> Self {
        self.route(Method::PATCH, template, vec![handler])
    }

    pub fn delete(self, template: &str, handler: HandlerService) -> Self {
        self.route(Method::DELETE, template, vec![handler])
    }

    /// Register a handler under the ALL-methods wildcard.
    pub fn any(self, template: &str, handler: HandlerService) -> Self {
        self.route(RouteMethod::Any, template, vec![handler])
    }

    /// Replace the default 404 terminal handler.
    pub fn not_found(mut self, handler: HandlerService) -> Self {
        self.not_found = Some(handler);
        self
    }

    /// Replace the default error handler.
    pub fn on_error(mut self, handler: ErrorHandlerService) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Compile the buffered registrations into a servable router.
    ///
    /// Strategy selection is eager: pattern conflicts surface here, once, at
    /// startup. A route set no strategy accepts is a fatal build error.
    pub fn build(self) -> std::result::Result<Router, BuildError> {
        let mut parsed = Vec::with_capacity(self.routes.len());
        for (order, route) in self.routes.into_iter().enumerate() {
            let variants = pattern::parse(&route.template)?;
            parsed.push(ParsedRoute {
                order,
                method: route.method,
                template: route.template,
                variants,
                chain: route.chain.into(),
            });
        }
        let matcher = strategy::select(&parsed).map_err(BuildError::NoStrategy)?;
        Ok(Router {
            matcher,
            not_found: self.not_found.unwrap_or_else(dispatch::default_not_found),
            error_handler: self
                .error_handler
                .unwrap_or_else(dispatch::default_error_handler),
        })
    }
}

/// A compiled router: immutable route tables behind the selected matcher
/// strategy, shareable across request tasks.
pub struct Router {
    matcher: MatcherService,
    not_found: HandlerService,
    error_handler: ErrorHandlerService,
}

impl Router {
    /// Resolve a method and path to the matching chains and bindings.
    pub fn find(&self, method: &Method, path: &str) -> MatchResult {
        self.matcher.find(method, path)
    }

    /// The name of the strategy selected at build time.
    pub fn strategy(&self) -> &'static str {
        self.matcher.name()
    }

    /// Dispatch one request through the matched chains and return the
    /// finalized response.
    pub async fn handle(&self, request: Request) -> Result<Response> {
        let ctx = Arc::new(Context::new(request));
        let matches = self.matcher.find(ctx.method(), ctx.path());
        if matches.is_empty() {
            debug!("no route matched {} {}", ctx.method(), ctx.path());
        }
        dispatch::run(matches, self.not_found.clone(), &self.error_handler, ctx).await
    }
}

pub(crate) fn capture_names(segments: &[Segment]) -> Vec<Option<String>> {
    segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::Param { name, .. } => Some(Some(name.clone())),
            Segment::Wildcard => Some(None),
            Segment::Tail => Some(Some("*".to_string())),
            Segment::Literal(_) => None,
        })
        .collect()
}

pub(crate) fn static_path(segments: &[Segment]) -> Option<String> {
    if !segments.iter().all(Segment::is_literal) {
        return None;
    }
    let parts: Vec<&str> = segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::Literal(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    Some(if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    })
}
