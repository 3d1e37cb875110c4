mod next;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use http::StatusCode;
use log::{debug, error, warn};

pub use next::Next;

use crate::context::{Context, Params};
use crate::handler::{ErrorHandler, ErrorHandlerService, Handler, HandlerService};
use crate::http::Response;
use crate::router::MatchResult;
use crate::{Error, Result};

/// One executable element of the composed chain: a handler plus the
/// bindings of the route that matched it.
pub(crate) struct Step {
    handler: HandlerService,
    params: Arc<Params>,
}

/// The composed continuation chain for one request: every matched chain
/// flattened in priority order, with the not-found handler as the terminal
/// fallthrough.
pub(crate) struct Chain {
    steps: Vec<Step>,
    not_found: HandlerService,
}

impl Chain {
    pub(crate) fn new(matches: MatchResult, not_found: HandlerService) -> Self {
        let mut steps = Vec::new();
        for matched in matches {
            let params = Arc::new(matched.params);
            for handler in matched.chain.iter() {
                steps.push(Step {
                    handler: handler.clone(),
                    params: params.clone(),
                });
            }
        }
        Self { steps, not_found }
    }

    /// Runs the chain from `index`. Index `steps.len()` is the not-found
    /// fallthrough; anything past it is the terminal no-op.
    pub(crate) fn run_from(
        self: Arc<Self>,
        ctx: Arc<Context>,
        index: usize,
    ) -> BoxFuture<'static, Result<()>> {
        Box::pin(async move {
            if let Some(step) = self.steps.get(index) {
                ctx.bind_params(step.params.clone());
                debug!("--> {}", step.handler.name());
                let next = Next::new(self.clone(), ctx.clone(), index + 1, step.params.clone());
                let result = step.handler.run(ctx, next).await;
                match &result {
                    Ok(()) => debug!("<-- {}", step.handler.name()),
                    Err(e) => debug!("<-- {} failed: {e}", step.handler.name()),
                }
                return result;
            }
            if index == self.steps.len() {
                if ctx.has_response() {
                    return Ok(());
                }
                ctx.bind_params(Arc::default());
                debug!("--> {} (fallthrough)", self.not_found.name());
                let next = Next::new(self.clone(), ctx.clone(), index + 1, Arc::default());
                return self.not_found.run(ctx, next).await;
            }
            Ok(())
        })
    }
}

struct DefaultNotFound;

#[async_trait]
impl Handler for DefaultNotFound {
    async fn run(&self, ctx: Arc<Context>, _next: Next) -> Result<()> {
        ctx.status(StatusCode::NOT_FOUND)
    }

    fn name(&self) -> &str {
        "not_found"
    }
}

pub(crate) fn default_not_found() -> HandlerService {
    Arc::new(DefaultNotFound)
}

struct DefaultErrorHandler;

#[async_trait]
impl ErrorHandler for DefaultErrorHandler {
    async fn handle(&self, ctx: Arc<Context>, error: Error) -> Result<()> {
        error!("handler failed: {error}");
        match error {
            Error::Status(status) => ctx.respond(Response::new(status)),
            _ => ctx.respond(Response::error()),
        }
    }
}

pub(crate) fn default_error_handler() -> ErrorHandlerService {
    Arc::new(DefaultErrorHandler)
}

/// Composes and runs the chain for one request.
///
/// Failures are intercepted exactly once at this boundary and handed to the
/// error handler; control-flow violations bypass it and fail the request.
/// The finalization contract is asserted before the response leaves.
pub(crate) async fn run(
    matches: MatchResult,
    not_found: HandlerService,
    error_handler: &ErrorHandlerService,
    ctx: Arc<Context>,
) -> Result<Response> {
    let chain = Arc::new(Chain::new(matches, not_found));
    if let Err(error) = chain.run_from(ctx.clone(), 0).await {
        if error.is_violation() {
            return Err(error);
        }
        warn!("recovering from handler failure: {error}");
        error_handler.handle(ctx.clone(), error).await?;
    }
    ctx.take_response().ok_or(Error::MissingResponse)
}
