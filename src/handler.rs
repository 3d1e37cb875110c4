use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::context::Context;
use crate::dispatch::Next;
use crate::{Error, Result};

/// A routed unit of work. Business endpoints and middleware share this shape:
/// a middleware does its work around `next.run().await`, an endpoint responds
/// on the context and returns without firing the continuation.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn run(&self, ctx: Arc<Context>, next: Next) -> Result<()>;

    /// Name used in dispatch logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

pub type HandlerService = Arc<dyn Handler>;

/// Handles a failure raised anywhere in a chain and must produce a
/// replacement response on the context. Its own failure is not recovered.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn handle(&self, ctx: Arc<Context>, error: Error) -> Result<()>;
}

pub type ErrorHandlerService = Arc<dyn ErrorHandler>;

struct FnHandler<F>(F);

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(Arc<Context>, Next) -> BoxFuture<'static, Result<()>> + Send + Sync,
{
    async fn run(&self, ctx: Arc<Context>, next: Next) -> Result<()> {
        (self.0)(ctx, next).await
    }

    fn name(&self) -> &str {
        "handler_fn"
    }
}

/// Adapts a closure into a [`Handler`].
///
/// ```
/// use http::StatusCode;
/// use switchboard::handler_fn;
///
/// let hello = handler_fn(|ctx, _next| {
///     Box::pin(async move { ctx.text(StatusCode::OK, "hello") })
/// });
/// # let _ = hello;
/// ```
pub fn handler_fn<F>(f: F) -> HandlerService
where
    F: Fn(Arc<Context>, Next) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}
