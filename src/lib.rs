//! Route registration, matching, and middleware dispatch for HTTP services.
//!
//! Routes are buffered into a [`RouterBuilder`] and compiled eagerly by
//! [`RouterBuilder::build`]: the registration set is replayed into each
//! matcher strategy in order (single compiled alternation first, tree walk
//! as the universal fallback) and the first strategy that accepts it is
//! bound for the life of the router. Requests are then dispatched through a
//! continuation chain of [`Handler`]s with a not-found fallthrough and
//! one-shot error recovery.
//!
//! # Example usage
//!
//! ```
//! use http::{Method, StatusCode};
//! use switchboard::{builder, handler_fn, Request};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let trace = handler_fn(|_ctx, next| {
//!     Box::pin(async move { next.run().await })
//! });
//! let show = handler_fn(|ctx, _next| {
//!     Box::pin(async move {
//!         let id = ctx.param("id").unwrap_or_default();
//!         ctx.text(StatusCode::OK, format!("listing {id}"))
//!     })
//! });
//!
//! let router = builder()
//!     .route(Method::GET, "/api/listings/:id{[0-9]+}", vec![trace, show])
//!     .build()?;
//!
//! let response = router
//!     .handle(Request::new(Method::GET, "/api/listings/42"))
//!     .await?;
//! assert_eq!(response.status, StatusCode::OK);
//! # Ok(())
//! # }
//! ```
pub mod context;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod http;
pub mod router;

pub use context::{Context, Param, Params};
pub use dispatch::Next;
pub use error::{BuildError, Error, PatternConflict, PatternError, Result};
pub use handler::{handler_fn, ErrorHandler, ErrorHandlerService, Handler, HandlerService};
pub use router::{
    builder, MatchResult, Matcher, MatcherService, RouteMatch, RouteMethod, Router, RouterBuilder,
};
pub use self::http::{Request, Response};
