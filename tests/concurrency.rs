use std::sync::Arc;

use futures::future::join_all;
use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use switchboard::{builder, handler_fn, Request};

/// Unrelated requests share one compiled router with no contention: every
/// task gets its own context and the matcher tables are immutable.
#[tokio::test]
async fn concurrent_requests_resolve_independently() {
    let _ = env_logger::builder().is_test(true).try_init();
    let echo = handler_fn(|ctx, _next| {
        Box::pin(async move {
            let id = ctx.param("id").unwrap_or_default();
            tokio::task::yield_now().await;
            ctx.text(StatusCode::OK, id)
        })
    });
    let router = Arc::new(
        builder()
            .get("/listings/:id", echo)
            .build()
            .unwrap(),
    );

    let tasks = (0..64).map(|i| {
        let router = router.clone();
        tokio::spawn(async move {
            let request = Request::new(Method::GET, format!("/listings/{i}"));
            let response = router.handle(request).await.unwrap();
            (i, response)
        })
    });
    for joined in join_all(tasks).await {
        let (i, response) = joined.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.text(), Some(i.to_string().as_str()));
    }
}
