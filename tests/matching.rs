use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use switchboard::{builder, handler_fn, HandlerService, Request, Router};

fn install_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn respond(body: &'static str) -> HandlerService {
    handler_fn(move |ctx, _next| Box::pin(async move { ctx.text(StatusCode::OK, body) }))
}

fn make_router(templates: &[&'static str]) -> Router {
    let mut builder = builder();
    for template in templates {
        builder = builder.get(template, respond(template));
    }
    builder.build().unwrap()
}

#[tokio::test]
async fn first_registered_route_wins_a_structural_tie() {
    install_logging();
    let router = make_router(&["/a/:id", "/a/fixed"]);
    let response = router.handle(Request::new(Method::GET, "/a/fixed")).await.unwrap();
    assert_eq!(response.text(), Some("/a/:id"));

    let router = make_router(&["/a/fixed", "/a/:id"]);
    let response = router.handle(Request::new(Method::GET, "/a/fixed")).await.unwrap();
    assert_eq!(response.text(), Some("/a/fixed"));
}

#[tokio::test]
async fn every_named_parameter_round_trips() {
    install_logging();
    let router = make_router(&["/shops/:shop/items/:item/reviews/:review"]);
    let matches = router.find(&Method::GET, "/shops/acme/items/12/reviews/last");
    assert_eq!(matches.len(), 1);
    let params = &matches[0].params;
    assert_eq!(params.len(), 3);
    assert_eq!(params.get("shop"), Some("acme"));
    assert_eq!(params.get("item"), Some("12"));
    assert_eq!(params.get("review"), Some("last"));
}

#[tokio::test]
async fn tail_wildcard_binds_the_full_remainder() {
    install_logging();
    let router = make_router(&["/files/*"]);
    let matches = router.find(&Method::GET, "/files/a/b/c");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].params.get("*"), Some("a/b/c"));
    assert!(router.find(&Method::GET, "/files").is_empty());
}

#[tokio::test]
async fn optional_tail_registers_the_zero_segment_variant() {
    install_logging();
    let router = make_router(&["/files/*?"]);
    assert_eq!(router.find(&Method::GET, "/files").len(), 1);
    let matches = router.find(&Method::GET, "/files/readme.txt");
    assert_eq!(matches[0].params.get("*"), Some("readme.txt"));
}

#[tokio::test]
async fn constrained_parameters_reject_non_matching_segments() {
    install_logging();
    let router = make_router(&["/orders/:id{[0-9]+}"]);
    assert_eq!(router.find(&Method::GET, "/orders/42").len(), 1);
    assert!(router.find(&Method::GET, "/orders/recent").is_empty());
}

#[tokio::test]
async fn optional_parameter_matches_with_and_without_the_segment() {
    install_logging();
    let router = make_router(&["/users/:id?"]);
    let with = router.find(&Method::GET, "/users/7");
    assert_eq!(with[0].params.get("id"), Some("7"));
    let without = router.find(&Method::GET, "/users");
    assert_eq!(without.len(), 1);
    assert!(without[0].params.is_empty());
}

#[tokio::test]
async fn brace_groups_match_literally() {
    install_logging();
    let router = make_router(&["/static/{css/vendor}/:file"]);
    let matches = router.find(&Method::GET, "/static/css/vendor/app.css");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].params.get("file"), Some("app.css"));
}

#[tokio::test]
async fn any_middleware_applies_to_unregistered_methods() {
    install_logging();
    let seen = respond("any");
    let router = builder()
        .any("/ping", seen)
        .build()
        .unwrap();
    let response = router.handle(Request::new(Method::DELETE, "/ping")).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), Some("any"));
}

#[tokio::test]
async fn unmatched_methods_and_paths_fall_through_to_not_found() {
    install_logging();
    let router = make_router(&["/a"]);
    let response = router.handle(Request::new(Method::POST, "/a")).await.unwrap();
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let response = router.handle(Request::new(Method::GET, "/b")).await.unwrap();
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn trailing_slashes_do_not_change_the_route() {
    install_logging();
    let router = make_router(&["/shop/items"]);
    assert_eq!(router.find(&Method::GET, "/shop/items/").len(), 1);
    assert_eq!(router.find(&Method::GET, "//shop//items").len(), 1);
}
