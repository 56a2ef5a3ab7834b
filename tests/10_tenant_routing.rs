// Host-based tenant resolution and internal URI rewriting, exercised through
// the real middleware stack with in-memory requests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use vitrine_api::middleware::tenant_rewrite_middleware;
use vitrine_api::routing::TenantResolver;

async fn echo_uri(req: axum::extract::Request) -> String {
    req.uri().to_string()
}

fn app(root_domains: &[&str]) -> Router {
    let resolver = TenantResolver::new(root_domains.iter().map(|s| s.to_string()).collect());
    Router::new()
        .route("/", get(|| async { "platform-root" }))
        .route("/*rest", get(echo_uri))
        .layer(axum::middleware::from_fn_with_state(
            resolver,
            tenant_rewrite_middleware,
        ))
}

async fn dispatch(app: Router, host: &str, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .uri(uri)
        .header("host", host)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn subdomain_host_is_rewritten_to_slug_prefix() {
    let (status, body) = dispatch(app(&["localhost:3000"]), "loja1.localhost:3000", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "/loja1/");
}

#[tokio::test]
async fn path_fallback_on_root_domain_extracts_slug() {
    let (status, body) =
        dispatch(app(&["localhost:3000"]), "localhost:3000", "/v/loja2/contato").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "/loja2/contato");
}

#[tokio::test]
async fn custom_domain_uses_full_host_as_slug() {
    let (status, body) = dispatch(
        app(&["localhost:3000", "plataforma.com"]),
        "www.dealer.com.br",
        "/",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "/www.dealer.com.br/");
}

#[tokio::test]
async fn root_domain_passes_through_untouched() {
    let (status, body) = dispatch(app(&["localhost:3000"]), "localhost:3000", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "platform-root");

    // Non-fallback paths on the platform domain keep their original URI.
    let (_, body) = dispatch(app(&["localhost:3000"]), "localhost:3000", "/contato").await;
    assert_eq!(body, "/contato");
}

#[tokio::test]
async fn already_prefixed_path_is_not_rewritten_again() {
    let (status, body) = dispatch(
        app(&["localhost:3000"]),
        "loja1.localhost:3000",
        "/loja1/contato",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "/loja1/contato");
}

#[tokio::test]
async fn platform_apis_are_exempt_on_tenant_hosts() {
    // Leads are posted from storefront domains; the API path must reach the
    // platform handler untouched instead of being slug-prefixed.
    let (_, body) = dispatch(app(&["localhost:3000"]), "loja1.localhost:3000", "/api/leads").await;
    assert_eq!(body, "/api/leads");

    let (_, body) = dispatch(
        app(&["localhost:3000"]),
        "loja1.localhost:3000",
        "/uploads/x/foto.jpg",
    )
    .await;
    assert_eq!(body, "/uploads/x/foto.jpg");
}

#[tokio::test]
async fn query_string_survives_the_rewrite() {
    let (_, body) = dispatch(
        app(&["localhost:3000"]),
        "loja1.localhost:3000",
        "/estoque?categoria=SUV&busca=gol",
    )
    .await;
    assert_eq!(body, "/loja1/estoque?categoria=SUV&busca=gol");
}

#[tokio::test]
async fn fallback_with_query_keeps_it() {
    let (_, body) = dispatch(
        app(&["plataforma.com"]),
        "plataforma.com",
        "/v/marinhos/estoque?busca=hilux",
    )
    .await;
    assert_eq!(body, "/marinhos/estoque?busca=hilux");
}
