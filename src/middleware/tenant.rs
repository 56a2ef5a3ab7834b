use axum::{
    extract::{Request, State},
    http::{header, Uri},
    middleware::Next,
    response::Response,
};

use crate::routing::{rewrite::join_target, rewrite_path, Resolution, TenantResolver};

/// Tenant slug resolved for this request, injected for downstream handlers.
#[derive(Clone, Debug)]
pub struct ResolvedTenant(pub String);

/// Resolves the tenant from the Host header (or the `/v/<slug>` fallback)
/// and internally rewrites the URI to `/<slug><path>`, keeping the query
/// string. The client keeps seeing the original host and path; no redirect
/// is ever issued here.
///
/// Runs after the session gate: admin-path protection is decided on the
/// original path, before any tenant prefixing.
pub async fn tenant_rewrite_middleware(
    State(resolver): State<TenantResolver>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    // Platform-level endpoints and assets are never tenant content, whatever
    // host they arrive on (the lead API is posted from storefront domains).
    if is_exempt(&path) {
        return next.run(request).await;
    }

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
        .to_string();
    let query = request.uri().query().map(str::to_string);

    match resolver.resolve(&host, &path) {
        Resolution::PlatformRoot => {}
        Resolution::HostTenant { slug } => {
            // None means the path is already slug-prefixed; rewriting again
            // would loop, so the request passes through untouched.
            if let Some(target) = rewrite_path(&slug, &path, query.as_deref()) {
                apply_rewrite(&mut request, &slug, &target);
            }
        }
        Resolution::PathTenant { slug, effective_path } => {
            let target = join_target(&slug, &effective_path, query.as_deref());
            apply_rewrite(&mut request, &slug, &target);
        }
    }

    next.run(request).await
}

fn is_exempt(path: &str) -> bool {
    path.starts_with("/api/")
        || path.starts_with("/uploads/")
        || path == "/health"
        || path == "/favicon.ico"
        || path == "/robots.txt"
        || path == "/sitemap.xml"
}

fn apply_rewrite(request: &mut Request, slug: &str, target: &str) {
    match target.parse::<Uri>() {
        Ok(uri) => {
            tracing::debug!(slug, target, "rewriting request to tenant path");
            *request.uri_mut() = uri;
            request
                .extensions_mut()
                .insert(ResolvedTenant(slug.to_string()));
        }
        Err(e) => {
            // Leave the request alone; the router will 404 it downstream.
            tracing::warn!(slug, target, "tenant rewrite produced an invalid uri: {e}");
        }
    }
}
