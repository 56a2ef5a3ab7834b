/// Builds the internal dispatch path `/<slug><path>?<query>` for a resolved
/// tenant, or `None` when the request must pass through unchanged.
///
/// The no-op case is the loop guard: if the path already starts with
/// `/<slug>` the request has been rewritten once (or arrived pre-prefixed
/// from the path fallback) and prefixing again would recurse forever under
/// any rewrite-aware proxy or retry.
pub fn rewrite_path(slug: &str, path: &str, query: Option<&str>) -> Option<String> {
    if slug.is_empty() {
        return None;
    }
    if path.starts_with(&format!("/{slug}")) {
        return None;
    }
    Some(join_target(slug, path, query))
}

/// Assembles the dispatch path without the idempotence guard, for the
/// `/v/<slug>` fallback where the slug was just removed from the path.
pub fn join_target(slug: &str, path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("/{slug}{path}?{q}"),
        _ => format!("/{slug}{path}"),
    }
}
