/// Reserved path prefix for slug-in-path storefront access, used when the
/// dealer's subdomain is not configured in DNS yet (e.g. `/v/marinhos/contato`).
pub const FALLBACK_PREFIX: &str = "/v/";

/// Outcome of tenant resolution for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Host is one of the platform's own domains and the path carries no
    /// fallback prefix: serve the platform itself (landing, admin, super-admin).
    PlatformRoot,
    /// Tenant derived from the Host header - either a subdomain label of a
    /// root domain or a dealer-owned custom domain (full host as slug).
    HostTenant { slug: String },
    /// Tenant derived from the reserved `/v/<slug>` path prefix on a root
    /// domain. `effective_path` is the original path with the prefix and
    /// slug segment removed.
    PathTenant { slug: String, effective_path: String },
}

/// Resolves a tenant slug from the request's host and path.
///
/// Purely syntactic: resolution never fails here. A slug with no matching
/// loja record is only discovered downstream, when the storefront lookup
/// returns empty and the handler answers 404.
///
/// The root domain set is injected at construction so tests can exercise
/// arbitrary sets without touching process environment. Comparison is a
/// verbatim string match against the Host header (port included); slugs are
/// not canonicalized (case, trailing dot, IDN), so persisted loja slugs must
/// match what the browser sends.
#[derive(Debug, Clone)]
pub struct TenantResolver {
    root_domains: Vec<String>,
}

impl TenantResolver {
    pub fn new(root_domains: Vec<String>) -> Self {
        Self { root_domains }
    }

    pub fn resolve(&self, host: &str, path: &str) -> Resolution {
        if self.is_root_domain(host) {
            // Path fallback only applies on the platform's own domains.
            if let Some(resolution) = self.resolve_from_path(path) {
                return resolution;
            }
            return Resolution::PlatformRoot;
        }

        // Subdomain of a root domain: the remaining prefix is the slug.
        for root in &self.root_domains {
            if let Some(label) = host.strip_suffix(&format!(".{root}")) {
                if label.is_empty() {
                    return Resolution::PlatformRoot;
                }
                return Resolution::HostTenant { slug: label.to_string() };
            }
        }

        if host.is_empty() {
            return Resolution::PlatformRoot;
        }

        // Custom dealer-owned domain: the whole host is the slug.
        Resolution::HostTenant { slug: host.to_string() }
    }

    fn is_root_domain(&self, host: &str) -> bool {
        self.root_domains.iter().any(|root| root == host)
    }

    fn resolve_from_path(&self, path: &str) -> Option<Resolution> {
        let rest = path.strip_prefix(FALLBACK_PREFIX)?;
        let mut parts = rest.splitn(2, '/');
        let slug = parts.next().unwrap_or_default();
        if slug.is_empty() {
            return None;
        }
        let effective_path = match parts.next() {
            Some(remainder) => format!("/{remainder}"),
            None => "/".to_string(),
        };
        Some(Resolution::PathTenant {
            slug: slug.to_string(),
            effective_path,
        })
    }
}
