use axum::{
    extract::{Request, State},
    http::header::{COOKIE, SET_COOKIE},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{issue_session_token, verify_session_token, Claims};

/// Fixed redirect target for unauthenticated admin requests.
pub const LOGIN_PATH: &str = "/admin/login";

/// Gate configuration, injected so tests can run against arbitrary secrets
/// and cookie names.
#[derive(Clone, Debug)]
pub struct SessionGate {
    pub cookie_name: String,
    pub jwt_secret: String,
    pub session_expiry_hours: u64,
}

/// Authenticated session context, injected into the request for handlers.
#[derive(Clone, Debug)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: String,
    pub is_super_admin: bool,
}

impl From<&Claims> for SessionUser {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email.clone(),
            is_super_admin: claims.super_admin,
        }
    }
}

/// Session gate: admin and super-admin paths require a valid session cookie,
/// everything else passes through. Runs before tenant rewriting so admin
/// paths are never misread as tenant-prefixed storefront content.
///
/// Validating a session close to expiry reissues the cookie; the refreshed
/// cookie rides on whatever response goes out, pass-through or redirect.
pub async fn session_gate_middleware(
    State(gate): State<SessionGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let claims = session_from_request(&gate, &request);

    if requires_session(&path) && claims.is_none() {
        return Redirect::to(LOGIN_PATH).into_response();
    }

    let refreshed = claims.as_ref().and_then(|c| refreshed_cookie(&gate, c));
    if let Some(claims) = &claims {
        request.extensions_mut().insert(SessionUser::from(claims));
    }

    let mut response = next.run(request).await;

    if let Some(cookie) = refreshed {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }

    response
}

/// Protected prefixes, with the login page itself carved out.
pub fn requires_session(path: &str) -> bool {
    (path.starts_with("/admin") || path.starts_with("/super-admin"))
        && !path.starts_with(LOGIN_PATH)
}

fn session_from_request(gate: &SessionGate, request: &Request) -> Option<Claims> {
    let header = request.headers().get(COOKIE)?.to_str().ok()?;
    let token = cookie_value(header, &gate.cookie_name)?;
    match verify_session_token(token, &gate.jwt_secret) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!("session token rejected: {}", e);
            None
        }
    }
}

fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')))
}

/// Reissues the session cookie once the token crosses half its lifetime.
fn refreshed_cookie(gate: &SessionGate, claims: &Claims) -> Option<String> {
    let remaining = claims.exp - Utc::now().timestamp();
    let half_life = (gate.session_expiry_hours.saturating_mul(3600) / 2) as i64;
    if remaining >= half_life {
        return None;
    }

    let token = issue_session_token(
        claims.sub,
        &claims.email,
        claims.super_admin,
        &gate.jwt_secret,
        gate.session_expiry_hours,
    )
    .ok()?;

    Some(format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        gate.cookie_name, token
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_paths_require_session_except_login() {
        assert!(requires_session("/admin/estoque"));
        assert!(requires_session("/admin/api/config"));
        assert!(requires_session("/super-admin"));
        assert!(requires_session("/super-admin/api/lojas"));
        assert!(!requires_session("/admin/login"));
        assert!(!requires_session("/"));
        assert!(!requires_session("/marinhos/v/abc"));
        assert!(!requires_session("/api/leads"));
    }

    #[test]
    fn cookie_value_parses_multi_cookie_headers() {
        let header = "outra=1; vitrine_session=abc.def.ghi; mais=2";
        assert_eq!(cookie_value(header, "vitrine_session"), Some("abc.def.ghi"));
        assert_eq!(cookie_value(header, "inexistente"), None);
        // Names must match whole, not by prefix.
        assert_eq!(cookie_value("vitrine_session2=x", "vitrine_session"), None);
    }
}
