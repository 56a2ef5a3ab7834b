pub mod admin;
pub mod leads;
pub mod storefront;
pub mod super_admin;

use axum::Extension;

use crate::error::ApiError;
use crate::middleware::SessionUser;

/// Unwraps the session injected by the gate. Gated routes always carry it;
/// a missing extension means the route was wired outside the gate.
pub(crate) fn session_user(ext: Option<Extension<SessionUser>>) -> Result<SessionUser, ApiError> {
    ext.map(|Extension(user)| user)
        .ok_or_else(|| ApiError::unauthorized("Sessão de administrador necessária"))
}
