use axum::extract::{Path, State};
use axum::Extension;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::Loja;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, SessionUser};
use crate::services::LojaService;
use crate::state::AppState;

use super::session_user;

/// Platform view of a dealer: status and identity, no credentials.
#[derive(Debug, Serialize)]
pub struct LojaResumo {
    pub id: Uuid,
    pub nome: String,
    pub slug: String,
    pub custom_domain: Option<String>,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Loja> for LojaResumo {
    fn from(loja: Loja) -> Self {
        Self {
            id: loja.id,
            nome: loja.nome,
            slug: loja.slug,
            custom_domain: loja.custom_domain,
            ativo: loja.ativo,
            created_at: loja.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusLoja {
    pub id: Uuid,
    pub ativo: bool,
}

/// GET /super-admin/api/lojas - every dealer on the platform.
pub async fn listar_lojas(
    State(state): State<AppState>,
    session: Option<Extension<SessionUser>>,
) -> ApiResult<Vec<LojaResumo>> {
    let session = session_user(session)?;
    exigir_super_admin(&session)?;

    let lojas = LojaService::new(state.pool.clone()).list_all().await?;
    Ok(ApiResponse::success(
        lojas.into_iter().map(LojaResumo::from).collect(),
    ))
}

/// POST /super-admin/api/lojas/:id/toggle - activate or deactivate a dealer.
/// Deactivated lojas vanish from storefront resolution on the next request.
pub async fn alternar_status(
    State(state): State<AppState>,
    session: Option<Extension<SessionUser>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusLoja> {
    let session = session_user(session)?;
    exigir_super_admin(&session)?;

    let ativo = LojaService::new(state.pool.clone()).toggle_ativo(id).await?;
    tracing::info!(loja = %id, ativo, "loja status toggled");
    Ok(ApiResponse::success(StatusLoja { id, ativo }))
}

/// The session cookie gets anyone past the gate; this is the platform-owner
/// check on top of it.
fn exigir_super_admin(session: &SessionUser) -> Result<(), ApiError> {
    if session.is_super_admin {
        Ok(())
    } else {
        Err(ApiError::forbidden("Acesso restrito ao super administrador"))
    }
}
