use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult, SessionUser};
use crate::services::instagram::PublishOutcome;
use crate::services::VeiculoService;
use crate::state::AppState;

use super::loja_do_usuario;
use crate::handlers::session_user;

#[derive(Debug, Deserialize)]
pub struct PublicarRequest {
    /// Subset of the vehicle's photo URLs picked by the operator; defaults
    /// to the full stored list.
    #[serde(default)]
    pub imagens: Option<Vec<String>>,
    /// Custom opening line for the caption.
    #[serde(default)]
    pub tag: Option<String>,
}

/// POST /admin/api/veiculos/:id/instagram - publish the vehicle on the
/// dealer's Instagram account using their configured Graph API credentials.
pub async fn publicar(
    State(state): State<AppState>,
    session: Option<Extension<SessionUser>>,
    Path(id): Path<Uuid>,
    Json(req): Json<PublicarRequest>,
) -> ApiResult<PublishOutcome> {
    let session = session_user(session)?;
    let loja = loja_do_usuario(&state, &session).await?;

    let veiculo = VeiculoService::new(state.pool.clone())
        .get_own(loja.id, id)
        .await?;

    let outcome = state
        .instagram
        .publish_vehicle(&loja, &veiculo, req.imagens, req.tag)
        .await?;

    tracing::info!(veiculo = %veiculo.id, media = %outcome.media_id, "instagram publish ok");
    Ok(ApiResponse::success(outcome))
}
