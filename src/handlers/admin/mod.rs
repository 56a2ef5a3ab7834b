pub mod config;
pub mod instagram;
pub mod veiculos;

use axum::extract::State;
use axum::Extension;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::config as app_config;
use crate::database::models::Loja;
use crate::error::ApiError;
use crate::imaging::{normalize_batch, NormalizeOptions, RawUpload};
use crate::middleware::{ApiResponse, ApiResult, SessionUser};
use crate::services::LojaService;
use crate::state::AppState;
use crate::storage::photo_key;

use super::session_user;

/// GET /admin/login - the gate's redirect target. Session issuance lives in
/// the identity provider; this endpoint only tells the caller where to go.
pub async fn login_page() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "message": "Autentique-se no provedor de identidade para receber o cookie de sessão.",
        "cookie": app_config().security.session_cookie,
    })))
}

/// GET /admin/api/loja - the signed-in dealer's own profile.
pub async fn loja_atual(
    State(state): State<AppState>,
    session: Option<Extension<SessionUser>>,
) -> ApiResult<Loja> {
    let session = session_user(session)?;
    let loja = loja_do_usuario(&state, &session).await?;
    Ok(ApiResponse::success(loja))
}

pub(crate) async fn loja_do_usuario(
    state: &AppState,
    session: &SessionUser,
) -> Result<Loja, ApiError> {
    LojaService::new(state.pool.clone())
        .get_by_user(session.user_id)
        .await
        .map_err(ApiError::from)
}

/// One photo that did not survive normalization or storage. Reported
/// per-file so the dealer knows exactly which shot to redo.
#[derive(Debug, Serialize)]
pub struct FotoRejeitada {
    pub arquivo: String,
    pub motivo: String,
}

/// Runs the upload batch through the normalizer and into storage. Photos
/// fail independently: the survivors land, the rejects come back named.
pub(crate) async fn processar_fotos(
    state: &AppState,
    loja_id: Uuid,
    fotos: Vec<RawUpload>,
) -> (Vec<String>, Vec<FotoRejeitada>) {
    let imaging = &app_config().imaging;
    let opts = NormalizeOptions {
        max_width: imaging.max_width,
        max_height: imaging.max_height,
        jpeg_quality: imaging.jpeg_quality,
    };

    let resultados = normalize_batch(fotos, opts, imaging.batch_concurrency).await;

    let mut urls = Vec::new();
    let mut rejeitadas = Vec::new();
    for (arquivo, resultado) in resultados {
        match resultado {
            Ok(foto) => {
                let key = photo_key(loja_id, &foto.bytes);
                match state.storage.put(&key, &foto.bytes, foto.content_type).await {
                    Ok(url) => urls.push(url),
                    Err(e) => {
                        tracing::error!(%arquivo, "photo storage failed: {e}");
                        rejeitadas.push(FotoRejeitada {
                            arquivo,
                            motivo: "Falha ao salvar arquivo".to_string(),
                        });
                    }
                }
            }
            Err(e) => {
                tracing::warn!(%arquivo, "photo rejected: {e}");
                rejeitadas.push(FotoRejeitada {
                    arquivo,
                    motivo: e.to_string(),
                });
            }
        }
    }

    (urls, rejeitadas)
}
