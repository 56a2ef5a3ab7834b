use axum::extract::{Multipart, State};
use axum::{Extension, Json};
use std::collections::HashMap;
use url::Url;

use crate::database::models::Loja;
use crate::error::ApiError;
use crate::imaging::RawUpload;
use crate::middleware::{ApiResponse, ApiResult, SessionUser};
use crate::services::loja_service::ConfiguracaoLoja;
use crate::services::LojaService;
use crate::state::AppState;

use super::{loja_do_usuario, processar_fotos};
use crate::handlers::session_user;

/// PUT /admin/api/config - white-label storefront configuration. The form
/// arrives as named, typed fields; empty strings mean "clear this".
pub async fn atualizar_config(
    State(state): State<AppState>,
    session: Option<Extension<SessionUser>>,
    Json(mut form): Json<ConfiguracaoLoja>,
) -> ApiResult<Loja> {
    let session = session_user(session)?;
    let loja = loja_do_usuario(&state, &session).await?;

    normalizar(&mut form);
    validar(&form)?;

    let atualizada = LojaService::new(state.pool.clone())
        .update_config(loja.id, &form)
        .await?;

    Ok(ApiResponse::success(atualizada))
}

/// POST /admin/api/config/imagem-sobre - replaces the storefront "about"
/// photo. Single file, same normalization pipeline as vehicle photos.
pub async fn enviar_imagem_sobre(
    State(state): State<AppState>,
    session: Option<Extension<SessionUser>>,
    mut multipart: Multipart,
) -> ApiResult<Loja> {
    let session = session_user(session)?;
    let loja = loja_do_usuario(&state, &session).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Formulário inválido: {e}")))?
    {
        if field.name() != Some("imagem_sobre") {
            continue;
        }
        let name = field.file_name().unwrap_or("imagem-sobre").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Upload interrompido: {e}")))?
            .to_vec();
        if !bytes.is_empty() {
            upload = Some(RawUpload {
                name,
                content_type,
                bytes,
            });
        }
    }

    let upload = upload.ok_or_else(|| ApiError::bad_request("Nenhuma imagem enviada"))?;

    let (urls, rejeitadas) = processar_fotos(&state, loja.id, vec![upload]).await;
    if let Some(rejeitada) = rejeitadas.into_iter().next() {
        return Err(ApiError::bad_request(format!(
            "{}: {}",
            rejeitada.arquivo, rejeitada.motivo
        )));
    }
    let url = urls
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::internal_server_error("Falha ao salvar arquivo"))?;

    let atualizada = LojaService::new(state.pool.clone())
        .set_imagem_sobre(loja.id, &url)
        .await?;

    Ok(ApiResponse::success(atualizada))
}

/// Empty strings from cleared form inputs become NULLs.
fn normalizar(form: &mut ConfiguracaoLoja) {
    for campo in [
        &mut form.custom_domain,
        &mut form.cor_primaria,
        &mut form.sobre_loja,
        &mut form.webhook_url_leads,
        &mut form.instagram_access_token,
        &mut form.instagram_account_id,
    ] {
        if campo.as_deref().is_some_and(|v| v.trim().is_empty()) {
            *campo = None;
        }
    }
}

fn validar(form: &ConfiguracaoLoja) -> Result<(), ApiError> {
    let mut erros = HashMap::new();

    if form.nome.trim().is_empty() {
        erros.insert("nome".to_string(), "Campo obrigatório".to_string());
    }
    if let Some(webhook) = form.webhook_url_leads.as_deref() {
        if Url::parse(webhook).is_err() {
            erros.insert(
                "webhook_url_leads".to_string(),
                "URL inválida".to_string(),
            );
        }
    }

    if erros.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error(
            "Configuração inválida",
            Some(erros),
        ))
    }
}
