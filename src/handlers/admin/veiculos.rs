use axum::extract::{Multipart, Path, State};
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::config::config as app_config;
use crate::database::models::Veiculo;
use crate::error::ApiError;
use crate::imaging::RawUpload;
use crate::middleware::{ApiResponse, ApiResult, SessionUser};
use crate::services::veiculo_service::{NovoVeiculo, VeiculoAtualizacao};
use crate::services::VeiculoService;
use crate::state::AppState;

use super::{loja_do_usuario, processar_fotos, FotoRejeitada};
use crate::handlers::session_user;

#[derive(Debug, Serialize)]
pub struct VeiculoComFotos {
    pub veiculo: Veiculo,
    pub fotos_enviadas: usize,
    pub fotos_rejeitadas: Vec<FotoRejeitada>,
}

#[derive(Debug, Deserialize)]
pub struct PromocaoRequest {
    #[serde(default)]
    pub preco_promocional: Option<Decimal>,
}

/// GET /admin/api/veiculos - the dealer's full inventory, sold included.
pub async fn listar(
    State(state): State<AppState>,
    session: Option<Extension<SessionUser>>,
) -> ApiResult<Vec<Veiculo>> {
    let session = session_user(session)?;
    let loja = loja_do_usuario(&state, &session).await?;

    let veiculos = VeiculoService::new(state.pool.clone())
        .list_own(loja.id)
        .await?;
    Ok(ApiResponse::success(veiculos))
}

/// POST /admin/api/veiculos - multipart create: typed fields plus up to the
/// configured number of photos. Each photo is normalized independently;
/// rejects are listed in the response while the vehicle and surviving
/// photos still land.
pub async fn criar(
    State(state): State<AppState>,
    session: Option<Extension<SessionUser>>,
    multipart: Multipart,
) -> ApiResult<VeiculoComFotos> {
    let session = session_user(session)?;
    let loja = loja_do_usuario(&state, &session).await?;

    let form = ler_formulario(multipart).await?;
    let novo = coagir_novo_veiculo(&form.campos)?;

    let (urls, fotos_rejeitadas) = processar_fotos(&state, loja.id, form.fotos).await;

    let veiculo = VeiculoService::new(state.pool.clone())
        .create(loja.id, &novo, &urls)
        .await?;

    Ok(ApiResponse::created(VeiculoComFotos {
        veiculo,
        fotos_enviadas: urls.len(),
        fotos_rejeitadas,
    }))
}

/// PUT /admin/api/veiculos/:id - full update from the edit form.
pub async fn atualizar(
    State(state): State<AppState>,
    session: Option<Extension<SessionUser>>,
    Path(id): Path<Uuid>,
    Json(dados): Json<VeiculoAtualizacao>,
) -> ApiResult<Veiculo> {
    let session = session_user(session)?;
    let loja = loja_do_usuario(&state, &session).await?;

    let veiculo = VeiculoService::new(state.pool.clone())
        .update(loja.id, id, &dados)
        .await?;
    Ok(ApiResponse::success(veiculo))
}

/// DELETE /admin/api/veiculos/:id
pub async fn excluir(
    State(state): State<AppState>,
    session: Option<Extension<SessionUser>>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let session = session_user(session)?;
    let loja = loja_do_usuario(&state, &session).await?;

    VeiculoService::new(state.pool.clone())
        .delete(loja.id, id)
        .await?;
    Ok(ApiResponse::<()>::no_content())
}

/// POST /admin/api/veiculos/:id/promo - set or clear the promotional price.
pub async fn definir_promocao(
    State(state): State<AppState>,
    session: Option<Extension<SessionUser>>,
    Path(id): Path<Uuid>,
    Json(req): Json<PromocaoRequest>,
) -> ApiResult<Veiculo> {
    let session = session_user(session)?;
    let loja = loja_do_usuario(&state, &session).await?;

    let veiculo = VeiculoService::new(state.pool.clone())
        .set_promocao(loja.id, id, req.preco_promocional)
        .await?;
    Ok(ApiResponse::success(veiculo))
}

/// POST /admin/api/veiculos/:id/imagens - append photos to an existing
/// vehicle, same pipeline as creation.
pub async fn adicionar_imagens(
    State(state): State<AppState>,
    session: Option<Extension<SessionUser>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<VeiculoComFotos> {
    let session = session_user(session)?;
    let loja = loja_do_usuario(&state, &session).await?;

    let form = ler_formulario(multipart).await?;
    if form.fotos.is_empty() {
        return Err(ApiError::bad_request("Nenhuma foto enviada"));
    }

    let (urls, fotos_rejeitadas) = processar_fotos(&state, loja.id, form.fotos).await;

    let service = VeiculoService::new(state.pool.clone());
    let veiculo = if urls.is_empty() {
        service.get_own(loja.id, id).await?
    } else {
        service.append_imagens(loja.id, id, &urls).await?
    };

    Ok(ApiResponse::success(VeiculoComFotos {
        veiculo,
        fotos_enviadas: urls.len(),
        fotos_rejeitadas,
    }))
}

struct FormularioVeiculo {
    campos: HashMap<String, String>,
    fotos: Vec<RawUpload>,
}

/// Drains the multipart stream: text fields into a map for coercion, photo
/// parts (field name `fotos`) into raw uploads. Empty file parts - browsers
/// send one for a blank file input - are dropped, and the photo count is
/// capped at the configured maximum.
async fn ler_formulario(mut multipart: Multipart) -> Result<FormularioVeiculo, ApiError> {
    let max_fotos = app_config().imaging.max_fotos;
    let mut campos = HashMap::new();
    let mut fotos = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Formulário inválido: {e}")))?
    {
        let nome = field.name().unwrap_or_default().to_string();

        if nome == "fotos" {
            let arquivo = field.file_name().unwrap_or("foto").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Upload interrompido: {e}")))?
                .to_vec();

            if !bytes.is_empty() && fotos.len() < max_fotos {
                fotos.push(RawUpload {
                    name: arquivo,
                    content_type,
                    bytes,
                });
            }
        } else {
            let valor = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(format!("Formulário inválido: {e}")))?;
            campos.insert(nome, valor);
        }
    }

    Ok(FormularioVeiculo { campos, fotos })
}

/// Boundary coercion of the creation form: named fields, typed values, one
/// validation error naming every bad field at once.
fn coagir_novo_veiculo(campos: &HashMap<String, String>) -> Result<NovoVeiculo, ApiError> {
    let mut erros = HashMap::new();

    let marca = texto(campos, "marca", &mut erros);
    let modelo = texto(campos, "modelo", &mut erros);
    let ano_fabricacao = inteiro(campos, "ano_fabricacao", &mut erros);
    let ano_modelo = inteiro(campos, "ano_modelo", &mut erros);
    let preco = decimal(campos, "preco", &mut erros);

    let quilometragem = campos
        .get("km")
        .or_else(|| campos.get("quilometragem"))
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0);
    let categoria = campos
        .get("categoria")
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .unwrap_or("Outros")
        .to_string();
    let cor = campos
        .get("cor")
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    if !erros.is_empty() {
        return Err(ApiError::validation_error(
            "Campos inválidos no formulário",
            Some(erros),
        ));
    }

    Ok(NovoVeiculo {
        marca: marca.unwrap(),
        modelo: modelo.unwrap(),
        ano_fabricacao: ano_fabricacao.unwrap(),
        ano_modelo: ano_modelo.unwrap(),
        preco: preco.unwrap(),
        quilometragem,
        categoria,
        cor,
    })
}

fn texto(
    campos: &HashMap<String, String>,
    campo: &str,
    erros: &mut HashMap<String, String>,
) -> Option<String> {
    match campos.get(campo).map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            erros.insert(campo.to_string(), "Campo obrigatório".to_string());
            None
        }
    }
}

fn inteiro(
    campos: &HashMap<String, String>,
    campo: &str,
    erros: &mut HashMap<String, String>,
) -> Option<i32> {
    match campos.get(campo).and_then(|v| v.trim().parse::<i32>().ok()) {
        Some(v) => Some(v),
        None => {
            erros.insert(campo.to_string(), "Número inválido".to_string());
            None
        }
    }
}

fn decimal(
    campos: &HashMap<String, String>,
    campo: &str,
    erros: &mut HashMap<String, String>,
) -> Option<Decimal> {
    match campos.get(campo).and_then(|v| Decimal::from_str(v.trim()).ok()) {
        Some(v) => Some(v),
        None => {
            erros.insert(campo.to_string(), "Valor inválido".to_string());
            None
        }
    }
}
