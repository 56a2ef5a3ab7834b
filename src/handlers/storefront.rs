use axum::extract::{Path, Query, State};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{LojaPublica, Veiculo};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::veiculo_service::VeiculoFiltro;
use crate::services::{LojaService, VeiculoService};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct VitrineView {
    pub loja: LojaPublica,
    pub veiculos: Vec<Veiculo>,
}

#[derive(Debug, Serialize)]
pub struct VeiculoDetalheView {
    pub loja: LojaPublica,
    pub veiculo: Veiculo,
}

/// GET /:tenant - storefront home: dealer profile plus available inventory.
/// The tenant segment was prefixed by the rewrite middleware; an unknown
/// slug 404s here, not in the routing layer.
pub async fn vitrine_home(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Query(filtro): Query<VeiculoFiltro>,
) -> ApiResult<VitrineView> {
    let loja = LojaService::new(state.pool.clone())
        .get_active_by_slug(&tenant)
        .await?
        .ok_or_else(|| ApiError::not_found("Loja não encontrada"))?;

    let veiculos = VeiculoService::new(state.pool.clone())
        .list_public(loja.id, &filtro)
        .await?;

    Ok(ApiResponse::success(VitrineView {
        loja: loja.publica(),
        veiculos,
    }))
}

/// GET /:tenant/v/:veiculo_id - public vehicle detail page data.
pub async fn veiculo_detalhe(
    State(state): State<AppState>,
    Path((tenant, veiculo_id)): Path<(String, Uuid)>,
) -> ApiResult<VeiculoDetalheView> {
    let loja = LojaService::new(state.pool.clone())
        .get_active_by_slug(&tenant)
        .await?
        .ok_or_else(|| ApiError::not_found("Loja não encontrada"))?;

    let veiculo = VeiculoService::new(state.pool.clone())
        .get_public(loja.id, veiculo_id)
        .await?;

    Ok(ApiResponse::success(VeiculoDetalheView {
        loja: loja.publica(),
        veiculo,
    }))
}
