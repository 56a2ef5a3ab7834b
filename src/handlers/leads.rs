use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::lead_service::{
    dispatch_lead_webhook, LeadContexto, LeadEnriquecimento, LeadWebhookPayload, NovoLead,
};
use crate::services::LeadService;
use crate::state::AppState;

const ORIGEM_CADASTRO: &str = "Vitrine Auto SaaS";
const ORIGEM_CREDITO: &str = "Vitrine Auto SaaS (Etapa 2 - Crédito)";

/// Wire format of the public financing form. Money fields arrive as the
/// masked strings the form shows ("R$ 1.500,00") and are coerced here.
#[derive(Debug, Deserialize)]
pub struct NovoLeadRequest {
    pub loja_id: Option<Uuid>,
    #[serde(default)]
    pub veiculo_id: Option<Uuid>,
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub data_nascimento: Option<String>,
    #[serde(default)]
    pub renda_mensal: Option<String>,
    #[serde(default)]
    pub valor_entrada: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AtualizarLeadRequest {
    pub lead_id: Option<Uuid>,
    pub loja_id: Option<Uuid>,
    #[serde(default)]
    pub data_nascimento: Option<String>,
    #[serde(default)]
    pub renda_mensal: Option<String>,
    #[serde(default)]
    pub valor_entrada: Option<String>,
    #[serde(default)]
    pub possui_cnh: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct LeadResponse {
    pub lead_id: Uuid,
    pub webhook_triggered: Option<bool>,
}

/// POST /api/leads - public lead capture. Persists the lead and fires the
/// dealer's webhook in the background; webhook failures are logged, never
/// surfaced to the storefront visitor.
pub async fn criar_lead(
    State(state): State<AppState>,
    Json(req): Json<NovoLeadRequest>,
) -> ApiResult<LeadResponse> {
    let mut erros = HashMap::new();

    let loja_id = obrigatorio(req.loja_id, "loja_id", &mut erros);
    let nome = texto_obrigatorio(req.nome.as_deref(), "nome", &mut erros);
    let whatsapp = texto_obrigatorio(req.whatsapp.as_deref(), "whatsapp", &mut erros);
    let cpf = texto_obrigatorio(req.cpf.as_deref(), "cpf", &mut erros);
    let data_nascimento = data_opcional(req.data_nascimento.as_deref(), &mut erros);

    if !erros.is_empty() {
        return Err(ApiError::validation_error(
            "Campos obrigatórios faltando",
            Some(erros),
        ));
    }

    let novo = NovoLead {
        loja_id: loja_id.unwrap(),
        veiculo_id: req.veiculo_id,
        nome: nome.unwrap(),
        whatsapp: whatsapp.unwrap(),
        email: req.email.filter(|e| !e.is_empty()),
        cpf: cpf.unwrap(),
        data_nascimento,
        renda_mensal: req.renda_mensal.as_deref().and_then(parse_money_string),
        valor_entrada: req.valor_entrada.as_deref().and_then(parse_money_string),
    };

    let contexto = LeadService::new(state.pool.clone()).create(&novo).await?;
    let webhook_triggered = disparar_webhook(&state, ORIGEM_CADASTRO, &contexto);

    Ok(ApiResponse::created(LeadResponse {
        lead_id: contexto.lead.id,
        webhook_triggered,
    }))
}

/// PUT /api/leads - second step of the financing form (credit data).
pub async fn atualizar_lead(
    State(state): State<AppState>,
    Json(req): Json<AtualizarLeadRequest>,
) -> ApiResult<LeadResponse> {
    let mut erros = HashMap::new();

    let lead_id = obrigatorio(req.lead_id, "lead_id", &mut erros);
    let loja_id = obrigatorio(req.loja_id, "loja_id", &mut erros);
    let data_nascimento = data_opcional(req.data_nascimento.as_deref(), &mut erros);

    if !erros.is_empty() {
        return Err(ApiError::validation_error(
            "ID do lead e da loja são obrigatórios",
            Some(erros),
        ));
    }

    let dados = LeadEnriquecimento {
        lead_id: lead_id.unwrap(),
        loja_id: loja_id.unwrap(),
        data_nascimento,
        renda_mensal: req.renda_mensal.as_deref().and_then(parse_money_string),
        valor_entrada: req.valor_entrada.as_deref().and_then(parse_money_string),
        possui_cnh: req.possui_cnh,
    };

    let contexto = LeadService::new(state.pool.clone()).enrich(&dados).await?;
    let webhook_triggered = disparar_webhook(&state, ORIGEM_CREDITO, &contexto);

    Ok(ApiResponse::success(LeadResponse {
        lead_id: contexto.lead.id,
        webhook_triggered,
    }))
}

/// Fire-and-forget webhook dispatch. `None` when the loja has no webhook
/// configured; `Some(true)` once the background task is spawned.
fn disparar_webhook(state: &AppState, origem: &str, contexto: &LeadContexto) -> Option<bool> {
    let url = contexto.webhook_url.clone()?;
    let payload = LeadWebhookPayload::from_contexto(origem, contexto);
    let client = state.http.clone();

    tokio::spawn(async move {
        if let Err(e) = dispatch_lead_webhook(&client, &url, &payload).await {
            tracing::error!("lead webhook failed for {}: {}", url, e);
        }
    });

    Some(true)
}

fn obrigatorio<T>(valor: Option<T>, campo: &str, erros: &mut HashMap<String, String>) -> Option<T> {
    if valor.is_none() {
        erros.insert(campo.to_string(), "Campo obrigatório".to_string());
    }
    valor
}

fn texto_obrigatorio(
    valor: Option<&str>,
    campo: &str,
    erros: &mut HashMap<String, String>,
) -> Option<String> {
    match valor.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            erros.insert(campo.to_string(), "Campo obrigatório".to_string());
            None
        }
    }
}

fn data_opcional(
    valor: Option<&str>,
    erros: &mut HashMap<String, String>,
) -> Option<NaiveDate> {
    let raw = valor.filter(|v| !v.is_empty())?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(data) => Some(data),
        Err(_) => {
            erros.insert(
                "data_nascimento".to_string(),
                "Data inválida, use AAAA-MM-DD".to_string(),
            );
            None
        }
    }
}

/// Coerces masked pt-BR money strings ("R$ 1.500,00") into a decimal.
/// Unparseable input counts as absent.
pub fn parse_money_string(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned.replace(',', ".")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_parsing_handles_masked_input() {
        assert_eq!(
            parse_money_string("R$ 1.500,00"),
            Some(Decimal::new(150000, 2))
        );
        assert_eq!(parse_money_string("2500"), Some(Decimal::from(2500)));
        assert_eq!(
            parse_money_string("3.000,50"),
            Some(Decimal::new(300050, 2))
        );
        assert_eq!(parse_money_string(""), None);
        assert_eq!(parse_money_string("R$ "), None);
    }

    #[test]
    fn dates_must_be_iso() {
        let mut erros = HashMap::new();
        assert_eq!(
            data_opcional(Some("1990-05-20"), &mut erros),
            NaiveDate::from_ymd_opt(1990, 5, 20)
        );
        assert!(erros.is_empty());

        assert_eq!(data_opcional(Some("20/05/1990"), &mut erros), None);
        assert!(erros.contains_key("data_nascimento"));
    }
}
