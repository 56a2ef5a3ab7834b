use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Lead;

use super::StoreError;

/// Identification step captured by the public financing form.
#[derive(Debug, Clone)]
pub struct NovoLead {
    pub loja_id: Uuid,
    pub veiculo_id: Option<Uuid>,
    pub nome: String,
    pub whatsapp: String,
    pub email: Option<String>,
    pub cpf: String,
    pub data_nascimento: Option<NaiveDate>,
    pub renda_mensal: Option<Decimal>,
    pub valor_entrada: Option<Decimal>,
}

/// Credit-data enrichment, second step of the same form.
#[derive(Debug, Clone)]
pub struct LeadEnriquecimento {
    pub lead_id: Uuid,
    pub loja_id: Uuid,
    pub data_nascimento: Option<NaiveDate>,
    pub renda_mensal: Option<Decimal>,
    pub valor_entrada: Option<Decimal>,
    pub possui_cnh: Option<bool>,
}

/// A persisted lead plus the context the dealer's webhook wants: display
/// names and the configured endpoint.
#[derive(Debug, Clone)]
pub struct LeadContexto {
    pub lead: Lead,
    pub loja_nome: String,
    pub veiculo_nome: Option<String>,
    pub webhook_url: Option<String>,
}

/// Payload posted to the dealer's lead webhook (spreadsheet integrations
/// and the like). Field names are part of the integration contract.
#[derive(Debug, Clone, Serialize)]
pub struct LeadWebhookPayload {
    pub origem: String,
    pub data: String,
    pub loja_nome: String,
    pub veiculo_nome: Option<String>,
    pub veiculo_id: Option<Uuid>,
    pub lead_id: Uuid,
    pub nome: String,
    pub whatsapp: String,
    pub email: Option<String>,
    pub cpf: String,
    pub data_nascimento: Option<NaiveDate>,
    pub renda_mensal: Option<Decimal>,
    pub valor_entrada: Option<Decimal>,
    pub possui_cnh: Option<bool>,
}

impl LeadWebhookPayload {
    pub fn from_contexto(origem: &str, ctx: &LeadContexto) -> Self {
        Self {
            origem: origem.to_string(),
            data: Utc::now().to_rfc3339(),
            loja_nome: ctx.loja_nome.clone(),
            veiculo_nome: ctx.veiculo_nome.clone(),
            veiculo_id: ctx.lead.veiculo_id,
            lead_id: ctx.lead.id,
            nome: ctx.lead.nome.clone(),
            whatsapp: ctx.lead.whatsapp.clone(),
            email: ctx.lead.email.clone(),
            cpf: ctx.lead.cpf.clone(),
            data_nascimento: ctx.lead.data_nascimento,
            renda_mensal: ctx.lead.renda_mensal,
            valor_entrada: ctx.lead.valor_entrada,
            possui_cnh: ctx.lead.possui_cnh,
        }
    }
}

pub struct LeadService {
    pool: PgPool,
}

impl LeadService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, novo: &NovoLead) -> Result<LeadContexto, StoreError> {
        let loja: Option<(String, Option<String>)> = sqlx::query_as(
            "SELECT nome, webhook_url_leads FROM lojas WHERE id = $1 AND ativo = TRUE",
        )
        .bind(novo.loja_id)
        .fetch_optional(&self.pool)
        .await?;

        let (loja_nome, webhook_url) =
            loja.ok_or_else(|| StoreError::NotFound("Loja não encontrada".to_string()))?;

        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads
                (loja_id, veiculo_id, nome, whatsapp, email, cpf,
                 data_nascimento, renda_mensal, valor_entrada)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(novo.loja_id)
        .bind(novo.veiculo_id)
        .bind(&novo.nome)
        .bind(&novo.whatsapp)
        .bind(&novo.email)
        .bind(&novo.cpf)
        .bind(novo.data_nascimento)
        .bind(novo.renda_mensal)
        .bind(novo.valor_entrada)
        .fetch_one(&self.pool)
        .await?;

        let veiculo_nome = self.veiculo_nome(lead.veiculo_id).await?;

        Ok(LeadContexto {
            lead,
            loja_nome,
            veiculo_nome,
            webhook_url,
        })
    }

    pub async fn enrich(&self, dados: &LeadEnriquecimento) -> Result<LeadContexto, StoreError> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads SET
                data_nascimento = COALESCE($3, data_nascimento),
                renda_mensal = COALESCE($4, renda_mensal),
                valor_entrada = COALESCE($5, valor_entrada),
                possui_cnh = COALESCE($6, possui_cnh),
                updated_at = now()
            WHERE id = $1 AND loja_id = $2
            RETURNING *
            "#,
        )
        .bind(dados.lead_id)
        .bind(dados.loja_id)
        .bind(dados.data_nascimento)
        .bind(dados.renda_mensal)
        .bind(dados.valor_entrada)
        .bind(dados.possui_cnh)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("Simulação não encontrada".to_string()))?;

        let loja: Option<(String, Option<String>)> =
            sqlx::query_as("SELECT nome, webhook_url_leads FROM lojas WHERE id = $1")
                .bind(dados.loja_id)
                .fetch_optional(&self.pool)
                .await?;
        let (loja_nome, webhook_url) =
            loja.ok_or_else(|| StoreError::NotFound("Loja não encontrada".to_string()))?;

        let veiculo_nome = self.veiculo_nome(lead.veiculo_id).await?;

        Ok(LeadContexto {
            lead,
            loja_nome,
            veiculo_nome,
            webhook_url,
        })
    }

    async fn veiculo_nome(&self, veiculo_id: Option<Uuid>) -> Result<Option<String>, StoreError> {
        let Some(id) = veiculo_id else {
            return Ok(None);
        };
        let nome: Option<(String,)> =
            sqlx::query_as("SELECT marca || ' ' || modelo FROM veiculos WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(nome.map(|(n,)| n))
    }
}

/// Posts the payload to the dealer's configured webhook. Callers spawn this
/// in the background; a webhook failure must never fail the lead response.
pub async fn dispatch_lead_webhook(
    client: &reqwest::Client,
    url: &str,
    payload: &LeadWebhookPayload,
) -> Result<(), reqwest::Error> {
    client
        .post(url)
        .json(payload)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}
