use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A financing/contact lead captured on the public storefront. Created with
/// the identification step and optionally enriched later with credit data.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lead {
    pub id: Uuid,
    pub loja_id: Uuid,
    pub veiculo_id: Option<Uuid>,
    pub nome: String,
    pub whatsapp: String,
    pub email: Option<String>,
    pub cpf: String,
    pub data_nascimento: Option<NaiveDate>,
    pub renda_mensal: Option<Decimal>,
    pub valor_entrada: Option<Decimal>,
    pub possui_cnh: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
