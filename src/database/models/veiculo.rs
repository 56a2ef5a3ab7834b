use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_DISPONIVEL: &str = "disponivel";
pub const STATUS_VENDIDO: &str = "vendido";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Veiculo {
    pub id: Uuid,
    pub loja_id: Uuid,
    pub marca: String,
    pub modelo: String,
    pub ano_fabricacao: i32,
    pub ano_modelo: i32,
    pub preco: Decimal,
    pub preco_promocional: Option<Decimal>,
    pub quilometragem: i64,
    pub categoria: String,
    pub cor: Option<String>,
    pub status: String,
    /// Public URLs of normalized photos, in display order.
    pub imagens: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
