use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::database::models::{Veiculo, STATUS_DISPONIVEL};

use super::StoreError;

/// Storefront listing filters, straight from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VeiculoFiltro {
    pub categoria: Option<String>,
    pub marca: Option<String>,
    pub busca: Option<String>,
}

/// Typed creation payload, coerced from the admin multipart form before it
/// gets here.
#[derive(Debug, Clone)]
pub struct NovoVeiculo {
    pub marca: String,
    pub modelo: String,
    pub ano_fabricacao: i32,
    pub ano_modelo: i32,
    pub preco: Decimal,
    pub quilometragem: i64,
    pub categoria: String,
    pub cor: Option<String>,
}

/// Full-replace update for the edit form. `imagens: None` keeps the stored
/// photo list; `Some(list)` replaces it (reorder/remove).
#[derive(Debug, Clone, Deserialize)]
pub struct VeiculoAtualizacao {
    pub marca: String,
    pub modelo: String,
    pub ano_fabricacao: i32,
    pub ano_modelo: i32,
    pub preco: Decimal,
    #[serde(default)]
    pub preco_promocional: Option<Decimal>,
    pub quilometragem: i64,
    pub categoria: String,
    #[serde(default)]
    pub cor: Option<String>,
    pub status: String,
    #[serde(default)]
    pub imagens: Option<Vec<String>>,
}

pub struct VeiculoService {
    pool: PgPool,
}

impl VeiculoService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Available inventory for the public storefront, newest first.
    pub async fn list_public(
        &self,
        loja_id: Uuid,
        filtro: &VeiculoFiltro,
    ) -> Result<Vec<Veiculo>, StoreError> {
        let mut qb = QueryBuilder::new("SELECT * FROM veiculos WHERE loja_id = ");
        qb.push_bind(loja_id);
        qb.push(" AND status = ");
        qb.push_bind(STATUS_DISPONIVEL);

        if let Some(categoria) = filtro.categoria.as_deref().filter(|c| !c.is_empty()) {
            qb.push(" AND categoria = ");
            qb.push_bind(categoria.to_string());
        }
        if let Some(marca) = filtro.marca.as_deref().filter(|m| !m.is_empty()) {
            qb.push(" AND marca ILIKE ");
            qb.push_bind(marca.to_string());
        }
        if let Some(busca) = filtro.busca.as_deref().filter(|b| !b.is_empty()) {
            let pattern = format!("%{busca}%");
            qb.push(" AND (marca ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR modelo ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR cor ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        qb.push(" ORDER BY created_at DESC");

        let veiculos = qb
            .build_query_as::<Veiculo>()
            .fetch_all(&self.pool)
            .await?;
        Ok(veiculos)
    }

    /// One available vehicle for the public detail page.
    pub async fn get_public(&self, loja_id: Uuid, id: Uuid) -> Result<Veiculo, StoreError> {
        sqlx::query_as::<_, Veiculo>(
            "SELECT * FROM veiculos WHERE id = $1 AND loja_id = $2 AND status = $3",
        )
        .bind(id)
        .bind(loja_id)
        .bind(STATUS_DISPONIVEL)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("Veículo não encontrado".to_string()))
    }

    /// Full inventory for the admin panel, sold vehicles included.
    pub async fn list_own(&self, loja_id: Uuid) -> Result<Vec<Veiculo>, StoreError> {
        let veiculos = sqlx::query_as::<_, Veiculo>(
            "SELECT * FROM veiculos WHERE loja_id = $1 ORDER BY created_at DESC",
        )
        .bind(loja_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(veiculos)
    }

    pub async fn get_own(&self, loja_id: Uuid, id: Uuid) -> Result<Veiculo, StoreError> {
        sqlx::query_as::<_, Veiculo>("SELECT * FROM veiculos WHERE id = $1 AND loja_id = $2")
            .bind(id)
            .bind(loja_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("Veículo não encontrado".to_string()))
    }

    pub async fn create(
        &self,
        loja_id: Uuid,
        novo: &NovoVeiculo,
        imagens: &[String],
    ) -> Result<Veiculo, StoreError> {
        let veiculo = sqlx::query_as::<_, Veiculo>(
            r#"
            INSERT INTO veiculos
                (loja_id, marca, modelo, ano_fabricacao, ano_modelo, preco,
                 quilometragem, categoria, cor, status, imagens)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(loja_id)
        .bind(&novo.marca)
        .bind(&novo.modelo)
        .bind(novo.ano_fabricacao)
        .bind(novo.ano_modelo)
        .bind(novo.preco)
        .bind(novo.quilometragem)
        .bind(&novo.categoria)
        .bind(&novo.cor)
        .bind(STATUS_DISPONIVEL)
        .bind(imagens)
        .fetch_one(&self.pool)
        .await?;

        Ok(veiculo)
    }

    pub async fn update(
        &self,
        loja_id: Uuid,
        id: Uuid,
        dados: &VeiculoAtualizacao,
    ) -> Result<Veiculo, StoreError> {
        sqlx::query_as::<_, Veiculo>(
            r#"
            UPDATE veiculos SET
                marca = $3,
                modelo = $4,
                ano_fabricacao = $5,
                ano_modelo = $6,
                preco = $7,
                preco_promocional = $8,
                quilometragem = $9,
                categoria = $10,
                cor = $11,
                status = $12,
                imagens = COALESCE($13, imagens),
                updated_at = now()
            WHERE id = $1 AND loja_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(loja_id)
        .bind(&dados.marca)
        .bind(&dados.modelo)
        .bind(dados.ano_fabricacao)
        .bind(dados.ano_modelo)
        .bind(dados.preco)
        .bind(dados.preco_promocional)
        .bind(dados.quilometragem)
        .bind(&dados.categoria)
        .bind(&dados.cor)
        .bind(&dados.status)
        .bind(&dados.imagens)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("Veículo não encontrado".to_string()))
    }

    pub async fn delete(&self, loja_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM veiculos WHERE id = $1 AND loja_id = $2")
            .bind(id)
            .bind(loja_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Veículo não encontrado".to_string()));
        }
        Ok(())
    }

    /// Sets or clears the promotional price badge.
    pub async fn set_promocao(
        &self,
        loja_id: Uuid,
        id: Uuid,
        preco_promocional: Option<Decimal>,
    ) -> Result<Veiculo, StoreError> {
        sqlx::query_as::<_, Veiculo>(
            r#"
            UPDATE veiculos SET preco_promocional = $3, updated_at = now()
            WHERE id = $1 AND loja_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(loja_id)
        .bind(preco_promocional)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("Veículo não encontrado".to_string()))
    }

    /// Appends freshly stored photo URLs to a vehicle.
    pub async fn append_imagens(
        &self,
        loja_id: Uuid,
        id: Uuid,
        urls: &[String],
    ) -> Result<Veiculo, StoreError> {
        sqlx::query_as::<_, Veiculo>(
            r#"
            UPDATE veiculos SET imagens = imagens || $3, updated_at = now()
            WHERE id = $1 AND loja_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(loja_id)
        .bind(urls)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("Veículo não encontrado".to_string()))
    }
}
