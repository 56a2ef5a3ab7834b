use serde::Deserialize;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{DadosContato, Loja};

use super::StoreError;

/// Typed configuration form for the admin config screen. Every field is
/// named and coerced here at the boundary; nothing downstream sees a loose
/// key/value bag.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfiguracaoLoja {
    pub nome: String,
    pub slug: String,
    #[serde(default)]
    pub custom_domain: Option<String>,
    #[serde(default)]
    pub cor_primaria: Option<String>,
    #[serde(default)]
    pub sobre_loja: Option<String>,
    #[serde(default)]
    pub webhook_url_leads: Option<String>,
    #[serde(default)]
    pub instagram_access_token: Option<String>,
    #[serde(default)]
    pub instagram_account_id: Option<String>,
    #[serde(default)]
    pub dados_contato: DadosContato,
}

pub struct LojaService {
    pool: PgPool,
}

impl LojaService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Storefront lookup for a resolved tenant slug: matches the slug or a
    /// dealer-owned custom domain, active lojas only. `None` is the
    /// tenant-not-found path the renderer turns into a 404.
    pub async fn get_active_by_slug(&self, slug: &str) -> Result<Option<Loja>, StoreError> {
        let loja = sqlx::query_as::<_, Loja>(
            "SELECT * FROM lojas WHERE (slug = $1 OR custom_domain = $1) AND ativo = TRUE",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(loja)
    }

    /// The loja owned by an authenticated admin account.
    pub async fn get_by_user(&self, user_id: Uuid) -> Result<Loja, StoreError> {
        sqlx::query_as::<_, Loja>("SELECT * FROM lojas WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("Loja não encontrada para este usuário".to_string()))
    }

    pub async fn update_config(
        &self,
        loja_id: Uuid,
        config: &ConfiguracaoLoja,
    ) -> Result<Loja, StoreError> {
        validate_slug(&config.slug)?;

        sqlx::query_as::<_, Loja>(
            r#"
            UPDATE lojas SET
                nome = $2,
                slug = $3,
                custom_domain = $4,
                cor_primaria = $5,
                sobre_loja = $6,
                webhook_url_leads = $7,
                instagram_access_token = $8,
                instagram_account_id = $9,
                dados_contato = $10,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(loja_id)
        .bind(&config.nome)
        .bind(&config.slug)
        .bind(&config.custom_domain)
        .bind(&config.cor_primaria)
        .bind(&config.sobre_loja)
        .bind(&config.webhook_url_leads)
        .bind(&config.instagram_access_token)
        .bind(&config.instagram_account_id)
        .bind(Json(&config.dados_contato))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::with_conflict(e, "Slug ou domínio já está em uso por outra loja"))?
        .ok_or_else(|| StoreError::NotFound("Loja não encontrada".to_string()))
    }

    /// Replaces the "about" image shown on the storefront.
    pub async fn set_imagem_sobre(&self, loja_id: Uuid, url: &str) -> Result<Loja, StoreError> {
        sqlx::query_as::<_, Loja>(
            "UPDATE lojas SET imagem_sobre = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(loja_id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("Loja não encontrada".to_string()))
    }

    /// Platform-wide listing for the super-admin panel.
    pub async fn list_all(&self) -> Result<Vec<Loja>, StoreError> {
        let lojas = sqlx::query_as::<_, Loja>("SELECT * FROM lojas ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(lojas)
    }

    /// Flips a loja's active flag, returning the new value.
    pub async fn toggle_ativo(&self, loja_id: Uuid) -> Result<bool, StoreError> {
        let row: Option<(bool,)> = sqlx::query_as(
            "UPDATE lojas SET ativo = NOT ativo, updated_at = now() WHERE id = $1 RETURNING ativo",
        )
        .bind(loja_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(ativo,)| ativo)
            .ok_or_else(|| StoreError::NotFound("Loja não encontrada".to_string()))
    }
}

/// Slugs become subdomain labels and path segments; restrict to the safe
/// alphabet up front instead of discovering breakage in DNS.
pub fn validate_slug(slug: &str) -> Result<(), StoreError> {
    if slug.len() < 2 || slug.len() > 63 {
        return Err(StoreError::Invalid(
            "Slug deve ter entre 2 e 63 caracteres".to_string(),
        ));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(StoreError::Invalid(
            "Slug deve conter apenas letras minúsculas, números e hífens".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_validation_accepts_dns_safe_names() {
        assert!(validate_slug("marinhos").is_ok());
        assert!(validate_slug("loja-2024").is_ok());
    }

    #[test]
    fn slug_validation_rejects_unsafe_names() {
        assert!(validate_slug("a").is_err());
        assert!(validate_slug("Marinhos").is_err());
        assert!(validate_slug("loja veiculos").is_err());
        assert!(validate_slug("loja.com").is_err());
    }
}
