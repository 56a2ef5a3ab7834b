use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Contact bundle shown on the storefront, stored as one jsonb column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DadosContato {
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub telefone_fixo: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub endereco: Option<String>,
    #[serde(default)]
    pub cidade: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub cep: Option<String>,
    #[serde(default)]
    pub horario_funcionamento: Option<String>,
    #[serde(default)]
    pub google_maps_embed: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
}

/// A dealer profile: one row per tenant. The slug (or custom domain) is what
/// the tenant resolver hands to the storefront lookup.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loja {
    pub id: Uuid,
    pub user_id: Uuid,
    pub nome: String,
    pub slug: String,
    pub custom_domain: Option<String>,
    pub ativo: bool,
    pub is_super_admin: bool,
    pub cor_primaria: Option<String>,
    pub sobre_loja: Option<String>,
    pub imagem_sobre: Option<String>,
    pub webhook_url_leads: Option<String>,
    pub instagram_access_token: Option<String>,
    pub instagram_account_id: Option<String>,
    pub dados_contato: Json<DadosContato>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storefront-facing view: no credentials, no webhook wiring, no owner id.
#[derive(Debug, Clone, Serialize)]
pub struct LojaPublica {
    pub id: Uuid,
    pub nome: String,
    pub slug: String,
    pub cor_primaria: Option<String>,
    pub sobre_loja: Option<String>,
    pub imagem_sobre: Option<String>,
    pub dados_contato: DadosContato,
}

impl Loja {
    pub fn publica(&self) -> LojaPublica {
        LojaPublica {
            id: self.id,
            nome: self.nome.clone(),
            slug: self.slug.clone(),
            cor_primaria: self.cor_primaria.clone(),
            sobre_loja: self.sobre_loja.clone(),
            imagem_sobre: self.imagem_sobre.clone(),
            dados_contato: self.dados_contato.0.clone(),
        }
    }

    pub fn instagram_credentials(&self) -> Option<(&str, &str)> {
        match (
            self.instagram_account_id.as_deref(),
            self.instagram_access_token.as_deref(),
        ) {
            (Some(account), Some(token)) if !account.is_empty() && !token.is_empty() => {
                Some((account, token))
            }
            _ => None,
        }
    }
}
