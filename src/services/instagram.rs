// Instagram publishing over the Meta Graph API.
//
// Media goes through containers: create a container per image, wait for the
// platform to finish ingesting it, then publish. Waiting is an explicit poll
// on the container's `status_code` with bounded attempts and exponential
// backoff, capped so a stuck container fails the request instead of hanging
// the admin panel.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::database::models::{DadosContato, Loja, Veiculo};

/// Instagram caps carousels at 10 items.
const MAX_FOTOS_POST: usize = 10;

/// Graph API error code for an expired/invalid access token.
const CODE_TOKEN_EXPIRED: i64 = 190;

#[derive(Debug, Error)]
pub enum InstagramError {
    #[error("integração com instagram não configurada")]
    NotConfigured,
    #[error("veículo sem fotos")]
    NoPhotos,
    #[error("token de acesso expirado")]
    TokenExpired,
    #[error("graph api: {0}")]
    Api(String),
    #[error("apenas {ready} de {wanted} itens do álbum ficaram prontos")]
    NotEnoughItems { ready: usize, wanted: usize },
    #[error("container {0} não terminou de processar")]
    ContainerTimeout(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Container polling knobs. Delays double per attempt up to `max_delay`.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub media_id: String,
    pub fotos: usize,
}

#[derive(Debug, Deserialize)]
struct GraphObject {
    id: Option<String>,
    status_code: Option<String>,
    error: Option<GraphApiError>,
}

#[derive(Debug, Deserialize)]
struct GraphApiError {
    message: Option<String>,
    code: Option<i64>,
}

#[derive(Clone)]
pub struct InstagramPublisher {
    http: reqwest::Client,
    graph_base: String,
    poll: PollConfig,
}

impl InstagramPublisher {
    /// `graph_base` is injectable (e.g. `https://graph.facebook.com/v19.0`)
    /// so tests can point the publisher at a local mock.
    pub fn new(graph_base: impl Into<String>, poll: PollConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            graph_base: graph_base.into().trim_end_matches('/').to_string(),
            poll,
        }
    }

    /// Publishes a vehicle to the dealer's Instagram account: single photo
    /// post for one image, carousel for several. `imagens` overrides the
    /// vehicle's stored photo list when the operator picked a subset.
    pub async fn publish_vehicle(
        &self,
        loja: &Loja,
        veiculo: &Veiculo,
        imagens: Option<Vec<String>>,
        custom_tag: Option<String>,
    ) -> Result<PublishOutcome, InstagramError> {
        let (account, token) = loja
            .instagram_credentials()
            .ok_or(InstagramError::NotConfigured)?;

        let mut fotos = match imagens {
            Some(list) if !list.is_empty() => list,
            _ => veiculo.imagens.clone(),
        };
        fotos.truncate(MAX_FOTOS_POST);
        if fotos.is_empty() {
            return Err(InstagramError::NoPhotos);
        }

        let caption = build_caption(loja, veiculo, custom_tag.as_deref());

        if fotos.len() == 1 {
            tracing::info!(veiculo = %veiculo.id, "publishing single photo post");
            let container = self
                .create_container(
                    account,
                    token,
                    &[("image_url", fotos[0].as_str()), ("caption", &caption)],
                )
                .await?;
            self.wait_for_container(&container, token).await?;
            let media_id = self.publish_container(account, token, &container).await?;
            return Ok(PublishOutcome { media_id, fotos: 1 });
        }

        tracing::info!(veiculo = %veiculo.id, fotos = fotos.len(), "publishing carousel");

        let mut items = Vec::new();
        for (index, url) in fotos.iter().enumerate() {
            let result = self
                .create_container(
                    account,
                    token,
                    &[("image_url", url.as_str()), ("is_carousel_item", "true")],
                )
                .await;
            match result {
                Ok(id) => items.push(id),
                Err(InstagramError::TokenExpired) => return Err(InstagramError::TokenExpired),
                Err(e) => {
                    tracing::warn!(index, %url, "carousel item rejected: {e}");
                }
            }
        }

        if items.len() < 2 {
            return Err(InstagramError::NotEnoughItems {
                ready: items.len(),
                wanted: fotos.len(),
            });
        }

        for id in &items {
            self.wait_for_container(id, token).await?;
        }

        let album = self
            .create_container(
                account,
                token,
                &[
                    ("media_type", "CAROUSEL"),
                    ("children", &items.join(",")),
                    ("caption", &caption),
                ],
            )
            .await?;
        self.wait_for_container(&album, token).await?;
        let media_id = self.publish_container(account, token, &album).await?;

        Ok(PublishOutcome {
            media_id,
            fotos: items.len(),
        })
    }

    async fn create_container(
        &self,
        account: &str,
        token: &str,
        params: &[(&str, &str)],
    ) -> Result<String, InstagramError> {
        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("access_token", token));

        let body: GraphObject = self
            .http
            .post(format!("{}/{}/media", self.graph_base, account))
            .form(&form)
            .send()
            .await?
            .json()
            .await?;

        Self::id_or_error(body)
    }

    /// Polls the container until Instagram reports it finished ingesting.
    /// This is the explicit state machine replacing wait-and-hope sleeps:
    /// FINISHED ends the wait, ERROR/EXPIRED fails it, and running out of
    /// attempts is a timeout.
    async fn wait_for_container(
        &self,
        container_id: &str,
        token: &str,
    ) -> Result<(), InstagramError> {
        let mut delay = self.poll.initial_delay;

        for attempt in 0..self.poll.max_attempts {
            let body: GraphObject = self
                .http
                .get(format!("{}/{}", self.graph_base, container_id))
                .query(&[("fields", "status_code"), ("access_token", token)])
                .send()
                .await?
                .json()
                .await?;

            if let Some(error) = body.error {
                return Err(Self::map_api_error(error));
            }

            match body.status_code.as_deref() {
                Some("FINISHED") => return Ok(()),
                Some("ERROR") | Some("EXPIRED") => {
                    return Err(InstagramError::Api(format!(
                        "container {container_id} falhou no processamento"
                    )));
                }
                status => {
                    tracing::debug!(container_id, attempt, ?status, "container still processing");
                }
            }

            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(self.poll.max_delay);
        }

        Err(InstagramError::ContainerTimeout(container_id.to_string()))
    }

    async fn publish_container(
        &self,
        account: &str,
        token: &str,
        creation_id: &str,
    ) -> Result<String, InstagramError> {
        let body: GraphObject = self
            .http
            .post(format!("{}/{}/media_publish", self.graph_base, account))
            .form(&[("creation_id", creation_id), ("access_token", token)])
            .send()
            .await?
            .json()
            .await?;

        Self::id_or_error(body)
    }

    fn id_or_error(body: GraphObject) -> Result<String, InstagramError> {
        if let Some(error) = body.error {
            return Err(Self::map_api_error(error));
        }
        body.id
            .ok_or_else(|| InstagramError::Api("resposta sem id".to_string()))
    }

    fn map_api_error(error: GraphApiError) -> InstagramError {
        if error.code == Some(CODE_TOKEN_EXPIRED) {
            return InstagramError::TokenExpired;
        }
        InstagramError::Api(error.message.unwrap_or_else(|| "erro desconhecido".to_string()))
    }
}

/// Builds the post caption in the house style: vehicle data lines, price (the
/// promotional one wins when set), WhatsApp contact and hashtags derived
/// from the vehicle and the dealer's state.
pub fn build_caption(loja: &Loja, veiculo: &Veiculo, custom_tag: Option<&str>) -> String {
    let contato: &DadosContato = &loja.dados_contato;
    let whatsapp = contato.whatsapp.as_deref().unwrap_or("");
    let cidade = contato.cidade.as_deref().unwrap_or("");
    let estado = contato.estado.as_deref().unwrap_or("");

    let preco_linha = match veiculo.preco_promocional {
        Some(promo) => format!("🔥 Por apenas: {}🔥", format_brl(promo)),
        None => format!("💰 Valor: {}💰", format_brl(veiculo.preco)),
    };

    let tag_estado = if estado.is_empty() {
        String::new()
    } else {
        format!("#{}", estado.to_lowercase())
    };

    let abertura = custom_tag.unwrap_or("‼️🇧🇷OPORTUNIDADE🇧🇷‼️");

    format!(
        "{abertura}\n\n\
         ◾ MARCA / {marca}\n\
         ◾ MODELO / {modelo}\n\
         ◾ ANO / {ano_fab}/{ano_mod}\n\
         ◾ Km's / {km}\n\n\
         {preco_linha}\n\n\
         🚨EXTREMAMENTE CONSERVADO🚨\n\n\
         Laudo cautelar aprovado✅\n\n\
         Quer saber mais??\n\n\
         Entre em contato com nosso time de vendas pelo whatsapp (link na bio) ou pelo direct no instagram.\n\n\
         ➖➖➖➖➖➖➖➖➖➖\n\
         Contatos whatsapp 👇🏼\n\n\
         📞 {fone} - (falar com time {loja_nome})\n\n\
         Cidade: 📍 {cidade}, {estado} 📍\n\n\
         ➖➖➖➖➖➖➖➖➖➖\n\n\
         #seminovosdequalidade #usadospremium {tag_estado} #{tag_modelo} #{tag_marca}",
        marca = veiculo.marca,
        modelo = veiculo.modelo,
        ano_fab = veiculo.ano_fabricacao,
        ano_mod = veiculo.ano_modelo,
        km = format_milhar(veiculo.quilometragem),
        fone = format_whatsapp(whatsapp),
        loja_nome = loja.nome,
        tag_modelo = hashtag(&veiculo.modelo),
        tag_marca = hashtag(&veiculo.marca),
    )
    .trim()
    .to_string()
}

/// pt-BR currency: `R$ 120.000,00`.
pub fn format_brl(valor: Decimal) -> String {
    let negativo = valor.is_sign_negative();
    let centavos = (valor.abs() * Decimal::from(100))
        .round()
        .to_i128()
        .unwrap_or(0);
    let inteiro = format_milhar((centavos / 100) as i64);
    let fracao = (centavos % 100) as u8;
    let sinal = if negativo { "-" } else { "" };
    format!("{sinal}R$ {inteiro},{fracao:02}")
}

/// pt-BR thousands grouping: 15000 -> "15.000".
pub fn format_milhar(valor: i64) -> String {
    let digits = valor.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if valor < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Formats a raw Brazilian phone number: 11 digits -> `(XX) XXXXX-XXXX`,
/// 10 digits -> `(XX) XXXX-XXXX`, anything else passes through untouched.
pub fn format_whatsapp(numero: &str) -> String {
    match numero.len() {
        11 => format!("({}) {}-{}", &numero[..2], &numero[2..7], &numero[7..]),
        10 => format!("({}) {}-{}", &numero[..2], &numero[2..6], &numero[6..]),
        _ => numero.to_string(),
    }
}

/// Hashtag-safe form of a free-text name: ASCII alphanumerics, lowercased.
pub fn hashtag(texto: &str) -> String {
    texto
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::DadosContato;
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn loja() -> Loja {
        Loja {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            nome: "Marinhos Veículos".to_string(),
            slug: "marinhos".to_string(),
            custom_domain: None,
            ativo: true,
            is_super_admin: false,
            cor_primaria: None,
            sobre_loja: None,
            imagem_sobre: None,
            webhook_url_leads: None,
            instagram_access_token: Some("token".to_string()),
            instagram_account_id: Some("17841400000000000".to_string()),
            dados_contato: Json(DadosContato {
                whatsapp: Some("11999998888".to_string()),
                cidade: Some("São Paulo".to_string()),
                estado: Some("SP".to_string()),
                ..Default::default()
            }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn veiculo() -> Veiculo {
        Veiculo {
            id: Uuid::new_v4(),
            loja_id: Uuid::new_v4(),
            marca: "JEEP".to_string(),
            modelo: "Compass Trailhawk".to_string(),
            ano_fabricacao: 2016,
            ano_modelo: 2017,
            preco: Decimal::new(12000000, 2),
            preco_promocional: None,
            quilometragem: 85000,
            categoria: "SUV".to_string(),
            cor: Some("Cinza".to_string()),
            status: "disponivel".to_string(),
            imagens: vec!["https://cdn/x.jpg".to_string()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn brl_formatting_groups_thousands() {
        assert_eq!(format_brl(Decimal::new(12000000, 2)), "R$ 120.000,00");
        assert_eq!(format_brl(Decimal::new(150050, 2)), "R$ 1.500,50");
        assert_eq!(format_brl(Decimal::new(900, 2)), "R$ 9,00");
    }

    #[test]
    fn milhar_grouping() {
        assert_eq!(format_milhar(0), "0");
        assert_eq!(format_milhar(999), "999");
        assert_eq!(format_milhar(15000), "15.000");
        assert_eq!(format_milhar(1234567), "1.234.567");
    }

    #[test]
    fn whatsapp_formats_mobile_and_landline() {
        assert_eq!(format_whatsapp("11999998888"), "(11) 99999-8888");
        assert_eq!(format_whatsapp("1133334444"), "(11) 3333-4444");
        assert_eq!(format_whatsapp("999"), "999");
    }

    #[test]
    fn hashtags_keep_only_ascii_alphanumerics() {
        assert_eq!(hashtag("Compass Trailhawk"), "compasstrailhawk");
        assert_eq!(hashtag("Gol 1.0"), "gol10");
    }

    #[test]
    fn caption_uses_regular_price_and_contact() {
        let caption = build_caption(&loja(), &veiculo(), None);
        assert!(caption.contains("◾ MARCA / JEEP"));
        assert!(caption.contains("◾ ANO / 2016/2017"));
        assert!(caption.contains("◾ Km's / 85.000"));
        assert!(caption.contains("💰 Valor: R$ 120.000,00💰"));
        assert!(caption.contains("(11) 99999-8888"));
        assert!(caption.contains("#sp"));
        assert!(caption.contains("#compasstrailhawk"));
        assert!(caption.starts_with("‼️🇧🇷OPORTUNIDADE🇧🇷‼️"));
    }

    #[test]
    fn caption_prefers_promotional_price_and_custom_tag() {
        let mut v = veiculo();
        v.preco_promocional = Some(Decimal::new(9990000, 2));
        let caption = build_caption(&loja(), &v, Some("⚡OFERTA RELÂMPAGO⚡"));
        assert!(caption.contains("🔥 Por apenas: R$ 99.900,00🔥"));
        assert!(!caption.contains("💰 Valor"));
        assert!(caption.starts_with("⚡OFERTA RELÂMPAGO⚡"));
    }
}
