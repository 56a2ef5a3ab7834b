#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::types::Json;
use uuid::Uuid;

use vitrine_api::database::models::{DadosContato, Lead, Loja, Veiculo};

/// A dealer with Instagram credentials pointing at `account`.
pub fn loja_com_instagram(account: &str) -> Loja {
    Loja {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        nome: "Marinhos Veículos".to_string(),
        slug: "marinhos".to_string(),
        custom_domain: None,
        ativo: true,
        is_super_admin: false,
        cor_primaria: Some("#3b82f6".to_string()),
        sobre_loja: None,
        imagem_sobre: None,
        webhook_url_leads: None,
        instagram_access_token: Some("token-de-teste".to_string()),
        instagram_account_id: Some(account.to_string()),
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

pub fn veiculo_com_fotos(fotos: &[&str]) -> Veiculo {
    Veiculo {
        id: Uuid::new_v4(),
        loja_id: Uuid::new_v4(),
        marca: "Toyota".to_string(),
        modelo: "Hilux SRX".to_string(),
        ano_fabricacao: 2023,
        ano_modelo: 2024,
        preco: Decimal::new(25000000, 2),
        preco_promocional: None,
        quilometragem: 15000,
        categoria: "Picape".to_string(),
        cor: Some("Prata".to_string()),
        status: "disponivel".to_string(),
        imagens: fotos.iter().map(|f| f.to_string()).collect(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn lead_basico(loja_id: Uuid) -> Lead {
    Lead {
        id: Uuid::new_v4(),
        loja_id,
        veiculo_id: None,
        nome: "Cliente Teste".to_string(),
        whatsapp: "11988887777".to_string(),
        email: Some("cliente@example.com".to_string()),
        cpf: "12345678900".to_string(),
        data_nascimento: None,
        renda_mensal: Some(Decimal::new(550000, 2)),
        valor_entrada: None,
        possui_cnh: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
