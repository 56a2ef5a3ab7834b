// Lead webhook dispatch against a mocked spreadsheet endpoint.

mod common;

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vitrine_api::services::lead_service::{
    dispatch_lead_webhook, LeadContexto, LeadWebhookPayload,
};

fn contexto(webhook_url: Option<String>) -> LeadContexto {
    let lead = common::lead_basico(Uuid::new_v4());
    LeadContexto {
        lead,
        loja_nome: "Marinhos Veículos".to_string(),
        veiculo_nome: Some("Toyota Hilux SRX".to_string()),
        webhook_url,
    }
}

#[tokio::test]
async fn posts_the_integration_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/macros/s/abc"))
        .and(body_partial_json(json!({
            "origem": "Vitrine Auto SaaS",
            "loja_nome": "Marinhos Veículos",
            "nome": "Cliente Teste",
            "whatsapp": "11988887777",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = contexto(None);
    let payload = LeadWebhookPayload::from_contexto("Vitrine Auto SaaS", &ctx);
    let url = format!("{}/macros/s/abc", server.uri());

    dispatch_lead_webhook(&reqwest::Client::new(), &url, &payload)
        .await
        .unwrap();
}

#[tokio::test]
async fn webhook_http_errors_are_reported_to_the_caller() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ctx = contexto(None);
    let payload = LeadWebhookPayload::from_contexto("Vitrine Auto SaaS", &ctx);

    let result = dispatch_lead_webhook(&reqwest::Client::new(), &server.uri(), &payload).await;
    assert!(result.is_err());
}
