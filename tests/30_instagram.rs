// Instagram publishing against a mocked Graph API: container creation,
// status polling, carousel assembly and the error paths.

mod common;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vitrine_api::services::instagram::{InstagramError, InstagramPublisher, PollConfig};

const ACCOUNT: &str = "17841400000000000";

fn publisher(server: &MockServer, max_attempts: u32) -> InstagramPublisher {
    InstagramPublisher::new(
        server.uri(),
        PollConfig {
            max_attempts,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
        },
    )
}

#[tokio::test]
async fn publishes_single_photo_after_container_finishes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{ACCOUNT}/media")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "111" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/111"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status_code": "FINISHED" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/{ACCOUNT}/media_publish")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "222" })))
        .expect(1)
        .mount(&server)
        .await;

    let loja = common::loja_com_instagram(ACCOUNT);
    let veiculo = common::veiculo_com_fotos(&["https://cdn.example/a.jpg"]);

    let outcome = publisher(&server, 3)
        .publish_vehicle(&loja, &veiculo, None, None)
        .await
        .unwrap();

    assert_eq!(outcome.media_id, "222");
    assert_eq!(outcome.fotos, 1);
}

#[tokio::test]
async fn carousel_builds_items_then_album_then_publishes() {
    let server = MockServer::start().await;

    // Per-photo containers.
    Mock::given(method("POST"))
        .and(path(format!("/{ACCOUNT}/media")))
        .and(body_string_contains("is_carousel_item=true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "item1" })))
        .expect(3)
        .mount(&server)
        .await;
    // Album container.
    Mock::given(method("POST"))
        .and(path(format!("/{ACCOUNT}/media")))
        .and(body_string_contains("media_type=CAROUSEL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "album9" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status_code": "FINISHED" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/album9"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status_code": "FINISHED" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/{ACCOUNT}/media_publish")))
        .and(body_string_contains("creation_id=album9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "post7" })))
        .expect(1)
        .mount(&server)
        .await;

    let loja = common::loja_com_instagram(ACCOUNT);
    let veiculo = common::veiculo_com_fotos(&[
        "https://cdn.example/a.jpg",
        "https://cdn.example/b.jpg",
        "https://cdn.example/c.jpg",
    ]);

    let outcome = publisher(&server, 3)
        .publish_vehicle(&loja, &veiculo, None, None)
        .await
        .unwrap();

    assert_eq!(outcome.media_id, "post7");
    assert_eq!(outcome.fotos, 3);
}

#[tokio::test]
async fn expired_token_maps_to_its_own_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{ACCOUNT}/media")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "Error validating access token", "code": 190 }
        })))
        .mount(&server)
        .await;

    let loja = common::loja_com_instagram(ACCOUNT);
    let veiculo = common::veiculo_com_fotos(&["https://cdn.example/a.jpg"]);

    let err = publisher(&server, 3)
        .publish_vehicle(&loja, &veiculo, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, InstagramError::TokenExpired));
}

#[tokio::test]
async fn stuck_container_times_out_after_bounded_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{ACCOUNT}/media")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "111" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/111"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status_code": "IN_PROGRESS" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let loja = common::loja_com_instagram(ACCOUNT);
    let veiculo = common::veiculo_com_fotos(&["https://cdn.example/a.jpg"]);

    let err = publisher(&server, 2)
        .publish_vehicle(&loja, &veiculo, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, InstagramError::ContainerTimeout(_)));
}

#[tokio::test]
async fn missing_credentials_and_missing_photos_fail_fast() {
    let server = MockServer::start().await;
    let publisher = publisher(&server, 3);

    let mut loja = common::loja_com_instagram(ACCOUNT);
    loja.instagram_access_token = None;
    let veiculo = common::veiculo_com_fotos(&["https://cdn.example/a.jpg"]);
    let err = publisher
        .publish_vehicle(&loja, &veiculo, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, InstagramError::NotConfigured));

    let loja = common::loja_com_instagram(ACCOUNT);
    let sem_fotos = common::veiculo_com_fotos(&[]);
    let err = publisher
        .publish_vehicle(&loja, &sem_fotos, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, InstagramError::NoPhotos));
}
