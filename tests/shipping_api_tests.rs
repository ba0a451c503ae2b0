use std::sync::Arc;

use secrecy::Secret;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use piletas_sync::config::{PiletasSettings, ShippingApiSettings};
use piletas_sync::errors::PiletasError;
use piletas_sync::models::LifecycleStatus;
use piletas_sync::repositories::{InMemoryBayRepository, InMemoryDisplayOrderRepository};
use piletas_sync::services::{
    BayAllocator, ShippingApiClient, TemperatureGate, TemperatureService,
};

fn settings_for(server: &MockServer) -> ShippingApiSettings {
    ShippingApiSettings {
        base_url: format!("{}/", server.uri()),
        bearer_token: Secret::new("test-token".to_string()),
        page_size: 2,
        timeout_secs: 5,
    }
}

fn piletas_settings() -> PiletasSettings {
    PiletasSettings {
        bay_count: 5,
        utc_offset_minutes: -180,
        temperature_threshold: 41.0,
        temperature_min: 0.0,
        temperature_max: 50.0,
        default_timer_category: "melaza-descarga".to_string(),
    }
}

fn record(id: i64, code_gen: &str, status: i32, arrival: &str) -> serde_json::Value {
    json!({
        "id": id,
        "codeGen": code_gen,
        "tipoUnidad": "P",
        "status": status,
        "fechaIngreso": arrival,
    })
}

#[tokio::test]
async fn status_listing_walks_every_page_with_the_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shipping/status/7"))
        .and(header("Authorization", "Bearer test-token"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                record(1, "TRX-1", 7, "2024-06-01 08:01:00"),
                record(2, "TRX-2", 7, "2024-06-01 08:02:00"),
            ],
            "current_page": 1,
            "last_page": 2,
            "total": 3,
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/shipping/status/7"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [record(3, "TRX-3", 7, "2024-06-01 08:03:00")],
            "current_page": 2,
            "last_page": 2,
            "total": 3,
        })))
        .mount(&server)
        .await;

    let client = ShippingApiClient::new(&settings_for(&server)).expect("client");
    let records = client
        .fetch_all_by_status(LifecycleStatus::Queued)
        .await
        .expect("listing succeeds");
    assert_eq!(records.len(), 3);
    assert_eq!(records[2].code_gen.as_deref(), Some("TRX-3"));
}

#[tokio::test]
async fn upstream_rejection_carries_the_upstream_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/status/push"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "Estado inválido"})),
        )
        .mount(&server)
        .await;

    let client = ShippingApiClient::new(&settings_for(&server)).expect("client");
    let err = client
        .push_status("TRX-1", LifecycleStatus::Processing)
        .await
        .expect_err("push must fail");
    match err {
        PiletasError::ShippingApiError { status, message } => {
            assert_eq!(status, Some(422));
            assert_eq!(message, "Estado inválido");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn status_push_sends_the_numeric_code() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/status/push"))
        .and(body_json(json!({"codeGen": "TRX-9", "status": 15})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ShippingApiClient::new(&settings_for(&server)).expect("client");
    client
        .push_status("TRX-9", LifecycleStatus::Cooling)
        .await
        .expect("push succeeds");
}

#[tokio::test]
async fn temperature_routing_reports_full_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/shipping/temperatura/TRX-9"))
        .and(body_json(json!({"temperatura": 38.5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/status/push"))
        .and(body_json(json!({"codeGen": "TRX-9", "status": 8})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let shipping = Arc::new(ShippingApiClient::new(&settings_for(&server)).expect("client"));
    let service = TemperatureService::new(TemperatureGate::new(&piletas_settings()), shipping);

    let outcome = service
        .record_and_route("TRX-9", 38.5, piletas_sync::models::TemperatureOrigin::Queue)
        .await
        .expect("routing succeeds");
    assert!(outcome.reading_recorded);
    assert!(outcome.transition_pushed);
    assert_eq!(outcome.target_status, 8);
}

#[tokio::test]
async fn failed_push_after_recorded_reading_is_a_partial_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/shipping/temperatura/TRX-5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/status/push"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"message": "servicio no disponible"})),
        )
        .mount(&server)
        .await;

    let shipping = Arc::new(ShippingApiClient::new(&settings_for(&server)).expect("client"));
    let service = TemperatureService::new(TemperatureGate::new(&piletas_settings()), shipping);

    let outcome = service
        .record_and_route(
            "TRX-5",
            44.0,
            piletas_sync::models::TemperatureOrigin::Cooling,
        )
        .await
        .expect("partial success is not an error");
    assert!(outcome.reading_recorded);
    assert!(!outcome.transition_pushed);
    assert_eq!(outcome.target_status, 15);
    assert!(outcome
        .push_error
        .as_deref()
        .expect("push error is reported")
        .contains("servicio no disponible"));
}

#[tokio::test]
async fn operation_times_and_queue_slots_round_through_the_upstream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/operation-times"))
        .and(body_json(json!({
            "codeGen": "TRX-4",
            "tipoTimer": "melaza-descarga",
            "elapsedSeconds": 5400,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/queue/count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 4})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/queue/TRX-4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/queue/TRX-4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ShippingApiClient::new(&settings_for(&server)).expect("client");
    client
        .record_operation_time("TRX-4", "melaza-descarga", 5400)
        .await
        .expect("operation time recorded");
    assert_eq!(client.queue_count().await.expect("count"), 4);
    client.call_to_queue("TRX-4").await.expect("call");
    client.release_queue_slot("TRX-4").await.expect("release");
}

#[tokio::test]
async fn reorganize_from_api_merges_queue_and_processing_listings() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shipping/status/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                record(10, "TRX-10", 7, "2024-06-01 09:10:00"),
                record(11, "TRX-11", 7, "2024-06-01 09:05:00"),
            ],
            "current_page": 1,
            "last_page": 1,
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/shipping/status/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                record(12, "TRX-12", 8, "2024-06-01 08:55:00"),
                // malformed record: no arrival, must be skipped not fatal
                {"id": 13, "codeGen": "TRX-13", "status": 8},
            ],
            "current_page": 1,
            "last_page": 1,
        })))
        .mount(&server)
        .await;

    let shipping = Arc::new(ShippingApiClient::new(&settings_for(&server)).expect("client"));
    let allocator = BayAllocator::new(
        Arc::new(InMemoryBayRepository::with_bay_count(5)),
        Arc::new(InMemoryDisplayOrderRepository::new()),
        shipping,
    );

    let ordering = allocator
        .reorganize_from_api("melaza-descarga")
        .await
        .expect("reorganize succeeds");

    // three usable records, FIFO by arrival: 12 (08:55), 11 (09:05), 10 (09:10)
    let ids: Vec<i64> = ordering.iter().map(|o| o.snapshot.shipment_id).collect();
    assert_eq!(ids, vec![12, 11, 10]);
    assert!(ordering.iter().all(|o| o.bay_number.is_some()));
}
