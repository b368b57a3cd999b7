use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use relief_desk::errors::ApiError;
use relief_desk::form::{FormSession, SubmitOutcome};
use relief_desk::models::{FieldUpdate, FoodSufficiency, LivingStatus};
use relief_desk::{AssessmentApi, BackendClient, Config};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn client_for(base_url: &str, timeout_secs: u64) -> BackendClient {
    let base_url = base_url.to_string();
    let config = Config::from_lookup(move |key| match key {
        "BACKEND_BASE_URL" => Some(base_url.clone()),
        "BACKEND_TIMEOUT_SECS" => Some(timeout_secs.to_string()),
        _ => None,
    })
    .unwrap();
    BackendClient::new(&config).unwrap()
}

fn recording_backend(received: Arc<Mutex<Vec<Value>>>, reply: Value) -> Router {
    Router::new().route(
        "/api/assessments",
        post(move |Json(body): Json<Value>| {
            let received = Arc::clone(&received);
            let reply = reply.clone();
            async move {
                received.lock().unwrap().push(body);
                Json(reply)
            }
        }),
    )
}

async fn filled_session() -> FormSession {
    let session = FormSession::new();
    for update in [
        FieldUpdate::Name(" Asha ".into()),
        FieldUpdate::ContactNumber("0771234567".into()),
        FieldUpdate::LivingStatus(Some(LivingStatus::Relative)),
        FieldUpdate::EnoughDailyFood(Some(FoodSufficiency::Yes)),
        FieldUpdate::Priority1("Water".into()),
        FieldUpdate::Priority2("   ".into()),
    ] {
        session.set_field(update).await;
    }
    session
}

#[tokio::test]
async fn submit_posts_normalized_payload_and_clears_draft() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let base = spawn_backend(recording_backend(
        Arc::clone(&received),
        json!({ "code": "OK", "message": "created" }),
    ))
    .await;
    let client = client_for(&base, 5);
    let session = filled_session().await;

    let outcome = session.submit(&client).await;
    assert_eq!(outcome, SubmitOutcome::Saved("Saved successfully.".into()));

    let bodies = received.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["name"], "Asha");
    assert_eq!(body["living_own_home"], false);
    assert_eq!(body["living_relatives_home"], true);
    assert_eq!(body["living_temporary_shelter"], false);
    assert_eq!(body["enough_daily_food"], "YES");
    assert_eq!(body["priority_1"], "Water");
    assert!(body["priority_2"].is_null());
    assert!(body.get("living_status").is_none());

    assert!(session.view().await.draft.name.is_empty());
}

#[tokio::test]
async fn non_ok_code_keeps_draft_and_shows_server_message() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let base = spawn_backend(recording_backend(
        Arc::clone(&received),
        json!({ "code": "DUPLICATE", "message": "Household already recorded today" }),
    ))
    .await;
    let client = client_for(&base, 5);
    let session = filled_session().await;

    let outcome = session.submit(&client).await;
    assert_eq!(
        outcome,
        SubmitOutcome::Failed("Household already recorded today".into())
    );
    assert_eq!(session.view().await.draft.name, " Asha ");
}

#[tokio::test]
async fn server_error_status_counts_as_transport_failure() {
    let router = Router::new().route(
        "/api/assessments/today",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "code": "OK" }))) }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base, 5);

    let err = client.today_assessments().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_backend_is_reported_not_raised() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = client_for(&format!("http://127.0.0.1:{port}"), 2);
    let session = filled_session().await;

    let outcome = session.submit(&client).await;
    assert_eq!(
        outcome,
        SubmitOutcome::Failed("Failed to save. Please check the backend and try again.".into())
    );
    assert_eq!(session.view().await.draft.contact_number, "0771234567");
}

#[tokio::test]
async fn slow_backend_hits_the_timeout() {
    let router = Router::new().route(
        "/api/assessments/today/stats",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "code": "OK" }))
        }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base, 1);

    let err = client.today_stats().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn listing_and_stats_decode_loose_payloads() {
    let router = Router::new()
        .route(
            "/api/assessments/today",
            get(|| async {
                Json(json!({
                    "code": "OK",
                    "data": [
                        { "id": 1, "token_number": 101, "name": "Asha", "need_water": true,
                          "priority_1": "water shortage", "collected_at": "2025-12-13T08:30:00Z" },
                        { "id": "b2", "name": "Bimal", "family_members": null, "notes": null }
                    ]
                }))
            }),
        )
        .route(
            "/api/assessments/today/stats",
            get(|| async {
                Json(json!({
                    "code": "OK",
                    "cards": { "structural_damage": 3 },
                    "charts": {
                        "needs_breakdown": { "water": 2, "repairs": 1 },
                        "top_priorities": [{ "priority": "Water", "count": 2 }]
                    }
                }))
            }),
        );
    let base = spawn_backend(router).await;
    let client = client_for(&base, 5);

    let rows = client.today_assessments().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id.as_deref(), Some("1"));
    assert_eq!(rows[0].token_number.as_deref(), Some("101"));
    assert!(rows[0].need_water);
    assert_eq!(rows[1].family_members, 0);

    let stats = client.today_stats().await.unwrap();
    assert_eq!(stats.cards.get("structural_damage"), Some(&json!(3)));
    assert_eq!(stats.charts.top_priorities[0].priority, "Water");
}

#[tokio::test]
async fn listing_keeps_rows_with_loosely_typed_columns() {
    let router = Router::new().route(
        "/api/assessments/today",
        get(|| async {
            Json(json!({
                "code": "OK",
                "data": [
                    { "id": 7, "name": "Asha", "contact_number": 771234567, "need_water": 1,
                      "support_none": 0 },
                    "not a row",
                    { "id": 8, "name": "Bimal", "need_sanitation": "true" }
                ]
            }))
        }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base, 5);

    let rows = client.today_assessments().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].contact_number, "771234567");
    assert!(rows[0].need_water);
    assert!(!rows[0].support_none);
    assert_eq!(rows[1].name, "Bimal");
    assert!(rows[1].need_sanitation);
}

#[tokio::test]
async fn listing_without_data_is_empty() {
    let router = Router::new().route(
        "/api/assessments/today",
        get(|| async { Json(json!({ "code": "OK", "data": null })) }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base, 5);

    assert!(client.today_assessments().await.unwrap().is_empty());
}

#[tokio::test]
async fn export_returns_raw_bytes() {
    let router = Router::new().route(
        "/api/assessments/today/export",
        get(|| async { vec![0x50u8, 0x4b, 0x03, 0x04, 0xff] }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base, 5);

    let bytes = client.export_today().await.unwrap();
    assert_eq!(bytes, vec![0x50, 0x4b, 0x03, 0x04, 0xff]);
}
