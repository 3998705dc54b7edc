//! End-to-end flow used by the operating-room frontend: sign up, open an
//! operation, log events during surgery and download the report.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use ornotes::clients::StaticTranscripts;
use ornotes::config::Config;
use ornotes::models::transcript::Conversation;
use ornotes::report::ReportAssembler;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const CONVERSATION_ID: &str = "conv_smoke";

fn transcript() -> Conversation {
    let display = |value: &str| {
        json!({
            "request_id": format!("req-{value}"),
            "tool_name": "displayEvent",
            "params_as_json": json!({"eventType": "medicine", "eventValue": value}).to_string(),
            "tool_has_been_called": true
        })
    };

    serde_json::from_value(json!({
        "agent_id": "agent_smoke",
        "conversation_id": CONVERSATION_ID,
        "status": "done",
        "transcript": [
            {"role": "user", "message": "We are starting now.", "tool_calls": null},
            {"role": "agent", "message": null, "tool_calls": [display("Surgery started")]},
            {"role": "agent", "message": null, "tool_calls": [
                {"tool_name": "displayEvent", "params_as_json": "{not json"},
                {"tool_name": "end_call", "params_as_json": "{}"}
            ]},
            {"role": "agent", "message": null, "tool_calls": [display("Surgery completed")]}
        ],
        "metadata": {"call_duration_secs": 95},
        "analysis": {"transcript_summary": "Appendectomy completed without complications."}
    }))
    .expect("valid transcript fixture")
}

async fn spawn_app() -> (Arc<ornotes::api::AppState>, Router) {
    let db_path =
        std::env::temp_dir().join(format!("ornotes-smoke-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.jwt_secret = "smoke-test-secret".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.report.logo_path = None;

    let transcripts = StaticTranscripts::new().with(CONVERSATION_ID, transcript());
    let state =
        ornotes::api::create_app_state_with_transcripts(config, Arc::new(transcripts), None)
            .await
            .expect("failed to create app state");

    let router = ornotes::api::router(state.clone());
    (state, router)
}

async fn post_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_surgery_report_flow() {
    let (state, app) = spawn_app().await;

    let (status, body) = post_json(
        &app,
        "/auth/register",
        None,
        json!({
            "firstName": "Jan",
            "lastName": "Kowalski",
            "email": "jan.kowalski@example.com",
            "password": "password123",
            "role": "Doctor"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().unwrap().to_string();
    let user_id = body["data"]["user"]["id"].as_i64().unwrap();

    let (status, body) = post_json(
        &app,
        "/api/createOperation",
        Some(&token),
        json!({
            "roomId": 1,
            "userId": user_id,
            "patientFirstName": "Tomasz",
            "patientLastName": "Lis",
            "patientId": "90010112345",
            "operationType": "Appendectomy"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let operation_id = body["data"]["operationId"].as_i64().unwrap();

    for value in ["Surgery started", "Surgery completed"] {
        let (status, _) = post_json(
            &app,
            "/api/sendNotes",
            Some(&token),
            json!({"operationId": operation_id, "eventType": "medicine", "eventValue": value}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    // Rows come out in transcript order with their stored times
    let rows = ReportAssembler::new(chrono_tz::Europe::Warsaw)
        .assemble(
            state.store(),
            i32::try_from(operation_id).unwrap(),
            &transcript().transcript,
            "",
            0.0,
        )
        .await
        .unwrap()
        .rows;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].event_value, "Surgery started");
    assert_eq!(rows[1].event_value, "Surgery completed");
    assert!(rows.iter().all(|row| !row.timestamp.is_empty()));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/downloadReport")
                .header("Authorization", format!("Bearer {token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    json!({
                        "conversationId": CONVERSATION_ID,
                        "operationId": operation_id,
                        "surgeryDetails": {
                            "patient_first_name": "Tomasz",
                            "patient_last_name": "Lis",
                            "patient_id": "90010112345",
                            "operation_type": "Appendectomy"
                        }
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers["content-type"], "application/pdf");
    assert_eq!(
        headers["content-disposition"],
        "attachment; filename=\"surgery_report_90010112345.pdf\""
    );
    assert_eq!(headers["x-report-skipped-events"], "1");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_event_value_with_surrounding_whitespace_keeps_its_timestamp() {
    let (state, app) = spawn_app().await;

    let (_, body) = post_json(
        &app,
        "/auth/register",
        None,
        json!({
            "firstName": "Ewa",
            "lastName": "Mazur",
            "email": "ewa.mazur@example.com",
            "password": "password123",
            "role": "Nurse"
        }),
    )
    .await;
    let token = body["data"]["token"].as_str().unwrap().to_string();
    let user_id = body["data"]["user"]["id"].as_i64().unwrap();

    let (_, body) = post_json(
        &app,
        "/api/createOperation",
        Some(&token),
        json!({
            "roomId": 1,
            "userId": user_id,
            "patientFirstName": "Piotr",
            "patientLastName": "Wrona",
            "patientId": "85050554321",
            "operationType": "Cholecystectomy"
        }),
    )
    .await;
    let operation_id = body["data"]["operationId"].as_i64().unwrap();

    let value = " Surgery started ";
    let (status, _) = post_json(
        &app,
        "/api/sendNotes",
        Some(&token),
        json!({"operationId": operation_id, "eventType": "medicine", "eventValue": value}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let conversation: Conversation = serde_json::from_value(json!({
        "conversation_id": "conv_whitespace",
        "transcript": [{
            "role": "agent",
            "message": null,
            "tool_calls": [{
                "tool_name": "displayEvent",
                "params_as_json": json!({"eventType": "medicine", "eventValue": value}).to_string()
            }]
        }],
        "metadata": {"call_duration_secs": 10},
        "analysis": {"transcript_summary": ""}
    }))
    .unwrap();

    let rows = ReportAssembler::new(chrono_tz::Europe::Warsaw)
        .assemble(
            state.store(),
            i32::try_from(operation_id).unwrap(),
            &conversation.transcript,
            "",
            0.0,
        )
        .await
        .unwrap()
        .rows;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_value, value);
    assert!(!rows[0].timestamp.is_empty(), "{rows:?}");
}

#[tokio::test]
async fn test_report_for_unknown_operation() {
    let (_, app) = spawn_app().await;

    let (_, body) = post_json(
        &app,
        "/auth/register",
        None,
        json!({
            "firstName": "Anna",
            "lastName": "Nowak",
            "email": "anna@example.com",
            "password": "securepass",
            "role": "Nurse"
        }),
    )
    .await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, _) = post_json(
        &app,
        "/api/downloadReport",
        Some(&token),
        json!({
            "conversationId": CONVERSATION_ID,
            "operationId": 4242,
            "surgeryDetails": {"patient_id": "x"}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
