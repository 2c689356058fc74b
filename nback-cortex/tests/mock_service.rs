//! Runs the full recording sequence against an in-process mock of the
//! service: one WebSocket connection, JSON-RPC responses per method, and the
//! warnings the real service pushes after controlDevice commands.

use futures_util::{SinkExt, StreamExt};
use nback_cortex::{CortexConfig, CortexError, Recorder, RecordingSettings};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::protocol::Message;

async fn spawn_mock_service(grant_access: bool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(stream)
            .await
            .expect("websocket handshake");

        while let Some(Ok(message)) = ws.next().await {
            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };
            let request: Value = serde_json::from_str(&text).expect("request json");
            let id = request["id"].as_u64().expect("request id");
            let method = request["method"].as_str().expect("request method");

            let result = match method {
                "requestAccess" => json!({
                    "accessGranted": grant_access,
                    "message": if grant_access { "access granted" } else { "waiting for approval" },
                }),
                "authorize" => json!({"cortexToken": "token-1"}),
                "queryHeadsets" => json!([{"id": "EPOCX-1234", "status": "discovered"}]),
                "controlDevice" => json!({"command": request["params"]["command"]}),
                "createSession" => json!({"id": "session-1", "status": "active"}),
                "createRecord" => json!({"record": {
                    "uuid": "record-1",
                    "title": "trial",
                    "startDatetime": "2026-01-01T10:00:00.000+00:00",
                }}),
                "stopRecord" => json!({"record": {
                    "uuid": "record-1",
                    "title": "trial",
                    "startDatetime": "2026-01-01T10:00:00.000+00:00",
                    "endDatetime": "2026-01-01T10:00:01.000+00:00",
                }}),
                "exportRecord" => json!({"success": [{"recordId": "record-1"}], "failure": []}),
                other => panic!("unexpected method {}", other),
            };

            ws.send(Message::Text(
                json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string(),
            ))
            .await
            .expect("send response");

            // The real service pushes warnings after controlDevice commands.
            if method == "controlDevice" {
                let code = if request["params"]["command"] == "connect" {
                    104
                } else {
                    142
                };
                ws.send(Message::Text(
                    json!({"warning": {"code": code, "message": "ok"}}).to_string(),
                ))
                .await
                .expect("send warning");
            }
        }
    });

    format!("ws://{}", addr)
}

fn config_for(url: String) -> CortexConfig {
    CortexConfig {
        url,
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn the_recorder_runs_the_full_sequence() {
    let url = spawn_mock_service(true).await;
    let recorder = Recorder::new(config_for(url), RecordingSettings::default())
        .with_timing(Duration::from_secs(2), Duration::from_millis(10));

    let outcome = recorder
        .run(Duration::from_millis(50))
        .await
        .expect("recording succeeds");

    assert_eq!(outcome.success.len(), 1);
    assert!(outcome.failure.is_empty());
}

#[tokio::test]
async fn denied_access_aborts_the_sequence() {
    let url = spawn_mock_service(false).await;
    let recorder = Recorder::new(config_for(url), RecordingSettings::default())
        .with_timing(Duration::from_secs(2), Duration::from_millis(10));

    let error = recorder
        .run(Duration::from_millis(50))
        .await
        .expect_err("access is rejected");

    assert!(matches!(error, CortexError::AccessDenied));
}

#[tokio::test]
async fn missing_credentials_fail_before_connecting() {
    // No server behind this address; validation must fail first.
    let config = CortexConfig {
        url: "ws://127.0.0.1:9".into(),
        ..Default::default()
    };
    let recorder = Recorder::new(config, RecordingSettings::default());

    let error = recorder
        .run(Duration::from_millis(10))
        .await
        .expect_err("credentials are empty");

    assert!(matches!(error, CortexError::MissingCredentials));
}
