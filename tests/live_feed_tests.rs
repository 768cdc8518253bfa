use std::time::Duration;

use actix_web::{App, http::StatusCode, web::Bytes};
use attendance::{config::Config, routes, state::AppState, store::Stores};
use awc::ws::{CloseCode, Frame, Message};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::time::timeout;

const FRAME_WAIT: Duration = Duration::from_secs(5);

fn start_server(config: Config) -> actix_test::TestServer {
    let state = AppState::new(config, Stores::in_memory()).expect("Failed to create app state");
    actix_test::start(move || {
        let state = state.clone();
        App::new().configure(move |cfg| routes::configure(cfg, &state))
    })
}

macro_rules! next_frame {
    ($ws:expr) => {
        timeout(FRAME_WAIT, $ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection ended")
            .expect("protocol error")
    };
}

#[actix_web::test]
async fn test_logged_attendance_reaches_websocket_client() {
    let mut srv = start_server(Config::in_memory());
    let mut ws = srv.ws_at("/ws/attendance").await.unwrap();

    let resp = srv
        .post("/api/employee/add")
        .send_json(&json!({"name": "Bob", "email": "bob@x.com", "department": "Eng"}))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = srv
        .post("/api/attendance/log")
        .send_json(&json!({"employeeId": 1, "status": "IN"}))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let Frame::Text(text) = next_frame!(ws) else {
        panic!("expected a text frame");
    };
    let record: Value = serde_json::from_slice(&text).unwrap();
    assert_eq!(record["status"], "IN");
    assert_eq!(record["employee"]["name"], "Bob");
    assert_eq!(record["employee"]["id"], 1);
    assert!(record["timestamp"].is_string());

    ws.send(Message::Ping(Bytes::from_static(b"still there?")))
        .await
        .unwrap();
    assert_eq!(
        next_frame!(ws),
        Frame::Pong(Bytes::from_static(b"still there?"))
    );

    ws.send(Message::Close(Some(CloseCode::Normal.into())))
        .await
        .unwrap();
    let Frame::Close(reason) = next_frame!(ws) else {
        panic!("expected the close to be echoed");
    };
    assert_eq!(reason.map(|r| r.code), Some(CloseCode::Normal));
}

#[actix_web::test]
async fn test_every_client_gets_each_event() {
    let mut srv = start_server(Config::in_memory());
    let mut first = srv.ws_at("/ws/attendance").await.unwrap();
    let mut second = srv.ws_at("/ws/attendance").await.unwrap();

    srv.post("/api/employee/add")
        .send_json(&json!({"name": "Bob", "email": "bob@x.com", "department": "Eng"}))
        .await
        .unwrap();
    srv.post("/api/attendance/log")
        .send_json(&json!({"employeeId": "1", "status": "OUT"}))
        .await
        .unwrap();

    for ws in [&mut first, &mut second] {
        let Frame::Text(text) = next_frame!(ws) else {
            panic!("expected a text frame");
        };
        let record: Value = serde_json::from_slice(&text).unwrap();
        assert_eq!(record["status"], "OUT");
    }
}

#[actix_web::test]
async fn test_silent_client_is_pinged_then_closed() {
    let config = Config {
        ws_heartbeat_interval: Duration::from_millis(50),
        ws_client_timeout: Duration::from_millis(200),
        ..Config::in_memory()
    };
    let mut srv = start_server(config);
    let mut ws = srv.ws_at("/ws/attendance").await.unwrap();

    // never answer, just watch what the server sends
    let mut pings = 0;
    let reason = loop {
        match next_frame!(ws) {
            Frame::Ping(_) => pings += 1,
            Frame::Close(reason) => break reason,
            other => panic!("unexpected frame {other:?}"),
        }
    };

    assert!(pings >= 1);
    let reason = reason.expect("close reason");
    assert_eq!(reason.code, CloseCode::Normal);
    assert_eq!(reason.description.as_deref(), Some("Heartbeat timeout"));
}
