// ABOUTME: Integration tests for notification settings and push subscription routes
// ABOUTME: Defaults, subscribe/unsubscribe and preference validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;
mod helpers;

use axum::http::StatusCode;
use common::TestApp;
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

fn subscription() -> Value {
    json!({
        "endpoint": "https://push.example.com/send/abc",
        "expirationTime": null,
        "keys": {"p256dh": "BNcRdreALRFXTkOOUHK1EtK2wtaz5Ry4YfYCA_0QTpQtUbVlUls0VJXg7A8u-Ts1XbjhazAkj7I99e8QcYP7DkM", "auth": "tBHItJI5svbpez7KI4CCXg"}
    })
}

#[tokio::test]
async fn test_defaults_before_any_setting() {
    let app = TestApp::spawn().await;
    let (user_id, token) = app.new_user();

    let body: Value = AxumTestRequest::get("/api/notifications")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["settings"]["user_id"], user_id.to_string());
    assert_eq!(body["settings"]["notifications_enabled"], false);
    assert_eq!(body["settings"]["preferred_training_time"], "18:00");
    assert!(body["vapid_public_key"].is_null());
}

#[tokio::test]
async fn test_subscribe_enables_then_unsubscribe_disables() {
    let app = TestApp::spawn().await;
    let (user_id, token) = app.new_user();

    let settings: Value = AxumTestRequest::post("/api/notifications/subscribe")
        .bearer(&token)
        .json(&subscription())
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(settings["notifications_enabled"], true);
    assert_eq!(
        settings["push_subscription"]["endpoint"],
        "https://push.example.com/send/abc"
    );

    let candidates = app
        .database()
        .notifications()
        .enabled_with_subscription()
        .await
        .unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].user_id, user_id);

    let body: Value = AxumTestRequest::post("/api/notifications/unsubscribe")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["success"], true);

    let stored = app.database().notifications().get(user_id).await.unwrap().unwrap();
    assert!(!stored.notifications_enabled);
    assert!(stored.push_subscription.is_none());
}

#[tokio::test]
async fn test_subscribe_rejects_bad_endpoint() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    let mut bad = subscription();
    bad["endpoint"] = json!("ftp://push.example.com/x");

    AxumTestRequest::post("/api/notifications/subscribe")
        .bearer(&token)
        .json(&bad)
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_preferences_are_merged() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();

    AxumTestRequest::put("/api/notifications")
        .bearer(&token)
        .json(&json!({"preferred_training_time": "07:30", "training_days": ["lunes", "jueves"]}))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);

    let settings: Value = AxumTestRequest::put("/api/notifications")
        .bearer(&token)
        .json(&json!({"notifications_enabled": true}))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(settings["notifications_enabled"], true);
    assert_eq!(settings["preferred_training_time"], "07:30");
    assert_eq!(settings["training_days"], json!(["lunes", "jueves"]));
}

#[tokio::test]
async fn test_invalid_training_time_is_rejected() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    AxumTestRequest::put("/api/notifications")
        .bearer(&token)
        .json(&json!({"preferred_training_time": "tarde"}))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
