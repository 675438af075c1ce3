// ABOUTME: Integration tests for profile, dashboard and routine listing routes
// ABOUTME: Covers authentication, onboarding upsert, goal updates and the dashboard card
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

#[tokio::test]
async fn test_missing_token_is_401() {
    let app = TestApp::spawn().await;
    let body: Value = AxumTestRequest::get("/api/profile")
        .send(app.router())
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .json();
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_garbage_token_is_401() {
    let app = TestApp::spawn().await;
    AxumTestRequest::get("/api/profile")
        .bearer("not-a-jwt")
        .send(app.router())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_onboarding_then_goal_update() {
    let app = TestApp::spawn().await;
    let (user_id, token) = app.new_user();

    AxumTestRequest::get("/api/profile")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let profile: Value = AxumTestRequest::post("/api/profile/onboarding")
        .bearer(&token)
        .json(&json!({
            "full_name": "Lucía",
            "goal": "lose_fat",
            "experience_level": "beginner",
            "height_cm": 165.0,
            "weight_kg": 62.5
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(profile["user_id"], user_id.to_string());
    assert_eq!(profile["goal"], "lose_fat");
    assert_eq!(profile["total_xp"], 0);

    let updated: Value = AxumTestRequest::put("/api/profile/goal")
        .bearer(&token)
        .json(&json!({"goal": "strength"}))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(updated["goal"], "strength");
    assert_eq!(updated["experience_level"], "beginner");
    assert_eq!(updated["full_name"], "Lucía");
}

#[tokio::test]
async fn test_non_positive_weight_is_rejected() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();
    AxumTestRequest::post("/api/profile/onboarding")
        .bearer(&token)
        .json(&json!({"weight_kg": 0.0}))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard_for_new_user() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();

    let body: Value = AxumTestRequest::get("/api/dashboard")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["streak_days"], 0);
    assert_eq!(body["weekly_sessions"], 0);
    assert!(body["insight"]
        .as_str()
        .unwrap()
        .contains("primer entrenamiento"));
    assert!(body.get("active_routine").is_none());
}

#[tokio::test]
async fn test_routines_empty_for_new_user() {
    let app = TestApp::spawn().await;
    let (_, token) = app.new_user();

    let body: Value = AxumTestRequest::get("/api/routines")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["routines"], json!([]));

    let active: Value = AxumTestRequest::get("/api/routines/active")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert!(active["routine"].is_null());
}
