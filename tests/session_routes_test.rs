// ABOUTME: Integration tests for workout session routes
// ABOUTME: Set logging, ownership checks and XP/streak rules on completion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;
mod helpers;

use axum::http::StatusCode;
use coach_ia_server::models::{Difficulty, GeneratedExercise, GeneratedRoutine, OnboardingInput};
use common::TestApp;
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};
use uuid::Uuid;

async fn onboarded(app: &TestApp) -> (Uuid, String) {
    let (user_id, token) = app.new_user();
    app.database()
        .profiles()
        .upsert_onboarding(user_id, &OnboardingInput::default())
        .await
        .unwrap();
    (user_id, token)
}

async fn start_session(app: &TestApp, token: &str, body: &Value) -> Value {
    AxumTestRequest::post("/api/sessions")
        .bearer(token)
        .json(body)
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json()
}

#[tokio::test]
async fn test_free_session_awards_xp_without_streak() {
    let app = TestApp::spawn().await;
    let (_, token) = onboarded(&app).await;
    let session = start_session(&app, &token, &json!({})).await;
    let id = session["id"].as_str().unwrap();

    AxumTestRequest::post(&format!("/api/sessions/{id}/sets"))
        .bearer(&token)
        .json(&json!({"exercise_name": "Flexiones", "set_number": 1, "reps_completed": 15}))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED);

    let done: Value = AxumTestRequest::post(&format!("/api/sessions/{id}/complete"))
        .bearer(&token)
        .json(&json!({"durationSeconds": 900, "exercisesCompleted": 2}))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(done["xpEarned"], 35);
    assert_eq!(done["streakIncremented"], false);
    assert_eq!(done["profile"]["total_xp"], 35);
    assert_eq!(done["profile"]["streak_days"], 0);
}

#[tokio::test]
async fn test_complete_without_profile_still_closes_session() {
    let app = TestApp::spawn().await;
    let (user_id, token) = app.new_user();
    let session = start_session(&app, &token, &json!({})).await;
    let id = session["id"].as_str().unwrap();

    let done: Value = AxumTestRequest::post(&format!("/api/sessions/{id}/complete"))
        .bearer(&token)
        .json(&json!({"durationSeconds": 600, "exercisesCompleted": 1}))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(done["xpEarned"], 30);
    assert!(done["profile"].is_null());

    let stored = app
        .database()
        .sessions()
        .get(user_id, Uuid::parse_str(id).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.completed_at.is_some());
    assert_eq!(stored.xp_earned, 30);
}

#[tokio::test]
async fn test_routine_session_awards_xp_and_streak() {
    let app = TestApp::spawn().await;
    let (user_id, token) = onboarded(&app).await;
    let routine = app
        .database()
        .routines()
        .insert_generated(
            user_id,
            &GeneratedRoutine {
                name: "Piernas".to_owned(),
                description: None,
                target_muscle_groups: vec!["piernas".to_owned()],
                estimated_duration_minutes: Some(40),
                difficulty_level: Some(Difficulty::Beginner),
                exercises: vec![GeneratedExercise {
                    name: "Sentadilla".to_owned(),
                    sets: 3,
                    reps: "10".to_owned(),
                    weight_suggestion: None,
                    rest_seconds: 60,
                    notes: None,
                }],
            },
        )
        .await
        .unwrap();

    let session = start_session(&app, &token, &json!({"routineId": routine.id})).await;
    let id = session["id"].as_str().unwrap();

    let done: Value = AxumTestRequest::post(&format!("/api/sessions/{id}/complete"))
        .bearer(&token)
        .json(&json!({"durationSeconds": 2400, "exercisesCompleted": 3}))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(done["xpEarned"], 80);
    assert_eq!(done["streakIncremented"], true);
    assert_eq!(done["profile"]["streak_days"], 1);

    AxumTestRequest::post(&format!("/api/sessions/{id}/complete"))
        .bearer(&token)
        .json(&json!({"durationSeconds": 2400, "exercisesCompleted": 3}))
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);

    let dashboard: Value = AxumTestRequest::get("/api/dashboard")
        .bearer(&token)
        .send(app.router())
        .await
        .json();
    assert_eq!(dashboard["weekly_sessions"], 1);
    assert_eq!(dashboard["total_xp"], 80);
}

#[tokio::test]
async fn test_other_users_session_is_not_found() {
    let app = TestApp::spawn().await;
    let (_, owner) = onboarded(&app).await;
    let (_, intruder) = onboarded(&app).await;
    let session = start_session(&app, &owner, &json!({})).await;
    let id = session["id"].as_str().unwrap();

    AxumTestRequest::get(&format!("/api/sessions/{id}/sets"))
        .bearer(&intruder)
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_routine_is_rejected() {
    let app = TestApp::spawn().await;
    let (_, token) = onboarded(&app).await;
    AxumTestRequest::post("/api/sessions")
        .bearer(&token)
        .json(&json!({"routineId": Uuid::new_v4()}))
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_zero_set_number_is_rejected() {
    let app = TestApp::spawn().await;
    let (_, token) = onboarded(&app).await;
    let session = start_session(&app, &token, &json!({})).await;
    let id = session["id"].as_str().unwrap();

    AxumTestRequest::post(&format!("/api/sessions/{id}/sets"))
        .bearer(&token)
        .json(&json!({"exercise_name": "Remo", "set_number": 0}))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
