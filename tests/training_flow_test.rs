// ABOUTME: End-to-end guided training against real storage
// ABOUTME: Drives the controller through a routine and checks sets, session row and profile progress
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use coach_ia_server::database::Database;
use coach_ia_server::models::{GeneratedExercise, GeneratedRoutine, OnboardingInput};
use coach_ia_server::training::{
    DatabaseRecorder, Notice, PlannedExercise, TrainingController, TrainingEvent, TrainingMode,
    TrainingSession, TrainingState,
};
use common::init_test_logging;
use uuid::Uuid;

async fn setup() -> (Database, Uuid, Vec<PlannedExercise>, Uuid) {
    init_test_logging();
    let db = Database::in_memory().await.unwrap();
    let user_id = Uuid::new_v4();
    db.profiles()
        .upsert_onboarding(user_id, &OnboardingInput::default())
        .await
        .unwrap();
    let routine = db
        .routines()
        .insert_generated(
            user_id,
            &GeneratedRoutine {
                name: "Pierna".to_owned(),
                description: None,
                target_muscle_groups: vec!["piernas".to_owned()],
                estimated_duration_minutes: Some(30),
                difficulty_level: None,
                exercises: vec![GeneratedExercise {
                    name: "Sentadilla".to_owned(),
                    sets: 2,
                    reps: "10".to_owned(),
                    weight_suggestion: Some("60 kg".to_owned()),
                    rest_seconds: 90,
                    notes: None,
                }],
            },
        )
        .await
        .unwrap();
    let plan = routine
        .routine_exercises
        .iter()
        .map(PlannedExercise::from)
        .collect();
    let session = db.sessions().start(user_id, Some(routine.id)).await.unwrap();
    (db, user_id, plan, session.id)
}

#[tokio::test]
async fn test_routine_workout_is_persisted() {
    let (db, user_id, plan, session_id) = setup().await;
    let session = TrainingSession::new(TrainingMode::Routine, plan).unwrap();
    let mut controller =
        TrainingController::new(session, DatabaseRecorder::new(db.clone()), user_id, session_id);

    controller.dispatch(TrainingEvent::SetCompleted).await.unwrap();
    controller.dispatch(TrainingEvent::ChooseRest).await.unwrap();
    for _ in 0..5 {
        controller.dispatch(TrainingEvent::Tick).await.unwrap();
    }
    controller.dispatch(TrainingEvent::SkipRest).await.unwrap();
    let notices = controller.dispatch(TrainingEvent::SetCompleted).await.unwrap();

    assert!(notices.contains(&Notice::Success("¡Entrenamiento completado!".to_owned())));
    assert!(matches!(
        controller.session().state(),
        TrainingState::Finished {
            exercises_completed: 1
        }
    ));

    let sets = db.sessions().sets_for(session_id).await.unwrap();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].exercise_name, "Sentadilla");
    assert_eq!(sets[1].set_number, 2);
    assert_eq!(sets[1].reps_completed, Some(10));

    let stored = db.sessions().get(user_id, session_id).await.unwrap().unwrap();
    assert!(stored.completed_at.is_some());
    assert_eq!(stored.xp_earned, 60);

    let profile = db.profiles().get(user_id).await.unwrap().unwrap();
    assert_eq!(profile.total_xp, 60);
    assert_eq!(profile.streak_days, 1);
}

#[tokio::test]
async fn test_free_workout_finished_early_keeps_streak() {
    let (db, user_id, _, _) = setup().await;
    let session_row = db.sessions().start(user_id, None).await.unwrap();
    let session = TrainingSession::new(
        TrainingMode::Free,
        vec![PlannedExercise::free("Flexiones", 3, "15")],
    )
    .unwrap();
    let mut controller = TrainingController::new(
        session,
        DatabaseRecorder::new(db.clone()),
        user_id,
        session_row.id,
    );

    controller.dispatch(TrainingEvent::SetCompleted).await.unwrap();
    let notices = controller.dispatch(TrainingEvent::Finish).await.unwrap();
    assert!(notices.contains(&Notice::Success("¡Entrenamiento libre completado!".to_owned())));

    let profile = db.profiles().get(user_id).await.unwrap().unwrap();
    assert_eq!(profile.total_xp, 25);
    assert_eq!(profile.streak_days, 0);

    assert!(controller.dispatch(TrainingEvent::Finish).await.is_err());
}

#[tokio::test]
async fn test_workout_without_profile_completes_cleanly() {
    init_test_logging();
    let db = Database::in_memory().await.unwrap();
    let user_id = Uuid::new_v4();
    let session_row = db.sessions().start(user_id, None).await.unwrap();
    let session = TrainingSession::new(
        TrainingMode::Free,
        vec![PlannedExercise::free("Plancha", 1, "30s")],
    )
    .unwrap();
    let mut controller = TrainingController::new(
        session,
        DatabaseRecorder::new(db.clone()),
        user_id,
        session_row.id,
    );

    let notices = controller.dispatch(TrainingEvent::SetCompleted).await.unwrap();
    assert!(notices.contains(&Notice::Success("¡Entrenamiento libre completado!".to_owned())));
    assert!(!notices.iter().any(|notice| matches!(notice, Notice::Error(_))));

    let stored = db.sessions().get(user_id, session_row.id).await.unwrap().unwrap();
    assert!(stored.completed_at.is_some());
}
