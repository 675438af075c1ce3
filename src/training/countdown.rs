// ABOUTME: One-second clock that feeds Tick events into a training session's event queue
// ABOUTME: Stops when asked or when the receiving side goes away
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use super::state::TrainingEvent;

const TICK: Duration = Duration::from_secs(1);

/// Ticking clock for rest countdowns and elapsed time
pub struct RestCountdown {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl RestCountdown {
    /// Send [`TrainingEvent::Tick`] to `events` once per second
    #[must_use]
    pub fn spawn(events: mpsc::Sender<TrainingEvent>) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut ticks: u64 = 0;

            loop {
                tokio::select! {
                    biased;
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if events.send(TrainingEvent::Tick).await.is_err() {
                            debug!("Training event queue closed, stopping countdown");
                            break;
                        }
                        ticks += 1;
                    }
                }
            }
            ticks
        });

        Self { stop_tx, task }
    }

    /// Stop ticking and return the number of ticks sent
    pub async fn stop(self) -> u64 {
        let _ = self.stop_tx.send(true);
        self.task.await.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::state::{PlannedExercise, TrainingMode, TrainingSession, TrainingState};

    #[tokio::test(start_paused = true)]
    async fn test_countdown_ends_rest() {
        let mut session = TrainingSession::new(
            TrainingMode::Free,
            vec![PlannedExercise::free("Remo", 2, "12")],
        )
        .unwrap();
        session.handle(TrainingEvent::SetCompleted).unwrap();
        session.handle(TrainingEvent::ChooseRest).unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let countdown = RestCountdown::spawn(tx);
        while matches!(session.state(), TrainingState::Resting { .. }) {
            let event = rx.recv().await.unwrap();
            session.handle(event).unwrap();
        }

        assert_eq!(
            session.state(),
            TrainingState::Exercising {
                exercise_index: 0,
                set_number: 2
            }
        );
        assert!(countdown.stop().await >= 90);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        let countdown = RestCountdown::spawn(tx);
        drop(rx);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(countdown.stop().await, 0);
    }
}
