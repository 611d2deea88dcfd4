// Shared fixtures for pot integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use htcpcp_pot::{ActionError, ActionOutput, ActionRunner, Pot, PotSettings};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Action runner that records every invocation and can be told to fail
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    failing: Mutex<Option<String>>,
}

impl RecordingRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every run of `action` fail from now on
    pub fn fail_action(&self, action: &str) {
        *self.failing.lock().unwrap() = Some(action.to_string());
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.calls().into_iter().map(|(action, _)| action).collect()
    }
}

#[async_trait]
impl ActionRunner for RecordingRunner {
    async fn run(&self, action: &str, args: &[String]) -> Result<ActionOutput, ActionError> {
        self.calls
            .lock()
            .unwrap()
            .push((action.to_string(), args.to_vec()));

        if self.failing.lock().unwrap().as_deref() == Some(action) {
            return Err(ActionError::Failed {
                action: action.to_string(),
                status_code: 1,
                stderr: "kettle on fire".to_string(),
            });
        }
        Ok(ActionOutput::default())
    }
}

pub fn settings(brew_time_sec: u64, max_pour_time_sec: u64) -> PotSettings {
    PotSettings {
        coffee_type: "Latte".to_string(),
        brew_time_sec,
        max_pour_time_sec,
        brew_command: "brew".to_string(),
        stop_pouring_command: "stop".to_string(),
    }
}

pub fn pot_with(runner: Arc<RecordingRunner>, brew: u64, pour: u64) -> Pot {
    Pot::new(settings(brew, pour), runner)
}

/// Let timer tasks woken by a clock advance run to completion
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Advance the paused clock and let the pot react
pub async fn advance_secs(secs: u64) {
    tokio::time::advance(Duration::from_secs(secs)).await;
    settle().await;
}
