use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::external::ActionError;

/// Observable pot state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PotState {
    Ready,
    Brewing,
    Pouring,
    /// Reserved terminal slot. No transition enters it yet.
    Error,
}

impl PotState {
    pub const ALL: [PotState; 4] = [
        PotState::Ready,
        PotState::Brewing,
        PotState::Pouring,
        PotState::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PotState::Ready => "Ready",
            PotState::Brewing => "Brewing",
            PotState::Pouring => "Pouring",
            PotState::Error => "Error",
        }
    }
}

impl fmt::Display for PotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunable pot parameters, replaceable while the pot is Ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PotSettings {
    pub coffee_type: String,
    pub brew_time_sec: u64,
    pub max_pour_time_sec: u64,
    pub brew_command: String,
    pub stop_pouring_command: String,
}

impl PotSettings {
    pub fn brew_time(&self) -> Duration {
        Duration::from_secs(self.brew_time_sec)
    }

    pub fn max_pour_time(&self) -> Duration {
        Duration::from_secs(self.max_pour_time_sec)
    }
}

impl Default for PotSettings {
    fn default() -> Self {
        Self {
            coffee_type: "Latte".to_string(),
            brew_time_sec: 10,
            max_pour_time_sec: 5,
            brew_command: "./brew.sh".to_string(),
            stop_pouring_command: "./stopPouring.sh".to_string(),
        }
    }
}

/// Consistent view of the pot, taken under a single lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotSnapshot {
    pub state: PotState,
    #[serde(rename = "coffeeType")]
    pub coffee_type: String,
    #[serde(rename = "brew-time-sec")]
    pub brew_time_sec: u64,
    #[serde(rename = "max-pour-time-sec")]
    pub max_pour_time_sec: u64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PotError {
    #[error("pot is not yet ready (currently {state})")]
    NotReady { state: PotState },
    #[error("coffee is not pouring (currently {state})")]
    NotPouring { state: PotState },
    /// The transition was committed before the action ran and stays committed.
    #[error("action {action} failed: {source}")]
    ActionFailed {
        action: String,
        #[source]
        source: ActionError,
    },
}
