use statig::prelude::*;

use super::types::PotState;

/// Everything that can move the pot between states
///
/// Each accepted `Brew` starts a new cycle. Timer events carry the cycle they
/// were scheduled for; a timer whose cycle is stale, or that fires in the
/// wrong state, is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PotEvent {
    Brew,
    BrewComplete { cycle: u64 },
    StopPouring,
    PourTimeout { cycle: u64 },
}

#[derive(Debug, Default)]
pub struct PotMachine {
    cycle: u64,
}

impl PotMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of the most recently started brew cycle, 0 before the first
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    fn is_current(&self, cycle: u64) -> bool {
        self.cycle == cycle
    }
}

#[state_machine(initial = "State::ready()", state(derive(Debug, Clone, PartialEq, Eq)))]
impl PotMachine {
    #[state]
    fn ready(&mut self, event: &PotEvent) -> Outcome<State> {
        match event {
            PotEvent::Brew => {
                self.cycle += 1;
                tracing::info!(cycle = %self.cycle, "Brewing");
                Transition(State::brewing())
            }
            _ => Handled,
        }
    }

    #[state]
    fn brewing(&mut self, event: &PotEvent) -> Outcome<State> {
        match event {
            PotEvent::BrewComplete { cycle } if self.is_current(*cycle) => {
                tracing::info!(cycle = %cycle, "Pouring!");
                Transition(State::pouring())
            }
            _ => Handled,
        }
    }

    #[state]
    fn pouring(&mut self, event: &PotEvent) -> Outcome<State> {
        match event {
            PotEvent::StopPouring => {
                tracing::info!(cycle = %self.cycle, "Stopped pouring");
                Transition(State::ready())
            }
            PotEvent::PourTimeout { cycle } if self.is_current(*cycle) => {
                tracing::info!(cycle = %cycle, "Poured at maximum capacity!");
                Transition(State::ready())
            }
            _ => Handled,
        }
    }

    #[state]
    fn error(&mut self, event: &PotEvent) -> Outcome<State> {
        tracing::warn!(event = ?event, cycle = %self.cycle, "Pot is in error state, ignoring event");
        Handled
    }
}

impl From<&State> for PotState {
    fn from(state: &State) -> Self {
        match state {
            State::Ready { .. } => PotState::Ready,
            State::Brewing { .. } => PotState::Brewing,
            State::Pouring { .. } => PotState::Pouring,
            State::Error { .. } => PotState::Error,
        }
    }
}
