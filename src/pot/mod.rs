//! The coffee pot
//!
//! `Pot` is a cheap, cloneable handle to the single shared pot. Requests and
//! the background brew timers all go through the same async mutex, so every
//! precondition check and the transition it guards happen in one critical
//! section. External actions run after the lock is released.

pub mod machine;
pub mod types;

use statig::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn, Instrument};

use crate::external::{ActionOutput, ActionRunner};
use crate::observability::PotMetrics;

pub use machine::{PotEvent, PotMachine};
pub use types::{PotError, PotSettings, PotSnapshot, PotState};

struct PotInner {
    machine: StateMachine<PotMachine>,
    settings: PotSettings,
}

impl PotInner {
    fn state(&self) -> PotState {
        PotState::from(self.machine.state())
    }

    fn cycle(&self) -> u64 {
        self.machine.inner().cycle()
    }

    /// Feed an event to the machine and report whether the state changed
    fn fire(&mut self, event: PotEvent) -> bool {
        let before = self.state();
        self.machine.handle(&event);
        before != self.state()
    }
}

#[derive(Clone)]
pub struct Pot {
    inner: Arc<Mutex<PotInner>>,
    runner: Arc<dyn ActionRunner>,
    metrics: Arc<PotMetrics>,
}

impl Pot {
    pub fn new(settings: PotSettings, runner: Arc<dyn ActionRunner>) -> Self {
        Self::with_metrics(settings, runner, Arc::new(PotMetrics::new()))
    }

    pub fn with_metrics(
        settings: PotSettings,
        runner: Arc<dyn ActionRunner>,
        metrics: Arc<PotMetrics>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PotInner {
                machine: PotMachine::new().state_machine(),
                settings,
            })),
            runner,
            metrics,
        }
    }

    pub fn metrics(&self) -> &PotMetrics {
        &self.metrics
    }

    pub async fn state(&self) -> PotState {
        self.inner.lock().await.state()
    }

    pub async fn coffee_type(&self) -> String {
        self.inner.lock().await.settings.coffee_type.clone()
    }

    pub async fn settings(&self) -> PotSettings {
        self.inner.lock().await.settings.clone()
    }

    pub async fn snapshot(&self) -> PotSnapshot {
        let inner = self.inner.lock().await;
        PotSnapshot {
            state: inner.state(),
            coffee_type: inner.settings.coffee_type.clone(),
            brew_time_sec: inner.settings.brew_time_sec,
            max_pour_time_sec: inner.settings.max_pour_time_sec,
        }
    }

    /// Start brewing
    ///
    /// The pot enters Brewing before the brew action runs. A failing action
    /// is reported to the caller but the pot keeps brewing: a client may
    /// already have seen the transition.
    pub async fn brew(&self, args: &[String]) -> Result<ActionOutput, PotError> {
        let (cycle, settings) = {
            let mut inner = self.inner.lock().await;
            let state = inner.state();
            if state != PotState::Ready {
                self.metrics.record_brew_rejected();
                warn!(state = %state, "Refusing to brew");
                return Err(PotError::NotReady { state });
            }

            inner.fire(PotEvent::Brew);
            (inner.cycle(), inner.settings.clone())
        };

        self.metrics.record_brew_started();
        self.schedule_cycle(cycle, &settings);
        self.run_action(&settings.brew_command, args).await
    }

    /// Stop pouring early
    ///
    /// The pot is Ready once this returns, whether or not the stop action
    /// succeeded. The pending pour timeout becomes a no-op.
    pub async fn stop_pouring(&self) -> Result<ActionOutput, PotError> {
        let action = {
            let mut inner = self.inner.lock().await;
            let state = inner.state();
            if state != PotState::Pouring {
                self.metrics.record_stop_rejected();
                warn!(state = %state, "Refusing to stop pouring");
                return Err(PotError::NotPouring { state });
            }

            inner.fire(PotEvent::StopPouring);
            inner.settings.stop_pouring_command.clone()
        };

        self.metrics.record_pour_stopped();
        self.run_action(&action, &[]).await
    }

    /// Replace the tunable parameters if the pot is Ready
    ///
    /// Returns false, leaving everything untouched, while a brew cycle is in
    /// progress.
    pub async fn reconfigure(&self, settings: PotSettings) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.state() != PotState::Ready {
            return false;
        }
        if inner.settings != settings {
            info!(
                coffee_type = %settings.coffee_type,
                brew_time_sec = settings.brew_time_sec,
                max_pour_time_sec = settings.max_pour_time_sec,
                "Pot reconfigured"
            );
            inner.settings = settings;
            self.metrics.record_config_reload();
        }
        true
    }

    async fn run_action(&self, action: &str, args: &[String]) -> Result<ActionOutput, PotError> {
        self.runner.run(action, args).await.map_err(|source| {
            self.metrics.record_action_failure();
            warn!(action, error = %source, "Action failed");
            PotError::ActionFailed {
                action: action.to_string(),
                source,
            }
        })
    }

    /// One timer task per brew cycle: brewing, then the pour limit
    ///
    /// Both deadlines are fixed when the cycle starts, so a late wake-up of
    /// the brew timer does not stretch the pour.
    fn schedule_cycle(&self, cycle: u64, settings: &PotSettings) {
        let pot = self.clone();
        let brew_done = deadline_after(Instant::now(), settings.brew_time());
        let pour_done = deadline_after(brew_done, settings.max_pour_time());
        let span = tracing::info_span!("brew_cycle", cycle = cycle);

        tokio::spawn(
            async move {
                tokio::time::sleep_until(brew_done).await;
                if !pot.fire(PotEvent::BrewComplete { cycle }).await {
                    return;
                }

                tokio::time::sleep_until(pour_done).await;
                if pot.fire(PotEvent::PourTimeout { cycle }).await {
                    pot.metrics.record_pour_timeout();
                }
            }
            .instrument(span),
        );
    }

    async fn fire(&self, event: PotEvent) -> bool {
        self.inner.lock().await.fire(event)
    }
}

/// Roughly 30 years out, the horizon tokio itself uses for unbounded sleeps
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `start + duration`, saturating at a far-future instant instead of panicking
fn deadline_after(start: Instant, duration: Duration) -> Instant {
    start
        .checked_add(duration)
        .or_else(|| start.checked_add(FAR_FUTURE))
        .unwrap_or(start)
}
