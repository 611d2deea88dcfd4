//! Pot lifecycle tests
//!
//! Drive the pot through whole brew cycles on a paused tokio clock so timer
//! transitions land at exact instants.
//!
//! Test coverage:
//! - Ready → Brewing → Pouring → Ready with and without an explicit stop
//! - Rejected operations leave the state untouched
//! - Stale pour timeouts never end a later cycle
//! - Action failures are reported without undoing the transition

use htcpcp_pot::{ActionError, PotError, PotState};

mod fixtures;
use fixtures::{advance_secs, pot_with, settle, RecordingRunner};

#[tokio::test(start_paused = true)]
async fn test_stop_pouring_then_timeout_is_noop() {
    let runner = RecordingRunner::new();
    let pot = pot_with(runner.clone(), 2, 3);
    assert_eq!(pot.state().await, PotState::Ready);

    pot.brew(&[]).await.unwrap();
    assert_eq!(pot.state().await, PotState::Brewing);

    advance_secs(2).await;
    assert_eq!(pot.state().await, PotState::Pouring);

    pot.stop_pouring().await.unwrap();
    assert_eq!(pot.state().await, PotState::Ready);

    advance_secs(3).await;
    assert_eq!(pot.state().await, PotState::Ready);
    assert_eq!(runner.actions(), vec!["brew", "stop"]);
    assert_eq!(pot.metrics().get_stats().pour_timeouts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_pour_times_out_without_stop() {
    let runner = RecordingRunner::new();
    let pot = pot_with(runner.clone(), 1, 1);

    pot.brew(&[]).await.unwrap();
    advance_secs(1).await;
    assert_eq!(pot.state().await, PotState::Pouring);

    advance_secs(1).await;
    assert_eq!(pot.state().await, PotState::Ready);
    assert_eq!(runner.actions(), vec!["brew"]);
    assert_eq!(pot.metrics().get_stats().pour_timeouts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_transitions_happen_exactly_on_time() {
    let pot = pot_with(RecordingRunner::new(), 4, 6);

    pot.brew(&[]).await.unwrap();
    tokio::time::advance(std::time::Duration::from_millis(3_999)).await;
    settle().await;
    assert_eq!(pot.state().await, PotState::Brewing);

    tokio::time::advance(std::time::Duration::from_millis(1)).await;
    settle().await;
    assert_eq!(pot.state().await, PotState::Pouring);

    advance_secs(5).await;
    assert_eq!(pot.state().await, PotState::Pouring);

    advance_secs(1).await;
    assert_eq!(pot.state().await, PotState::Ready);
}

#[tokio::test(start_paused = true)]
async fn test_brew_rejected_unless_ready() {
    let runner = RecordingRunner::new();
    let pot = pot_with(runner.clone(), 2, 2);

    pot.brew(&[]).await.unwrap();
    assert_eq!(
        pot.brew(&[]).await,
        Err(PotError::NotReady { state: PotState::Brewing })
    );
    assert_eq!(pot.state().await, PotState::Brewing);

    advance_secs(2).await;
    assert_eq!(
        pot.brew(&[]).await,
        Err(PotError::NotReady { state: PotState::Pouring })
    );
    assert_eq!(pot.state().await, PotState::Pouring);

    // Only the first brew reached the runner
    assert_eq!(runner.actions(), vec!["brew"]);
    assert_eq!(pot.metrics().get_stats().brews_rejected, 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_rejected_unless_pouring() {
    let runner = RecordingRunner::new();
    let pot = pot_with(runner.clone(), 2, 2);

    assert_eq!(
        pot.stop_pouring().await,
        Err(PotError::NotPouring { state: PotState::Ready })
    );
    assert_eq!(pot.state().await, PotState::Ready);

    pot.brew(&[]).await.unwrap();
    assert_eq!(
        pot.stop_pouring().await,
        Err(PotError::NotPouring { state: PotState::Brewing })
    );
    assert_eq!(pot.state().await, PotState::Brewing);
    assert!(runner.actions().iter().all(|action| action != "stop"));
}

#[tokio::test(start_paused = true)]
async fn test_stale_timeout_does_not_cut_next_cycle_short() {
    let pot = pot_with(RecordingRunner::new(), 1, 5);

    // Cycle 1: stop early, its timeout stays pending until t=6
    pot.brew(&[]).await.unwrap();
    advance_secs(1).await;
    pot.stop_pouring().await.unwrap();

    // Cycle 2 starts at t=1 and pours from t=2 until t=7
    pot.brew(&[]).await.unwrap();
    advance_secs(1).await;
    assert_eq!(pot.state().await, PotState::Pouring);

    advance_secs(4).await;
    assert_eq!(pot.state().await, PotState::Pouring);

    advance_secs(1).await;
    assert_eq!(pot.state().await, PotState::Ready);
}

#[tokio::test(start_paused = true)]
async fn test_failed_brew_action_still_brews() {
    let runner = RecordingRunner::new();
    runner.fail_action("brew");
    let pot = pot_with(runner.clone(), 1, 1);

    let result = pot.brew(&["--decaf".to_string()]).await;
    match result {
        Err(PotError::ActionFailed { action, source }) => {
            assert_eq!(action, "brew");
            assert!(matches!(source, ActionError::Failed { status_code: 1, .. }));
        }
        other => panic!("expected ActionFailed, got {other:?}"),
    }
    assert_eq!(pot.state().await, PotState::Brewing);
    assert_eq!(runner.calls(), vec![("brew".to_string(), vec!["--decaf".to_string()])]);

    advance_secs(1).await;
    assert_eq!(pot.state().await, PotState::Pouring);
}

#[tokio::test(start_paused = true)]
async fn test_failed_stop_action_still_stops() {
    let runner = RecordingRunner::new();
    runner.fail_action("stop");
    let pot = pot_with(runner.clone(), 1, 10);

    pot.brew(&[]).await.unwrap();
    advance_secs(1).await;

    assert!(matches!(
        pot.stop_pouring().await,
        Err(PotError::ActionFailed { .. })
    ));
    assert_eq!(pot.state().await, PotState::Ready);
    assert_eq!(pot.metrics().get_stats().action_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_tracks_state() {
    let pot = pot_with(RecordingRunner::new(), 1, 1);

    for expected in [PotState::Brewing, PotState::Pouring, PotState::Ready] {
        if expected == PotState::Brewing {
            pot.brew(&[]).await.unwrap();
        } else {
            advance_secs(1).await;
        }
        let snapshot = pot.snapshot().await;
        assert_eq!(snapshot.state, expected);
        assert_eq!(snapshot.state, pot.state().await);
        assert_eq!(snapshot.coffee_type, "Latte");
        assert_eq!(snapshot.brew_time_sec, 1);
        assert_eq!(snapshot.max_pour_time_sec, 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_zero_durations_complete_cycle() {
    let pot = pot_with(RecordingRunner::new(), 0, 0);

    pot.brew(&[]).await.unwrap();
    settle().await;
    assert_eq!(pot.state().await, PotState::Ready);
    assert_eq!(pot.metrics().get_stats().pour_timeouts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_brews_start_exactly_one_cycle() {
    let runner = RecordingRunner::new();
    let pot = pot_with(runner.clone(), 5, 5);

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let pot = pot.clone();
            tokio::spawn(async move { pot.brew(&[]).await })
        })
        .collect();

    let mut started = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => started += 1,
            Err(e) => assert!(matches!(e, PotError::NotReady { .. })),
        }
    }

    assert_eq!(started, 1);
    assert_eq!(runner.actions().len(), 1);
    assert_eq!(pot.state().await, PotState::Brewing);
}

#[tokio::test(start_paused = true)]
async fn test_huge_brew_time_keeps_brewing_without_panicking() {
    let runner = RecordingRunner::new();
    let pot = pot_with(runner.clone(), u64::MAX / 2, 1);

    let brewing = tokio::spawn({
        let pot = pot.clone();
        async move { pot.brew(&[]).await }
    });
    assert!(brewing.await.unwrap().is_ok());
    assert_eq!(pot.state().await, PotState::Brewing);

    advance_secs(86_400).await;
    assert_eq!(pot.state().await, PotState::Brewing);
    assert_eq!(runner.actions(), vec!["brew"]);
}

#[tokio::test(start_paused = true)]
async fn test_huge_pour_time_still_stops_on_request() {
    let pot = pot_with(RecordingRunner::new(), 1, u64::MAX);

    pot.brew(&[]).await.unwrap();
    advance_secs(1).await;
    assert_eq!(pot.state().await, PotState::Pouring);

    pot.stop_pouring().await.unwrap();
    assert_eq!(pot.state().await, PotState::Ready);

    // The next cycle starts normally
    pot.brew(&[]).await.unwrap();
    assert_eq!(pot.state().await, PotState::Brewing);
}
