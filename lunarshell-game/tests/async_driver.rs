#![cfg(feature = "async")]

use lunarshell_game::{
    ExplorationSession, ExplorationSettings, HandleError, MemoryStorage, PlayerState,
    SessionPhase, SessionServices, TokioClock, spawn_session,
};
use std::time::Duration;
use tokio::sync::watch;

fn settings() -> ExplorationSettings {
    ExplorationSettings {
        choice_threshold_min: 0,
        choice_threshold_max: 0,
        ..ExplorationSettings::default()
    }
}

#[tokio::test(start_paused = true)]
async fn timer_fires_and_auto_pause_waits_for_a_choice() {
    let (_online_tx, online) = watch::channel(true);
    let services = SessionServices {
        storage: MemoryStorage::new(),
        connectivity: online,
        player: PlayerState::default(),
        clock: TokioClock::starting_at(1_700_000_000_000),
    };
    let handle = spawn_session(ExplorationSession::new(services, settings(), 11));

    assert!(handle.start().await.unwrap());
    tokio::time::sleep(Duration::from_secs(9)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.history_len, 1);
    assert_eq!(snapshot.phase, SessionPhase::Paused);
    let pending = snapshot.pending_choice.expect("choice entry");

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(handle.snapshot().await.unwrap().history_len, 1);

    let outcome = handle
        .resolve_choice(pending.id.clone(), pending.choices[1].id.clone())
        .await
        .unwrap();
    assert!(outcome.resumed);
    assert!(matches!(
        handle.resolve_choice(pending.id, "fight").await,
        Err(HandleError::Choice(_))
    ));

    handle.shutdown().await.unwrap();
    assert_eq!(handle.start().await, Err(HandleError::Closed));
}

#[tokio::test(start_paused = true)]
async fn going_offline_suppresses_choices() {
    let (online_tx, online) = watch::channel(false);
    let services = SessionServices {
        storage: MemoryStorage::new(),
        connectivity: online,
        player: PlayerState::default(),
        clock: TokioClock::starting_at(0),
    };
    let handle = spawn_session(ExplorationSession::new(services, settings(), 4));
    handle.start().await.unwrap();

    tokio::time::sleep(Duration::from_secs(40)).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.history_len >= 4);
    assert!(snapshot.pending_choice.is_none());
    assert_eq!(snapshot.phase, SessionPhase::Running);

    online_tx.send(true).unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Paused);
    assert!(snapshot.pending_choice.is_some());

    assert!(handle.stop().await.unwrap());
    assert!(!handle.pause().await.unwrap());
}
