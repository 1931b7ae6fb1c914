use lunarshell_game::constants::{STORAGE_KEY_HISTORY, STORAGE_KEY_RUN_STATE};
use lunarshell_game::{
    ChoiceError, ConnectivityFlag, EntryId, EntryKind, ExplorationSession, ExplorationSettings,
    ManualClock, MemoryStorage, PlayerState, RunStateBlob, SessionPhase, SessionServices, Severity,
};

type Session = ExplorationSession<MemoryStorage, ConnectivityFlag, PlayerState, ManualClock>;

const EPOCH_MS: u64 = 1_700_000_000_000;

struct Harness {
    session: Session,
    storage: MemoryStorage,
    clock: ManualClock,
}

fn harness_with(settings: ExplorationSettings, storage: MemoryStorage, seed: u64) -> Harness {
    let clock = ManualClock::starting_at(EPOCH_MS);
    let services = SessionServices {
        storage: storage.clone(),
        connectivity: ConnectivityFlag::new(true),
        player: PlayerState::default(),
        clock: clock.clone(),
    };
    Harness {
        session: ExplorationSession::new(services, settings, seed),
        storage,
        clock,
    }
}

fn harness(settings: ExplorationSettings) -> Harness {
    harness_with(settings, MemoryStorage::new(), 2024)
}

fn choices_every_entry() -> ExplorationSettings {
    ExplorationSettings {
        choice_threshold_min: 0,
        choice_threshold_max: 0,
        ..ExplorationSettings::default()
    }
}

#[test]
fn first_tick_produces_one_consistent_entry() {
    let mut h = harness(ExplorationSettings::default());
    assert!(h.session.start());
    h.clock.advance_secs(9);
    assert_eq!(h.session.poll(), 1);

    let history = h.session.history();
    assert_eq!(history.len(), 1);
    let entry = &history[0];
    assert_eq!(entry.resolved, entry.choices.is_empty());
    assert_eq!(entry.difficulty_level, 1);
    assert_eq!(entry.elapsed_seconds, 8);
}

#[test]
fn generated_rewards_reach_the_player_immediately() {
    let mut h = harness(ExplorationSettings {
        auto_pause_on_choice: false,
        ..ExplorationSettings::default()
    });
    h.session.start();
    h.clock.advance_secs(600);
    h.session.poll();

    let granted: i64 = h
        .session
        .history()
        .iter()
        .filter_map(|entry| entry.rewards.get("moonlight"))
        .sum();
    assert_eq!(h.session.player().moonlight, granted);
}

#[test]
fn history_keeps_the_most_recent_hundred() {
    let mut h = harness(ExplorationSettings {
        auto_pause_on_choice: false,
        ..ExplorationSettings::default()
    });
    h.session.start();

    let mut generated: Vec<EntryId> = Vec::new();
    while generated.len() < 150 {
        h.clock.advance_secs(1);
        let fired = h.session.poll();
        let history = h.session.history();
        generated.extend(
            history
                .iter()
                .skip(history.len() - fired)
                .map(|entry| entry.id.clone()),
        );
    }

    assert_eq!(generated.len(), 150);
    let retained: Vec<EntryId> = h.session.history().iter().map(|e| e.id.clone()).collect();
    assert_eq!(retained.len(), 100);
    assert_eq!(retained, generated[50..].to_vec());
}

#[test]
fn pause_twice_is_the_same_as_pause_once() {
    let mut h = harness(ExplorationSettings::default());
    h.session.start();
    h.clock.advance_secs(3);
    assert!(h.session.pause());
    let snapshot = h.session.snapshot();
    assert!(!h.session.pause());
    assert_eq!(h.session.snapshot(), snapshot);
    assert_eq!(h.session.phase(), SessionPhase::Paused);

    h.clock.advance_secs(60);
    assert_eq!(h.session.poll(), 0);
    assert!(h.session.history().is_empty());
}

#[test]
fn choices_apply_exactly_once() {
    let mut h = harness(choices_every_entry());
    h.session.start();
    h.clock.advance_secs(8);
    h.session.poll();

    let pending = h.session.pending_choice().cloned().expect("pending entry");
    let option = pending.choices[0].id.clone();
    h.session.resolve_choice(&pending.id, &option).unwrap();
    let after_first = h.session.player().clone();

    assert_eq!(
        h.session.resolve_choice(&pending.id, &option),
        Err(ChoiceError::AlreadyResolved(pending.id.clone()))
    );
    assert_eq!(h.session.player(), &after_first);

    let resolved = h.session.entry(&pending.id).unwrap();
    assert!(resolved.resolved);
    assert_eq!(resolved.chosen_option_id.as_deref(), Some(option.as_str()));
}

#[test]
fn unknown_option_is_reported_and_leaves_entry_pending() {
    let mut h = harness(choices_every_entry());
    h.session.start();
    h.clock.advance_secs(8);
    h.session.poll();

    let pending = h.session.pending_choice().cloned().expect("pending entry");
    assert_eq!(
        h.session.resolve_choice(&pending.id, "dance"),
        Err(ChoiceError::OptionNotFound {
            entry_id: pending.id.clone(),
            option_id: "dance".to_string(),
        })
    );
    assert!(h.session.entry(&pending.id).unwrap().is_pending());
}

#[test]
fn fighting_a_solo_encounter_appends_one_combat_entry() {
    let mut h = harness(choices_every_entry());
    h.session.start();

    let mut fought = None;
    for _ in 0..400 {
        h.clock.advance_secs(1);
        h.session.poll();
        let Some(pending) = h.session.pending_choice().cloned() else {
            continue;
        };
        let solo = pending
            .encounter_context
            .as_ref()
            .is_some_and(|context| context.is_solo);
        if pending.kind == EntryKind::Encounter && solo {
            let outcome = h.session.resolve_choice(&pending.id, "fight").unwrap();
            assert!(outcome.triggers_combat);
            fought = Some(pending.id);
            break;
        }
        let option = pending.choices[pending.choices.len() - 1].id.clone();
        h.session.resolve_choice(&pending.id, &option).unwrap();
    }
    let source = fought.expect("a solo encounter within the run");

    let before = h.session.history().len();
    let follow_up = h.session.resolve_combat(&source).unwrap();
    assert_eq!(h.session.history().len(), before + 1);

    let entry = h.session.history().back().unwrap();
    assert_eq!(entry.id, follow_up.entry_id);
    assert_eq!(entry.kind, EntryKind::Encounter);
    assert_eq!(entry.severity, Severity::Combat);
    assert!(entry.resolved);
    assert!(!entry.rewards.is_empty());
}

#[test]
fn stop_keeps_history_and_reset_clears_it() {
    let mut h = harness(ExplorationSettings::default());
    h.session.start();
    h.clock.advance_secs(30);
    h.session.poll();
    let kept = h.session.history().len();
    assert!(kept > 0);

    assert!(h.session.stop());
    assert_eq!(h.session.history().len(), kept);
    assert!(h.session.next_deadline().is_none());
    let run: RunStateBlob =
        serde_json::from_value(h.storage.get(STORAGE_KEY_RUN_STATE).unwrap()).unwrap();
    assert!(!run.is_exploring);

    h.session.reset();
    assert!(h.session.history().is_empty());
    assert!(h.storage.get(STORAGE_KEY_HISTORY).is_none());
    assert!(h.storage.get(STORAGE_KEY_RUN_STATE).is_none());
}

#[test]
fn interrupted_run_restores_paused_with_its_elapsed_time() {
    let storage = MemoryStorage::new();
    let mut first = harness_with(ExplorationSettings::default(), storage.clone(), 9);
    first.session.start();
    first.clock.advance_secs(20);
    first.session.poll();
    let history_len = first.session.history().len();
    drop(first);

    let mut second = harness_with(ExplorationSettings::default(), storage, 9);
    assert!(second.session.restore());
    assert_eq!(second.session.phase(), SessionPhase::Paused);
    assert_eq!(second.session.history().len(), history_len);
    assert_eq!(second.session.elapsed_secs(), 20);
    assert!(second.session.player().in_active_run);

    second.clock.advance_secs(100);
    assert_eq!(second.session.elapsed_secs(), 20);
    assert!(second.session.resume());
    second.clock.advance_secs(5);
    assert_eq!(second.session.elapsed_secs(), 25);
}

#[test]
fn storage_failures_do_not_interrupt_the_run() {
    let storage = MemoryStorage::new();
    storage.set_fail_writes(true);
    let mut h = harness_with(ExplorationSettings::default(), storage, 5);

    assert!(h.session.start());
    h.clock.advance_secs(30);
    assert!(h.session.poll() > 0);
    assert!(!h.session.history().is_empty());
    assert!(h.storage.get(STORAGE_KEY_HISTORY).is_none());
    assert!(h.session.pause());
    assert!(h.session.stop());
}

#[test]
fn difficulty_rises_with_active_time_only() {
    let mut h = harness(ExplorationSettings {
        auto_pause_on_choice: false,
        ..ExplorationSettings::default()
    });
    h.session.start();
    h.clock.advance_secs(119);
    assert_eq!(h.session.difficulty(), 1);
    h.session.pause();
    h.clock.advance_secs(3_600);
    assert_eq!(h.session.difficulty(), 1);
    h.session.resume();
    h.clock.advance_secs(1);
    assert_eq!(h.session.difficulty(), 2);
}
