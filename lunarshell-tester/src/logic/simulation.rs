use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use lunarshell_game::constants::STORAGE_KEY_HISTORY;
use lunarshell_game::{
    ConnectivityFlag, EntryKind, ExplorationSession, ExplorationSettings, ManualClock,
    MemoryStorage, PersistentPlayer, PlayerState, RewardMap, SessionPhase, SessionServices,
    Storage, StreamDraws,
};
use serde::Serialize;

use super::policy::{ChoicePolicy, ExplorationStrategy};
use super::storage::JsonDirStorage;

const SIMULATION_EPOCH_MS: u64 = 1_700_000_000_000;

/// Parameters shared by every simulated run.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub minutes: u64,
    pub settings: ExplorationSettings,
    pub offline: bool,
    pub save_dir: Option<PathBuf>,
}

/// Outcome of one seeded run under one strategy.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationRecord {
    pub seed: u64,
    pub strategy: ExplorationStrategy,
    pub minutes: u64,
    pub entries_generated: usize,
    pub history_len: usize,
    pub kind_counts: BTreeMap<String, usize>,
    pub choices_resolved: usize,
    pub fights: usize,
    pub victories: usize,
    pub buildings_found: usize,
    pub moonlight: i64,
    pub resources: RewardMap,
    pub hp: i64,
    pub max_hp: i64,
    pub final_difficulty: u32,
    pub rng_draws: StreamDraws,
    pub violations: Vec<String>,
}

impl SimulationRecord {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Per-strategy statistics across seeds.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationAggregate {
    pub strategy: ExplorationStrategy,
    pub runs: usize,
    pub mean_entries: f64,
    pub mean_moonlight: f64,
    pub std_moonlight: f64,
    pub mean_fights: f64,
    pub victory_pct: f64,
    pub mean_final_difficulty: f64,
    pub failed_runs: usize,
}

/// Run one seed under one strategy, persisting to `save_dir` when configured.
///
/// # Errors
///
/// Fails when the save directory cannot be created or the run's journal
/// cannot be read back from it.
pub fn run_simulation(
    seed: u64,
    strategy: ExplorationStrategy,
    config: &SimulationConfig,
) -> Result<SimulationRecord> {
    let record = if let Some(dir) = &config.save_dir {
        let run_dir = dir.join(format!("{}-seed-{seed}", strategy_key(strategy)));
        let storage = JsonDirStorage::new(&run_dir);
        storage
            .prepare()
            .with_context(|| format!("failed to prepare save directory {}", run_dir.display()))?;
        let record = simulate(seed, strategy, config, storage.clone());
        storage
            .load(STORAGE_KEY_HISTORY)
            .with_context(|| format!("failed to read back journal in {}", run_dir.display()))?
            .with_context(|| format!("no journal was written to {}", run_dir.display()))?;
        record
    } else {
        simulate(seed, strategy, config, MemoryStorage::new())
    };
    log::debug!(
        "seed {seed} ({strategy}): {} entries, {} moonlight",
        record.entries_generated,
        record.moonlight
    );
    Ok(record)
}

fn strategy_key(strategy: ExplorationStrategy) -> String {
    strategy.label().to_ascii_lowercase()
}

fn simulate<S: Storage + Clone>(
    seed: u64,
    strategy: ExplorationStrategy,
    config: &SimulationConfig,
    storage: S,
) -> SimulationRecord {
    let clock = ManualClock::starting_at(SIMULATION_EPOCH_MS);
    let services = SessionServices {
        storage: storage.clone(),
        connectivity: ConnectivityFlag::new(!config.offline),
        player: PersistentPlayer::load(storage),
        clock: clock.clone(),
    };
    let mut session = ExplorationSession::new(services, config.settings.clone(), seed);
    let mut policy = strategy.create_policy(seed);

    let mut record = SimulationRecord {
        seed,
        strategy,
        minutes: config.minutes,
        entries_generated: 0,
        history_len: 0,
        kind_counts: EntryKind::ALL
            .iter()
            .map(|kind| (kind.key().to_string(), 0))
            .collect(),
        choices_resolved: 0,
        fights: 0,
        victories: 0,
        buildings_found: 0,
        moonlight: 0,
        resources: RewardMap::new(),
        hp: 0,
        max_hp: 0,
        final_difficulty: 1,
        rng_draws: StreamDraws::default(),
        violations: Vec::new(),
    };

    session.start();
    'run: for _ in 0..config.minutes.saturating_mul(60) {
        clock.advance_secs(1);
        let fired = session.poll();
        record.entries_generated += fired;
        let history = session.history();
        for entry in history.iter().skip(history.len().saturating_sub(fired)) {
            *record
                .kind_counts
                .entry(entry.kind.key().to_string())
                .or_insert(0) += 1;
        }

        while let Some(pending) = session.pending_choice().cloned() {
            let state = session.player().state().clone();
            let option_id = match policy.pick_option(&state, &pending) {
                Some(decision) => decision.option_id,
                None => break,
            };
            let outcome = match session.resolve_choice(&pending.id, &option_id) {
                Ok(outcome) => outcome,
                Err(err) => {
                    record.violations.push(format!("{}: {err}", policy.name()));
                    break 'run;
                }
            };
            record.choices_resolved += 1;
            if outcome.building_type.is_some() {
                record.buildings_found += 1;
            }
            if outcome.triggers_combat {
                match session.resolve_combat(&pending.id) {
                    Ok(follow_up) => {
                        record.fights += 1;
                        if follow_up.result.victory {
                            record.victories += 1;
                        }
                    }
                    Err(err) => {
                        record.violations.push(err.to_string());
                        break 'run;
                    }
                }
            }
        }
        if session.phase() == SessionPhase::Paused && session.pending_choice().is_none() {
            session.resume();
        }

        if let Some(violation) = check_invariants(&session) {
            record.violations.push(violation);
            break;
        }
    }

    let state: PlayerState = session.player().state().clone();
    record.history_len = session.history().len();
    record.final_difficulty = session.difficulty();
    record.rng_draws = session.rng_draws();
    record.moonlight = state.moonlight;
    record.resources = state.resources;
    record.hp = state.hp;
    record.max_hp = state.max_hp;
    session.stop();
    record
}

fn check_invariants<S, N, K>(
    session: &ExplorationSession<S, N, PersistentPlayer<S>, K>,
) -> Option<String>
where
    S: Storage,
    N: lunarshell_game::Connectivity,
    K: lunarshell_game::Clock,
{
    let limit = session.settings().history_limit;
    if session.history().len() > limit {
        return Some(format!(
            "history holds {} entries (limit {limit})",
            session.history().len()
        ));
    }
    let state = session.player().state();
    if state.moonlight < 0 {
        return Some(format!("negative moonlight {}", state.moonlight));
    }
    if !(0..=state.max_hp).contains(&state.hp) {
        return Some(format!("hp {} outside 0..={}", state.hp, state.max_hp));
    }
    if let Some((name, amount)) = state.resources.iter().find(|(_, amount)| **amount < 0) {
        return Some(format!("negative resource {name} = {amount}"));
    }
    if let Some(entry) = session
        .history()
        .iter()
        .find(|entry| !entry.resolved && entry.choices.is_empty())
    {
        return Some(format!("entry {} is unresolved without choices", entry.id));
    }
    None
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[allow(clippy::cast_precision_loss)]
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Group records by strategy and summarize.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn aggregate_records(records: &[SimulationRecord]) -> Vec<SimulationAggregate> {
    let mut grouped: BTreeMap<ExplorationStrategy, Vec<&SimulationRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.strategy).or_default().push(record);
    }

    grouped
        .into_iter()
        .map(|(strategy, runs)| {
            let entries: Vec<f64> = runs.iter().map(|r| r.entries_generated as f64).collect();
            let moonlight: Vec<f64> = runs.iter().map(|r| r.moonlight as f64).collect();
            let fights: Vec<f64> = runs.iter().map(|r| r.fights as f64).collect();
            let difficulty: Vec<f64> = runs.iter().map(|r| f64::from(r.final_difficulty)).collect();
            let total_fights: usize = runs.iter().map(|r| r.fights).sum();
            let total_victories: usize = runs.iter().map(|r| r.victories).sum();
            let victory_pct = if total_fights == 0 {
                0.0
            } else {
                total_victories as f64 / total_fights as f64 * 100.0
            };
            SimulationAggregate {
                strategy,
                runs: runs.len(),
                mean_entries: mean(&entries),
                mean_moonlight: mean(&moonlight),
                std_moonlight: std_dev(&moonlight),
                mean_fights: mean(&fights),
                victory_pct,
                mean_final_difficulty: mean(&difficulty),
                failed_runs: runs.iter().filter(|r| !r.passed()).count(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(minutes: u64) -> SimulationConfig {
        SimulationConfig {
            minutes,
            settings: ExplorationSettings::default(),
            offline: false,
            save_dir: None,
        }
    }

    #[test]
    fn short_runs_hold_invariants_for_every_strategy() {
        for strategy in ExplorationStrategy::ALL {
            let record = run_simulation(42, strategy, &config(5)).unwrap();
            assert!(record.passed(), "{strategy}: {:?}", record.violations);
            assert!(record.entries_generated > 30);
            assert!(record.choices_resolved > 0);
            assert_eq!(
                record.kind_counts.values().sum::<usize>(),
                record.entries_generated
            );
            assert_eq!(record.final_difficulty, 3);
        }
    }

    #[test]
    fn runs_are_reproducible_per_seed() {
        let a = run_simulation(7, ExplorationStrategy::Random, &config(3)).unwrap();
        let b = run_simulation(7, ExplorationStrategy::Random, &config(3)).unwrap();
        assert_eq!(a.moonlight, b.moonlight);
        assert_eq!(a.kind_counts, b.kind_counts);
        assert_eq!(a.fights, b.fights);
        assert_eq!(a.rng_draws, b.rng_draws);
        assert!(a.rng_draws.generator > 0);
        assert!(a.rng_draws.ids >= u64::try_from(a.entries_generated).unwrap());
    }

    #[test]
    fn unusable_save_dir_is_reported() {
        let blocker = std::env::temp_dir().join(format!(
            "lunarshell-sim-blocker-{}",
            std::process::id()
        ));
        std::fs::write(&blocker, b"occupied").unwrap();
        let mut cfg = config(1);
        cfg.save_dir = Some(blocker);
        let err = run_simulation(3, ExplorationStrategy::Greedy, &cfg).unwrap_err();
        assert!(format!("{err:#}").contains("failed to prepare save directory"));
    }

    #[test]
    fn save_dir_runs_persist_their_journal() {
        let dir = std::env::temp_dir().join(format!(
            "lunarshell-sim-saves-{}",
            std::process::id()
        ));
        let mut cfg = config(1);
        cfg.save_dir = Some(dir.clone());
        let record = run_simulation(4, ExplorationStrategy::Cautious, &cfg).unwrap();
        assert!(record.passed());
        assert!(dir.join("cautious-seed-4").join("exploration.log.json").exists());
    }

    #[test]
    fn offline_runs_resolve_nothing() {
        let mut cfg = config(3);
        cfg.offline = true;
        let record = run_simulation(5, ExplorationStrategy::Greedy, &cfg).unwrap();
        assert_eq!(record.choices_resolved, 0);
        assert_eq!(record.fights, 0);
    }

    #[test]
    fn aggregates_group_by_strategy() {
        let records: Vec<SimulationRecord> = [1, 2, 3]
            .into_iter()
            .flat_map(|seed| {
                [ExplorationStrategy::Greedy, ExplorationStrategy::Cautious]
                    .into_iter()
                    .map(move |strategy| run_simulation(seed, strategy, &config(2)).unwrap())
            })
            .collect();
        let aggregates = aggregate_records(&records);
        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].strategy, ExplorationStrategy::Cautious);
        assert!(aggregates.iter().all(|agg| agg.runs == 3));
        assert!(aggregates.iter().all(|agg| agg.failed_runs == 0));
    }

    #[test]
    fn std_dev_of_constant_series_is_zero() {
        assert!(std_dev(&[4.0, 4.0, 4.0]).abs() < f64::EPSILON);
        assert!((mean(&[1.0, 2.0, 3.0]) - 2.0).abs() < f64::EPSILON);
    }
}
