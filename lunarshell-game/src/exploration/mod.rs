//! Exploration session state machine.
//!
//! A session moves `Idle -> Running -> (Paused <-> Running) -> Idle`. While
//! running it keeps exactly one pending tick; each tick generates one log
//! entry, applies the entry's rewards to the player and schedules the next
//! tick. Every cancellation bumps a generation counter, so a tick token handed
//! out before a pause or stop can never fire afterwards.
//!
//! The session never sleeps on its own. Synchronous hosts call [`ExplorationSession::poll`]
//! after advancing their clock; the async driver in `actor` waits on
//! [`ExplorationSession::next_deadline`] and calls [`ExplorationSession::fire`].

#[cfg(feature = "async")]
pub mod actor;
mod combat_flow;
pub mod persistence;

pub use combat_flow::CombatFollowUp;

use crate::constants::{
    DIFFICULTY_STEP_SECS, MAX_CATCH_UP_TICKS, MIN_TICK_DELAY_MS, PACING_WINDOW_SECS,
    STORAGE_KEY_HISTORY, STORAGE_KEY_RUN_STATE,
};
use crate::entry::{Effect, EntryId, LogEntry};
use crate::error::ChoiceError;
use crate::generator::{self, EntryRequest};
use crate::numbers::{ceil_f64_to_u64, u64_to_f64};
use crate::player::{PlayerPort, apply_rewards};
use crate::ports::{Clock, Connectivity, Storage};
use crate::rng::{RngBundle, StreamDraws};
use crate::settings::ExplorationSettings;
use persistence::{HistoryBlob, RunStateBlob};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    Running,
    Paused,
}

impl SessionPhase {
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Collaborators a session calls out to.
#[derive(Debug, Clone)]
pub struct SessionServices<S, N, P, K> {
    pub storage: S,
    pub connectivity: N,
    pub player: P,
    pub clock: K,
}

/// Identifies one scheduled tick. Tokens from a cancelled schedule are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledTick {
    token: TickToken,
    due_ms: u64,
}

/// What resolving a choice did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOutcome {
    pub entry_id: EntryId,
    pub option_id: String,
    /// The option asks the caller to run combat via [`ExplorationSession::resolve_combat`].
    pub triggers_combat: bool,
    /// Structure the option opens, if any.
    pub building_type: Option<String>,
    /// The session left an auto-pause as a result of this resolution.
    pub resumed: bool,
}

/// Read-only view of a session for presentation layers and drivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub elapsed_seconds: u64,
    pub difficulty_level: u32,
    pub history_len: usize,
    pub latest: Option<LogEntry>,
    pub pending_choice: Option<LogEntry>,
}

/// Difficulty tier for an amount of active exploration time.
#[must_use]
pub fn difficulty_for(elapsed_seconds: u64) -> u32 {
    u32::try_from(elapsed_seconds / DIFFICULTY_STEP_SECS)
        .unwrap_or(u32::MAX)
        .saturating_add(1)
}

/// One exploration run plus its persisted journal.
#[derive(Debug)]
pub struct ExplorationSession<S, N, P, K> {
    services: SessionServices<S, N, P, K>,
    settings: ExplorationSettings,
    rng: RngBundle,
    phase: SessionPhase,
    history: VecDeque<LogEntry>,
    started_at_ms: Option<u64>,
    accrued_ms: u64,
    running_since: Option<u64>,
    entries_since_last_choice: u32,
    next_choice_threshold: u32,
    generation: u64,
    scheduled: Option<ScheduledTick>,
    auto_paused: bool,
}

impl<S, N, P, K> ExplorationSession<S, N, P, K>
where
    S: Storage,
    N: Connectivity,
    P: PlayerPort,
    K: Clock,
{
    /// Build an idle session. Settings are normalized before use.
    #[must_use]
    pub fn new(
        services: SessionServices<S, N, P, K>,
        settings: ExplorationSettings,
        seed: u64,
    ) -> Self {
        let settings = settings.normalized();
        let history = VecDeque::with_capacity(settings.history_limit);
        let next_choice_threshold = settings.choice_threshold_min;
        Self {
            services,
            settings,
            rng: RngBundle::from_user_seed(seed),
            phase: SessionPhase::Idle,
            history,
            started_at_ms: None,
            accrued_ms: 0,
            running_since: None,
            entries_since_last_choice: 0,
            next_choice_threshold,
            generation: 0,
            scheduled: None,
            auto_paused: false,
        }
    }

    // Lifecycle ---------------------------------------------------------------

    /// Idle to Running. Resets the run clock and choice gating.
    pub fn start(&mut self) -> bool {
        if self.phase != SessionPhase::Idle {
            return false;
        }
        let now = self.now();
        self.started_at_ms = Some(now);
        self.accrued_ms = 0;
        self.running_since = Some(now);
        self.entries_since_last_choice = 0;
        self.next_choice_threshold = self.draw_choice_threshold();
        self.auto_paused = false;
        self.phase = SessionPhase::Running;
        self.schedule_from(now);
        self.services.player.set_in_active_run(true);
        self.persist_run_state();
        log::info!(
            "exploration started (seed {}, first choice after {} entries)",
            self.rng.seed(),
            self.next_choice_threshold
        );
        true
    }

    /// Running or Paused to Idle. History is kept.
    pub fn stop(&mut self) -> bool {
        if self.phase == SessionPhase::Idle {
            return false;
        }
        let now = self.now();
        self.cancel();
        self.freeze_at(now);
        self.phase = SessionPhase::Idle;
        self.auto_paused = false;
        self.services.player.set_in_active_run(false);
        self.persist_history();
        self.persist_run_state();
        log::info!("exploration stopped after {}s", self.elapsed_secs());
        true
    }

    /// Running to Paused. Cancels the pending tick and freezes elapsed time.
    pub fn pause(&mut self) -> bool {
        if self.phase != SessionPhase::Running {
            return false;
        }
        let now = self.now();
        self.enter_pause(now);
        log::info!("exploration paused at {}s", self.elapsed_secs());
        true
    }

    /// Paused to Running. The next tick is scheduled from now.
    pub fn resume(&mut self) -> bool {
        if self.phase != SessionPhase::Paused {
            return false;
        }
        let now = self.now();
        self.running_since = Some(now);
        self.auto_paused = false;
        self.phase = SessionPhase::Running;
        self.schedule_from(now);
        self.persist_run_state();
        log::info!("exploration resumed at {}s", self.elapsed_secs());
        true
    }

    /// Stop any run and clear the journal and run state, in memory and in storage.
    pub fn reset(&mut self) {
        let was_active = self.phase.is_active();
        self.cancel();
        self.phase = SessionPhase::Idle;
        self.history.clear();
        self.started_at_ms = None;
        self.accrued_ms = 0;
        self.running_since = None;
        self.entries_since_last_choice = 0;
        self.next_choice_threshold = self.settings.choice_threshold_min;
        self.auto_paused = false;
        if was_active {
            self.services.player.set_in_active_run(false);
        }
        for key in [STORAGE_KEY_HISTORY, STORAGE_KEY_RUN_STATE] {
            if let Err(err) = persistence::remove(&self.services.storage, key) {
                log::warn!("{err}");
            }
        }
        log::info!("exploration reset");
    }

    /// Load the persisted journal and run state into an idle session.
    ///
    /// A run stored as exploring comes back Paused with its accrued time, so
    /// the host decides when the clock starts again. Returns `true` in that case.
    pub fn restore(&mut self) -> bool {
        if self.phase != SessionPhase::Idle {
            return false;
        }
        let history: HistoryBlob = persistence::load(&self.services.storage, STORAGE_KEY_HISTORY);
        let run: RunStateBlob = persistence::load(&self.services.storage, STORAGE_KEY_RUN_STATE);

        self.history = history.entries.into();
        self.trim_history();
        self.accrued_ms = run.elapsed_ms;
        self.running_since = None;
        self.entries_since_last_choice = 0;
        self.next_choice_threshold = self.draw_choice_threshold();

        if !run.is_exploring {
            log::debug!("restored {} entries, no active run", self.history.len());
            return false;
        }
        self.started_at_ms = Some(run.started_at_epoch_ms);
        self.phase = SessionPhase::Paused;
        self.services.player.set_in_active_run(true);
        log::info!(
            "restored paused run at {}s with {} entries",
            self.elapsed_secs(),
            self.history.len()
        );
        true
    }

    // Scheduling ----------------------------------------------------------------

    /// Pending tick and its due time in epoch milliseconds.
    #[must_use]
    pub fn next_deadline(&self) -> Option<(TickToken, u64)> {
        self.scheduled.map(|tick| (tick.token, tick.due_ms))
    }

    /// Fire every tick that is due by the clock, anchoring each follow-up to
    /// the previous due time. Returns the number of entries generated.
    pub fn poll(&mut self) -> usize {
        let now = self.now();
        let mut fired = 0;
        while fired < MAX_CATCH_UP_TICKS {
            let Some(tick) = self.scheduled else {
                break;
            };
            if self.phase != SessionPhase::Running || tick.due_ms > now {
                break;
            }
            self.run_tick(tick.due_ms);
            fired += 1;
        }
        if fired == MAX_CATCH_UP_TICKS
            && self.scheduled.is_some_and(|tick| tick.due_ms <= now)
        {
            log::debug!("catch-up limit reached, rescheduling from now");
            self.schedule_from(now);
        }
        fired
    }

    /// Fire the tick identified by `token`. Stale tokens are ignored.
    pub fn fire(&mut self, token: TickToken) -> bool {
        let current = self.scheduled.map(|tick| tick.token);
        if self.phase != SessionPhase::Running || current != Some(token) {
            log::trace!("ignoring stale tick {token:?}");
            return false;
        }
        let now = self.now();
        self.run_tick(now);
        true
    }

    // Choices and journal -----------------------------------------------------------

    /// Apply the consequences of `option_id` on a pending entry, exactly once.
    ///
    /// # Errors
    ///
    /// Returns `ChoiceError` when the entry or option is unknown, or the entry
    /// was already resolved.
    pub fn resolve_choice(
        &mut self,
        entry_id: &EntryId,
        option_id: &str,
    ) -> Result<ChoiceOutcome, ChoiceError> {
        let entry = self
            .history
            .iter_mut()
            .find(|entry| &entry.id == entry_id)
            .ok_or_else(|| ChoiceError::EntryNotFound(entry_id.clone()))?;
        if entry.resolved {
            return Err(ChoiceError::AlreadyResolved(entry_id.clone()));
        }
        let option = entry
            .option(option_id)
            .cloned()
            .ok_or_else(|| ChoiceError::OptionNotFound {
                entry_id: entry_id.clone(),
                option_id: option_id.to_string(),
            })?;
        entry.mark_resolved(option_id);

        let mut triggers_combat = false;
        let mut building_type = None;
        for effect in &option.consequences {
            match effect {
                Effect::Moonlight { amount } => self.services.player.add_currency(*amount),
                Effect::Resource { name, amount } => {
                    self.services.player.add_resource(name, *amount);
                }
                Effect::Heal { amount } => {
                    let stats = self.services.player.player_stats();
                    let hp = stats.hp.saturating_add(*amount).clamp(0, stats.max_hp);
                    self.services.player.set_hp(hp);
                }
                Effect::TriggerCombat => triggers_combat = true,
                Effect::TriggerBuilding { building_type: kind } => {
                    building_type = Some(kind.clone());
                }
            }
        }
        self.persist_history();
        log::debug!("resolved {entry_id} with `{option_id}`");

        let resumed = self.auto_paused
            && self.phase == SessionPhase::Paused
            && self.pending_choice().is_none()
            && self.resume();

        Ok(ChoiceOutcome {
            entry_id: entry_id.clone(),
            option_id: option_id.to_string(),
            triggers_combat,
            building_type,
            resumed,
        })
    }

    /// Append a caller-built entry without running the generator or applying rewards.
    pub fn append_entry(&mut self, entry: LogEntry) -> EntryId {
        let id = entry.id.clone();
        self.push_entry(entry);
        self.persist_history();
        id
    }

    // Accessors ----------------------------------------------------------------------

    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Active exploration time in milliseconds; frozen while paused or idle.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms_at(self.now())
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_ms() / 1_000
    }

    /// `1 + floor(elapsed / 120s)`, recomputed on every read.
    #[must_use]
    pub fn difficulty(&self) -> u32 {
        difficulty_for(self.elapsed_secs())
    }

    /// Journal, oldest first.
    #[must_use]
    pub const fn history(&self) -> &VecDeque<LogEntry> {
        &self.history
    }

    #[must_use]
    pub fn entry(&self, entry_id: &EntryId) -> Option<&LogEntry> {
        self.history.iter().find(|entry| &entry.id == entry_id)
    }

    /// Most recent entry still awaiting a decision.
    #[must_use]
    pub fn pending_choice(&self) -> Option<&LogEntry> {
        self.history.iter().rev().find(|entry| entry.is_pending())
    }

    #[must_use]
    pub const fn settings(&self) -> &ExplorationSettings {
        &self.settings
    }

    #[must_use]
    pub const fn player(&self) -> &P {
        &self.services.player
    }

    #[must_use]
    pub const fn services(&self) -> &SessionServices<S, N, P, K> {
        &self.services
    }

    /// Draws taken so far from each random stream of this session.
    #[must_use]
    pub fn rng_draws(&self) -> StreamDraws {
        self.rng.draw_counts()
    }

    /// Wall-clock start of the current run, if one was started.
    #[must_use]
    pub const fn started_at_ms(&self) -> Option<u64> {
        self.started_at_ms
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let elapsed_seconds = self.elapsed_secs();
        SessionSnapshot {
            phase: self.phase,
            elapsed_seconds,
            difficulty_level: difficulty_for(elapsed_seconds),
            history_len: self.history.len(),
            latest: self.history.back().cloned(),
            pending_choice: self.pending_choice().cloned(),
        }
    }

    // Internals ------------------------------------------------------------------------

    fn now(&self) -> u64 {
        self.services.clock.now_ms()
    }

    fn elapsed_ms_at(&self, at_ms: u64) -> u64 {
        let running = self
            .running_since
            .map_or(0, |since| at_ms.saturating_sub(since));
        self.accrued_ms.saturating_add(running)
    }

    fn freeze_at(&mut self, at_ms: u64) {
        self.accrued_ms = self.elapsed_ms_at(at_ms);
        self.running_since = None;
    }

    fn enter_pause(&mut self, at_ms: u64) {
        self.cancel();
        self.freeze_at(at_ms);
        self.phase = SessionPhase::Paused;
        self.persist_run_state();
    }

    fn draw_choice_threshold(&mut self) -> u32 {
        let min = self.settings.choice_threshold_min;
        let max = self.settings.choice_threshold_max.max(min);
        self.rng.generator().gen_range(min..=max)
    }

    /// Interval shrinks from max toward min across each pacing window.
    fn delay_ms_at(&self, elapsed_ms: u64) -> u64 {
        let window_ms = PACING_WINDOW_SECS * 1_000;
        let progress = u64_to_f64(elapsed_ms % window_ms) / u64_to_f64(window_ms);
        let min = self.settings.min_event_interval_secs;
        let max = self.settings.max_event_interval_secs;
        let interval_secs = (max - (max - min) * progress) / self.settings.event_speed;
        ceil_f64_to_u64(interval_secs * 1_000.0).max(MIN_TICK_DELAY_MS)
    }

    fn schedule_from(&mut self, anchor_ms: u64) {
        self.generation = self.generation.wrapping_add(1);
        let delay = self.delay_ms_at(self.elapsed_ms_at(anchor_ms));
        let due_ms = anchor_ms.saturating_add(delay);
        self.scheduled = Some(ScheduledTick {
            token: TickToken(self.generation),
            due_ms,
        });
        log::debug!("next entry in {delay}ms");
    }

    fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.scheduled = None;
    }

    fn run_tick(&mut self, at_ms: u64) {
        self.scheduled = None;
        let elapsed_seconds = self.elapsed_ms_at(at_ms) / 1_000;
        let difficulty_level = difficulty_for(elapsed_seconds);
        let allow_choices = self.entries_since_last_choice >= self.next_choice_threshold
            && self.services.connectivity.is_online();

        let request = EntryRequest {
            id: EntryId::generate(at_ms, self.rng.ids()),
            created_at: at_ms,
            elapsed_seconds,
            difficulty_level,
            allow_choices,
        };
        let entry = generator::generate(request, self.rng.generator());
        log::debug!(
            "generated {} entry `{}` at {elapsed_seconds}s (level {difficulty_level})",
            entry.kind.key(),
            entry.title
        );

        apply_rewards(&mut self.services.player, &entry.rewards);
        let pending = entry.is_pending();
        if pending {
            self.entries_since_last_choice = 0;
            self.next_choice_threshold = self.draw_choice_threshold();
        } else {
            self.entries_since_last_choice = self.entries_since_last_choice.saturating_add(1);
        }
        self.push_entry(entry);
        self.persist_history();

        if pending && self.settings.auto_pause_on_choice {
            self.enter_pause(at_ms);
            self.auto_paused = true;
            log::info!("exploration paused for a choice at {elapsed_seconds}s");
        } else {
            self.schedule_from(at_ms);
            self.persist_run_state();
        }
    }

    fn push_entry(&mut self, entry: LogEntry) {
        self.history.push_back(entry);
        self.trim_history();
    }

    fn trim_history(&mut self) {
        while self.history.len() > self.settings.history_limit {
            self.history.pop_front();
        }
    }

    fn persist_history(&self) {
        let blob = HistoryBlob {
            entries: self.history.iter().cloned().collect(),
        };
        if let Err(err) = persistence::save(&self.services.storage, STORAGE_KEY_HISTORY, &blob) {
            log::warn!("{err}");
        }
    }

    fn persist_run_state(&self) {
        let blob = RunStateBlob {
            is_exploring: self.phase.is_active(),
            started_at_epoch_ms: self.started_at_ms.unwrap_or(0),
            elapsed_ms: self.elapsed_ms(),
        };
        if let Err(err) = persistence::save(&self.services.storage, STORAGE_KEY_RUN_STATE, &blob) {
            log::warn!("{err}");
        }
    }
}
