//! Lunar Shell Exploration Engine
//!
//! Platform-agnostic core logic for the Lunar Shell idle exploration loop.
//! This crate provides entry generation, combat resolution and the exploration
//! session state machine without UI or platform-specific dependencies.

pub mod combat;
pub mod constants;
pub mod encounter;
pub mod entry;
pub mod error;
pub mod exploration;
pub mod generator;
pub mod numbers;
pub mod player;
pub mod ports;
pub mod rewards;
pub mod rng;
pub mod settings;
pub mod templates;
pub mod weighted;

// Re-export commonly used types
pub use combat::{CombatConfig, CombatResult, Enemy, Hit, SoloOutcome, resolve_group, resolve_solo};
pub use encounter::{EncounterContext, spawn_enemies};
pub use entry::{ChoiceList, ChoiceOption, Effect, EntryId, EntryKind, LogEntry, RewardMap, Severity};
pub use error::{ChoiceError, CombatFlowError, PersistenceError, SettingsError};
#[cfg(feature = "async")]
pub use exploration::actor::{HandleError, SessionHandle, TokioClock, spawn_session};
pub use exploration::persistence::{HistoryBlob, RunStateBlob};
pub use exploration::{
    ChoiceOutcome, CombatFollowUp, ExplorationSession, SessionPhase, SessionServices,
    SessionSnapshot, TickToken, difficulty_for,
};
pub use generator::{EntryRequest, generate};
pub use player::{PersistentPlayer, PlayerPort, PlayerState, PlayerStats, apply_rewards};
pub use ports::{
    AlwaysOnline, Clock, Connectivity, ConnectivityFlag, ManualClock, MemoryStorage,
    MemoryStorageError, Storage, SystemClock,
};
pub use rewards::{base_rewards_for, scale};
pub use rng::{CountingRng, RngBundle, StreamDraws};
pub use settings::ExplorationSettings;
