//! Persisted player record and the collaborator interface the core mutates it through.
use crate::constants::{
    PLAYER_DEFAULT_CRIT_RATE, PLAYER_DEFAULT_DAMAGE, PLAYER_DEFAULT_DEFENSE, PLAYER_DEFAULT_HP,
    RESOURCE_MOONLIGHT, STORAGE_KEY_PLAYER,
};
use crate::entry::RewardMap;
use crate::ports::Storage;
use serde::{Deserialize, Serialize};

/// Combat-relevant snapshot of the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub hp: i64,
    pub max_hp: i64,
    pub base_damage: i64,
    pub base_defense: i64,
    pub crit_rate: f64,
}

/// Mutations the exploration core performs on the player.
pub trait PlayerPort {
    fn add_currency(&mut self, amount: i64);
    fn add_resource(&mut self, name: &str, amount: i64);
    fn set_hp(&mut self, value: i64);
    fn player_stats(&self) -> PlayerStats;
    fn set_in_active_run(&mut self, active: bool);
}

/// The player record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerState {
    pub hp: i64,
    pub max_hp: i64,
    pub moonlight: i64,
    pub base_damage: i64,
    pub base_defense: i64,
    pub crit_rate: f64,
    pub resources: RewardMap,
    pub in_active_run: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            hp: PLAYER_DEFAULT_HP,
            max_hp: PLAYER_DEFAULT_HP,
            moonlight: 0,
            base_damage: PLAYER_DEFAULT_DAMAGE,
            base_defense: PLAYER_DEFAULT_DEFENSE,
            crit_rate: PLAYER_DEFAULT_CRIT_RATE,
            resources: RewardMap::new(),
            in_active_run: false,
        }
    }
}

impl PlayerState {
    /// Return to first-launch defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn resource(&self, name: &str) -> i64 {
        self.resources.get(name).copied().unwrap_or(0)
    }

    /// Restore ranges after deserialization or external edits.
    pub fn clamp(&mut self) {
        self.max_hp = self.max_hp.max(1);
        self.hp = self.hp.clamp(0, self.max_hp);
        self.moonlight = self.moonlight.max(0);
        self.base_damage = self.base_damage.max(0);
        self.base_defense = self.base_defense.max(0);
        self.crit_rate = if self.crit_rate.is_finite() {
            self.crit_rate.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.resources.retain(|_, amount| *amount > 0);
    }
}

impl PlayerPort for PlayerState {
    fn add_currency(&mut self, amount: i64) {
        self.moonlight = self.moonlight.saturating_add(amount).max(0);
    }

    fn add_resource(&mut self, name: &str, amount: i64) {
        let current = self.resource(name);
        let updated = current.saturating_add(amount).max(0);
        if updated == 0 {
            self.resources.remove(name);
        } else {
            self.resources.insert(name.to_string(), updated);
        }
    }

    fn set_hp(&mut self, value: i64) {
        self.hp = value.clamp(0, self.max_hp);
    }

    fn player_stats(&self) -> PlayerStats {
        PlayerStats {
            hp: self.hp,
            max_hp: self.max_hp,
            base_damage: self.base_damage,
            base_defense: self.base_defense,
            crit_rate: self.crit_rate,
        }
    }

    fn set_in_active_run(&mut self, active: bool) {
        self.in_active_run = active;
    }
}

/// Player record that writes itself through to storage after every mutation.
#[derive(Debug, Clone)]
pub struct PersistentPlayer<S: Storage> {
    state: PlayerState,
    storage: S,
}

impl<S: Storage> PersistentPlayer<S> {
    /// Load the stored player, or create first-launch defaults when absent or unreadable.
    pub fn load(storage: S) -> Self {
        let state = match storage.load(STORAGE_KEY_PLAYER) {
            Ok(Some(blob)) => serde_json::from_value::<PlayerState>(blob)
                .map(|mut state| {
                    state.clamp();
                    state
                })
                .unwrap_or_else(|err| {
                    log::warn!("discarding malformed player blob: {err}");
                    PlayerState::default()
                }),
            Ok(None) => PlayerState::default(),
            Err(err) => {
                log::warn!("failed to load player state: {err}");
                PlayerState::default()
            }
        };
        Self { state, storage }
    }

    #[must_use]
    pub const fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Reset to defaults and persist.
    pub fn reset(&mut self) {
        self.state.reset();
        self.persist();
    }

    fn persist(&self) {
        let blob = match serde_json::to_value(&self.state) {
            Ok(blob) => blob,
            Err(err) => {
                log::warn!("failed to encode player state: {err}");
                return;
            }
        };
        if let Err(err) = self.storage.save(STORAGE_KEY_PLAYER, &blob) {
            log::warn!("failed to persist player state: {err}");
        }
    }
}

impl<S: Storage> PlayerPort for PersistentPlayer<S> {
    fn add_currency(&mut self, amount: i64) {
        self.state.add_currency(amount);
        self.persist();
    }

    fn add_resource(&mut self, name: &str, amount: i64) {
        self.state.add_resource(name, amount);
        self.persist();
    }

    fn set_hp(&mut self, value: i64) {
        self.state.set_hp(value);
        self.persist();
    }

    fn player_stats(&self) -> PlayerStats {
        self.state.player_stats()
    }

    fn set_in_active_run(&mut self, active: bool) {
        self.state.set_in_active_run(active);
        self.persist();
    }
}

/// Apply a reward map: the currency key goes to `add_currency`, everything else is a resource.
pub fn apply_rewards<P: PlayerPort + ?Sized>(player: &mut P, rewards: &RewardMap) {
    for (name, amount) in rewards {
        if name == RESOURCE_MOONLIGHT {
            player.add_currency(*amount);
        } else {
            player.add_resource(name, *amount);
        }
    }
}
