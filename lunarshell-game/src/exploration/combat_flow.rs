//! Combat follow-up for encounter entries whose chosen option triggered a fight.
use super::ExplorationSession;
use crate::combat::{CombatResult, resolve_group, resolve_solo};
use crate::constants::{AUX_COMBAT_LOG, AUX_ENEMY_COUNT, AUX_SOURCE_ENTRY};
use crate::encounter::spawn_enemies;
use crate::entry::{EntryId, EntryKind, LogEntry, Severity};
use crate::error::CombatFlowError;
use crate::player::{PlayerPort, apply_rewards};
use crate::ports::{Clock, Connectivity, Storage};

/// The appended result entry and the fight that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatFollowUp {
    pub entry_id: EntryId,
    pub result: CombatResult,
}

impl<S, N, P, K> ExplorationSession<S, N, P, K>
where
    S: Storage,
    N: Connectivity,
    P: PlayerPort,
    K: Clock,
{
    /// Fight the encounter attached to `entry_id`, apply hp and reward deltas
    /// to the player, and append one resolved result entry.
    ///
    /// # Errors
    ///
    /// Returns `CombatFlowError` when the entry is unknown, carries no
    /// encounter, was not resolved with a fighting option, or its fight
    /// already has a result entry.
    pub fn resolve_combat(&mut self, entry_id: &EntryId) -> Result<CombatFollowUp, CombatFlowError> {
        let source = self
            .entry(entry_id)
            .ok_or_else(|| CombatFlowError::EntryNotFound(entry_id.clone()))?;
        let context = source
            .encounter_context
            .clone()
            .ok_or_else(|| CombatFlowError::NoEncounterContext(entry_id.clone()))?;
        let triggered = source.resolved
            && source
                .chosen_option_id
                .as_deref()
                .and_then(|option_id| source.option(option_id))
                .is_some_and(|option| option.requires_combat());
        if !triggered {
            return Err(CombatFlowError::NotTriggered(entry_id.clone()));
        }
        if self.combat_recorded_for(entry_id) {
            return Err(CombatFlowError::AlreadyFought(entry_id.clone()));
        }

        let stats = self.services.player.player_stats();
        let config = self.settings.combat.clone();
        let enemies = spawn_enemies(&context, self.rng.combat());
        let result = match enemies.as_slice() {
            [enemy] if context.is_solo => {
                let outcome = resolve_solo(&stats, &context, enemy, &config, self.rng.combat());
                let crit = if outcome.is_critical { " Critical!" } else { "" };
                CombatResult {
                    victory: true,
                    log: vec![
                        format!(
                            "You strike {} for {}.{crit}",
                            outcome.enemy, outcome.damage_dealt
                        ),
                        format!("{} collapses.", outcome.enemy),
                    ],
                    damage_dealt: outcome.damage_dealt,
                    damage_taken: 0,
                    rewards: outcome.rewards,
                    monsters_defeated: outcome.monsters_defeated,
                    rounds: 1,
                    hp_remaining: stats.hp,
                }
            }
            _ => resolve_group(&stats, &context, &enemies, &config, self.rng.combat()),
        };

        if result.hp_remaining != stats.hp {
            self.services.player.set_hp(result.hp_remaining);
        }
        apply_rewards(&mut self.services.player, &result.rewards);

        let now = self.now();
        let (title, severity) = if result.victory {
            ("Victory", Severity::Combat)
        } else {
            ("Defeat", Severity::Damage)
        };
        let description = if result.victory {
            format!(
                "You defeat {} foe{} and take {} damage.",
                result.monsters_defeated,
                if result.monsters_defeated == 1 { "" } else { "s" },
                result.damage_taken
            )
        } else {
            format!(
                "You are driven back after {} rounds, losing {} hp.",
                result.rounds, result.damage_taken
            )
        };
        let entry = LogEntry::new(
            EntryId::generate(now, self.rng.ids()),
            EntryKind::Encounter,
            title,
            description,
            now,
            context.difficulty_level,
            self.elapsed_secs(),
        )
        .with_severity(severity)
        .with_rewards(result.rewards.clone())
        .with_aux(AUX_SOURCE_ENTRY, entry_id.as_str())
        .with_aux(AUX_ENEMY_COUNT, enemies.len())
        .with_aux(AUX_COMBAT_LOG, result.log.clone());

        log::info!(
            "combat for {entry_id}: {} ({} defeated, {} taken)",
            if result.victory { "victory" } else { "defeat" },
            result.monsters_defeated,
            result.damage_taken
        );
        let entry_id = self.append_entry(entry);
        Ok(CombatFollowUp { entry_id, result })
    }

    fn combat_recorded_for(&self, entry_id: &EntryId) -> bool {
        self.history.iter().any(|entry| {
            entry
                .aux_data
                .get(AUX_SOURCE_ENTRY)
                .and_then(serde_json::Value::as_str)
                == Some(entry_id.as_str())
        })
    }
}
