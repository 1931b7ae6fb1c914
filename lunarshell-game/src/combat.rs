//! Combat resolution for solo and group encounters.
//!
//! Both resolvers are pure with respect to player state: they return damage,
//! remaining hp and rewards, and the caller applies those deltas.
use crate::constants::{DEFAULT_CRIT_MULTIPLIER, DEFAULT_DAMAGE_VARIANCE, DEFAULT_MAX_ROUNDS};
use crate::encounter::EncounterContext;
use crate::entry::RewardMap;
use crate::numbers::{i64_to_f64, round_f64_to_i64};
use crate::player::PlayerStats;
use crate::rewards::{base_rewards_for, scale};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tunables for damage rolls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Spread of the per-hit roll, centered on the base damage.
    pub damage_variance: i64,
    pub crit_multiplier: f64,
    /// Group fights still undecided after this many rounds count as a loss.
    pub max_rounds: u32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            damage_variance: DEFAULT_DAMAGE_VARIANCE,
            crit_multiplier: DEFAULT_CRIT_MULTIPLIER,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

/// A single opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    pub name: String,
    pub hp: i64,
    pub damage: i64,
    pub defense: i64,
}

/// One player strike after mitigation and crit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub damage: i64,
    pub is_critical: bool,
}

/// Roll one player strike against a target's defense.
pub fn roll_hit<R: Rng + ?Sized>(
    base_damage: i64,
    target_defense: i64,
    crit_rate: f64,
    config: &CombatConfig,
    rng: &mut R,
) -> Hit {
    let variance = config.damage_variance.max(0);
    let raw = (base_damage + rng.gen_range(0..=variance) - variance / 2).max(1);
    let net = (raw - target_defense).clamp(1, raw);
    let is_critical = crit_rate > 0.0 && rng.gen_range(0.0..1.0) < crit_rate;
    let damage = if is_critical {
        round_f64_to_i64(i64_to_f64(net) * config.crit_multiplier).max(net)
    } else {
        net
    };
    Hit {
        damage,
        is_critical,
    }
}

/// Result of the single-enemy fast path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoloOutcome {
    pub enemy: String,
    pub damage_dealt: i64,
    pub is_critical: bool,
    pub monsters_defeated: u32,
    pub rewards: RewardMap,
}

/// Resolve a solo encounter. The single exchange always defeats the enemy.
pub fn resolve_solo<R: Rng + ?Sized>(
    stats: &PlayerStats,
    context: &EncounterContext,
    enemy: &Enemy,
    config: &CombatConfig,
    rng: &mut R,
) -> SoloOutcome {
    let hit = roll_hit(
        stats.base_damage,
        enemy.defense,
        stats.crit_rate,
        config,
        rng,
    );
    SoloOutcome {
        enemy: enemy.name.clone(),
        damage_dealt: hit.damage,
        is_critical: hit.is_critical,
        monsters_defeated: 1,
        rewards: scale(&base_rewards_for(context, 1), context),
    }
}

/// Result of a multi-round group fight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatResult {
    pub victory: bool,
    pub log: Vec<String>,
    pub damage_dealt: i64,
    pub damage_taken: i64,
    pub rewards: RewardMap,
    pub monsters_defeated: u32,
    pub rounds: u32,
    /// Player hp after the fight, never below zero.
    pub hp_remaining: i64,
}

/// Resolve a group encounter round by round.
///
/// Each round the player strikes every surviving enemy once, then the
/// survivors hit back with their combined damage, reduced by half the player's
/// defense (minimum 1). Falling to zero hp, or running out of rounds with enemies
/// left standing, is a loss and pays nothing.
pub fn resolve_group<R: Rng + ?Sized>(
    stats: &PlayerStats,
    context: &EncounterContext,
    enemies: &[Enemy],
    config: &CombatConfig,
    rng: &mut R,
) -> CombatResult {
    let mut remaining: Vec<Enemy> = enemies.to_vec();
    let mut log = Vec::new();
    let mut hp = stats.hp;
    let mut damage_dealt = 0;
    let mut damage_taken = 0;
    let mut monsters_defeated = 0u32;
    let mut rounds = 0u32;

    log.push(format!(
        "{} foes emerge from the dark (level {}).",
        remaining.len(),
        context.difficulty_level
    ));

    let loss = |log: Vec<String>, dealt, taken, defeated, rounds| CombatResult {
        victory: false,
        log,
        damage_dealt: dealt,
        damage_taken: taken,
        rewards: RewardMap::new(),
        monsters_defeated: defeated,
        rounds,
        hp_remaining: 0,
    };

    while rounds < config.max_rounds {
        rounds += 1;

        for enemy in &mut remaining {
            let hit = roll_hit(
                stats.base_damage,
                enemy.defense,
                stats.crit_rate,
                config,
                rng,
            );
            enemy.hp -= hit.damage;
            damage_dealt += hit.damage;
            let crit = if hit.is_critical { " Critical!" } else { "" };
            log.push(format!(
                "Round {rounds}: you strike {} for {}.{crit}",
                enemy.name, hit.damage
            ));
            if enemy.hp <= 0 {
                monsters_defeated += 1;
                log.push(format!("{} collapses.", enemy.name));
            }
        }
        remaining.retain(|enemy| enemy.hp > 0);

        if remaining.is_empty() {
            log.push(format!("Victory after {rounds} rounds."));
            return CombatResult {
                victory: true,
                log,
                damage_dealt,
                damage_taken,
                rewards: scale(&base_rewards_for(context, monsters_defeated), context),
                monsters_defeated,
                rounds,
                hp_remaining: hp.max(0),
            };
        }

        let raw_group_damage: i64 = remaining.iter().map(|enemy| enemy.damage).sum();
        let taken = (raw_group_damage - stats.base_defense / 2).max(1);
        hp -= taken;
        damage_taken += taken;
        log.push(format!(
            "Round {rounds}: {} survivors strike back for {taken}.",
            remaining.len()
        ));

        if hp <= 0 {
            log.push("You fall beneath the pale light.".to_string());
            return loss(log, damage_dealt, damage_taken, monsters_defeated, rounds);
        }
    }

    log.push(format!(
        "The fight drags past {} rounds and you retreat.",
        config.max_rounds
    ));
    let mut result = loss(log, damage_dealt, damage_taken, monsters_defeated, rounds);
    result.hp_remaining = hp.max(0);
    result
}
