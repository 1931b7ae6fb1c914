//! Encounter contexts and enemy spawning.
use crate::combat::Enemy;
use crate::constants::{
    ENEMY_COUNT_SPREAD, ENEMY_TIER_SPAN, GROUP_CHANCE_CAP_PCT, GROUP_CHANCE_PER_LEVEL_PCT,
    RESOURCE_SHADOW_ESSENCE, SHADOW_SCALING_PER_LEVEL_PCT, UNSCALED_PCT,
};
use crate::numbers::percent_of;
use crate::weighted::{choose_weighted, roll_pct};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters describing a pending or resolved combat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterContext {
    pub id: String,
    pub difficulty_level: u32,
    pub min_enemies: u32,
    pub max_enemies: u32,
    /// Resource-name to percentage multiplier; absent keys scale at 100.
    #[serde(default)]
    pub resource_scaling: BTreeMap<String, i64>,
    pub is_solo: bool,
    pub elapsed_seconds: u64,
}

impl EncounterContext {
    /// Build a context for the given session clock and difficulty.
    pub fn build<R: Rng + ?Sized>(elapsed_seconds: u64, difficulty_level: u32, rng: &mut R) -> Self {
        let difficulty_level = difficulty_level.max(1);
        let min_enemies = difficulty_level.div_ceil(ENEMY_TIER_SPAN);
        let max_enemies = min_enemies + ENEMY_COUNT_SPREAD;
        let is_solo = !roll_pct(rng, group_chance_pct(difficulty_level));

        let mut resource_scaling = BTreeMap::new();
        resource_scaling.insert(
            RESOURCE_SHADOW_ESSENCE.to_string(),
            UNSCALED_PCT + i64::from(difficulty_level) * SHADOW_SCALING_PER_LEVEL_PCT,
        );

        let suffix: u32 = rng.gen_range(0..0x0100_0000);
        Self {
            id: format!("enc-{elapsed_seconds}-{suffix:06x}"),
            difficulty_level,
            min_enemies,
            max_enemies,
            resource_scaling,
            is_solo,
            elapsed_seconds,
        }
    }

    /// Multiplier percentage for a resource, 100 when unscaled.
    #[must_use]
    pub fn scaling_pct(&self, resource: &str) -> i64 {
        self.resource_scaling
            .get(resource)
            .copied()
            .unwrap_or(UNSCALED_PCT)
    }
}

/// Percent chance that an encounter at this difficulty is a group fight.
#[must_use]
pub fn group_chance_pct(difficulty_level: u32) -> u32 {
    difficulty_level
        .saturating_mul(GROUP_CHANCE_PER_LEVEL_PCT)
        .min(GROUP_CHANCE_CAP_PCT)
}

#[derive(Debug, Clone, Copy)]
struct EnemyTemplate {
    name: &'static str,
    hp: i64,
    damage: i64,
    defense: i64,
}

const BESTIARY: [(EnemyTemplate, u32); 5] = [
    (
        EnemyTemplate {
            name: "Moon Wisp",
            hp: 18,
            damage: 3,
            defense: 0,
        },
        30,
    ),
    (
        EnemyTemplate {
            name: "Crater Stalker",
            hp: 26,
            damage: 5,
            defense: 1,
        },
        25,
    ),
    (
        EnemyTemplate {
            name: "Shade Hound",
            hp: 32,
            damage: 6,
            defense: 2,
        },
        20,
    ),
    (
        EnemyTemplate {
            name: "Regolith Golem",
            hp: 48,
            damage: 7,
            defense: 4,
        },
        15,
    ),
    (
        EnemyTemplate {
            name: "Eclipse Wraith",
            hp: 40,
            damage: 9,
            defense: 3,
        },
        10,
    ),
];

/// Draw the enemy roster for a context: one enemy when solo, otherwise a
/// count in `min_enemies..=max_enemies`. Stats grow with difficulty.
pub fn spawn_enemies<R: Rng + ?Sized>(context: &EncounterContext, rng: &mut R) -> Vec<Enemy> {
    let count = if context.is_solo {
        1
    } else {
        let min = context.min_enemies.max(1);
        rng.gen_range(min..=context.max_enemies.max(min))
    };
    let tier = i64::from(context.difficulty_level.saturating_sub(1));
    let indices: Vec<(usize, u32)> = BESTIARY
        .iter()
        .enumerate()
        .map(|(idx, (_, weight))| (idx, *weight))
        .collect();

    (0..count)
        .map(|_| {
            let idx = choose_weighted(&indices, rng).unwrap_or(0);
            let template = BESTIARY[idx].0;
            Enemy {
                name: template.name.to_string(),
                hp: percent_of(template.hp, 100 + tier * 15).max(1),
                damage: template.damage + tier,
                defense: template.defense + tier / 3,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn enemy_range_is_ordered_for_all_levels() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        for level in 1..=60 {
            let ctx = EncounterContext::build(30, level, &mut rng);
            assert!(ctx.min_enemies >= 1);
            assert!(ctx.min_enemies <= ctx.max_enemies);
            assert_eq!(ctx.max_enemies, ctx.min_enemies + 2);
        }
    }

    #[test]
    fn enemy_range_tracks_difficulty_tiers() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert_eq!(EncounterContext::build(0, 1, &mut rng).min_enemies, 1);
        assert_eq!(EncounterContext::build(0, 5, &mut rng).min_enemies, 1);
        assert_eq!(EncounterContext::build(0, 6, &mut rng).min_enemies, 2);
        assert_eq!(EncounterContext::build(0, 11, &mut rng).min_enemies, 3);
    }

    #[test]
    fn shadow_essence_scaling_grows_with_level() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let ctx = EncounterContext::build(0, 3, &mut rng);
        assert_eq!(ctx.scaling_pct(RESOURCE_SHADOW_ESSENCE), 130);
        assert_eq!(ctx.scaling_pct("moonlight"), 100);
    }

    #[test]
    fn group_chance_caps_at_seventy() {
        assert_eq!(group_chance_pct(1), 5);
        assert_eq!(group_chance_pct(10), 50);
        assert_eq!(group_chance_pct(14), 70);
        assert_eq!(group_chance_pct(400), 70);
    }

    #[test]
    fn low_levels_are_mostly_solo() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let solo = (0..400)
            .filter(|_| EncounterContext::build(0, 1, &mut rng).is_solo)
            .count();
        assert!(solo > 340, "solo count {solo}");
    }

    #[test]
    fn spawn_respects_context_bounds() {
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        for level in [1, 4, 9, 20] {
            let mut ctx = EncounterContext::build(0, level, &mut rng);
            ctx.is_solo = false;
            let enemies = spawn_enemies(&ctx, &mut rng);
            let count = u32::try_from(enemies.len()).unwrap();
            assert!(count >= ctx.min_enemies && count <= ctx.max_enemies);
            assert!(enemies.iter().all(|enemy| enemy.hp > 0));

            ctx.is_solo = true;
            assert_eq!(spawn_enemies(&ctx, &mut rng).len(), 1);
        }
    }
}
