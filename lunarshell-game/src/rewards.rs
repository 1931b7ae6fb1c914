//! Reward scaling shared by combat payouts and encounter previews.

use crate::constants::{
    LUNAR_CLAW_MAX, MOONLIGHT_PER_KILL_PER_LEVEL, RESOURCE_LUNAR_CLAW, RESOURCE_MOONLIGHT,
    RESOURCE_SHADOW_ESSENCE, SHADOW_ESSENCE_MAX, SHADOW_ESSENCE_MIN, SHADOW_ESSENCE_PER_KILL,
};
use crate::encounter::EncounterContext;
use crate::entry::RewardMap;
use crate::numbers::percent_of;

/// Apply the context's per-resource percentage multipliers, rounding half-up.
#[must_use]
pub fn scale(base_rewards: &RewardMap, context: &EncounterContext) -> RewardMap {
    base_rewards
        .iter()
        .map(|(resource, amount)| {
            (
                resource.clone(),
                percent_of(*amount, context.scaling_pct(resource)),
            )
        })
        .collect()
}

/// Unscaled combat payout for `monsters_defeated` kills at the context's difficulty.
#[must_use]
pub fn base_rewards_for(context: &EncounterContext, monsters_defeated: u32) -> RewardMap {
    let kills = i64::from(monsters_defeated);
    let mut rewards = RewardMap::new();
    if kills == 0 {
        return rewards;
    }
    rewards.insert(
        RESOURCE_MOONLIGHT.to_string(),
        MOONLIGHT_PER_KILL_PER_LEVEL * i64::from(context.difficulty_level.max(1)) * kills,
    );
    rewards.insert(
        RESOURCE_SHADOW_ESSENCE.to_string(),
        (SHADOW_ESSENCE_PER_KILL * kills).clamp(SHADOW_ESSENCE_MIN, SHADOW_ESSENCE_MAX),
    );
    let claws = kills.clamp(0, LUNAR_CLAW_MAX);
    if claws > 0 {
        rewards.insert(RESOURCE_LUNAR_CLAW.to_string(), claws);
    }
    rewards
}
