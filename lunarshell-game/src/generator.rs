//! Log entry generation.
//!
//! An entry is produced in three steps: a weighted draw picks the kind, a
//! template supplies the flavor text, and a kind-specific builder computes the
//! reward magnitude and (when allowed) the two branching choices.
use crate::constants::{
    AUX_BUILDING_TYPE, BUILDING_CHANCE_BASE_PCT, BUILDING_CHANCE_CAP_PCT,
    BUILDING_CHANCE_PER_LEVEL_PCT, CHALLENGE_BASE, CHALLENGE_PER_LEVEL, DISCOVERY_BASE,
    DISCOVERY_JITTER, DISCOVERY_PER_LEVEL, ENCOUNTER_BASE, ENCOUNTER_PER_LEVEL, EXPLORATION_BASE,
    EXPLORATION_JITTER, EXPLORATION_PER_LEVEL, EXPLORE_FURTHER_PCT, FLEE_REWARD_PCT,
    PUSH_THROUGH_PCT, RESOURCE_MOONLIGHT, RESOURCE_SHADOW_ESSENCE, RESOURCE_STAR_SHARD,
    REST_HEAL, REWARD_BASE, REWARD_JITTER, REWARD_PER_LEVEL, TURN_BACK_HEAL,
};
use crate::encounter::EncounterContext;
use crate::entry::{ChoiceList, ChoiceOption, Effect, EntryId, EntryKind, LogEntry, RewardMap};
use crate::numbers::percent_of;
use crate::templates::{BUILDING_TYPES, building_title, pool};
use crate::weighted::{choose_weighted, roll_pct};
use rand::Rng;
use smallvec::smallvec;

/// Inputs for a single generated entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRequest {
    pub id: EntryId,
    pub created_at: u64,
    pub elapsed_seconds: u64,
    pub difficulty_level: u32,
    pub allow_choices: bool,
}

const EARLY: [(EntryKind, u32); 5] = [
    (EntryKind::Exploration, 40),
    (EntryKind::Discovery, 25),
    (EntryKind::Encounter, 15),
    (EntryKind::Reward, 15),
    (EntryKind::Challenge, 5),
];
const WARMING: [(EntryKind, u32); 5] = [
    (EntryKind::Exploration, 30),
    (EntryKind::Discovery, 25),
    (EntryKind::Encounter, 20),
    (EntryKind::Reward, 15),
    (EntryKind::Challenge, 10),
];
const DEEP: [(EntryKind, u32); 5] = [
    (EntryKind::Exploration, 25),
    (EntryKind::Discovery, 20),
    (EntryKind::Encounter, 25),
    (EntryKind::Reward, 15),
    (EntryKind::Challenge, 15),
];
const ABYSS: [(EntryKind, u32); 5] = [
    (EntryKind::Exploration, 20),
    (EntryKind::Discovery, 15),
    (EntryKind::Encounter, 30),
    (EntryKind::Reward, 15),
    (EntryKind::Challenge, 20),
];
const NARRATIVE: [(EntryKind, u32); 5] = [
    (EntryKind::Exploration, 50),
    (EntryKind::Discovery, 20),
    (EntryKind::Encounter, 15),
    (EntryKind::Reward, 10),
    (EntryKind::Challenge, 5),
];

/// Kind weights for the current elapsed-time bucket.
#[must_use]
pub fn weight_table(elapsed_seconds: u64, allow_choices: bool) -> &'static [(EntryKind, u32)] {
    if !allow_choices {
        return &NARRATIVE;
    }
    match elapsed_seconds / 60 {
        0 => &EARLY,
        1..=2 => &WARMING,
        3..=4 => &DEEP,
        _ => &ABYSS,
    }
}

/// Weighted kind draw; degenerate tables fall back to exploration.
pub fn pick_kind<R: Rng + ?Sized>(
    table: &[(EntryKind, u32)],
    rng: &mut R,
) -> EntryKind {
    choose_weighted(table, rng).unwrap_or(EntryKind::Exploration)
}

/// Chance that a choice-free entry of this kind carries any reward.
#[must_use]
pub const fn narrative_reward_chance_pct(kind: EntryKind) -> u32 {
    match kind {
        EntryKind::Exploration => 8,
        EntryKind::Discovery => 15,
        EntryKind::Encounter => 10,
        EntryKind::Reward => 20,
        EntryKind::Challenge => 12,
    }
}

/// Chance that a discovery reveals a structure instead of loot.
#[must_use]
pub fn building_chance_pct(difficulty_level: u32) -> u32 {
    BUILDING_CHANCE_BASE_PCT
        .saturating_add(difficulty_level.saturating_mul(BUILDING_CHANCE_PER_LEVEL_PCT))
        .min(BUILDING_CHANCE_CAP_PCT)
}

fn base_magnitude<R: Rng + ?Sized>(kind: EntryKind, level: i64, rng: &mut R) -> i64 {
    match kind {
        EntryKind::Exploration => {
            EXPLORATION_BASE + level * EXPLORATION_PER_LEVEL + rng.gen_range(0..=EXPLORATION_JITTER)
        }
        EntryKind::Discovery => {
            DISCOVERY_BASE + level * DISCOVERY_PER_LEVEL + rng.gen_range(0..=DISCOVERY_JITTER)
        }
        EntryKind::Encounter => ENCOUNTER_BASE + level * ENCOUNTER_PER_LEVEL,
        EntryKind::Reward => {
            REWARD_BASE + level * REWARD_PER_LEVEL + rng.gen_range(0..=REWARD_JITTER)
        }
        EntryKind::Challenge => CHALLENGE_BASE + level * CHALLENGE_PER_LEVEL,
    }
}

fn moonlight(amount: i64) -> RewardMap {
    RewardMap::from([(RESOURCE_MOONLIGHT.to_string(), amount)])
}

/// Generate one entry.
pub fn generate<R: Rng + ?Sized>(request: EntryRequest, rng: &mut R) -> LogEntry {
    let kind = pick_kind(
        weight_table(request.elapsed_seconds, request.allow_choices),
        rng,
    );
    compose(kind, request, rng)
}

/// Build an entry of a fixed kind.
pub fn compose<R: Rng + ?Sized>(kind: EntryKind, request: EntryRequest, rng: &mut R) -> LogEntry {
    let templates = pool(kind);
    let (title, description) = templates[rng.gen_range(0..templates.len())];
    let difficulty = request.difficulty_level.max(1);
    let level = i64::from(difficulty);
    let base = base_magnitude(kind, level, rng);
    let entry = LogEntry::new(
        request.id,
        kind,
        title,
        description,
        request.created_at,
        difficulty,
        request.elapsed_seconds,
    );

    if !request.allow_choices {
        let rewards = if roll_pct(rng, narrative_reward_chance_pct(kind)) {
            moonlight(base)
        } else {
            RewardMap::new()
        };
        return entry.with_rewards(rewards);
    }

    match kind {
        EntryKind::Exploration => entry
            .with_rewards(moonlight(base))
            .with_choices(smallvec![
                ChoiceOption::new(
                    "investigate",
                    "Investigate",
                    "Search the area for traces of shadow essence.",
                    vec![
                        Effect::resource(RESOURCE_SHADOW_ESSENCE, 1 + level / 3),
                        Effect::Moonlight {
                            amount: percent_of(base, 50),
                        },
                    ],
                ),
                ChoiceOption::new(
                    "rest",
                    "Rest",
                    "Catch your breath before moving on.",
                    vec![Effect::Heal { amount: REST_HEAL }],
                ),
            ]),
        EntryKind::Discovery if roll_pct(rng, building_chance_pct(difficulty)) => {
            let building = BUILDING_TYPES[rng.gen_range(0..BUILDING_TYPES.len())];
            let name = building_title(building);
            let choices: ChoiceList = smallvec![
                ChoiceOption::new(
                    "enter",
                    "Enter",
                    &format!("Step inside the {name}."),
                    vec![Effect::TriggerBuilding {
                        building_type: building.to_string(),
                    }],
                ),
                ChoiceOption::new("skip", "Skip", "Leave it to the dust.", Vec::new()),
            ];
            let mut entry = entry.with_choices(choices).with_aux(AUX_BUILDING_TYPE, building);
            entry.title = name.clone();
            entry.description = format!("The outline of a {name} rises from the regolith.");
            entry
        }
        EntryKind::Discovery => entry
            .with_rewards(moonlight(base))
            .with_choices(smallvec![
                ChoiceOption::new(
                    "explore",
                    "Explore further",
                    "Dig deeper for a richer find.",
                    vec![
                        Effect::Moonlight {
                            amount: percent_of(base, EXPLORE_FURTHER_PCT),
                        },
                        Effect::resource(RESOURCE_STAR_SHARD, 1),
                    ],
                ),
                ChoiceOption::new(
                    "leave",
                    "Leave",
                    "Take what is in plain sight.",
                    vec![Effect::Moonlight { amount: base }],
                ),
            ]),
        EntryKind::Encounter => {
            let context = EncounterContext::build(request.elapsed_seconds, difficulty, rng);
            entry
                .with_choices(smallvec![
                    ChoiceOption::new(
                        "fight",
                        "Fight",
                        "Stand your ground.",
                        vec![Effect::Moonlight { amount: base }, Effect::TriggerCombat],
                    ),
                    ChoiceOption::new(
                        "flee",
                        "Flee",
                        "Slip away with what you can carry.",
                        vec![Effect::Moonlight {
                            amount: percent_of(base, FLEE_REWARD_PCT),
                        }],
                    ),
                ])
                .with_encounter(context)
        }
        EntryKind::Reward => entry.with_choices(smallvec![
            ChoiceOption::new(
                "take",
                "Take",
                "Claim the prize.",
                vec![
                    Effect::Moonlight { amount: base },
                    Effect::resource(RESOURCE_SHADOW_ESSENCE, 1),
                ],
            ),
            ChoiceOption::new("leave", "Leave", "Leave it for another wanderer.", Vec::new()),
        ]),
        EntryKind::Challenge => entry.with_choices(smallvec![
            ChoiceOption::new(
                "push",
                "Push through",
                "Brave the danger for a greater reward.",
                vec![
                    Effect::Moonlight {
                        amount: percent_of(base, PUSH_THROUGH_PCT),
                    },
                    Effect::Heal {
                        amount: -(3 + level),
                    },
                ],
            ),
            ChoiceOption::new(
                "turn_back",
                "Turn back",
                "Retreat and tend your wounds.",
                vec![Effect::Heal {
                    amount: TURN_BACK_HEAL,
                }],
            ),
        ]),
    }
}
