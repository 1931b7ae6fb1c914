use std::fmt;

use lunarshell_game::{ChoiceOption, LogEntry, PlayerState};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

/// Decision returned by a [`ChoicePolicy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub option_id: String,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(option_id: &str, rationale: Option<String>) -> Self {
        Self {
            option_id: option_id.to_string(),
            rationale,
        }
    }
}

/// Policy interface for scripted choice resolution.
pub trait ChoicePolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick an option for a pending entry; `None` when the entry offers nothing.
    fn pick_option(&mut self, player: &PlayerState, entry: &LogEntry) -> Option<PolicyDecision>;
}

/// Built-in strategies for simulated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorationStrategy {
    Cautious,
    Greedy,
    Fighter,
    Random,
}

impl ExplorationStrategy {
    pub const ALL: [Self; 4] = [Self::Cautious, Self::Greedy, Self::Fighter, Self::Random];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::Greedy => "Greedy",
            Self::Fighter => "Fighter",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "cautious" => Some(Self::Cautious),
            "greedy" => Some(Self::Greedy),
            "fighter" => Some(Self::Fighter),
            "random" => Some(Self::Random),
            _ => None,
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn ChoicePolicy + Send> {
        match self {
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Greedy => Box::new(GreedyPolicy),
            Self::Fighter => Box::new(FighterPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for ExplorationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct CautiousPolicy;
struct GreedyPolicy;
struct FighterPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

/// Combat and injuries weigh far more than lost currency.
fn cautious_risk(choice: &ChoiceOption) -> i64 {
    let combat = if choice.requires_combat() { 1_000 } else { 0 };
    let injury = (-choice.hp_delta()).max(0) * 10;
    combat + injury - choice.moonlight()
}

impl ChoicePolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn pick_option(&mut self, player: &PlayerState, entry: &LogEntry) -> Option<PolicyDecision> {
        let wounded = player.hp * 2 < player.max_hp;
        if wounded
            && let Some(heal) = entry
                .choices
                .iter()
                .filter(|choice| !choice.requires_combat())
                .max_by_key(|choice| choice.hp_delta())
                .filter(|choice| choice.hp_delta() > 0)
        {
            return Some(PolicyDecision::new(&heal.id, Some("wounded".to_string())));
        }

        entry
            .choices
            .iter()
            .min_by_key(|choice| cautious_risk(choice))
            .map(|choice| {
                PolicyDecision::new(
                    &choice.id,
                    Some(format!("risk {}", cautious_risk(choice))),
                )
            })
    }
}

impl ChoicePolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn pick_option(&mut self, _player: &PlayerState, entry: &LogEntry) -> Option<PolicyDecision> {
        let mut best: Option<&ChoiceOption> = None;
        for choice in &entry.choices {
            if best.is_none_or(|current| choice.moonlight() > current.moonlight()) {
                best = Some(choice);
            }
        }
        best.map(|choice| {
            PolicyDecision::new(&choice.id, Some(format!("moonlight {}", choice.moonlight())))
        })
    }
}

impl ChoicePolicy for FighterPolicy {
    fn name(&self) -> &'static str {
        "Fighter"
    }

    fn pick_option(&mut self, player: &PlayerState, entry: &LogEntry) -> Option<PolicyDecision> {
        if let Some(fight) = entry.choices.iter().find(|choice| choice.requires_combat()) {
            return Some(PolicyDecision::new(&fight.id, Some("fight".to_string())));
        }
        if let Some(building) = entry.choices.iter().find(|choice| choice.building().is_some()) {
            return Some(PolicyDecision::new(&building.id, Some("enter".to_string())));
        }
        GreedyPolicy.pick_option(player, entry)
    }
}

impl ChoicePolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_option(&mut self, _player: &PlayerState, entry: &LogEntry) -> Option<PolicyDecision> {
        if entry.choices.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..entry.choices.len());
        Some(PolicyDecision::new(&entry.choices[idx].id, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lunarshell_game::{ChoiceList, Effect, EntryId, EntryKind};

    fn choices(options: Vec<ChoiceOption>) -> ChoiceList {
        options.into_iter().collect()
    }

    fn encounter() -> LogEntry {
        LogEntry::new(
            EntryId::from("e-1"),
            EntryKind::Encounter,
            "Ambush",
            "",
            0,
            1,
            0,
        )
        .with_choices(choices(vec![
            ChoiceOption::new(
                "fight",
                "Fight",
                "",
                vec![Effect::Moonlight { amount: 25 }, Effect::TriggerCombat],
            ),
            ChoiceOption::new("flee", "Flee", "", vec![Effect::Moonlight { amount: 8 }]),
        ]))
    }

    fn challenge() -> LogEntry {
        LogEntry::new(
            EntryId::from("c-1"),
            EntryKind::Challenge,
            "Frost Storm",
            "",
            0,
            1,
            0,
        )
        .with_choices(choices(vec![
            ChoiceOption::new(
                "push",
                "Push through",
                "",
                vec![Effect::Moonlight { amount: 18 }, Effect::Heal { amount: -4 }],
            ),
            ChoiceOption::new("turn_back", "Turn back", "", vec![Effect::Heal { amount: 5 }]),
        ]))
    }

    #[test]
    fn cautious_avoids_combat() {
        let mut policy = ExplorationStrategy::Cautious.create_policy(1);
        let decision = policy
            .pick_option(&PlayerState::default(), &encounter())
            .unwrap();
        assert_eq!(decision.option_id, "flee");
    }

    #[test]
    fn cautious_heals_when_wounded() {
        let mut policy = ExplorationStrategy::Cautious.create_policy(1);
        let wounded = PlayerState {
            hp: 20,
            ..PlayerState::default()
        };
        let decision = policy.pick_option(&wounded, &challenge()).unwrap();
        assert_eq!(decision.option_id, "turn_back");
    }

    #[test]
    fn greedy_and_fighter_take_the_fight() {
        let player = PlayerState::default();
        for strategy in [ExplorationStrategy::Greedy, ExplorationStrategy::Fighter] {
            let mut policy = strategy.create_policy(1);
            let decision = policy.pick_option(&player, &encounter()).unwrap();
            assert_eq!(decision.option_id, "fight", "{strategy}");
        }
    }

    #[test]
    fn random_is_seeded_and_always_valid() {
        let entry = challenge();
        let player = PlayerState::default();
        let mut first = ExplorationStrategy::Random.create_policy(9);
        let mut second = ExplorationStrategy::Random.create_policy(9);
        for _ in 0..20 {
            let a = first.pick_option(&player, &entry).unwrap();
            let b = second.pick_option(&player, &entry).unwrap();
            assert_eq!(a, b);
            assert!(entry.option(&a.option_id).is_some());
        }
    }

    #[test]
    fn entries_without_choices_yield_no_decision() {
        let plain = LogEntry::new(EntryId::from("p"), EntryKind::Exploration, "", "", 0, 1, 0);
        for strategy in ExplorationStrategy::ALL {
            let mut policy = strategy.create_policy(3);
            assert!(policy.pick_option(&PlayerState::default(), &plain).is_none());
        }
    }

    #[test]
    fn strategy_keys_parse() {
        assert_eq!(
            ExplorationStrategy::from_key(" Fighter "),
            Some(ExplorationStrategy::Fighter)
        );
        assert_eq!(ExplorationStrategy::from_key("berserk"), None);
    }
}
