//! Journal records emitted by the exploration engine.

use crate::constants::{AUX_BUILDING_TYPE, RESOURCE_MOONLIGHT};
use crate::encounter::EncounterContext;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

/// Resource-name to amount mapping used for rewards and deltas.
pub type RewardMap = BTreeMap<String, i64>;

/// Branches offered by a single entry. Generated entries never carry more than two.
pub type ChoiceList = SmallVec<[ChoiceOption; 2]>;

/// Stable identifier for a log entry: creation time in hex plus a random suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Build an id from the creation timestamp and a random 24-bit suffix.
    pub fn generate<R: Rng + ?Sized>(created_at_ms: u64, rng: &mut R) -> Self {
        let suffix: u32 = rng.gen_range(0..0x0100_0000);
        Self(format!("{created_at_ms:x}-{suffix:06x}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Narrative category of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Exploration,
    Encounter,
    Discovery,
    Reward,
    Challenge,
}

impl EntryKind {
    pub const ALL: [Self; 5] = [
        Self::Exploration,
        Self::Encounter,
        Self::Discovery,
        Self::Reward,
        Self::Challenge,
    ];

    /// Display tier implied by the kind when no override is given.
    #[must_use]
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::Exploration => Severity::Info,
            Self::Encounter => Severity::Encounter,
            Self::Discovery => Severity::Event,
            Self::Reward => Severity::Loot,
            Self::Challenge => Severity::Warning,
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Exploration => "exploration",
            Self::Encounter => "encounter",
            Self::Discovery => "discovery",
            Self::Reward => "reward",
            Self::Challenge => "challenge",
        }
    }
}

/// Display-level tag used by presentation layers to style an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Encounter,
    Warning,
    Loot,
    Combat,
    Event,
    Damage,
}

/// A single consequence of picking a choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Primary currency delta.
    Moonlight { amount: i64 },
    /// Generic resource delta.
    Resource { name: String, amount: i64 },
    /// Instant hp change, clamped to `0..=max_hp`. Negative amounts are injuries.
    Heal { amount: i64 },
    /// Marker: the caller should run combat against the entry's encounter context.
    TriggerCombat,
    /// Marker: the caller may open the named structure.
    TriggerBuilding { building_type: String },
}

impl Effect {
    /// Build a resource delta, routing the currency key to [`Effect::Moonlight`].
    #[must_use]
    pub fn resource(name: &str, amount: i64) -> Self {
        if name == RESOURCE_MOONLIGHT {
            Self::Moonlight { amount }
        } else {
            Self::Resource {
                name: name.to_string(),
                amount,
            }
        }
    }
}

/// A branch a player may pick for an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
    pub description: String,
    #[serde(default)]
    pub consequences: Vec<Effect>,
    /// Informational spend-to-choose cost.
    #[serde(default)]
    pub resource_cost: u32,
}

impl ChoiceOption {
    #[must_use]
    pub fn new(id: &str, label: &str, description: &str, consequences: Vec<Effect>) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            consequences,
            resource_cost: 0,
        }
    }

    #[must_use]
    pub fn requires_combat(&self) -> bool {
        self.consequences
            .iter()
            .any(|effect| matches!(effect, Effect::TriggerCombat))
    }

    #[must_use]
    pub fn building(&self) -> Option<&str> {
        self.consequences.iter().find_map(|effect| match effect {
            Effect::TriggerBuilding { building_type } => Some(building_type.as_str()),
            _ => None,
        })
    }

    /// Net currency granted by this option.
    #[must_use]
    pub fn moonlight(&self) -> i64 {
        self.consequences
            .iter()
            .map(|effect| match effect {
                Effect::Moonlight { amount } => *amount,
                _ => 0,
            })
            .sum()
    }

    /// Net hp change of this option.
    #[must_use]
    pub fn hp_delta(&self) -> i64 {
        self.consequences
            .iter()
            .map(|effect| match effect {
                Effect::Heal { amount } => *amount,
                _ => 0,
            })
            .sum()
    }
}

/// One journal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: EntryId,
    pub kind: EntryKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub created_at: u64,
    pub difficulty_level: u32,
    pub elapsed_seconds: u64,
    #[serde(default)]
    pub rewards: RewardMap,
    #[serde(default)]
    pub choices: ChoiceList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter_context: Option<EncounterContext>,
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_option_id: Option<String>,
    #[serde(default)]
    pub aux_data: BTreeMap<String, serde_json::Value>,
}

impl LogEntry {
    /// Create a resolved entry with no rewards or choices.
    #[must_use]
    pub fn new(
        id: EntryId,
        kind: EntryKind,
        title: impl Into<String>,
        description: impl Into<String>,
        created_at: u64,
        difficulty_level: u32,
        elapsed_seconds: u64,
    ) -> Self {
        Self {
            id,
            kind,
            severity: kind.default_severity(),
            title: title.into(),
            description: description.into(),
            created_at,
            difficulty_level: difficulty_level.max(1),
            elapsed_seconds,
            rewards: RewardMap::new(),
            choices: ChoiceList::new(),
            encounter_context: None,
            resolved: true,
            chosen_option_id: None,
            aux_data: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_rewards(mut self, rewards: RewardMap) -> Self {
        self.rewards = rewards;
        self
    }

    /// Attach choices; an entry is pending exactly when it has choices to act on.
    #[must_use]
    pub fn with_choices(mut self, choices: ChoiceList) -> Self {
        self.resolved = choices.is_empty();
        self.choices = choices;
        self
    }

    #[must_use]
    pub fn with_encounter(mut self, context: EncounterContext) -> Self {
        self.encounter_context = Some(context);
        self
    }

    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_aux(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.aux_data.insert(key.to_string(), value.into());
        self
    }

    /// True while the entry still awaits a player decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.resolved && !self.choices.is_empty()
    }

    #[must_use]
    pub fn option(&self, option_id: &str) -> Option<&ChoiceOption> {
        self.choices.iter().find(|choice| choice.id == option_id)
    }

    #[must_use]
    pub fn building_type(&self) -> Option<&str> {
        self.aux_data
            .get(AUX_BUILDING_TYPE)
            .and_then(serde_json::Value::as_str)
    }

    pub(crate) fn mark_resolved(&mut self, option_id: &str) {
        self.resolved = true;
        self.chosen_option_id = Some(option_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn sample_entry() -> LogEntry {
        LogEntry::new(
            EntryId::from("abc-000001"),
            EntryKind::Discovery,
            "Glittering Crater",
            "Something glints below.",
            1_700_000_000_000,
            2,
            130,
        )
    }

    #[test]
    fn severity_follows_kind_unless_overridden() {
        let entry = sample_entry();
        assert_eq!(entry.severity, Severity::Event);
        let forced = entry.with_severity(Severity::Combat);
        assert_eq!(forced.severity, Severity::Combat);
        assert_eq!(EntryKind::Reward.default_severity(), Severity::Loot);
    }

    #[test]
    fn choices_drive_resolved_flag() {
        let entry = sample_entry();
        assert!(entry.resolved);
        assert!(!entry.is_pending());

        let choices: ChoiceList = smallvec::smallvec![
            ChoiceOption::new("take", "Take", "Pocket it", vec![Effect::resource("moonlight", 5)]),
            ChoiceOption::new("leave", "Leave", "Walk away", Vec::new()),
        ];
        let mut pending = sample_entry().with_choices(choices);
        assert!(!pending.resolved);
        assert!(pending.is_pending());
        assert_eq!(pending.option("take").map(ChoiceOption::moonlight), Some(5));

        pending.mark_resolved("take");
        assert!(pending.resolved);
        assert_eq!(pending.chosen_option_id.as_deref(), Some("take"));
    }

    #[test]
    fn effect_resource_routes_currency() {
        assert_eq!(
            Effect::resource("moonlight", 3),
            Effect::Moonlight { amount: 3 }
        );
        assert_eq!(
            Effect::resource("star_shard", 1),
            Effect::Resource {
                name: "star_shard".to_string(),
                amount: 1
            }
        );
    }

    #[test]
    fn entry_ids_embed_timestamp() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let id = EntryId::generate(0xABCD, &mut rng);
        let (stamp, suffix) = id.as_str().split_once('-').expect("separator");
        assert_eq!(stamp, "abcd");
        assert_eq!(suffix.len(), 6);
    }

    #[test]
    fn option_markers_are_detected() {
        let fight = ChoiceOption::new(
            "fight",
            "Fight",
            "Draw your blade",
            vec![Effect::Moonlight { amount: 25 }, Effect::TriggerCombat],
        );
        assert!(fight.requires_combat());
        assert_eq!(fight.building(), None);

        let enter = ChoiceOption::new(
            "enter",
            "Enter",
            "Step inside",
            vec![Effect::TriggerBuilding {
                building_type: "crater_vault".to_string(),
            }],
        );
        assert_eq!(enter.building(), Some("crater_vault"));
        assert!(!enter.requires_combat());
    }
}
