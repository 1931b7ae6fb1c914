//! Flavor text pools for generated entries.

use crate::entry::EntryKind;

/// Title and description pair.
pub type Template = (&'static str, &'static str);

const EXPLORATION: [Template; 6] = [
    (
        "Silent Maria",
        "You cross a basalt plain where nothing has moved in a thousand years.",
    ),
    (
        "Crater Rim",
        "The rim of an old impact crater offers a view of the pale horizon.",
    ),
    (
        "Dust Veil",
        "Fine regolith drifts across your path, muffling every footstep.",
    ),
    (
        "Earthshine",
        "A blue glow from the distant homeworld lights a narrow ravine.",
    ),
    (
        "Broken Relay",
        "A toppled signal mast hums faintly as you pass beneath it.",
    ),
    (
        "Frozen Tracks",
        "Someone walked this way long ago; their prints are still sharp.",
    ),
];

const DISCOVERY: [Template; 5] = [
    (
        "Glittering Seam",
        "A vein of crystallized moonlight runs through the crater wall.",
    ),
    (
        "Buried Cache",
        "Half-buried beneath the dust lies a sealed supply canister.",
    ),
    (
        "Ancient Glyphs",
        "Etched symbols on a monolith pulse when you touch them.",
    ),
    (
        "Shell Fragment",
        "A shard of the old lunar shell gleams among the rocks.",
    ),
    (
        "Hollow Geode",
        "A cracked geode spills pale light across the ground.",
    ),
];

const ENCOUNTER: [Template; 5] = [
    (
        "Shadows Stir",
        "Something shifts in the dark between the boulders ahead.",
    ),
    (
        "Hunting Cry",
        "A thin howl echoes off the crater walls. You are being tracked.",
    ),
    (
        "Ambush",
        "Figures rise from the dust, their eyes catching the starlight.",
    ),
    (
        "Lurker",
        "A shape clings to the underside of an overhang, waiting.",
    ),
    (
        "Wisp Swarm",
        "Cold lights drift toward you from a fissure in the ground.",
    ),
];

const REWARD: [Template; 4] = [
    (
        "Moonlight Pool",
        "A shallow basin brims with liquid moonlight.",
    ),
    (
        "Forgotten Satchel",
        "A traveler's satchel lies open, its contents untouched.",
    ),
    (
        "Starfall",
        "A meteorite has just landed nearby, still warm and glowing.",
    ),
    (
        "Shrine Offering",
        "A small shrine holds an offering left for whoever comes next.",
    ),
];

const CHALLENGE: [Template; 5] = [
    (
        "Collapsing Ledge",
        "The path narrows to a crumbling ledge above a deep chasm.",
    ),
    (
        "Solar Flare",
        "The horizon flashes white; radiation will sweep the plain soon.",
    ),
    (
        "Gravity Well",
        "Loose stones float around a distortion blocking the route.",
    ),
    (
        "Frost Storm",
        "A storm of ice crystals rolls in from the dark side.",
    ),
    (
        "Sealed Gate",
        "An ancient gate bars the way, its mechanism half-jammed.",
    ),
];

/// Structures a discovery may reveal.
pub const BUILDING_TYPES: [&str; 4] = [
    "ruined_observatory",
    "crater_vault",
    "silver_spire",
    "abandoned_habitat",
];

/// Template pool for an entry kind.
#[must_use]
pub const fn pool(kind: EntryKind) -> &'static [Template] {
    match kind {
        EntryKind::Exploration => &EXPLORATION,
        EntryKind::Discovery => &DISCOVERY,
        EntryKind::Encounter => &ENCOUNTER,
        EntryKind::Reward => &REWARD,
        EntryKind::Challenge => &CHALLENGE,
    }
}

/// Human-readable title for a structure key.
#[must_use]
pub fn building_title(building_type: &str) -> String {
    building_type
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
