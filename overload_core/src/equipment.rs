//! Keyword heuristics for equipment class and movement role.
//!
//! Marker sets are checked in order and the first hit wins. A marker
//! matches at the start of a word; a trailing space in the marker forces a
//! whole-word match ("db " does not match "dbl").

use crate::{EquipmentClass, MovementRole};

/// Ordered marker sets; earlier classes take precedence
const EQUIPMENT_MARKERS: &[(EquipmentClass, &[&str])] = &[
    (
        EquipmentClass::Dumbbell,
        &["dumbbell", "dumbell", "db ", "goblet"],
    ),
    (
        EquipmentClass::Barbell,
        &[
            "barbell",
            "bb ",
            "ez bar",
            "ezbar",
            "ez curl bar",
            "trap bar",
            "hex bar",
            "landmine",
            "deadlift",
            "back squat",
            "front squat",
            "good morning",
            "bench press",
        ],
    ),
    (
        EquipmentClass::Cable,
        &[
            "cable",
            "pulldown",
            "pull down",
            "pushdown",
            "push down",
            "face pull",
            "crossover",
            "cross over",
            "rope ",
            "pallof",
        ],
    ),
    (
        EquipmentClass::Machine,
        &[
            "machine",
            "smith",
            "leg press",
            "hack squat",
            "pec deck",
            "leg extension",
            "leg curl",
            "hamstring curl",
            "chest press",
            "hip abduction",
            "hip adduction",
            "abductor",
            "adductor",
            "selectorized",
            "plate loaded",
            "lever",
            "pendulum",
            "belt squat",
        ],
    ),
    (
        EquipmentClass::Bodyweight,
        &[
            "bodyweight",
            "body weight",
            "push up",
            "pushup",
            "press up",
            "pull up",
            "pullup",
            "chin up",
            "chinup",
            "dip",
            "plank",
            "sit up",
            "situp",
            "crunch",
            "burpee",
            "muscle up",
            "inverted row",
            "hanging leg raise",
        ],
    ),
];

const ISOLATION_MARKERS: &[&str] = &[
    "curl",
    "raise",
    "fly",
    "flye",
    "extension",
    "kickback",
    "shrug",
    "calf",
    "crunch",
    "pushdown",
    "push down",
    "face pull",
    "pec deck",
    "abduction",
    "adduction",
    "abductor",
    "adductor",
    "pullover",
    "wrist",
    "crossover",
    "preacher",
    "skull crusher",
    "skullcrusher",
    "plank",
];

/// Classify a free-text exercise name into an equipment class
///
/// Total: names without any marker are treated as dumbbell work.
pub fn classify_equipment(name: &str) -> EquipmentClass {
    let haystack = marker_haystack(name);
    let class = EQUIPMENT_MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| has_marker(&haystack, m)))
        .map(|(class, _)| *class)
        .unwrap_or(EquipmentClass::Dumbbell);

    tracing::trace!(name, %class, "equipment.classified");
    class
}

/// Classify a free-text exercise name as isolation or compound work
pub fn classify_role(name: &str) -> MovementRole {
    let haystack = marker_haystack(name);
    if ISOLATION_MARKERS.iter().any(|m| has_marker(&haystack, m)) {
        MovementRole::Isolation
    } else {
        MovementRole::Compound
    }
}

/// Lowercase, punctuation to spaces, padded so every word starts after a space
fn marker_haystack(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let mut haystack = String::with_capacity(cleaned.len() + 2);
    haystack.push(' ');
    haystack.push_str(&cleaned.split_whitespace().collect::<Vec<_>>().join(" "));
    haystack.push(' ');
    haystack
}

fn has_marker(haystack: &str, marker: &str) -> bool {
    haystack.contains(&format!(" {}", marker))
}
