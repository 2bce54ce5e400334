//! Core domain types for the progressive overload planner.
//!
//! This module defines the fundamental types used throughout the system:
//! - Equipment classes and quantization profiles
//! - Performance history (set records, exercise records, client snapshots)
//! - Workout catalog entries and set-count hints
//! - Planning output (per-set goals, per-exercise goals, the client plan)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Equipment Types
// ============================================================================

/// Equipment class an exercise is loaded with
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentClass {
    Dumbbell,
    Barbell,
    Cable,
    Machine,
    Bodyweight,
}

impl EquipmentClass {
    pub const ALL: [EquipmentClass; 5] = [
        EquipmentClass::Dumbbell,
        EquipmentClass::Barbell,
        EquipmentClass::Cable,
        EquipmentClass::Machine,
        EquipmentClass::Bodyweight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentClass::Dumbbell => "dumbbell",
            EquipmentClass::Barbell => "barbell",
            EquipmentClass::Cable => "cable",
            EquipmentClass::Machine => "machine",
            EquipmentClass::Bodyweight => "bodyweight",
        }
    }
}

impl fmt::Display for EquipmentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipmentClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dumbbell" | "db" => Ok(EquipmentClass::Dumbbell),
            "barbell" | "bb" => Ok(EquipmentClass::Barbell),
            "cable" => Ok(EquipmentClass::Cable),
            "machine" => Ok(EquipmentClass::Machine),
            "bodyweight" | "bw" => Ok(EquipmentClass::Bodyweight),
            other => Err(format!("Unknown equipment class: {}", other)),
        }
    }
}

/// Whether a movement trains one joint or several
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MovementRole {
    Isolation,
    Compound,
}

impl fmt::Display for MovementRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementRole::Isolation => f.write_str("isolation"),
            MovementRole::Compound => f.write_str("compound"),
        }
    }
}

/// How weights are made settable for one equipment class
#[derive(Clone, Debug, PartialEq)]
pub enum QuantizationRule {
    /// Discrete rack of values; past the top, add `top_step`
    Sequence { values: Vec<f64>, top_step: f64 },
    /// Multiples of `step`, widening to `heavy_step` at `heavy_threshold`
    Tiered {
        step: f64,
        heavy_threshold: Option<f64>,
        heavy_step: f64,
    },
}

/// Equipment class together with its quantization rule
#[derive(Clone, Debug, PartialEq)]
pub struct EquipmentProfile {
    pub class: EquipmentClass,
    pub rule: QuantizationRule,
}

// ============================================================================
// Performance History Types
// ============================================================================

/// One performed set
///
/// Fields are read leniently: numbers and numeric strings are accepted.
/// An unreadable weight is stored as NaN and unreadable reps as `None`;
/// the progression step substitutes safe values and flags them.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSetRecord {
    #[serde(default, deserialize_with = "lenient::weight")]
    pub weight: f64,
    #[serde(default, deserialize_with = "lenient::reps")]
    pub reps: Option<u32>,
}

impl ExerciseSetRecord {
    pub fn new(weight: f64, reps: u32) -> Self {
        Self {
            weight,
            reps: Some(reps),
        }
    }
}

/// Most recent performance of one exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExercisePerformanceRecord {
    pub name: String,
    pub date: NaiveDate,
    pub sets: Vec<ExerciseSetRecord>,
}

/// A client's latest recorded performance across exercises
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClientProgressionSnapshot {
    pub client_id: String,
    pub as_of_date: NaiveDate,
    #[serde(default)]
    pub exercises: BTreeMap<String, ExercisePerformanceRecord>,
}

impl ClientProgressionSnapshot {
    pub fn new(client_id: impl Into<String>, as_of_date: NaiveDate) -> Self {
        Self {
            client_id: client_id.into(),
            as_of_date,
            exercises: BTreeMap::new(),
        }
    }

    /// Add a record keyed by its name, replacing any previous one
    pub fn with_record(mut self, record: ExercisePerformanceRecord) -> Self {
        self.exercises.insert(record.name.clone(), record);
        self
    }
}

// ============================================================================
// Catalog Types
// ============================================================================

/// An exercise name currently assigned in the target workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ExerciseCatalogEntry {
    pub name: String,
}

impl ExerciseCatalogEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Alternative spellings listed in the entry, split on '/'
    pub fn alternatives(&self) -> impl Iterator<Item = &str> {
        split_alternatives(&self.name)
    }
}

impl AsRef<str> for ExerciseCatalogEntry {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl From<&str> for ExerciseCatalogEntry {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Split a catalog name like "Wide Grip Chin Up/Assisted Chin Up"
pub fn split_alternatives(name: &str) -> impl Iterator<Item = &str> {
    name.split('/').map(str::trim).filter(|s| !s.is_empty())
}

/// Caller-supplied set counts detected in the target workout
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SetCountHints {
    pub default: Option<u32>,
    #[serde(default)]
    pub per_exercise: BTreeMap<String, u32>,
}

impl SetCountHints {
    /// Same count for every exercise
    pub fn uniform(count: u32) -> Self {
        Self {
            default: Some(count),
            per_exercise: BTreeMap::new(),
        }
    }

    pub fn with_exercise(mut self, name: impl Into<String>, count: u32) -> Self {
        self.per_exercise.insert(name.into(), count);
        self
    }

    /// Hint for a catalog name; per-exercise entries win over the default
    pub fn for_exercise(&self, name: &str) -> Option<u32> {
        self.per_exercise
            .get(name)
            .copied()
            .filter(|n| *n > 0)
            .or(self.default.filter(|n| *n > 0))
    }
}

// ============================================================================
// Planning Output Types
// ============================================================================

/// Target for one set
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetGoal {
    pub weight: f64,
    pub reps: u32,
    pub increased_weight: bool,
}

/// How a catalog exercise was matched against history
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalOutcome {
    ResolvedWithHistory,
    ResolvedNoHistory,
    Unresolved,
}

impl GoalOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalOutcome::ResolvedWithHistory => "RESOLVED_WITH_HISTORY",
            GoalOutcome::ResolvedNoHistory => "RESOLVED_NO_HISTORY",
            GoalOutcome::Unresolved => "UNRESOLVED",
        }
    }
}

impl fmt::Display for GoalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Next-period targets for one catalog exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressionGoal {
    pub resolved_name: String,
    pub history_name: Option<String>,
    pub outcome: GoalOutcome,
    pub equipment: EquipmentClass,
    pub sets: Vec<SetGoal>,
    pub rationale: String,
}

/// A catalog exercise that could not be matched safely
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UnresolvedExercise {
    pub catalog_name: String,
    pub candidate_history_name: Option<String>,
    pub best_score: Option<f64>,
    pub reason: String,
}

/// Everything one composition produces for a client
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressionPlan {
    pub client_id: String,
    pub as_of_date: NaiveDate,
    pub goals: Vec<ProgressionGoal>,
    pub unresolved: Vec<UnresolvedExercise>,
    /// History names that matched nothing in the catalog
    pub unmatched_history: Vec<String>,
}

impl ProgressionPlan {
    pub fn goal(&self, name: &str) -> Option<&ProgressionGoal> {
        self.goals.iter().find(|g| g.resolved_name == name)
    }

    pub fn needs_review(&self) -> bool {
        !self.unresolved.is_empty()
    }
}

// ============================================================================
// Lenient numeric parsing
// ============================================================================

/// Parse the leading number of a scraped field
///
/// Accepts "60", "62.5kg", "12,5", "8 reps" and the lower bound of "8-10".
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim().replace(',', ".");
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '-' | '+' if i == 0 => {}
            '0'..='9' => {}
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Reps from a parsed number; negative or non-finite values are unreadable
pub fn reps_from_number(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 0.0 {
        Some(value.round() as u32)
    } else {
        None
    }
}

mod lenient {
    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        Number(f64),
        Text(String),
        Other(IgnoredAny),
    }

    impl Field {
        fn as_f64(&self) -> Option<f64> {
            match self {
                Field::Number(v) => Some(*v),
                Field::Text(s) => super::parse_number(s),
                Field::Other(_) => None,
            }
        }
    }

    pub fn weight<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let field = Option::<Field>::deserialize(d)?;
        Ok(field.and_then(|f| f.as_f64()).unwrap_or(f64::NAN))
    }

    pub fn reps<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let field = Option::<Field>::deserialize(d)?;
        Ok(field.and_then(|f| f.as_f64()).and_then(super::reps_from_number))
    }
}
