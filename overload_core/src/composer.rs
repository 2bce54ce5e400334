//! Goal composition: resolve history against the catalog, then progress.
//!
//! Every catalog exercise ends in exactly one of three outcomes:
//! 1. **Resolved with history**: each recorded set climbs the rep ladder
//! 2. **Resolved, no history**: a conservative default is synthesized
//! 3. **Unresolved**: a history record nearly matched but was rejected, so
//!    the exercise is reported for review and gets no goal
//!
//! History names that matched nothing are listed on the plan as well.

use crate::config::{Config, DefaultsConfig};
use crate::equipment::{classify_equipment, classify_role};
use crate::progression::{ProgressionStateMachine, SetProgression};
use crate::resolver::{ExerciseResolver, RejectReason, Rejection, Resolution};
use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static DEFAULT_COMPOSER: Lazy<GoalComposer> =
    Lazy::new(|| GoalComposer::new(&Config::default()));

/// Full pipeline with the default configuration
pub fn resolve_and_progress(
    snapshot: &ClientProgressionSnapshot,
    catalog: &[ExerciseCatalogEntry],
    hints: &SetCountHints,
) -> ProgressionPlan {
    DEFAULT_COMPOSER.compose(snapshot, catalog, hints)
}

/// A history record accepted for a catalog entry
struct Accepted<'a> {
    record: &'a ExercisePerformanceRecord,
    score: f64,
}

/// A history record rejected close enough to need review
struct NearMiss<'a> {
    record: &'a ExercisePerformanceRecord,
    rejection: Rejection,
}

/// Composes per-exercise goals for one client
#[derive(Clone, Debug)]
pub struct GoalComposer {
    resolver: ExerciseResolver,
    machine: ProgressionStateMachine,
    defaults: DefaultsConfig,
    review_floor: f64,
}

impl GoalComposer {
    pub fn new(config: &Config) -> Self {
        Self {
            resolver: ExerciseResolver::new(&config.resolver),
            machine: ProgressionStateMachine::new(&config.quantizer),
            defaults: config.defaults.clone(),
            review_floor: config.resolver.review_floor,
        }
    }

    pub fn resolver(&self) -> &ExerciseResolver {
        &self.resolver
    }

    pub fn machine(&self) -> &ProgressionStateMachine {
        &self.machine
    }

    /// Build the plan for one snapshot against one workout catalog
    ///
    /// Goals follow catalog order. Identical inputs give identical plans.
    pub fn compose(
        &self,
        snapshot: &ClientProgressionSnapshot,
        catalog: &[ExerciseCatalogEntry],
        hints: &SetCountHints,
    ) -> ProgressionPlan {
        let mut accepted: HashMap<&str, Accepted> = HashMap::new();
        let mut near_misses: HashMap<String, NearMiss> = HashMap::new();
        let mut unmatched_history = Vec::new();

        for record in snapshot.exercises.values() {
            match self.resolver.resolve(&record.name, catalog) {
                Resolution::Resolved(m) => {
                    let Some(entry) = catalog.iter().find(|e| e.name == m.name) else {
                        continue;
                    };
                    let replace = match accepted.get(entry.name.as_str()) {
                        None => true,
                        Some(current) => {
                            m.score > current.score
                                || (m.score == current.score && record.date > current.record.date)
                        }
                    };
                    if replace {
                        accepted.insert(
                            entry.name.as_str(),
                            Accepted {
                                record,
                                score: m.score,
                            },
                        );
                    }
                }
                Resolution::Unresolved { best_rejected } => {
                    unmatched_history.push(record.name.clone());
                    let Some(rejection) = best_rejected else {
                        continue;
                    };
                    let reviewable = rejection.reason == RejectReason::ConfusedPair
                        || rejection.score >= self.review_floor;
                    if !reviewable {
                        continue;
                    }
                    let stronger = near_misses
                        .get(&rejection.name)
                        .map_or(true, |current| rejection.score > current.rejection.score);
                    if stronger {
                        near_misses.insert(rejection.name.clone(), NearMiss { record, rejection });
                    }
                }
            }
        }

        let mut goals = Vec::new();
        let mut unresolved = Vec::new();

        for entry in catalog {
            if let Some(found) = accepted.get(entry.name.as_str()) {
                goals.push(self.goal_from_history(entry, found.record, hints));
            } else if let Some(miss) = near_misses.get(&entry.name) {
                tracing::warn!(
                    exercise = %entry.name,
                    candidate = %miss.record.name,
                    score = miss.rejection.score,
                    reason = %miss.rejection.reason,
                    "Exercise needs review"
                );
                unresolved.push(UnresolvedExercise {
                    catalog_name: entry.name.clone(),
                    candidate_history_name: Some(miss.record.name.clone()),
                    best_score: Some(round_score(miss.rejection.score)),
                    reason: miss.rejection.reason.to_string(),
                });
            } else {
                goals.push(self.default_goal(entry, None, hints));
            }
        }

        tracing::info!(
            client = %snapshot.client_id,
            goals = goals.len(),
            unresolved = unresolved.len(),
            unmatched = unmatched_history.len(),
            "Composed progression plan"
        );

        ProgressionPlan {
            client_id: snapshot.client_id.clone(),
            as_of_date: snapshot.as_of_date,
            goals,
            unresolved,
            unmatched_history,
        }
    }

    fn goal_from_history(
        &self,
        entry: &ExerciseCatalogEntry,
        record: &ExercisePerformanceRecord,
        hints: &SetCountHints,
    ) -> ProgressionGoal {
        if record.sets.is_empty() {
            return self.default_goal(entry, Some(record), hints);
        }

        let equipment = classify_equipment(&entry.name);
        let mut sets = Vec::with_capacity(record.sets.len());
        let mut notes = Vec::with_capacity(record.sets.len());

        for (i, set) in record.sets.iter().enumerate() {
            let next = self.machine.advance(equipment, set.weight, set.reps);
            notes.push(describe_set(i + 1, set, &next));
            sets.push(SetGoal {
                weight: next.weight,
                reps: next.reps,
                increased_weight: next.increased_weight,
            });
        }

        ProgressionGoal {
            resolved_name: entry.name.clone(),
            history_name: Some(record.name.clone()),
            outcome: GoalOutcome::ResolvedWithHistory,
            equipment,
            sets,
            rationale: format!("'{}' on {}: {}", record.name, record.date, notes.join("; ")),
        }
    }

    fn default_goal(
        &self,
        entry: &ExerciseCatalogEntry,
        record: Option<&ExercisePerformanceRecord>,
        hints: &SetCountHints,
    ) -> ProgressionGoal {
        let equipment = classify_equipment(&entry.name);
        let role = classify_role(&entry.name);
        let start = self.defaults.starting_weights.for_class(equipment, role);
        let weight = self
            .machine
            .quantizer()
            .snap(equipment, start)
            .unwrap_or_else(|e| {
                tracing::warn!(exercise = %entry.name, "Bad starting weight: {}", e);
                0.0
            });
        let count = hints
            .for_exercise(&entry.name)
            .unwrap_or(self.defaults.set_count);
        let reps = crate::progression::REP_LADDER[0];

        let source = match record {
            Some(r) => format!("'{}' has no recorded sets", r.name),
            None => "no history".to_string(),
        };

        ProgressionGoal {
            resolved_name: entry.name.clone(),
            history_name: record.map(|r| r.name.clone()),
            outcome: GoalOutcome::ResolvedNoHistory,
            equipment,
            sets: (0..count)
                .map(|_| SetGoal {
                    weight,
                    reps,
                    increased_weight: false,
                })
                .collect(),
            rationale: format!(
                "{}: {} {} start {}kg x {} for {} sets",
                source, equipment, role, weight, reps, count
            ),
        }
    }
}

fn describe_set(number: usize, set: &ExerciseSetRecord, next: &SetProgression) -> String {
    let reps = set
        .reps
        .map(|r| r.to_string())
        .unwrap_or_else(|| "?".to_string());
    let mut line = format!(
        "set {} {}kg x {} -> {}kg x {}",
        number, set.weight, reps, next.weight, next.reps
    );
    if next.increased_weight {
        line.push_str(" (weight up)");
    }
    for flag in &next.flags {
        line.push_str(&format!(" [{}]", flag));
    }
    line
}

fn round_score(score: f64) -> f64 {
    (score * 1000.0).round() / 1000.0
}
