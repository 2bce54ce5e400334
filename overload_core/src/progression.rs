//! Per-set rep ladder progression.
//!
//! Every tracked set climbs the ladder 6 → 8 → 10 → 12 → 15 on its own.
//! Completing the top tier resets reps to 6 and ratchets the weight one
//! settable step for the exercise's equipment class:
//! - Below 12 reps: advance to the tier after the smallest tier ≥ reps
//! - 12 up to 14 reps: target 15, weight unchanged
//! - 15 or more: back to 6, weight increased

use crate::config::QuantizerConfig;
use crate::equipment::classify_equipment;
use crate::quantize::WeightQuantizer;
use crate::EquipmentClass;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;

/// Rep targets in climbing order
pub const REP_LADDER: [u32; 5] = [6, 8, 10, 12, 15];

static DEFAULT_MACHINE: Lazy<ProgressionStateMachine> =
    Lazy::new(|| ProgressionStateMachine::new(&QuantizerConfig::default()));

/// Progress one set of a named exercise with the default quantizer
///
/// `reps` is `None` when the recorded value could not be read.
pub fn progress_set(exercise: &str, weight: f64, reps: Option<u32>) -> SetProgression {
    DEFAULT_MACHINE.progress_set(exercise, weight, reps)
}

/// Next rep target and whether the weight ratchets
pub fn next_reps(reps: u32) -> (u32, bool) {
    let top = REP_LADDER[REP_LADDER.len() - 1];
    if reps >= top {
        return (REP_LADDER[0], true);
    }
    let next = REP_LADDER
        .iter()
        .position(|tier| *tier >= reps)
        .and_then(|i| REP_LADDER.get(i + 1))
        .copied()
        .unwrap_or(top);
    (next, false)
}

/// Input problems replaced with safe values
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetFlag {
    /// Reps missing or unreadable; treated as the bottom tier
    UnreadableReps,
    /// Weight negative or unreadable; treated as zero
    InvalidWeight,
}

impl fmt::Display for SetFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetFlag::UnreadableReps => f.write_str("unreadable reps"),
            SetFlag::InvalidWeight => f.write_str("invalid weight"),
        }
    }
}

/// Result of progressing a single set
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SetProgression {
    pub weight: f64,
    pub reps: u32,
    pub increased_weight: bool,
    pub flags: Vec<SetFlag>,
}

/// Rep ladder bound to a weight quantizer
#[derive(Clone, Debug)]
pub struct ProgressionStateMachine {
    quantizer: WeightQuantizer,
}

impl ProgressionStateMachine {
    pub fn new(config: &QuantizerConfig) -> Self {
        Self {
            quantizer: WeightQuantizer::new(config),
        }
    }

    pub fn quantizer(&self) -> &WeightQuantizer {
        &self.quantizer
    }

    /// Progress a set, classifying the exercise name for the weight step
    pub fn progress_set(&self, exercise: &str, weight: f64, reps: Option<u32>) -> SetProgression {
        self.advance(classify_equipment(exercise), weight, reps)
    }

    /// Progress a set for a known equipment class
    pub fn advance(&self, class: EquipmentClass, weight: f64, reps: Option<u32>) -> SetProgression {
        let mut flags = Vec::new();

        let weight = if weight.is_finite() && weight >= 0.0 {
            weight
        } else {
            flags.push(SetFlag::InvalidWeight);
            0.0
        };

        let Some(reps) = reps else {
            flags.push(SetFlag::UnreadableReps);
            tracing::debug!(%class, weight, "progression.unreadable_reps");
            return SetProgression {
                weight,
                reps: REP_LADDER[0],
                increased_weight: false,
                flags,
            };
        };

        let (next, increased_weight) = next_reps(reps);
        let next_weight = if increased_weight {
            self.quantizer.profile(class).rule.next_above(weight)
        } else {
            weight
        };

        tracing::debug!(
            %class,
            weight,
            reps,
            next_weight,
            next_reps = next,
            increased_weight,
            "progression.set"
        );

        SetProgression {
            weight: next_weight,
            reps: next,
            increased_weight,
            flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_steps() {
        assert_eq!(next_reps(6), (8, false));
        assert_eq!(next_reps(8), (10, false));
        assert_eq!(next_reps(10), (12, false));
        assert_eq!(next_reps(12), (15, false));
        assert_eq!(next_reps(15), (6, true));
    }

    #[test]
    fn test_off_ladder_reps() {
        assert_eq!(next_reps(0), (8, false));
        assert_eq!(next_reps(5), (8, false));
        assert_eq!(next_reps(7), (10, false));
        assert_eq!(next_reps(13), (15, false));
        assert_eq!(next_reps(14), (15, false));
        assert_eq!(next_reps(20), (6, true));
    }

    #[test]
    fn test_ladder_cyclicity() {
        for tier in REP_LADDER {
            let mut reps = tier;
            for _ in 0..5 {
                reps = next_reps(reps).0;
            }
            assert_eq!(reps, tier, "tier {} did not cycle", tier);
        }

        for start in 0..30 {
            let mut reps = start;
            let mut seen_bottom = false;
            for _ in 0..5 {
                reps = next_reps(reps).0;
                assert!(REP_LADDER.contains(&reps));
                seen_bottom |= reps == 6;
            }
            assert!(seen_bottom, "start {} never reached 6", start);
        }
    }

    #[test]
    fn test_monotonic_below_top() {
        for r in 0..15 {
            let (next, increased) = next_reps(r);
            assert!(next > r);
            assert!(!increased);
        }
        for r in 15..40 {
            assert_eq!(next_reps(r), (6, true));
        }
    }

    #[test]
    fn test_barbell_ratchet() {
        let p = progress_set("Barbell Bench Press", 60.0, Some(15));
        assert_eq!(p.weight, 62.5);
        assert_eq!(p.reps, 6);
        assert!(p.increased_weight);
        assert!(p.flags.is_empty());

        let p = progress_set("Barbell Bench Press", 60.0, Some(8));
        assert_eq!((p.weight, p.reps, p.increased_weight), (60.0, 10, false));
    }

    #[test]
    fn test_dumbbell_ratchet_uses_rack() {
        let p = progress_set("Dumbbell Curl", 10.0, Some(15));
        assert_eq!(p.weight, 12.5);
        assert_eq!(p.reps, 6);
    }

    #[test]
    fn test_unreadable_reps_hold_weight() {
        let p = progress_set("Cable Fly", 20.0, None);
        assert_eq!(p.weight, 20.0);
        assert_eq!(p.reps, 6);
        assert!(!p.increased_weight);
        assert_eq!(p.flags, vec![SetFlag::UnreadableReps]);
    }

    #[test]
    fn test_invalid_weight_becomes_zero() {
        let p = progress_set("Barbell Row", f64::NAN, Some(10));
        assert_eq!(p.weight, 0.0);
        assert_eq!(p.reps, 12);
        assert_eq!(p.flags, vec![SetFlag::InvalidWeight]);

        let p = progress_set("Barbell Row", -20.0, Some(15));
        assert_eq!(p.weight, 2.5);
        assert!(p.increased_weight);
    }

    #[test]
    fn test_zero_baseline_is_valid() {
        let p = progress_set("Push-Up", 0.0, Some(12));
        assert_eq!(p.weight, 0.0);
        assert_eq!(p.reps, 15);
        assert!(p.flags.is_empty());
    }
}
