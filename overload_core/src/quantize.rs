//! Weight quantization per equipment class.
//!
//! Dumbbells come from a fixed rack; everything else moves in fixed
//! steps that widen once the load passes a per-class threshold.
//! Bodyweight work is loaded like a barbell (belts, vests, plates) and
//! zero is its unloaded baseline.

use crate::config::QuantizerConfig;
use crate::{EquipmentClass, EquipmentProfile, Error, QuantizationRule, Result};
use once_cell::sync::Lazy;

/// Canonical dumbbell rack: 1 kg steps to 10, 2.5 kg steps to 40, 5 kg steps to 80
pub const DUMBBELL_SEQUENCE: [f64; 30] = [
    1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, //
    12.5, 15.0, 17.5, 20.0, 22.5, 25.0, 27.5, 30.0, 32.5, 35.0, 37.5, 40.0, //
    45.0, 50.0, 55.0, 60.0, 65.0, 70.0, 75.0, 80.0,
];

const EPSILON: f64 = 1e-9;

static DEFAULT_QUANTIZER: Lazy<WeightQuantizer> =
    Lazy::new(|| WeightQuantizer::new(&QuantizerConfig::default()));

/// Next settable weight using the default quantizer configuration
///
/// Without `increase` the weight is returned unchanged.
pub fn quantize_weight(class: EquipmentClass, weight: f64, increase: bool) -> Result<f64> {
    DEFAULT_QUANTIZER.quantize(class, weight, increase)
}

/// Nearest settable weight using the default quantizer configuration
pub fn snap_weight(class: EquipmentClass, weight: f64) -> Result<f64> {
    DEFAULT_QUANTIZER.snap(class, weight)
}

/// Quantizer holding one rule per equipment class
#[derive(Clone, Debug)]
pub struct WeightQuantizer {
    dumbbell: QuantizationRule,
    barbell: QuantizationRule,
    cable: QuantizationRule,
    machine: QuantizationRule,
}

impl WeightQuantizer {
    pub fn new(config: &QuantizerConfig) -> Self {
        Self {
            dumbbell: QuantizationRule::Sequence {
                values: DUMBBELL_SEQUENCE.to_vec(),
                top_step: config.dumbbell_top_step,
            },
            barbell: QuantizationRule::Tiered {
                step: config.barbell_step,
                heavy_threshold: Some(config.barbell_heavy_threshold),
                heavy_step: config.barbell_heavy_step,
            },
            cable: QuantizationRule::Tiered {
                step: config.cable_step,
                heavy_threshold: Some(config.cable_heavy_threshold),
                heavy_step: config.cable_heavy_step,
            },
            machine: QuantizationRule::Tiered {
                step: config.machine_step,
                heavy_threshold: None,
                heavy_step: config.machine_step,
            },
        }
    }

    /// Profile for a class; bodyweight shares the barbell rule
    pub fn profile(&self, class: EquipmentClass) -> EquipmentProfile {
        let rule = match class {
            EquipmentClass::Dumbbell => &self.dumbbell,
            EquipmentClass::Barbell | EquipmentClass::Bodyweight => &self.barbell,
            EquipmentClass::Cable => &self.cable,
            EquipmentClass::Machine => &self.machine,
        };
        EquipmentProfile {
            class,
            rule: rule.clone(),
        }
    }

    /// Next weight for a class: identity unless `increase` is set
    pub fn quantize(&self, class: EquipmentClass, weight: f64, increase: bool) -> Result<f64> {
        check_weight(weight)?;
        if !increase {
            return Ok(weight);
        }
        let next = self.profile(class).rule.next_above(weight);
        tracing::debug!(%class, weight, next, "quantize.increase");
        Ok(next)
    }

    /// Round a weight to the nearest value settable for the class
    pub fn snap(&self, class: EquipmentClass, weight: f64) -> Result<f64> {
        check_weight(weight)?;
        Ok(self.profile(class).rule.snap(weight))
    }
}

impl QuantizationRule {
    /// Smallest settable value strictly greater than `weight`
    pub fn next_above(&self, weight: f64) -> f64 {
        match self {
            QuantizationRule::Sequence { values, top_step } => values
                .iter()
                .copied()
                .find(|v| *v > weight + EPSILON)
                .unwrap_or_else(|| round_weight(weight + top_step)),
            QuantizationRule::Tiered { .. } => {
                let step = self.step_for(weight);
                let multiples = ((weight / step) + EPSILON).floor() + 1.0;
                round_weight(multiples * step)
            }
        }
    }

    /// Nearest settable value; ties go to the lighter weight
    pub fn snap(&self, weight: f64) -> f64 {
        match self {
            QuantizationRule::Sequence { values, top_step } => {
                let top = values.last().copied().unwrap_or(0.0);
                if weight > top {
                    let steps = ((weight - top) / top_step).round();
                    return round_weight(top + steps * top_step);
                }
                values
                    .iter()
                    .copied()
                    .fold(None, |best: Option<f64>, v| match best {
                        Some(b) if (b - weight).abs() <= (v - weight).abs() + EPSILON => Some(b),
                        _ => Some(v),
                    })
                    .unwrap_or(weight)
            }
            QuantizationRule::Tiered { .. } => {
                let step = self.step_for(weight);
                round_weight((weight / step).round() * step)
            }
        }
    }

    fn step_for(&self, weight: f64) -> f64 {
        match self {
            QuantizationRule::Tiered {
                step,
                heavy_threshold: Some(threshold),
                heavy_step,
            } if weight + EPSILON >= *threshold => *heavy_step,
            QuantizationRule::Tiered { step, .. } => *step,
            QuantizationRule::Sequence { top_step, .. } => *top_step,
        }
    }
}

fn check_weight(weight: f64) -> Result<()> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidWeight(weight))
    }
}

/// Trim float noise from step arithmetic
fn round_weight(weight: f64) -> f64 {
    (weight * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_multiple_of(value: f64, step: f64) -> bool {
        let k = value / step;
        (k - k.round()).abs() < 1e-6
    }

    #[test]
    fn test_no_increase_is_identity() {
        for class in EquipmentClass::ALL {
            assert_eq!(quantize_weight(class, 61.3, false).unwrap(), 61.3);
            assert_eq!(quantize_weight(class, 0.0, false).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_dumbbell_follows_rack() {
        assert_eq!(quantize_weight(EquipmentClass::Dumbbell, 10.0, true).unwrap(), 12.5);
        assert_eq!(quantize_weight(EquipmentClass::Dumbbell, 4.0, true).unwrap(), 5.0);
        assert_eq!(quantize_weight(EquipmentClass::Dumbbell, 11.0, true).unwrap(), 12.5);
        assert_eq!(quantize_weight(EquipmentClass::Dumbbell, 40.0, true).unwrap(), 45.0);
        assert_eq!(quantize_weight(EquipmentClass::Dumbbell, 0.0, true).unwrap(), 1.0);
    }

    #[test]
    fn test_dumbbell_closure() {
        let mut w = 0.0;
        while w < 120.0 {
            let next = quantize_weight(EquipmentClass::Dumbbell, w, true).unwrap();
            assert!(next > w);
            if w < 80.0 {
                assert!(
                    DUMBBELL_SEQUENCE.contains(&next),
                    "{} -> {} is off the rack",
                    w,
                    next
                );
            } else {
                assert!((next - (w + 5.0)).abs() < 1e-6, "{} -> {}", w, next);
            }
            w += 0.75;
        }
    }

    #[test]
    fn test_barbell_step_and_heavy_tier() {
        assert_eq!(quantize_weight(EquipmentClass::Barbell, 60.0, true).unwrap(), 62.5);
        assert_eq!(quantize_weight(EquipmentClass::Barbell, 97.5, true).unwrap(), 100.0);
        assert_eq!(quantize_weight(EquipmentClass::Barbell, 100.0, true).unwrap(), 105.0);
        assert_eq!(quantize_weight(EquipmentClass::Barbell, 61.0, true).unwrap(), 62.5);
    }

    #[test]
    fn test_barbell_always_multiple_and_greater() {
        let mut w = 0.0;
        while w < 250.0 {
            let next = quantize_weight(EquipmentClass::Barbell, w, true).unwrap();
            assert!(next > w, "{} -> {} did not increase", w, next);
            assert!(is_multiple_of(next, 2.5), "{} -> {} off the 2.5 grid", w, next);
            w += 1.3;
        }
    }

    #[test]
    fn test_cable_threshold() {
        assert_eq!(quantize_weight(EquipmentClass::Cable, 20.0, true).unwrap(), 22.5);
        assert_eq!(quantize_weight(EquipmentClass::Cable, 47.5, true).unwrap(), 50.0);
        assert_eq!(quantize_weight(EquipmentClass::Cable, 50.0, true).unwrap(), 55.0);
    }

    #[test]
    fn test_machine_and_bodyweight() {
        assert_eq!(quantize_weight(EquipmentClass::Machine, 40.0, true).unwrap(), 45.0);
        assert_eq!(quantize_weight(EquipmentClass::Bodyweight, 0.0, true).unwrap(), 2.5);
        assert_eq!(quantize_weight(EquipmentClass::Bodyweight, 10.0, true).unwrap(), 12.5);
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        assert!(matches!(
            quantize_weight(EquipmentClass::Barbell, -2.5, true),
            Err(Error::InvalidWeight(_))
        ));
        assert!(quantize_weight(EquipmentClass::Dumbbell, f64::NAN, false).is_err());
        assert!(snap_weight(EquipmentClass::Cable, f64::INFINITY).is_err());
    }

    #[test]
    fn test_snap_to_settable() {
        assert_eq!(snap_weight(EquipmentClass::Dumbbell, 11.0).unwrap(), 10.0);
        assert_eq!(snap_weight(EquipmentClass::Dumbbell, 11.25).unwrap(), 10.0);
        assert_eq!(snap_weight(EquipmentClass::Dumbbell, 11.5).unwrap(), 12.5);
        assert_eq!(snap_weight(EquipmentClass::Dumbbell, 93.0).unwrap(), 95.0);
        assert_eq!(snap_weight(EquipmentClass::Barbell, 61.0).unwrap(), 60.0);
        assert_eq!(snap_weight(EquipmentClass::Machine, 43.0).unwrap(), 45.0);
        assert_eq!(snap_weight(EquipmentClass::Bodyweight, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_profile_for_bodyweight_matches_barbell() {
        let q = WeightQuantizer::new(&QuantizerConfig::default());
        assert_eq!(
            q.profile(EquipmentClass::Bodyweight).rule,
            q.profile(EquipmentClass::Barbell).rule
        );
        assert!(matches!(
            q.profile(EquipmentClass::Dumbbell).rule,
            QuantizationRule::Sequence { .. }
        ));
    }
}
