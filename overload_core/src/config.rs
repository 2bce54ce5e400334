//! Configuration file support for Overload.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/overload/config.toml`.
//! Every section is optional; missing keys fall back to the built-in
//! defaults.

use crate::{EquipmentClass, Error, MovementRole, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub quantizer: QuantizerConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Two families of name fragments that look alike but are different lifts
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConfusedPair {
    pub left: Vec<String>,
    pub right: Vec<String>,
}

impl ConfusedPair {
    pub fn new(left: &[&str], right: &[&str]) -> Self {
        Self {
            left: left.iter().map(|s| s.to_string()).collect(),
            right: right.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Exercise name matching configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Minimum score to accept a fuzzy match
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Minimum score when the requested name belongs to a confused pair
    #[serde(default = "default_strict_threshold")]
    pub strict_threshold: f64,

    /// Rejected matches scoring at least this are flagged for review
    #[serde(default = "default_review_floor")]
    pub review_floor: f64,

    /// Gym equipment brands stripped before comparison
    #[serde(default = "default_brand_tokens")]
    pub brand_tokens: Vec<String>,

    /// Replaces the built-in list when present
    #[serde(default = "default_confused_pairs")]
    pub confused_pairs: Vec<ConfusedPair>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            strict_threshold: default_strict_threshold(),
            review_floor: default_review_floor(),
            brand_tokens: default_brand_tokens(),
            confused_pairs: default_confused_pairs(),
        }
    }
}

/// Weight increments per equipment class
///
/// Barbell (and bodyweight) loads step by `barbell_step` below
/// `barbell_heavy_threshold` and by `barbell_heavy_step` from there on.
/// Cable stacks follow the same two-tier policy with their own constants.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuantizerConfig {
    #[serde(default = "default_dumbbell_top_step")]
    pub dumbbell_top_step: f64,

    #[serde(default = "default_barbell_step")]
    pub barbell_step: f64,

    #[serde(default = "default_barbell_heavy_threshold")]
    pub barbell_heavy_threshold: f64,

    #[serde(default = "default_barbell_heavy_step")]
    pub barbell_heavy_step: f64,

    #[serde(default = "default_cable_step")]
    pub cable_step: f64,

    #[serde(default = "default_cable_heavy_threshold")]
    pub cable_heavy_threshold: f64,

    #[serde(default = "default_cable_heavy_step")]
    pub cable_heavy_step: f64,

    #[serde(default = "default_machine_step")]
    pub machine_step: f64,
}

impl Default for QuantizerConfig {
    fn default() -> Self {
        Self {
            dumbbell_top_step: default_dumbbell_top_step(),
            barbell_step: default_barbell_step(),
            barbell_heavy_threshold: default_barbell_heavy_threshold(),
            barbell_heavy_step: default_barbell_heavy_step(),
            cable_step: default_cable_step(),
            cable_heavy_threshold: default_cable_heavy_threshold(),
            cable_heavy_step: default_cable_heavy_step(),
            machine_step: default_machine_step(),
        }
    }
}

/// Starting weight for one class, by movement role
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct StartingWeight {
    pub isolation: f64,
    pub compound: f64,
}

impl StartingWeight {
    const fn new(isolation: f64, compound: f64) -> Self {
        Self {
            isolation,
            compound,
        }
    }

    pub fn for_role(&self, role: MovementRole) -> f64 {
        match role {
            MovementRole::Isolation => self.isolation,
            MovementRole::Compound => self.compound,
        }
    }
}

/// Conservative starting weights for exercises with no history
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StartingWeights {
    #[serde(default = "default_dumbbell_start")]
    pub dumbbell: StartingWeight,

    #[serde(default = "default_barbell_start")]
    pub barbell: StartingWeight,

    #[serde(default = "default_cable_start")]
    pub cable: StartingWeight,

    #[serde(default = "default_machine_start")]
    pub machine: StartingWeight,
}

impl Default for StartingWeights {
    fn default() -> Self {
        Self {
            dumbbell: default_dumbbell_start(),
            barbell: default_barbell_start(),
            cable: default_cable_start(),
            machine: default_machine_start(),
        }
    }
}

impl StartingWeights {
    /// Bodyweight work always starts unloaded
    pub fn for_class(&self, class: EquipmentClass, role: MovementRole) -> f64 {
        match class {
            EquipmentClass::Dumbbell => self.dumbbell.for_role(role),
            EquipmentClass::Barbell => self.barbell.for_role(role),
            EquipmentClass::Cable => self.cable.for_role(role),
            EquipmentClass::Machine => self.machine.for_role(role),
            EquipmentClass::Bodyweight => 0.0,
        }
    }

    fn entries(&self) -> [(&'static str, StartingWeight); 4] {
        [
            ("dumbbell", self.dumbbell),
            ("barbell", self.barbell),
            ("cable", self.cable),
            ("machine", self.machine),
        ]
    }
}

/// Default synthesis for exercises without history
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Sets used when the caller detected none
    #[serde(default = "default_set_count")]
    pub set_count: u32,

    #[serde(default)]
    pub starting_weights: StartingWeights,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            set_count: default_set_count(),
            starting_weights: StartingWeights::default(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("overload")
}

fn default_threshold() -> f64 {
    0.7
}

fn default_strict_threshold() -> f64 {
    0.9
}

fn default_review_floor() -> f64 {
    0.5
}

fn default_brand_tokens() -> Vec<String> {
    [
        "hammer strength",
        "life fitness",
        "technogym",
        "cybex",
        "nautilus",
        "precor",
        "matrix",
        "panatta",
        "gym80",
        "rogue",
        "eleiko",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Fragments match whole words, so "Tricep Pressdown" is not a press but
/// "Press Up" is.
fn default_confused_pairs() -> Vec<ConfusedPair> {
    vec![
        ConfusedPair::new(&["pulldown", "pull down"], &["pull up", "pullup", "chin up", "chinup"]),
        ConfusedPair::new(&["press"], &["fly", "flye", "pec deck"]),
        ConfusedPair::new(&["pushdown", "push down"], &["push up", "pushup"]),
        ConfusedPair::new(&["hip abduction", "abductor"], &["hip adduction", "adductor"]),
        ConfusedPair::new(&["leg curl", "hamstring curl"], &["leg extension"]),
        ConfusedPair::new(&["lateral raise", "side raise"], &["front raise"]),
    ]
}

fn default_dumbbell_top_step() -> f64 {
    5.0
}

fn default_barbell_step() -> f64 {
    2.5
}

fn default_barbell_heavy_threshold() -> f64 {
    100.0
}

fn default_barbell_heavy_step() -> f64 {
    5.0
}

fn default_cable_step() -> f64 {
    2.5
}

fn default_cable_heavy_threshold() -> f64 {
    50.0
}

fn default_cable_heavy_step() -> f64 {
    5.0
}

fn default_machine_step() -> f64 {
    5.0
}

fn default_dumbbell_start() -> StartingWeight {
    StartingWeight::new(5.0, 10.0)
}

fn default_barbell_start() -> StartingWeight {
    StartingWeight::new(15.0, 20.0)
}

fn default_cable_start() -> StartingWeight {
    StartingWeight::new(10.0, 20.0)
}

fn default_machine_start() -> StartingWeight {
    StartingWeight::new(15.0, 40.0)
}

fn default_set_count() -> u32 {
    3
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("overload").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Validate the configuration
    ///
    /// Returns a list of validation errors (empty if valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let r = &self.resolver;
        if !(r.threshold > 0.0 && r.threshold <= 1.0) {
            errors.push(format!(
                "resolver.threshold {} must be in (0, 1]",
                r.threshold
            ));
        }
        if !(r.strict_threshold >= r.threshold && r.strict_threshold <= 1.0) {
            errors.push(format!(
                "resolver.strict_threshold {} must be between threshold {} and 1",
                r.strict_threshold, r.threshold
            ));
        }
        if !(r.review_floor >= 0.0 && r.review_floor < r.threshold) {
            errors.push(format!(
                "resolver.review_floor {} must be in [0, threshold)",
                r.review_floor
            ));
        }
        for (i, pair) in r.confused_pairs.iter().enumerate() {
            if pair.left.is_empty() || pair.right.is_empty() {
                errors.push(format!("resolver.confused_pairs[{}] has an empty side", i));
            }
            if pair
                .left
                .iter()
                .chain(pair.right.iter())
                .any(|f| f.trim().is_empty())
            {
                errors.push(format!(
                    "resolver.confused_pairs[{}] has an empty fragment",
                    i
                ));
            }
        }

        let q = &self.quantizer;
        let steps = [
            ("dumbbell_top_step", q.dumbbell_top_step),
            ("barbell_step", q.barbell_step),
            ("barbell_heavy_step", q.barbell_heavy_step),
            ("cable_step", q.cable_step),
            ("cable_heavy_step", q.cable_heavy_step),
            ("machine_step", q.machine_step),
        ];
        for (key, step) in steps {
            if !(step.is_finite() && step > 0.0) {
                errors.push(format!("quantizer.{} {} must be positive", key, step));
            }
        }
        if q.barbell_heavy_step < q.barbell_step {
            errors.push(format!(
                "quantizer.barbell_heavy_step {} < barbell_step {}",
                q.barbell_heavy_step, q.barbell_step
            ));
        }
        if q.cable_heavy_step < q.cable_step {
            errors.push(format!(
                "quantizer.cable_heavy_step {} < cable_step {}",
                q.cable_heavy_step, q.cable_step
            ));
        }

        if self.defaults.set_count == 0 {
            errors.push("defaults.set_count must be at least 1".to_string());
        }
        for (class, start) in self.defaults.starting_weights.entries() {
            for (role, weight) in [("isolation", start.isolation), ("compound", start.compound)] {
                if !(weight.is_finite() && weight >= 0.0) {
                    errors.push(format!(
                        "defaults.starting_weights.{}.{} {} must be >= 0",
                        class, role, weight
                    ));
                }
            }
        }

        errors
    }
}
