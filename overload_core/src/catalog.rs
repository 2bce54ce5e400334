//! Workout catalog files.
//!
//! A catalog lists the exercises currently assigned in one target workout,
//! optionally with the set count detected for each. Two JSON shapes are
//! accepted:
//!
//! ```json
//! {"workout": "Upper A", "exercises": [{"name": "Bench Press", "sets": 4}]}
//! ["Bench Press", "Seated Cable Row"]
//! ```

use crate::types::*;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One exercise slot in a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CatalogExercise {
    pub name: String,
    /// Set count detected in the workout, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,
}

/// The live exercise list of one workout
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkoutCatalog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout: Option<String>,
    #[serde(default)]
    pub exercises: Vec<CatalogExercise>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    // Names first: a derived struct also accepts a JSON array
    Names(Vec<String>),
    Workout(WorkoutCatalog),
}

impl WorkoutCatalog {
    /// Catalog from bare names with no set counts
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            workout: None,
            exercises: names
                .into_iter()
                .map(|name| CatalogExercise {
                    name: name.into(),
                    sets: None,
                })
                .collect(),
        }
    }

    /// Parse either catalog shape and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog = match serde_json::from_str::<CatalogFile>(json)? {
            CatalogFile::Workout(catalog) => catalog,
            CatalogFile::Names(names) => Self::from_names(names),
        };

        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }
        Ok(catalog)
    }

    /// Load and validate a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&contents)?;
        tracing::info!(
            path = %path.display(),
            exercises = catalog.exercises.len(),
            "Loaded workout catalog"
        );
        Ok(catalog)
    }

    /// Validate the catalog
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for (i, exercise) in self.exercises.iter().enumerate() {
            if exercise.name.trim().is_empty() {
                errors.push(format!("Exercise #{} has empty name", i + 1));
                continue;
            }
            if !seen.insert(exercise.name.as_str()) {
                errors.push(format!("Duplicate exercise '{}'", exercise.name));
            }
            if exercise.sets == Some(0) {
                errors.push(format!("Exercise '{}' has zero sets", exercise.name));
            }
        }

        errors
    }

    /// Catalog entries in workout order
    pub fn entries(&self) -> Vec<ExerciseCatalogEntry> {
        self.exercises
            .iter()
            .map(|e| ExerciseCatalogEntry::new(e.name.clone()))
            .collect()
    }

    /// Set-count hints from the file, with an optional fallback for all
    pub fn set_hints(&self, default: Option<u32>) -> SetCountHints {
        let mut hints = SetCountHints {
            default,
            ..SetCountHints::default()
        };
        for exercise in &self.exercises {
            if let Some(sets) = exercise.sets {
                hints = hints.with_exercise(exercise.name.clone(), sets);
            }
        }
        hints
    }
}
