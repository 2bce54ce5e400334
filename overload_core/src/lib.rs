#![forbid(unsafe_code)]

//! Core domain model and planning logic for Overload.
//!
//! This crate provides:
//! - Domain types (history snapshots, catalog entries, goals, plans)
//! - Equipment classification and weight quantization
//! - Exercise name resolution against a live catalog
//! - Per-set rep ladder progression and goal composition
//! - Persistence (snapshot store, history CSV import, goal export)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod equipment;
pub mod quantize;
pub mod resolver;
pub mod progression;
pub mod composer;
pub mod catalog;
pub mod store;
pub mod history;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use equipment::{classify_equipment, classify_role};
pub use quantize::{quantize_weight, snap_weight, WeightQuantizer};
pub use resolver::{resolve_exercise, ExerciseResolver, Resolution};
pub use progression::{progress_set, ProgressionStateMachine, SetProgression};
pub use composer::{resolve_and_progress, GoalComposer};
pub use catalog::WorkoutCatalog;
pub use store::{SnapshotSink, SnapshotStore};
pub use history::{import_history_csv, ImportReport};
pub use export::{append_goals_csv, write_plan_json};
