//! Plan export for the goal-application side.
//!
//! Goals are appended to a CSV file (one row per set; unresolved
//! exercises get a single row with no set data) and whole plans can be
//! written as JSON. Both writes are synced before returning.

use crate::store::write_atomic;
use crate::{ProgressionPlan, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the goal CSV
#[derive(Debug, serde::Serialize)]
struct GoalRow<'a> {
    client_id: &'a str,
    as_of_date: String,
    exercise: &'a str,
    outcome: &'static str,
    set: Option<usize>,
    weight: Option<f64>,
    reps: Option<u32>,
    increased_weight: Option<bool>,
    rationale: &'a str,
}

/// Flatten a plan into CSV rows, goals first in catalog order
fn rows(plan: &ProgressionPlan) -> Vec<GoalRow<'_>> {
    let as_of_date = plan.as_of_date.to_string();
    let mut rows = Vec::new();

    for goal in &plan.goals {
        for (i, set) in goal.sets.iter().enumerate() {
            rows.push(GoalRow {
                client_id: &plan.client_id,
                as_of_date: as_of_date.clone(),
                exercise: &goal.resolved_name,
                outcome: goal.outcome.as_str(),
                set: Some(i + 1),
                weight: Some(set.weight),
                reps: Some(set.reps),
                increased_weight: Some(set.increased_weight),
                rationale: &goal.rationale,
            });
        }
    }

    for item in &plan.unresolved {
        rows.push(GoalRow {
            client_id: &plan.client_id,
            as_of_date: as_of_date.clone(),
            exercise: &item.catalog_name,
            outcome: crate::GoalOutcome::Unresolved.as_str(),
            set: None,
            weight: None,
            reps: None,
            increased_weight: None,
            rationale: &item.reason,
        });
    }

    rows
}

/// Append a plan's goals to a CSV file
///
/// Headers are written only when the file is new or empty. Returns the
/// number of rows written.
pub fn append_goals_csv(plan: &ProgressionPlan, csv_path: &Path) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    let rows = rows(plan);
    for row in &rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!(
        client = %plan.client_id,
        rows = rows.len(),
        "Appended goals to {:?}",
        csv_path
    );
    Ok(rows.len())
}

/// Write a plan as pretty JSON, replacing any previous file atomically
pub fn write_plan_json(plan: &ProgressionPlan, path: &Path) -> Result<()> {
    let mut contents = serde_json::to_vec_pretty(plan)?;
    contents.push(b'\n');
    write_atomic(path, &contents)?;
    tracing::info!(client = %plan.client_id, "Wrote plan to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        EquipmentClass, GoalOutcome, ProgressionGoal, SetGoal, UnresolvedExercise,
    };
    use chrono::NaiveDate;

    fn sample_plan() -> ProgressionPlan {
        ProgressionPlan {
            client_id: "alice".into(),
            as_of_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            goals: vec![ProgressionGoal {
                resolved_name: "Barbell Bench Press".into(),
                history_name: Some("Barbell Bench Press".into()),
                outcome: GoalOutcome::ResolvedWithHistory,
                equipment: EquipmentClass::Barbell,
                sets: vec![
                    SetGoal {
                        weight: 62.5,
                        reps: 6,
                        increased_weight: true,
                    },
                    SetGoal {
                        weight: 60.0,
                        reps: 15,
                        increased_weight: false,
                    },
                ],
                rationale: "set 1 60kg x 15 -> 62.5kg x 6 (weight up)".into(),
            }],
            unresolved: vec![UnresolvedExercise {
                catalog_name: "Incline Dumbbell Fly".into(),
                candidate_history_name: Some("Incline Dumbbell Press".into()),
                best_score: Some(0.85),
                reason: "confused pair".into(),
            }],
            unmatched_history: vec!["Incline Dumbbell Press".into()],
        }
    }

    #[test]
    fn test_csv_rows_and_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("goals.csv");

        let written = append_goals_csv(&sample_plan(), &csv_path).unwrap();
        assert_eq!(written, 3);

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(
            headers,
            vec![
                "client_id",
                "as_of_date",
                "exercise",
                "outcome",
                "set",
                "weight",
                "reps",
                "increased_weight",
                "rationale"
            ]
        );

        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&records[0][3], "RESOLVED_WITH_HISTORY");
        assert_eq!(&records[0][5], "62.5");
        assert_eq!(&records[0][7], "true");
        assert_eq!(&records[2][3], "UNRESOLVED");
        assert_eq!(&records[2][4], "");
    }

    #[test]
    fn test_csv_appends_without_repeating_headers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("goals.csv");

        append_goals_csv(&sample_plan(), &csv_path).unwrap();
        append_goals_csv(&sample_plan(), &csv_path).unwrap();

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 6);
    }

    #[test]
    fn test_plan_json_round_trips() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("plan.json");

        write_plan_json(&sample_plan(), &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"RESOLVED_WITH_HISTORY\""));

        let parsed: ProgressionPlan = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed, sample_plan());
    }
}
