//! Performance history import from CSV.
//!
//! Expected headers: `client_id,date,exercise,set,weight,reps`. Rows are
//! grouped into one snapshot per client; for each exercise only the rows
//! of its most recent date are kept, ordered by set number. Rows with an
//! unreadable date or a blank client/exercise are skipped and counted.

use crate::store::SnapshotSink;
use crate::types::{parse_number, reps_from_number};
use crate::{
    ClientProgressionSnapshot, Error, ExercisePerformanceRecord, ExerciseSetRecord, Result,
};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 3] = ["client_id", "date", "exercise"];

/// CSV row format; numeric columns are read as text and parsed leniently
#[derive(Debug, Deserialize)]
struct CsvRow {
    client_id: String,
    date: String,
    exercise: String,
    #[serde(default)]
    set: Option<String>,
    #[serde(default)]
    weight: Option<String>,
    #[serde(default)]
    reps: Option<String>,
}

/// Outcome of one import
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportReport {
    /// One snapshot per client, sorted by client id
    pub snapshots: Vec<ClientProgressionSnapshot>,
    /// Data rows read, including skipped ones
    pub rows: usize,
    pub skipped: usize,
}

impl ImportReport {
    /// Append every snapshot to a sink, returning how many were written
    pub fn append_to<S: SnapshotSink>(&self, sink: &mut S) -> Result<usize> {
        for snapshot in &self.snapshots {
            sink.append(snapshot)?;
        }
        Ok(self.snapshots.len())
    }
}

/// Sets collected for one exercise on its latest date
struct ExerciseRows {
    name: String,
    date: NaiveDate,
    sets: Vec<(u32, usize, ExerciseSetRecord)>,
}

/// Import a history CSV file
pub fn import_history_csv(path: &Path) -> Result<ImportReport> {
    let file = std::fs::File::open(path)?;
    let report = import_history(file)?;
    tracing::info!(
        path = %path.display(),
        clients = report.snapshots.len(),
        rows = report.rows,
        skipped = report.skipped,
        "Imported history CSV"
    );
    Ok(report)
}

/// Import history CSV from any reader
pub fn import_history<R: Read>(reader: R) -> Result<ImportReport> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(Error::Other(format!(
                "History CSV is missing the '{}' column",
                column
            )));
        }
    }

    let mut clients: BTreeMap<String, BTreeMap<String, ExerciseRows>> = BTreeMap::new();
    let mut rows = 0;
    let mut skipped = 0;

    for (index, result) in csv_reader.deserialize::<CsvRow>().enumerate() {
        rows += 1;
        let line = index + 2;

        let row = match result {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("Skipping history row at line {}: {}", line, e);
                skipped += 1;
                continue;
            }
        };

        if row.client_id.is_empty() || row.exercise.is_empty() {
            tracing::warn!("Skipping history row at line {}: blank client or exercise", line);
            skipped += 1;
            continue;
        }

        let date = match NaiveDate::parse_from_str(&row.date, "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                tracing::warn!(
                    "Skipping history row at line {}: bad date '{}': {}",
                    line,
                    row.date,
                    e
                );
                skipped += 1;
                continue;
            }
        };

        let set = set_record(row.weight.as_deref(), row.reps.as_deref());
        let exercises = clients.entry(row.client_id).or_default();
        let entry = exercises
            .entry(row.exercise.clone())
            .or_insert_with(|| ExerciseRows {
                name: row.exercise.clone(),
                date,
                sets: Vec::new(),
            });

        if date > entry.date {
            entry.date = date;
            entry.sets.clear();
        } else if date < entry.date {
            continue;
        }

        let order = entry.sets.len();
        let set_number = row
            .set
            .as_deref()
            .and_then(parse_number)
            .and_then(reps_from_number)
            .unwrap_or(u32::MAX);
        entry.sets.push((set_number, order, set));
    }

    let snapshots = clients
        .into_iter()
        .filter_map(|(client_id, exercises)| {
            let as_of_date = exercises.values().map(|e| e.date).max()?;
            let mut snapshot = ClientProgressionSnapshot::new(client_id, as_of_date);
            for (_, mut collected) in exercises {
                collected.sets.sort_by_key(|(number, order, _)| (*number, *order));
                snapshot = snapshot.with_record(ExercisePerformanceRecord {
                    name: collected.name,
                    date: collected.date,
                    sets: collected.sets.into_iter().map(|(_, _, set)| set).collect(),
                });
            }
            Some(snapshot)
        })
        .collect();

    Ok(ImportReport {
        snapshots,
        rows,
        skipped,
    })
}

/// Blank weight is an unloaded set; unreadable weight is kept as NaN
fn set_record(weight: Option<&str>, reps: Option<&str>) -> ExerciseSetRecord {
    let weight = match weight.map(str::trim) {
        None | Some("") => 0.0,
        Some(raw) => parse_number(raw).unwrap_or(f64::NAN),
    };
    let reps = reps.and_then(parse_number).and_then(reps_from_number);
    ExerciseSetRecord { weight, reps }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SnapshotStore;

    const HISTORY: &str = "\
client_id,date,exercise,set,weight,reps
alice,2026-05-01,Barbell Bench Press,1,60,8
alice,2026-05-01,Barbell Bench Press,2,60,7
alice,2026-05-08,Barbell Bench Press,2,62.5,6
alice,2026-05-08,Barbell Bench Press,1,62.5,8
alice,2026-05-04,Dumbbell Curl,1,10,15
bob,2026-05-02,Leg Press,1,100,12
";

    #[test]
    fn test_groups_by_client_and_latest_date() {
        let report = import_history(HISTORY.as_bytes()).unwrap();
        assert_eq!(report.rows, 6);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.snapshots.len(), 2);

        let alice = &report.snapshots[0];
        assert_eq!(alice.client_id, "alice");
        assert_eq!(alice.as_of_date.to_string(), "2026-05-08");

        let bench = &alice.exercises["Barbell Bench Press"];
        assert_eq!(bench.date.to_string(), "2026-05-08");
        assert_eq!(
            bench.sets,
            vec![
                ExerciseSetRecord::new(62.5, 8),
                ExerciseSetRecord::new(62.5, 6)
            ]
        );

        let curl = &alice.exercises["Dumbbell Curl"];
        assert_eq!(curl.date.to_string(), "2026-05-04");
        assert_eq!(report.snapshots[1].client_id, "bob");
    }

    #[test]
    fn test_skips_bad_rows() {
        let csv = "\
client_id,date,exercise,set,weight,reps
alice,05/01/2026,Barbell Row,1,50,8
alice,2026-05-01,,1,50,8
,2026-05-01,Barbell Row,1,50,8
alice,2026-05-01,Barbell Row,1,50,8
";
        let report = import_history(csv.as_bytes()).unwrap();
        assert_eq!(report.rows, 4);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.snapshots[0].exercises.len(), 1);
    }

    #[test]
    fn test_lenient_numeric_fields() {
        let csv = "\
client_id,date,exercise,set,weight,reps
carol,2026-05-01,Push-Up,1,,12
carol,2026-05-01,Push-Up,2,heavy,AMRAP
carol,2026-05-01,Push-Up,3,5kg,8-10
";
        let report = import_history(csv.as_bytes()).unwrap();
        let sets = &report.snapshots[0].exercises["Push-Up"].sets;
        assert_eq!(sets[0], ExerciseSetRecord::new(0.0, 12));
        assert!(sets[1].weight.is_nan());
        assert_eq!(sets[1].reps, None);
        assert_eq!(sets[2], ExerciseSetRecord::new(5.0, 8));
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let csv = "client,date,exercise\nalice,2026-05-01,Row\n";
        assert!(import_history(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_append_to_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("history.csv");
        std::fs::write(&csv_path, HISTORY).unwrap();

        let report = import_history_csv(&csv_path).unwrap();
        let mut store = SnapshotStore::new(temp_dir.path());
        assert_eq!(report.append_to(&mut store).unwrap(), 2);

        let latest = store.latest("bob").unwrap();
        assert_eq!(latest.exercises["Leg Press"].sets[0].weight, 100.0);
        assert_eq!(store.clients().unwrap(), vec!["alice", "bob"]);
    }
}
