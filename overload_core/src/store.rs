//! Per-client snapshot store.
//!
//! Each client's snapshots are appended to `<data_dir>/snapshots/<client>.jsonl`,
//! one JSON object per line, under an exclusive file lock. Readers take a
//! shared lock and skip lines that fail to parse.

use crate::{ClientProgressionSnapshot, Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Destination for imported snapshots
pub trait SnapshotSink {
    fn append(&mut self, snapshot: &ClientProgressionSnapshot) -> Result<()>;
}

/// JSONL snapshot store rooted at a data directory
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Store under `<data_dir>/snapshots`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            root: data_dir.as_ref().join("snapshots"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding one client's snapshots
    pub fn path_for(&self, client_id: &str) -> PathBuf {
        let stem: String = client_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{}.jsonl", stem))
    }

    /// Every readable snapshot for a client, in append order
    pub fn read_all(&self, client_id: &str) -> Result<Vec<ClientProgressionSnapshot>> {
        read_snapshots(&self.path_for(client_id))
    }

    /// Snapshot with the greatest `as_of_date`; ties go to the last appended
    pub fn latest(&self, client_id: &str) -> Result<ClientProgressionSnapshot> {
        let mut latest: Option<ClientProgressionSnapshot> = None;
        for snapshot in self.read_all(client_id)? {
            if snapshot.client_id != client_id {
                tracing::warn!(
                    expected = client_id,
                    found = %snapshot.client_id,
                    "Skipping snapshot filed under another client"
                );
                continue;
            }
            if latest
                .as_ref()
                .map_or(true, |current| snapshot.as_of_date >= current.as_of_date)
            {
                latest = Some(snapshot);
            }
        }
        latest.ok_or_else(|| Error::SnapshotNotFound(client_id.to_string()))
    }

    /// Client file stems present in the store, sorted
    pub fn clients(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut clients = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                clients.push(stem.to_string());
            }
        }
        clients.sort();
        Ok(clients)
    }
}

impl SnapshotSink for SnapshotStore {
    fn append(&mut self, snapshot: &ClientProgressionSnapshot) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.path_for(&snapshot.client_id);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(snapshot)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.sync_all()?;
        file.unlock()?;

        tracing::debug!(
            client = %snapshot.client_id,
            as_of = %snapshot.as_of_date,
            exercises = snapshot.exercises.len(),
            "Appended snapshot"
        );
        Ok(())
    }
}

/// Read all snapshots from a JSONL file, skipping corrupt lines
pub fn read_snapshots(path: &Path) -> Result<Vec<ClientProgressionSnapshot>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut snapshots = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = match line_result {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Unreadable line {} in {:?}: {}", line_num + 1, path, e);
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ClientProgressionSnapshot>(&line) {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => {
                tracing::warn!("Failed to parse snapshot at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} snapshots from {:?}", snapshots.len(), path);
    Ok(snapshots)
}

/// Replace `path` with `contents` via a synced temp file in the same directory
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;
    temp.write_all(contents)?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    tracing::debug!("Wrote {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExercisePerformanceRecord, ExerciseSetRecord};
    use chrono::NaiveDate;

    fn snapshot(client: &str, day: u32, weight: f64) -> ClientProgressionSnapshot {
        let date = NaiveDate::from_ymd_opt(2026, 4, day).unwrap();
        ClientProgressionSnapshot::new(client, date).with_record(ExercisePerformanceRecord {
            name: "Barbell Bench Press".into(),
            date,
            sets: vec![ExerciseSetRecord::new(weight, 8)],
        })
    }

    #[test]
    fn test_append_and_read_back() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = SnapshotStore::new(temp_dir.path());

        store.append(&snapshot("alice", 1, 60.0)).unwrap();
        store.append(&snapshot("alice", 8, 62.5)).unwrap();

        let all = store.read_all("alice").unwrap();
        assert_eq!(all.len(), 2);
        assert!(store.path_for("alice").ends_with("snapshots/alice.jsonl"));
    }

    #[test]
    fn test_latest_by_date_then_append_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = SnapshotStore::new(temp_dir.path());

        store.append(&snapshot("alice", 8, 62.5)).unwrap();
        store.append(&snapshot("alice", 1, 60.0)).unwrap();
        assert_eq!(store.latest("alice").unwrap().as_of_date.to_string(), "2026-04-08");

        store.append(&snapshot("alice", 8, 65.0)).unwrap();
        let latest = store.latest("alice").unwrap();
        assert_eq!(latest.exercises["Barbell Bench Press"].sets[0].weight, 65.0);
    }

    #[test]
    fn test_unknown_client() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(temp_dir.path());
        assert!(matches!(
            store.latest("nobody"),
            Err(Error::SnapshotNotFound(_))
        ));
        assert!(store.clients().unwrap().is_empty());
    }

    #[test]
    fn test_skips_corrupt_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = SnapshotStore::new(temp_dir.path());
        store.append(&snapshot("bob", 2, 40.0)).unwrap();

        let path = store.path_for("bob");
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{\"client_id\": \"bob\", truncated").unwrap();
        writeln!(file, "not json at all").unwrap();
        drop(file);

        store.append(&snapshot("bob", 3, 42.5)).unwrap();

        let all = store.read_all("bob").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(store.latest("bob").unwrap().as_of_date.to_string(), "2026-04-03");
    }

    #[test]
    fn test_client_ids_are_sanitized() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = SnapshotStore::new(temp_dir.path());
        store.append(&snapshot("../evil name", 1, 20.0)).unwrap();

        let path = store.path_for("../evil name");
        assert!(path.starts_with(store.root()));
        assert_eq!(store.clients().unwrap(), vec![".._evil_name".to_string()]);
        assert_eq!(store.latest("../evil name").unwrap().client_id, "../evil name");
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out").join("plan.json");

        write_atomic(&path, b"{\"v\":1}").unwrap();
        write_atomic(&path, b"{\"v\":2}").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"v\":2}");
    }
}
