//! Session store persistence with file locking.
//!
//! This module handles saving and loading the store snapshot. Every access
//! takes an `fs2` lock on a sidecar `<state>.lock` file, so readers never see
//! a half-replaced file and writers from separate processes take turns. Only
//! profiles, goals, ledger totals and dialogue progress are persisted; pending
//! food entries are transient.

use crate::dialogue::ProfileDialogue;
use crate::{Error, Ledger, Result, UserId};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Persistable state of every user
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct StoreSnapshot {
    pub users: BTreeMap<UserId, UserRecord>,
}

/// Persistable state of one user
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct UserRecord {
    #[serde(default)]
    pub dialogue: ProfileDialogue,
    #[serde(default)]
    pub ledger: Option<Ledger>,
}

impl StoreSnapshot {
    /// Load a snapshot from a file under a shared lock
    ///
    /// Returns an empty snapshot if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns an empty snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No state file found, starting with no users");
            return Ok(Self::default());
        }

        let lock = match open_lock(path).and_then(|lock| lock.lock_shared().map(|()| lock)) {
            Ok(lock) => lock,
            Err(e) => {
                tracing::warn!(
                    "Unable to lock state file {:?}: {}. Starting empty.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        let snapshot = read_snapshot(path);
        lock.unlock()?;
        Ok(snapshot)
    }

    /// Replace the file with this snapshot under an exclusive lock
    pub fn save(&self, path: &Path) -> Result<()> {
        let lock = lock_for_writing(path)?;
        let result = write_atomic(path, self);
        lock.unlock()?;
        result
    }

    /// Write these users over the file's copies, keeping users only the file has
    ///
    /// Load, merge and write all happen under one exclusive lock, so separate
    /// processes handling different users never drop each other's records.
    pub fn merge_into(&self, path: &Path) -> Result<()> {
        let lock = lock_for_writing(path)?;
        let mut merged = if path.exists() {
            read_snapshot(path)
        } else {
            Self::default()
        };
        merged
            .users
            .extend(self.users.iter().map(|(user, record)| (user.clone(), record.clone())));
        let result = write_atomic(path, &merged);
        lock.unlock()?;
        result
    }
}

/// `state.json` is guarded by `state.json.lock` next to it
fn lock_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("state"));
    name.push(".lock");
    path.with_file_name(name)
}

fn open_lock(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path(path))
}

fn lock_for_writing(path: &Path) -> Result<File> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let lock = open_lock(path)?;
    lock.lock_exclusive()?;
    Ok(lock)
}

/// Read and parse the file; the caller holds the lock
fn read_snapshot(path: &Path) -> StoreSnapshot {
    let mut contents = String::new();
    if let Err(e) = File::open(path).and_then(|file| {
        std::io::BufReader::new(file).read_to_string(&mut contents)
    }) {
        tracing::warn!(
            "Failed to read state file {:?}: {}. Starting empty.",
            path,
            e
        );
        return StoreSnapshot::default();
    }

    match serde_json::from_str::<StoreSnapshot>(&contents) {
        Ok(snapshot) => {
            tracing::debug!("Loaded {} users from {:?}", snapshot.users.len(), path);
            snapshot
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse state file {:?}: {}. Starting empty.",
                path,
                e
            );
            StoreSnapshot::default()
        }
    }
}

/// Atomically writes state by:
/// 1. Writing to a temp file
/// 2. Syncing to disk
/// 3. Renaming over the original
fn write_atomic(path: &Path, snapshot: &StoreSnapshot) -> Result<()> {
    // Create unique temp file in the same directory for atomic rename
    let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "state path missing parent")
    })?)?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(snapshot)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;

    // Atomically replace old state file
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved {} users to {:?}", snapshot.users.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DialogueStage, Goals, Profile, ProfileDraft};

    fn sample() -> StoreSnapshot {
        let profile = Profile {
            weight_kg: 70.0,
            height_cm: 175.0,
            age_years: 30,
            daily_activity_minutes: 30,
            city: "Kazan".into(),
        };
        let mut ledger = Ledger::new(
            profile,
            Goals {
                water_goal_ml: 3100,
                calorie_goal_kcal: 2473,
            },
        );
        ledger.logged_water_ml = 500.0;
        ledger.burned_calories_kcal = 280.0;

        let mut users = BTreeMap::new();
        users.insert(
            UserId::new("1"),
            UserRecord {
                dialogue: ProfileDialogue {
                    stage: DialogueStage::Completed,
                    draft: ProfileDraft::default(),
                },
                ledger: Some(ledger),
            },
        );
        users.insert(
            UserId::new("2"),
            UserRecord {
                dialogue: ProfileDialogue {
                    stage: DialogueStage::AwaitingAge,
                    draft: ProfileDraft {
                        weight_kg: Some(60.0),
                        height_cm: Some(165.0),
                        ..ProfileDraft::default()
                    },
                },
                ledger: None,
            },
        );
        StoreSnapshot { users }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        let snapshot = sample();
        snapshot.save(&state_path).unwrap();

        let loaded = StoreSnapshot::load(&state_path).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("nonexistent.json");

        let snapshot = StoreSnapshot::load(&state_path).unwrap();
        assert!(snapshot.users.is_empty());
    }

    #[test]
    fn test_corrupted_state_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("corrupted.json");

        // Write invalid JSON
        std::fs::write(&state_path, "{ invalid json }").unwrap();

        let snapshot = StoreSnapshot::load(&state_path).unwrap();
        assert!(snapshot.users.is_empty());
    }

    #[test]
    fn test_stage_serialized_in_snake_case() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"awaiting_age\""));
        assert!(json.contains("\"logged_water_ml\":500.0"));
    }

    #[test]
    fn test_atomic_save() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        sample().save(&state_path).unwrap();
        StoreSnapshot::default().save(&state_path).unwrap();

        // Verify state file exists and no stray temp files remain
        assert!(state_path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "state.json" && e.file_name() != "state.json.lock")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only state.json and its lock, found extras: {:?}",
            extras
        );
        assert!(StoreSnapshot::load(&state_path).unwrap().users.is_empty());
    }

    #[test]
    fn test_merge_keeps_users_only_on_disk() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");
        sample().save(&state_path).unwrap();

        let mut mine = StoreSnapshot::default();
        mine.users.insert(UserId::new("2"), UserRecord::default());
        mine.users.insert(UserId::new("3"), UserRecord::default());
        mine.merge_into(&state_path).unwrap();

        let loaded = StoreSnapshot::load(&state_path).unwrap();
        assert_eq!(loaded.users.len(), 3);
        assert_eq!(loaded.users[&UserId::new("1")], sample().users[&UserId::new("1")]);
        // Records for the same user are replaced wholesale
        assert_eq!(loaded.users[&UserId::new("2")], UserRecord::default());
        assert!(state_path.with_file_name("state.json.lock").exists());
    }

    #[test]
    fn test_concurrent_merges_keep_every_user() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        std::thread::scope(|scope| {
            for i in 0..8 {
                let state_path = &state_path;
                scope.spawn(move || {
                    let mut mine = StoreSnapshot::default();
                    mine.users.insert(UserId::new(format!("u{i}")), UserRecord::default());
                    for _ in 0..10 {
                        mine.merge_into(state_path).unwrap();
                    }
                });
            }
        });

        assert_eq!(StoreSnapshot::load(&state_path).unwrap().users.len(), 8);
    }
}
