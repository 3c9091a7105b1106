//! Filesystem snapshot store.

use std::fs;
use std::path::{Path, PathBuf};
use vigil_core::{ReportRecord, StorageError, VigilResult};

const LATEST_FILE: &str = "latest.json";
const LATEST_TMP_FILE: &str = "latest.json.tmp";
const ARCHIVE_DIR: &str = "archive";

/// Snapshot store rooted at a reports directory.
///
/// Layout:
/// ```text
/// <root>/latest.json
/// <root>/archive/report-20260806T090000.000000Z.json
/// ```
///
/// Concurrent invocation is out of scope: the external scheduler runs at
/// most one monitor per period, so no locking is done here.
pub struct SnapshotStore {
    root: PathBuf,
}

/// Paths written by a successful `save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSnapshot {
    pub latest: PathBuf,
    pub archive: PathBuf,
}

impl SnapshotStore {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn latest_path(&self) -> PathBuf {
        self.root.join(LATEST_FILE)
    }

    fn archive_dir(&self) -> PathBuf {
        self.root.join(ARCHIVE_DIR)
    }

    // Microsecond precision keeps archive names injective for distinct
    // timestamps, which the monotonicity check guarantees across saves.
    fn archive_path(&self, record: &ReportRecord) -> PathBuf {
        let stamp = record.timestamp.format("%Y%m%dT%H%M%S%.6fZ");
        self.archive_dir().join(format!("report-{}.json", stamp))
    }

    /// Load the most recent record. `Ok(None)` on a first run.
    ///
    /// The stored content hash is verified against the raw text so a
    /// corrupted or hand-edited latest file surfaces as an error rather
    /// than a silently wrong baseline.
    pub fn load_latest(&self) -> VigilResult<Option<ReportRecord>> {
        let path = self.latest_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path).map_err(|e| StorageError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let record: ReportRecord =
            serde_json::from_str(&contents).map_err(|e| StorageError::DecodeFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        if !record.verify_content_hash() {
            return Err(StorageError::HashMismatch {
                path: path.display().to_string(),
            }
            .into());
        }
        Ok(Some(record))
    }

    /// Persist `record` as the new latest and append an archive copy.
    ///
    /// Timestamps must strictly increase across saves. The archive copy
    /// is written first; the latest pointer is then replaced via
    /// temp-file + rename, so a crash at any point leaves the previous
    /// latest intact.
    pub fn save(&self, record: &ReportRecord) -> VigilResult<SavedSnapshot> {
        if let Some(latest) = self.load_latest()? {
            if record.timestamp <= latest.timestamp {
                return Err(StorageError::NonMonotonicTimestamp {
                    current: record.timestamp.to_rfc3339(),
                    latest: latest.timestamp.to_rfc3339(),
                }
                .into());
            }
        }

        let encoded =
            serde_json::to_string_pretty(record).map_err(|e| StorageError::EncodeFailed {
                reason: e.to_string(),
            })?;

        let archive_dir = self.archive_dir();
        fs::create_dir_all(&archive_dir).map_err(|e| StorageError::WriteFailed {
            path: archive_dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let archive = self.archive_path(record);
        if archive.exists() {
            return Err(StorageError::ArchiveCollision {
                path: archive.display().to_string(),
            }
            .into());
        }
        fs::write(&archive, &encoded).map_err(|e| StorageError::WriteFailed {
            path: archive.display().to_string(),
            reason: e.to_string(),
        })?;

        let latest = self.latest_path();
        self.replace_latest(&latest, &encoded)?;

        tracing::info!(latest = %latest.display(), archive = %archive.display(), "snapshot saved");
        Ok(SavedSnapshot { latest, archive })
    }

    fn replace_latest(&self, latest: &Path, encoded: &str) -> VigilResult<()> {
        let tmp = self.root.join(LATEST_TMP_FILE);
        fs::write(&tmp, encoded).map_err(|e| StorageError::WriteFailed {
            path: tmp.display().to_string(),
            reason: e.to_string(),
        })?;
        fs::rename(&tmp, latest).map_err(|e| StorageError::WriteFailed {
            path: latest.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use vigil_core::{MetricValue, Timestamp, VigilError};

    fn ts(hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 8, 6, hour, 0, 0).unwrap()
    }

    fn record(hour: u32) -> ReportRecord {
        let mut record = ReportRecord::new(ts(hour), format!("report at hour {}", hour));
        record
            .metrics
            .insert("AUA".to_string(), MetricValue::Text("£150bn".to_string()));
        record
    }

    #[test]
    fn test_first_run_has_no_latest() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path());
        assert_eq!(store.load_latest().unwrap(), None);
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path());
        let saved = store.save(&record(9)).unwrap();
        assert!(saved.latest.exists());
        assert!(saved.archive.exists());

        let loaded = store.load_latest().unwrap().unwrap();
        assert_eq!(loaded, record(9));
    }

    #[test]
    fn test_save_updates_latest_and_appends_archive() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path());
        store.save(&record(9)).unwrap();
        store.save(&record(10)).unwrap();

        let loaded = store.load_latest().unwrap().unwrap();
        assert_eq!(loaded.timestamp, ts(10));

        let archived: Vec<_> = fs::read_dir(dir.path().join("archive"))
            .unwrap()
            .collect();
        assert_eq!(archived.len(), 2);
    }

    #[test]
    fn test_non_monotonic_timestamp_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path());
        store.save(&record(10)).unwrap();

        let err = store.save(&record(10)).unwrap_err();
        assert!(matches!(
            err,
            VigilError::Storage(StorageError::NonMonotonicTimestamp { .. })
        ));
        let err = store.save(&record(9)).unwrap_err();
        assert!(matches!(
            err,
            VigilError::Storage(StorageError::NonMonotonicTimestamp { .. })
        ));
    }

    #[test]
    fn test_archive_copies_are_immutable_across_saves() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path());
        let first = store.save(&record(9)).unwrap();
        let before = fs::read_to_string(&first.archive).unwrap();

        store.save(&record(10)).unwrap();
        let after = fs::read_to_string(&first.archive).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_corrupted_latest_fails_hash_verification() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path());
        store.save(&record(9)).unwrap();

        let path = store.latest_path();
        let tampered = fs::read_to_string(&path)
            .unwrap()
            .replace("report at hour 9", "report at hour 9 tampered");
        fs::write(&path, tampered).unwrap();

        let err = store.load_latest().unwrap_err();
        assert!(matches!(
            err,
            VigilError::Storage(StorageError::HashMismatch { .. })
        ));
    }

    #[test]
    fn test_undecodable_latest_is_an_error_not_a_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path());
        fs::write(store.latest_path(), "not json").unwrap();

        let err = store.load_latest().unwrap_err();
        assert!(matches!(
            err,
            VigilError::Storage(StorageError::DecodeFailed { .. })
        ));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path());
        store.save(&record(9)).unwrap();
        assert!(!dir.path().join("latest.json.tmp").exists());
    }

    #[test]
    fn test_degraded_record_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path());
        let degraded = ReportRecord::new(ts(9), "");
        store.save(&degraded).unwrap();
        let loaded = store.load_latest().unwrap().unwrap();
        assert!(loaded.is_degraded());
        assert_eq!(loaded.raw_text, "");
    }
}
