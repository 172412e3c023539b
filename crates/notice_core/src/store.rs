use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::notice::ArrivalTime;

/// Durable home of the "last notified notice arrival time".
pub trait WatermarkStore: Send + Sync {
    fn load(&self) -> Result<ArrivalTime, StoreError>;
    fn save(&self, arrival_time: ArrivalTime) -> Result<(), StoreError>;
}

impl<T: WatermarkStore + ?Sized> WatermarkStore for std::sync::Arc<T> {
    fn load(&self) -> Result<ArrivalTime, StoreError> {
        (**self).load()
    }

    fn save(&self, arrival_time: ArrivalTime) -> Result<(), StoreError> {
        (**self).save(arrival_time)
    }
}

#[derive(Debug, Default)]
pub struct MemoryWatermarkStore {
    value: Mutex<ArrivalTime>,
}

impl MemoryWatermarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(arrival_time: ArrivalTime) -> Self {
        Self {
            value: Mutex::new(arrival_time),
        }
    }
}

impl WatermarkStore for MemoryWatermarkStore {
    fn load(&self) -> Result<ArrivalTime, StoreError> {
        Ok(*self.value.lock())
    }

    fn save(&self, arrival_time: ArrivalTime) -> Result<(), StoreError> {
        *self.value.lock() = arrival_time;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WatermarkRecord {
    last_notified_notice_arrival_time: ArrivalTime,
}

/// JSON-backed store. A missing file reads as [`ArrivalTime::EARLIEST`].
#[derive(Debug, Clone)]
pub struct FileWatermarkStore {
    path: PathBuf,
}

impl FileWatermarkStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the next value is written to before it is renamed into place.
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("watermark"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl WatermarkStore for FileWatermarkStore {
    fn load(&self) -> Result<ArrivalTime, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ArrivalTime::EARLIEST),
            Err(err) => return Err(self.io_error(err)),
        };
        let record: WatermarkRecord =
            serde_json::from_str(&raw).map_err(|source| StoreError::Json {
                path: self.path.clone(),
                source,
            })?;
        Ok(record.last_notified_notice_arrival_time)
    }

    fn save(&self, arrival_time: ArrivalTime) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
            }
        }
        let record = WatermarkRecord {
            last_notified_notice_arrival_time: arrival_time,
        };
        let payload = serde_json::to_string_pretty(&record).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        let staging = self.staging_path();
        fs::write(&staging, payload).map_err(|err| self.io_error(err))?;
        fs::rename(&staging, &self.path).map_err(|err| self.io_error(err))?;
        tracing::debug!(path = %self.path.display(), %arrival_time, "watermark persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_reads_as_earliest() {
        let temp = tempdir().unwrap();
        let store = FileWatermarkStore::new(temp.path().join("absent.json"));
        assert_eq!(store.load().unwrap(), ArrivalTime::EARLIEST);
    }

    #[test]
    fn save_creates_parent_and_survives_reopen() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("state").join("watermark.json");
        FileWatermarkStore::new(&path)
            .save(ArrivalTime(42.25))
            .unwrap();

        let reopened = FileWatermarkStore::new(&path);
        assert_eq!(reopened.load().unwrap(), ArrivalTime(42.25));
        assert!(!temp.path().join("state").join("watermark.json.tmp").exists());
    }

    #[test]
    fn staging_file_keeps_caller_extension() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("state.dat");
        let store = FileWatermarkStore::new(&path);
        assert_eq!(store.staging_path(), temp.path().join("state.dat.tmp"));

        store.save(ArrivalTime(7.0)).unwrap();
        assert_eq!(store.load().unwrap(), ArrivalTime(7.0));
        assert!(path.exists());
        assert!(!temp.path().join("state.json.tmp").exists());
        assert!(!temp.path().join("state.dat.tmp").exists());
    }

    #[test]
    fn malformed_file_is_reported() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("watermark.json");
        fs::write(&path, "not json").unwrap();
        let err = FileWatermarkStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }
}
