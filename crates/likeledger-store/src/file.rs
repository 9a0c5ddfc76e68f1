use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use likeledger_types::{LedgerError, Result};

use crate::traits::SnapshotStore;

/// File-based snapshot store with atomic writes (unique .tmp → fsync → rename).
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default snapshot location, relative to the working directory.
    pub fn default_path() -> PathBuf {
        PathBuf::from("data").join("likes.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "likes.json".to_string());
        self.path.with_file_name(format!("{name}{suffix}"))
    }

    fn write_tmp(tmp_path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = File::create(tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()
    }
}

fn storage_err(action: &str, path: &Path, err: std::io::Error) -> LedgerError {
    LedgerError::Storage(format!("Failed to {action} {}: {err}", path.display()))
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_err("read snapshot", &self.path, e)),
        }
    }

    fn save(&self, bytes: &[u8]) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent)
                .map_err(|e| storage_err("create snapshot directory", parent, e))?;
        }

        let tmp_path = self.sibling(&format!(".{}.tmp", Uuid::new_v4().simple()));
        if let Err(e) = Self::write_tmp(&tmp_path, bytes) {
            let _ = fs::remove_file(&tmp_path);
            return Err(storage_err("write temp snapshot", &tmp_path, e));
        }
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(storage_err("replace snapshot", &self.path, e));
        }

        // Persist the rename itself. Not every platform can open a directory.
        if let Some(parent) = parent {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }

    fn quarantine(&self) -> Result<String> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        let target = self.sibling(&format!(".corrupt-{stamp}"));
        fs::rename(&self.path, &target)
            .map_err(|e| storage_err("quarantine snapshot", &self.path, e))?;
        Ok(target.display().to_string())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
