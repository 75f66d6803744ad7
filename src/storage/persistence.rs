//! Ledger persistence layer
//!
//! Provides save/load functionality for the engine state.

use crate::contract::EngineSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub state_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".ledger_data"),
            state_file: "state.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// What goes on disk: the engine snapshot and when it was taken
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedState {
    pub saved_at: DateTime<Utc>,
    pub snapshot: EngineSnapshot,
}

impl SavedState {
    pub fn new(snapshot: EngineSnapshot) -> Self {
        Self {
            saved_at: Utc::now(),
            snapshot,
        }
    }
}

/// Ledger storage manager
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Result<Self, StorageError> {
        Self::new(StorageConfig::default())
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn state_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.state_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.state_file, index))
    }

    /// Save a snapshot to disk
    pub fn save(&self, snapshot: &EngineSnapshot) -> Result<(), StorageError> {
        let path = self.state_path();

        // Create backup if enabled
        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self.config.data_dir.join(format!("{}.tmp", self.config.state_file));
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, &SavedState::new(snapshot.clone()))?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        log::debug!("State saved to {}", path.display());
        Ok(())
    }

    /// Load the saved state from disk
    pub fn load(&self) -> Result<SavedState, StorageError> {
        let path = self.state_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(
                "State file not found".to_string(),
            ));
        }

        load_from_file(&path)
    }

    /// Check if a saved state exists
    pub fn exists(&self) -> bool {
        self.state_path().exists()
    }

    /// Delete the saved state
    pub fn delete(&self) -> Result<(), StorageError> {
        let path = self.state_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Rotate backup files
    fn rotate_backups(&self) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                let next = self.backup_path(i + 1);
                fs::rename(&current, &next)?;
            }
        }

        Ok(())
    }

    /// Restore from a backup
    pub fn restore_backup(&self, backup_index: usize) -> Result<SavedState, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        load_from_file(&backup_path)
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let path = self.state_path();

        let file_size = if path.exists() {
            fs::metadata(&path)?.len()
        } else {
            0
        };

        Ok(StorageStats {
            file_size,
            backup_count: self.list_backups().len(),
            data_dir: self.config.data_dir.clone(),
        })
    }
}

/// Storage statistics
#[derive(Debug)]
pub struct StorageStats {
    pub file_size: u64,
    pub backup_count: usize,
    pub data_dir: PathBuf,
}

/// Save a snapshot to a specific file path
pub fn save_to_file(snapshot: &EngineSnapshot, path: &Path) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &SavedState::new(snapshot.clone()))?;
    Ok(())
}

/// Load saved state from a specific file path
pub fn load_from_file(path: &Path) -> Result<SavedState, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let saved: SavedState = serde_json::from_reader(reader)?;

    // every instance must live at the address it is keyed under
    for (address, instance) in &saved.snapshot.instances {
        if *address != instance.address {
            return Err(StorageError::InvalidData(format!(
                "Instance {} stored under {}",
                instance.address, address
            )));
        }
    }

    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Call, Engine};
    use crate::core::{Address, Value};
    use std::collections::BTreeMap;

    fn sample_engine() -> (Engine, Address, Address) {
        let mut engine = Engine::new();
        let owner = Address::hash_of(b"owner");
        engine.credit(&owner, &Address::NATIVE, 42).unwrap();
        let relay = engine.deploy("relay", &owner, &[], BTreeMap::new()).unwrap();
        (engine, owner, relay)
    }

    #[test]
    fn test_save_load_state() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        let storage = Storage::new(config).unwrap();
        let (mut engine, owner, relay) = sample_engine();
        engine.set_height(9).unwrap();

        // Save
        storage.save(&engine.snapshot()).unwrap();
        assert!(storage.exists());

        // Load
        let loaded = storage.load().unwrap();
        assert_eq!(loaded.snapshot.height, 9);
        let restored = Engine::from_snapshot(
            loaded.snapshot,
            crate::protocols::registry(),
            Default::default(),
        );
        assert_eq!(restored.balance(&owner, &Address::NATIVE), 42);
        assert_eq!(restored.read(&relay, "owner"), Value::Address(owner));
        assert_eq!(restored.instance(&relay).unwrap().type_name, "relay");
    }

    #[test]
    fn test_missing_state() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();
        assert!(!storage.exists());
        assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_backup_rotation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            max_backups: 3,
            ..Default::default()
        };

        let storage = Storage::new(config).unwrap();
        let (mut engine, owner, relay) = sample_engine();

        // Save multiple times
        for _ in 0..5 {
            storage.save(&engine.snapshot()).unwrap();
            engine
                .call(Call::new(owner, relay, "transfer", vec![Value::Address(owner)]))
                .unwrap();
            engine.advance(1).unwrap();
        }

        // Should have 3 backups (max)
        assert_eq!(storage.list_backups(), vec![0, 1, 2]);
        let oldest_kept = storage.restore_backup(2).unwrap();
        assert_eq!(oldest_kept.snapshot.height, 1);
        assert!(storage.restore_backup(3).is_err());
        assert_eq!(storage.stats().unwrap().backup_count, 3);
    }

    #[test]
    fn test_save_to_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("export.json");
        let (engine, _, _) = sample_engine();

        save_to_file(&engine.snapshot(), &path).unwrap();
        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded.snapshot.instances.len(), 1);
    }
}
