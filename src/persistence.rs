//! Persistence of the adapter's device store
//!
//! The standalone adapter keeps device values in memory and writes them to a
//! JSON file after every callback, so accumulated counters survive restarts.

use crate::error::Result;
use crate::host::HostDevice;
use crate::logging::{StructuredLogger, get_logger};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistentState {
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub devices: Vec<HostDevice>,
}

/// Persistence manager
pub struct PersistenceManager {
    file_path: PathBuf,
    logger: StructuredLogger,
}

impl PersistenceManager {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            logger: get_logger("persistence"),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Load devices from disk; a missing file is an empty store
    pub fn load(&self) -> Result<Vec<HostDevice>> {
        if !self.file_path.exists() {
            self.logger
                .info("No persistent state file found, starting empty");
            return Ok(Vec::new());
        }

        let contents = std::fs::read_to_string(&self.file_path)?;
        let state: PersistentState = serde_json::from_str(&contents)?;
        self.logger.info(&format!(
            "Loaded {} device units saved at {}",
            state.devices.len(),
            state.saved_at
        ));
        Ok(state.devices)
    }

    /// Save devices to disk
    pub fn save(&self, devices: Vec<HostDevice>) -> Result<()> {
        let state = PersistentState {
            saved_at: Utc::now(),
            devices,
        };
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&state)?;
        let tmp = self.file_path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.file_path)?;
        self.logger.debug("Saved persistent state to disk");
        Ok(())
    }
}
