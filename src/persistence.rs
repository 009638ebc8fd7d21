//! Persistence layer for sensor state
//!
//! Each sensor's last value and attributes are stored under its entity id
//! so prices survive a restart and can be spliced back into the
//! coordinator before the first live fetch.

use crate::error::Result;
use crate::logging::get_logger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Stored payload of one entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestoredState {
    pub native_value: Option<serde_json::Value>,
    pub native_unit_of_measurement: Option<String>,
    pub extra_state_attributes: Option<serde_json::Map<String, serde_json::Value>>,
}

impl RestoredState {
    /// A named attribute decoded into `T`, if present and well formed
    pub fn attribute<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.extra_state_attributes
            .as_ref()
            .and_then(|attrs| attrs.get(key))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Persistent state structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistentState {
    /// Restored state per entity id
    #[serde(default)]
    pub entities: BTreeMap<String, RestoredState>,
}

/// Persistence manager
pub struct PersistenceManager {
    file_path: String,
    state: PersistentState,
    logger: crate::logging::StructuredLogger,
}

impl PersistenceManager {
    /// Create a new persistence manager
    pub fn new(file_path: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            state: PersistentState::default(),
            logger: get_logger("persistence"),
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// Load state from disk; a missing file leaves the state empty
    pub fn load(&mut self) -> Result<()> {
        let path = Path::new(&self.file_path);

        if !path.exists() {
            self.logger
                .info("No persistent state file found, starting empty");
            return Ok(());
        }

        let contents = std::fs::read_to_string(path)?;
        self.state = serde_json::from_str(&contents)?;
        self.logger.info(&format!(
            "Loaded stored state for {} entities",
            self.state.entities.len()
        ));

        Ok(())
    }

    /// Save state to disk
    pub fn save(&self) -> Result<()> {
        let path = Path::new(&self.file_path);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.state)?;
        std::fs::write(path, contents)?;
        self.logger.debug("Saved persistent state to disk");

        Ok(())
    }

    pub fn get(&self, entity_id: &str) -> Option<&RestoredState> {
        self.state.entities.get(entity_id)
    }

    pub fn set(&mut self, entity_id: &str, state: RestoredState) {
        self.state.entities.insert(entity_id.to_string(), state);
    }

    pub fn state(&self) -> &PersistentState {
        &self.state
    }
}
