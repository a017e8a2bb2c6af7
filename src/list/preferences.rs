use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use parking_lot::Mutex;

use super::ListPreferences;
use crate::errors::OraclesError;

/// Where the list keeps its filter between sessions
pub trait PreferenceStore: Send + Sync {
    /// `Ok(None)` when nothing was stored yet
    fn load(&self) -> Result<Option<ListPreferences>, OraclesError>;

    fn save(&self, prefs: &ListPreferences) -> Result<(), OraclesError>;
}

/// JSON file on disk
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Result<Option<ListPreferences>, OraclesError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&data)?))
    }

    fn save(&self, prefs: &ListPreferences) -> Result<(), OraclesError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(prefs)?)?;
        debug!("Saved list preferences to {}", self.path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    prefs: Mutex<Option<ListPreferences>>,
}

impl MemoryPreferenceStore {
    pub fn new(prefs: Option<ListPreferences>) -> Self {
        Self {
            prefs: Mutex::new(prefs),
        }
    }

    pub fn current(&self) -> Option<ListPreferences> {
        self.prefs.lock().clone()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Option<ListPreferences>, OraclesError> {
        Ok(self.prefs.lock().clone())
    }

    fn save(&self, prefs: &ListPreferences) -> Result<(), OraclesError> {
        *self.prefs.lock() = Some(prefs.clone());
        Ok(())
    }
}
