//! Per-directory vault and item defaults.
//!
//! Stored as JSON in `~/.config/op-dotenv/config.json`:
//!
//! ```json
//! {
//!   "projects": {
//!     "/home/me/src/api": { "vault": "Environments", "item": "api" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
#[cfg(feature = "tracing")]
use tracing::debug;

const CONFIG_DIR: &str = ".config";
const APP_DIR: &str = "op-dotenv";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Preferences {
  #[serde(default)]
  pub projects: BTreeMap<String, ProjectPreference>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectPreference {
  #[serde(default)]
  pub vault: String,
  #[serde(default)]
  pub item: String,
}

impl Preferences {
  /// `~/.config/op-dotenv/config.json`
  pub fn default_path() -> Result<PathBuf, PreferencesError> {
    dirs::home_dir()
      .map(|home| home.join(CONFIG_DIR).join(APP_DIR).join(CONFIG_FILE))
      .ok_or(PreferencesError::NoHomeDir)
  }

  /// Loads preferences from `path`; a missing file yields empty preferences.
  pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PreferencesError> {
    let path = path.as_ref();

    let content = match std::fs::read_to_string(path) {
      Ok(content) => content,
      Err(err) if err.kind() == io::ErrorKind::NotFound => {
        #[cfg(feature = "tracing")]
        debug!("No preferences at {:?}, using defaults", path);
        return Ok(Self::default());
      }
      Err(err) => return Err(PreferencesError::Io(err)),
    };

    Ok(serde_json::from_str(&content)?)
  }

  pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PreferencesError> {
    let path = path.as_ref();

    if let Some(dir) = path.parent() {
      std::fs::create_dir_all(dir)?;
    }

    let content = serde_json::to_string_pretty(self)?;
    std::fs::write(path, content)?;

    #[cfg(feature = "tracing")]
    debug!("Saved preferences to {:?}", path);

    Ok(())
  }

  /// Deletes the preference file and, when it is left empty, its directory.
  /// Returns whether there was a file to delete.
  pub fn remove<P: AsRef<Path>>(path: P) -> Result<bool, PreferencesError> {
    let path = path.as_ref();

    match std::fs::remove_file(path) {
      Ok(()) => {}
      Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
      Err(err) => return Err(PreferencesError::Io(err)),
    }

    if let Some(dir) = path.parent() {
      // Fails when other files remain, which is fine.
      let _ = std::fs::remove_dir(dir);
    }

    Ok(true)
  }

  pub fn project(&self, project: &Path) -> Option<&ProjectPreference> {
    self.projects.get(&key(project))
  }

  pub fn vault_for(&self, project: &Path, default: &str) -> String {
    self
      .project(project)
      .map(|preference| preference.vault.as_str())
      .filter(|vault| !vault.is_empty())
      .unwrap_or(default)
      .to_string()
  }

  pub fn item_for(&self, project: &Path, default: &str) -> String {
    self
      .project(project)
      .map(|preference| preference.item.as_str())
      .filter(|item| !item.is_empty())
      .unwrap_or(default)
      .to_string()
  }

  pub fn set_vault(&mut self, project: &Path, vault: &str) {
    self.projects.entry(key(project)).or_default().vault = vault.to_string();
  }

  pub fn set_item(&mut self, project: &Path, item: &str) {
    self.projects.entry(key(project)).or_default().item = item.to_string();
  }
}

fn key(project: &Path) -> String {
  project.to_string_lossy().into_owned()
}

#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
  /// The home directory could not be determined
  #[error("could not determine the home directory")]
  NoHomeDir,
  /// Reading or writing the preference file failed
  #[error("preferences IO error: {0}")]
  Io(#[from] io::Error),
  /// The preference file is not valid JSON
  #[error("invalid preferences file: {0}")]
  Json(#[from] serde_json::Error),
}
