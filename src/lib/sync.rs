//! Push and pull between a local `.env` file and a secret-store item.
//!
//! # Sync Logic
//!
//! Both directions:
//! 1. Resolve the target vault and item: explicit names win, then the names
//!    remembered for the working directory, then vault `Environments` and an
//!    item named after the working directory
//! 2. Resolve the vault; when it is missing, let the user pick or create one
//! 3. Push: parse the file, confirm before replacing an existing item, then
//!    update it or create it. Pull: fetch the item (letting the user pick
//!    another when it is missing), confirm before replacing an existing file,
//!    then write it
//! 4. Remember the vault and item for the working directory
//!
//! Every sync is last-write-wins; nothing is merged.
//!
//! # Examples
//!
//! ```rust,no_run
//! use op_dotenv::prompt::TerminalResolver;
//! use op_dotenv::store::op::OpCli;
//! use op_dotenv::sync::{OpDotenv, SyncOptions};
//! use std::path::PathBuf;
//!
//! let working_dir = std::env::current_dir().unwrap();
//! let mut app = OpDotenv::new(OpCli::new(), TerminalResolver::stdio(), working_dir);
//!
//! app.push(SyncOptions {
//!     env_file: PathBuf::from(".env"),
//!     vault: None,
//!     item: None,
//!     force: false,
//! }).unwrap();
//! ```

use std::io;
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

use crate::preferences::{Preferences, PreferencesError};
use crate::prompt::{PromptError, Resolution, Resolver};
use crate::record::Record;
use crate::store::{SecretStore, StoreError, StoredItem};

pub const DEFAULT_ENV_FILE: &str = ".env";
/// Vault used when none is given or remembered, and offered when creating one.
pub const DEFAULT_VAULT: &str = "Environments";

/// Options shared by push and pull.
#[derive(Debug, Clone)]
pub struct SyncOptions {
  /// Local env file to read or write.
  pub env_file: PathBuf,
  /// Vault name. If None, the remembered or default vault is used.
  pub vault: Option<String>,
  /// Item name. If None, the remembered item or the directory name is used.
  pub item: Option<String>,
  /// Overwrite without asking.
  pub force: bool,
}

/// Vault and item names a sync will use before any disambiguation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
  pub vault: String,
  pub item: String,
}

/// How a push or pull ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  Pushed {
    env_file: PathBuf,
    vault: String,
    item: String,
    created: bool,
  },
  Pulled {
    vault: String,
    item: String,
    env_file: PathBuf,
  },
  /// The user declined a prompt; nothing was changed.
  Cancelled,
}

/// Effective configuration for a working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigView {
  pub working_dir: PathBuf,
  pub vault: String,
  pub item: String,
  /// Whether the values come from stored preferences rather than defaults.
  pub stored: bool,
}

struct ResolvedVault {
  name: String,
  id: String,
}

/// Sync service between env files and a [`SecretStore`].
pub struct OpDotenv<S, R> {
  store: S,
  resolver: R,
  preferences: Preferences,
  preferences_path: Option<PathBuf>,
  working_dir: PathBuf,
}

impl<S: SecretStore, R: Resolver> OpDotenv<S, R> {
  /// Creates a service that keeps preferences in memory only.
  pub fn new(store: S, resolver: R, working_dir: PathBuf) -> Self {
    Self {
      store,
      resolver,
      preferences: Preferences::default(),
      preferences_path: None,
      working_dir,
    }
  }

  /// Uses `preferences` and saves them to `path` after every sync.
  pub fn with_preferences(mut self, preferences: Preferences, path: PathBuf) -> Self {
    self.preferences = preferences;
    self.preferences_path = Some(path);
    self
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  pub fn preferences(&self) -> &Preferences {
    &self.preferences
  }

  pub fn target(&self, vault: Option<&str>, item: Option<&str>) -> Target {
    let default_item = self.default_item();

    Target {
      vault: vault
        .filter(|vault| !vault.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| self.preferences.vault_for(&self.working_dir, DEFAULT_VAULT)),
      item: item
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| self.preferences.item_for(&self.working_dir, &default_item)),
    }
  }

  pub fn config(&self) -> ConfigView {
    let Target { vault, item } = self.target(None, None);

    ConfigView {
      working_dir: self.working_dir.clone(),
      vault,
      item,
      stored: self.preferences.project(&self.working_dir).is_some(),
    }
  }

  /// Uploads the env file to the target item, creating it when needed.
  pub fn push(&mut self, options: SyncOptions) -> Result<Outcome, SyncError> {
    #[cfg(feature = "tracing")]
    info!("Starting push of {:?}", options.env_file);

    self.store.ensure_ready()?;

    let target = self.target(options.vault.as_deref(), options.item.as_deref());
    let Some(vault) = self.resolve_vault(&target.vault)? else {
      return Ok(Outcome::Cancelled);
    };

    let record = Record::from_path(&options.env_file, &target.item).map_err(|source| {
      SyncError::Read {
        path: options.env_file.clone(),
        source,
      }
    })?;

    #[cfg(feature = "tracing")]
    debug!(
      "Parsed {} variables, notes present: {}",
      record.variables().count(),
      record.notes().is_some()
    );

    let exists = self.store.item_exists(&vault.id, &target.item);
    if exists
      && !options.force
      && !self.resolver.confirm_overwrite(
        "Item",
        &target.item,
        &format!("vault '{}'", vault.name),
      )?
    {
      return Ok(Outcome::Cancelled);
    }

    if exists {
      let StoredItem { id, .. } = self.store.get_item(&vault.id, &target.item)?;

      #[cfg(feature = "tracing")]
      debug!("Updating item {}", id);

      self.store.update_item(&id, &record)?;
    } else {
      #[cfg(feature = "tracing")]
      debug!("Creating item {} in vault {}", target.item, vault.name);

      self.store.create_item(&vault.id, &target.item, &record)?;
    }

    self.remember(&vault.name, &target.item);

    #[cfg(feature = "tracing")]
    info!("Push completed successfully");

    Ok(Outcome::Pushed {
      env_file: options.env_file,
      vault: vault.name,
      item: target.item,
      created: !exists,
    })
  }

  /// Downloads the target item into the env file.
  pub fn pull(&mut self, options: SyncOptions) -> Result<Outcome, SyncError> {
    #[cfg(feature = "tracing")]
    info!("Starting pull into {:?}", options.env_file);

    self.store.ensure_ready()?;

    let target = self.target(options.vault.as_deref(), options.item.as_deref());
    let Some(vault) = self.resolve_vault(&target.vault)? else {
      return Ok(Outcome::Cancelled);
    };

    let (item, stored) = match self.store.get_item(&vault.id, &target.item) {
      Ok(stored) => (target.item, stored),
      Err(err) if err.is_not_found() => {
        #[cfg(feature = "tracing")]
        debug!("Item {} not found, asking for another", target.item);

        let items = self.store.list_items(&vault.id)?;
        match self.resolver.choose_item(&vault.name, &target.item, &items)? {
          Resolution::Use(name) | Resolution::Create(name) => {
            let stored = self.store.get_item(&vault.id, &name)?;
            (name, stored)
          }
          Resolution::Cancelled => return Ok(Outcome::Cancelled),
        }
      }
      Err(err) => return Err(err.into()),
    };

    if options.env_file.exists()
      && !options.force
      && !self.resolver.confirm_overwrite(
        "File",
        &options.env_file.display().to_string(),
        "local filesystem",
      )?
    {
      return Ok(Outcome::Cancelled);
    }

    Self::update_local(&stored.record, &options.env_file)?;
    self.remember(&vault.name, &item);

    Ok(Outcome::Pulled {
      vault: vault.name,
      item,
      env_file: options.env_file,
    })
  }

  /// Maps a vault name to its store identifier, asking the user when the
  /// vault does not exist. `None` means the user cancelled.
  fn resolve_vault(&mut self, name: &str) -> Result<Option<ResolvedVault>, SyncError> {
    match self.store.vault_identifier(name) {
      Ok(id) => {
        return Ok(Some(ResolvedVault {
          name: name.to_string(),
          id,
        }));
      }
      Err(err) if err.is_not_found() => {}
      Err(err) => return Err(err.into()),
    }

    #[cfg(feature = "tracing")]
    debug!("Vault {} not found, asking for another", name);

    let vaults = self.store.list_vaults()?;
    let chosen = match self.resolver.choose_vault(name, &vaults)? {
      Resolution::Use(chosen) => chosen,
      Resolution::Create(chosen) => {
        match self.store.vault_identifier(&chosen) {
          Ok(_) => {
            #[cfg(feature = "tracing")]
            debug!("Vault {} already exists, reusing it", chosen);
          }
          Err(err) if err.is_not_found() => self.store.create_vault(&chosen)?,
          Err(err) => return Err(err.into()),
        }
        chosen
      }
      Resolution::Cancelled => return Ok(None),
    };

    let id = self.store.vault_identifier(&chosen)?;
    Ok(Some(ResolvedVault { name: chosen, id }))
  }

  fn update_local(record: &Record, env_file: &Path) -> Result<(), SyncError> {
    #[cfg(feature = "tracing")]
    debug!("Writing {} to {:?}", record.title, env_file);

    record.write_to(env_file).map_err(|source| SyncError::Write {
      path: env_file.to_path_buf(),
      source,
    })
  }

  fn remember(&mut self, vault: &str, item: &str) {
    self.preferences.set_vault(&self.working_dir, vault);
    self.preferences.set_item(&self.working_dir, item);

    // A failed save does not undo a finished sync.
    if let Some(path) = &self.preferences_path
      && let Err(_err) = self.preferences.save(path)
    {
      #[cfg(feature = "tracing")]
      warn!("Could not save preferences to {:?}: {}", path, _err);
    }
  }

  fn default_item(&self) -> String {
    self
      .working_dir
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| self.working_dir.display().to_string())
  }
}

/// Errors that can occur while pushing or pulling.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
  /// Error reading the local env file
  #[error("failed to parse {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },
  /// Error writing the local env file
  #[error("failed to generate {}: {source}", path.display())]
  Write { path: PathBuf, source: io::Error },
  /// The secret store failed
  #[error(transparent)]
  Store(#[from] StoreError),
  /// Interactive prompt failed
  #[error(transparent)]
  Prompt(#[from] PromptError),
  /// Error loading or saving preferences
  #[error("failed to load preferences: {0}")]
  Preferences(#[from] PreferencesError),
  /// The working directory could not be determined
  #[error("failed to determine the working directory: {0}")]
  CurrentDir(io::Error),
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::prompt::TerminalResolver;
  use crate::record::Field;
  use crate::store::memory::MemoryStore;
  use std::io::Cursor;
  use tempfile::TempDir;

  type TestApp = OpDotenv<MemoryStore, TerminalResolver<Cursor<Vec<u8>>, Vec<u8>>>;

  fn app(store: MemoryStore, answers: &str) -> TestApp {
    OpDotenv::new(
      store,
      TerminalResolver::new(Cursor::new(answers.as_bytes().to_vec()), Vec::new()),
      PathBuf::from("/work/billing-api"),
    )
  }

  fn options(env_file: PathBuf) -> SyncOptions {
    SyncOptions {
      env_file,
      vault: None,
      item: None,
      force: false,
    }
  }

  #[test]
  fn test_target_defaults() {
    let app = app(MemoryStore::new(), "");

    assert_eq!(
      app.target(None, None),
      Target {
        vault: "Environments".into(),
        item: "billing-api".into(),
      }
    );
    assert_eq!(app.target(None, None).vault, DEFAULT_VAULT);
    assert_eq!(app.target(Some("Team"), Some("")).vault, "Team");
    assert_eq!(app.target(Some("Team"), Some("")).item, "billing-api");
    assert!(!app.config().stored);
  }

  #[test]
  fn test_push_creates_then_updates() {
    let temp_dir = TempDir::new().unwrap();
    let env_file = temp_dir.path().join(".env");
    std::fs::write(&env_file, "PORT=8080\n# Auth\nJWT_SECRET=abc\n").unwrap();

    let mut store = MemoryStore::new();
    store.add_vault("Environments");

    // The second push is confirmed with "y".
    let mut app = app(store, "y\n");
    let outcome = app.push(options(env_file.clone())).unwrap();
    assert_eq!(
      outcome,
      Outcome::Pushed {
        env_file: env_file.clone(),
        vault: "Environments".into(),
        item: "billing-api".into(),
        created: true,
      }
    );

    std::fs::write(&env_file, "PORT=9090\n").unwrap();
    let outcome = app.push(options(env_file.clone())).unwrap();
    assert!(matches!(outcome, Outcome::Pushed { created: false, .. }));

    let records = app.store().records("Environments");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "billing-api");
    assert_eq!(records[0].get("PORT").unwrap().value, "9090");

    let config = app.config();
    assert!(config.stored);
    assert_eq!(config.item, "billing-api");
  }

  #[test]
  fn test_push_declined_leaves_item() {
    let temp_dir = TempDir::new().unwrap();
    let env_file = temp_dir.path().join(".env");
    std::fs::write(&env_file, "PORT=1\n").unwrap();

    let mut store = MemoryStore::new();
    store.add_vault("Environments");
    let mut existing = Record::new("billing-api");
    existing.fields.push(Field::new("PORT", "0", None));
    store
      .create_item("Environments", "billing-api", &existing)
      .unwrap();

    let mut app = app(store, "n\n");
    assert_eq!(app.push(options(env_file)).unwrap(), Outcome::Cancelled);
    assert_eq!(
      app.store().records("Environments")[0].get("PORT").unwrap().value,
      "0"
    );
    assert!(app.preferences().projects.is_empty());
  }

  #[test]
  fn test_push_missing_file() {
    let mut store = MemoryStore::new();
    store.add_vault("Environments");

    let mut app = app(store, "");
    let err = app
      .push(options(PathBuf::from("/nonexistent/.env")))
      .unwrap_err();
    assert!(matches!(err, SyncError::Read { .. }));
    assert!(err.to_string().starts_with("failed to parse /nonexistent/.env"));
  }

  #[test]
  fn test_missing_vault_created_on_request() {
    let temp_dir = TempDir::new().unwrap();
    let env_file = temp_dir.path().join(".env");
    std::fs::write(&env_file, "PORT=1\n").unwrap();

    let mut app = app(MemoryStore::new(), "2\nTeam\n");
    let outcome = app.push(options(env_file)).unwrap();

    assert!(matches!(outcome, Outcome::Pushed { ref vault, .. } if vault == "Team"));
    assert_eq!(app.store().records("Team").len(), 1);
    assert_eq!(app.config().vault, "Team");
  }

  #[test]
  fn test_missing_vault_cancelled() {
    let mut app = app(MemoryStore::new(), "3\n");
    let outcome = app.pull(options(PathBuf::from("/unused/.env"))).unwrap();
    assert_eq!(outcome, Outcome::Cancelled);
  }

  #[test]
  fn test_pull_picks_other_item() {
    let temp_dir = TempDir::new().unwrap();
    let env_file = temp_dir.path().join(".env");

    let mut store = MemoryStore::new();
    store.add_vault("Environments");
    let mut record = Record::new("shared");
    record.fields.push(Field::new("HOST", "db", Some("Database".into())));
    store.create_item("Environments", "shared", &record).unwrap();

    let mut app = app(store, "1\n1\n");
    let outcome = app.pull(options(env_file.clone())).unwrap();

    assert_eq!(
      outcome,
      Outcome::Pulled {
        vault: "Environments".into(),
        item: "shared".into(),
        env_file: env_file.clone(),
      }
    );
    assert_eq!(
      std::fs::read_to_string(&env_file).unwrap(),
      "# Database\nHOST='db'\n\n"
    );
    assert_eq!(app.config().item, "shared");
  }

  #[test]
  fn test_pull_force_skips_confirmation() {
    let temp_dir = TempDir::new().unwrap();
    let env_file = temp_dir.path().join(".env");
    std::fs::write(&env_file, "OLD=1\n").unwrap();

    let mut store = MemoryStore::new();
    store.add_vault("Environments");
    let mut record = Record::new("billing-api");
    record.fields.push(Field::new("NEW", "2", None));
    store
      .create_item("Environments", "billing-api", &record)
      .unwrap();

    let mut app = app(store, "");
    let mut opts = options(env_file.clone());
    opts.force = true;
    app.pull(opts).unwrap();

    assert_eq!(std::fs::read_to_string(&env_file).unwrap(), "NEW='2'\n\n");
  }
}
