//! Secret-store collaborators.
//!
//! [`SecretStore`] is the seam between the sync service and the remote
//! store. [`op::OpCli`] talks to 1Password through the `op` command line
//! tool; [`memory::MemoryStore`] keeps everything in process.

pub mod memory;
pub mod op;

use serde::Deserialize;

use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VaultInfo {
  pub id: String,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemInfo {
  pub id: String,
  pub title: String,
}

/// An item fetched from the store together with its store-assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredItem {
  pub id: String,
  pub record: Record,
}

/// Operations the sync service needs from a secret store.
pub trait SecretStore {
  /// Checks that the store can be used at all (tooling present, signed in).
  fn ensure_ready(&self) -> Result<(), StoreError> {
    Ok(())
  }

  /// Resolves a vault name to the identifier used in later calls.
  ///
  /// Returns the name itself when it is unique and the id of the first match
  /// when several vaults share the name.
  fn vault_identifier(&self, name: &str) -> Result<String, StoreError> {
    let matching: Vec<VaultInfo> = self
      .list_vaults()?
      .into_iter()
      .filter(|vault| vault.name == name)
      .collect();

    match matching.as_slice() {
      [] => Err(StoreError::VaultNotFound(name.to_string())),
      [_] => Ok(name.to_string()),
      [first, ..] => Ok(first.id.clone()),
    }
  }

  fn item_exists(&self, vault: &str, name: &str) -> bool {
    self.get_item(vault, name).is_ok()
  }

  fn get_item(&self, vault: &str, name: &str) -> Result<StoredItem, StoreError>;

  fn create_item(&mut self, vault: &str, name: &str, record: &Record) -> Result<(), StoreError>;

  fn update_item(&mut self, item_id: &str, record: &Record) -> Result<(), StoreError>;

  fn list_vaults(&self) -> Result<Vec<VaultInfo>, StoreError>;

  fn list_items(&self, vault: &str) -> Result<Vec<ItemInfo>, StoreError>;

  fn create_vault(&mut self, name: &str) -> Result<(), StoreError>;
}

/// Errors raised by a [`SecretStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// No vault with the requested name
  #[error("vault '{0}' not found")]
  VaultNotFound(String),
  /// No item with the requested name in the vault
  #[error("item '{item}' not found in vault '{vault}'")]
  ItemNotFound { vault: String, item: String },
  /// The `op` executable is not on `PATH`
  #[error(
    "1Password CLI not found\nInstall from: https://developer.1password.com/docs/cli/get-started/"
  )]
  CliMissing,
  /// `op whoami` failed
  #[error("1Password CLI not authenticated. Run 'op signin' first.")]
  NotSignedIn,
  /// The store process could not be started
  #[error("failed to run store command: {0}")]
  Spawn(#[source] std::io::Error),
  /// The store process exited unsuccessfully
  #[error("failed to {action}: {output}")]
  CallFailed { action: String, output: String },
  /// The store returned output that could not be decoded
  #[error("malformed store output: {0}")]
  Malformed(#[from] serde_json::Error),
}

impl StoreError {
  /// Whether the error means a vault or item is absent, as opposed to the
  /// store itself failing.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      StoreError::VaultNotFound(_) | StoreError::ItemNotFound { .. }
    )
  }
}
