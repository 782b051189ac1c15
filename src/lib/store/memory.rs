//! In-process [`SecretStore`], used for tests and dry runs.

use super::{ItemInfo, SecretStore, StoreError, StoredItem, VaultInfo};
use crate::record::Record;

#[derive(Debug, Clone)]
struct MemoryItem {
  id: String,
  vault_id: String,
  record: Record,
}

/// Keeps vaults and items in memory. Vault ids are `vault-N`, item ids `item-N`.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
  vaults: Vec<VaultInfo>,
  items: Vec<MemoryItem>,
  next_id: usize,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a vault and returns its id. Duplicate names are allowed.
  pub fn add_vault(&mut self, name: &str) -> String {
    let id = self.allocate("vault");
    self.vaults.push(VaultInfo {
      id: id.clone(),
      name: name.to_string(),
    });
    id
  }

  /// All records stored in the vault, in creation order.
  pub fn records(&self, vault: &str) -> Vec<&Record> {
    match self.vault_id(vault) {
      Some(vault_id) => self
        .items
        .iter()
        .filter(|item| item.vault_id == vault_id)
        .map(|item| &item.record)
        .collect(),
      None => Vec::new(),
    }
  }

  fn allocate(&mut self, prefix: &str) -> String {
    self.next_id += 1;
    format!("{}-{}", prefix, self.next_id)
  }

  /// Accepts either a vault id or a vault name.
  fn vault_id(&self, vault: &str) -> Option<&str> {
    self
      .vaults
      .iter()
      .find(|info| info.id == vault)
      .or_else(|| self.vaults.iter().find(|info| info.name == vault))
      .map(|info| info.id.as_str())
  }
}

impl SecretStore for MemoryStore {
  fn get_item(&self, vault: &str, name: &str) -> Result<StoredItem, StoreError> {
    let not_found = || StoreError::ItemNotFound {
      vault: vault.to_string(),
      item: name.to_string(),
    };

    let vault_id = self.vault_id(vault).ok_or_else(not_found)?;
    self
      .items
      .iter()
      .find(|item| item.vault_id == vault_id && item.record.title == name)
      .map(|item| StoredItem {
        id: item.id.clone(),
        record: item.record.clone(),
      })
      .ok_or_else(not_found)
  }

  fn create_item(&mut self, vault: &str, name: &str, record: &Record) -> Result<(), StoreError> {
    let vault_id = self
      .vault_id(vault)
      .ok_or_else(|| StoreError::VaultNotFound(vault.to_string()))?
      .to_string();

    let id = self.allocate("item");
    let mut record = record.clone();
    record.title = name.to_string();
    self.items.push(MemoryItem {
      id,
      vault_id,
      record,
    });
    Ok(())
  }

  fn update_item(&mut self, item_id: &str, record: &Record) -> Result<(), StoreError> {
    let item = self
      .items
      .iter_mut()
      .find(|item| item.id == item_id)
      .ok_or_else(|| StoreError::CallFailed {
        action: "update item".to_string(),
        output: format!("no item with id '{item_id}'"),
      })?;

    let title = std::mem::take(&mut item.record.title);
    item.record = record.clone();
    item.record.title = title;
    Ok(())
  }

  fn list_vaults(&self) -> Result<Vec<VaultInfo>, StoreError> {
    Ok(self.vaults.clone())
  }

  fn list_items(&self, vault: &str) -> Result<Vec<ItemInfo>, StoreError> {
    let vault_id = self
      .vault_id(vault)
      .ok_or_else(|| StoreError::VaultNotFound(vault.to_string()))?;

    Ok(
      self
        .items
        .iter()
        .filter(|item| item.vault_id == vault_id)
        .map(|item| ItemInfo {
          id: item.id.clone(),
          title: item.record.title.clone(),
        })
        .collect(),
    )
  }

  fn create_vault(&mut self, name: &str) -> Result<(), StoreError> {
    self.add_vault(name);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::Field;

  #[test]
  fn test_vault_identifier() {
    let mut store = MemoryStore::new();
    store.add_vault("Personal");
    let first = store.add_vault("Shared");
    store.add_vault("Shared");

    assert_eq!(store.vault_identifier("Personal").unwrap(), "Personal");
    assert_eq!(store.vault_identifier("Shared").unwrap(), first);
    assert!(matches!(
      store.vault_identifier("Missing"),
      Err(StoreError::VaultNotFound(name)) if name == "Missing"
    ));
  }

  #[test]
  fn test_create_update_get() {
    let mut store = MemoryStore::new();
    store.add_vault("Environments");

    let mut record = Record::new("ignored");
    record.fields.push(Field::new("PORT", "80", None));
    store.create_item("Environments", "api", &record).unwrap();
    assert!(store.item_exists("Environments", "api"));
    assert!(!store.item_exists("Environments", "web"));

    let stored = store.get_item("Environments", "api").unwrap();
    assert_eq!(stored.record.title, "api");

    record.fields[0].value = "443".into();
    store.update_item(&stored.id, &record).unwrap();

    let stored = store.get_item("Environments", "api").unwrap();
    assert_eq!(stored.record.get("PORT").unwrap().value, "443");
    assert_eq!(stored.record.title, "api");

    let items = store.list_items("Environments").unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "api");
  }

  #[test]
  fn test_missing_item_is_not_found() {
    let mut store = MemoryStore::new();
    store.add_vault("Environments");

    let err = store.get_item("Environments", "nope").unwrap_err();
    assert!(err.is_not_found());

    let err = store.update_item("item-99", &Record::new("x")).unwrap_err();
    assert!(!err.is_not_found());
  }
}
