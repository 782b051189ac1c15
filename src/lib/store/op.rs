//! 1Password store backed by the `op` command line tool.
//!
//! Items are created as Secure Notes. The note block maps to the built-in
//! `notesPlain` field and every other field is written with the
//! `[section.]label[type]=value` assignment syntax, sensitive fields as
//! `password` and the rest as `text`.

use std::path::PathBuf;
use std::process::Command;

use serde::Deserialize;
#[cfg(feature = "tracing")]
use tracing::{debug, trace};

use super::{ItemInfo, SecretStore, StoreError, StoredItem, VaultInfo};
use crate::record::{Field, Record};

const DEFAULT_PROGRAM: &str = "op";
const NOTES_PLAIN: &str = "notesPlain";
const ITEM_CATEGORY: &str = "Secure Note";

/// Client for the `op` executable.
#[derive(Debug, Clone)]
pub struct OpCli {
  program: PathBuf,
}

impl Default for OpCli {
  fn default() -> Self {
    Self {
      program: PathBuf::from(DEFAULT_PROGRAM),
    }
  }
}

impl OpCli {
  pub fn new() -> Self {
    Self::default()
  }

  /// Uses a different executable instead of `op` from `PATH`.
  pub fn with_program(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
    }
  }

  /// Runs `op` and returns its stdout. Arguments may carry secret values and
  /// are never logged.
  fn run(&self, action: &str, args: &[String]) -> Result<Vec<u8>, StoreError> {
    #[cfg(feature = "tracing")]
    debug!("Running op to {}", action);

    let output = Command::new(&self.program)
      .args(args)
      .output()
      .map_err(StoreError::Spawn)?;

    if output.status.success() {
      Ok(output.stdout)
    } else {
      let message = if output.stderr.is_empty() {
        output.stdout
      } else {
        output.stderr
      };
      Err(StoreError::CallFailed {
        action: action.to_string(),
        output: String::from_utf8_lossy(&message).trim().to_string(),
      })
    }
  }
}

impl SecretStore for OpCli {
  fn ensure_ready(&self) -> Result<(), StoreError> {
    which::which(&self.program).map_err(|_| StoreError::CliMissing)?;

    let status = Command::new(&self.program)
      .arg("whoami")
      .output()
      .map_err(StoreError::Spawn)?
      .status;

    if status.success() {
      Ok(())
    } else {
      Err(StoreError::NotSignedIn)
    }
  }

  fn get_item(&self, vault: &str, name: &str) -> Result<StoredItem, StoreError> {
    let args = strings(&["item", "get", name, "--vault", vault, "--format", "json"]);

    let output = self.run("get item", &args).map_err(|err| match err {
      StoreError::CallFailed { .. } => StoreError::ItemNotFound {
        vault: vault.to_string(),
        item: name.to_string(),
      },
      other => other,
    })?;

    decode_item(&output)
  }

  fn create_item(&mut self, vault: &str, name: &str, record: &Record) -> Result<(), StoreError> {
    self.run("create item", &create_args(vault, name, record))?;
    Ok(())
  }

  fn update_item(&mut self, item_id: &str, record: &Record) -> Result<(), StoreError> {
    self.run("update item", &edit_args(item_id, record))?;
    Ok(())
  }

  fn list_vaults(&self) -> Result<Vec<VaultInfo>, StoreError> {
    let output = self.run("list vaults", &strings(&["vault", "list", "--format", "json"]))?;
    Ok(serde_json::from_slice(&output)?)
  }

  fn list_items(&self, vault: &str) -> Result<Vec<ItemInfo>, StoreError> {
    let args = strings(&["item", "list", "--vault", vault, "--format", "json"]);
    let output = self.run(&format!("list items in vault '{vault}'"), &args)?;
    Ok(serde_json::from_slice(&output)?)
  }

  fn create_vault(&mut self, name: &str) -> Result<(), StoreError> {
    self.run("create vault", &strings(&["vault", "create", name]))?;
    Ok(())
  }
}

#[derive(Debug, Deserialize)]
struct OpItem {
  id: String,
  #[serde(default)]
  title: String,
  #[serde(default)]
  fields: Vec<OpField>,
}

#[derive(Debug, Deserialize)]
struct OpField {
  #[serde(default)]
  id: String,
  #[serde(default)]
  label: String,
  #[serde(default)]
  value: String,
  #[serde(default)]
  section: Option<OpSection>,
}

#[derive(Debug, Deserialize)]
struct OpSection {
  #[serde(default)]
  label: Option<String>,
}

fn decode_item(json: &[u8]) -> Result<StoredItem, StoreError> {
  let item: OpItem = serde_json::from_slice(json)?;
  let mut record = Record::new(item.title);
  let mut notes = None;

  for field in item.fields {
    if field.id == NOTES_PLAIN {
      notes = Some(field.value).filter(|value| !value.is_empty());
      continue;
    }
    if field.label.is_empty() {
      continue;
    }

    #[cfg(feature = "tracing")]
    trace!("Decoded field {}", field.label);

    let section = field
      .section
      .and_then(|section| section.label)
      .filter(|label| !label.is_empty());
    record
      .fields
      .push(Field::new(field.label, field.value, section));
  }

  if let Some(notes) = notes {
    record.set_notes(notes);
  }

  Ok(StoredItem {
    id: item.id,
    record,
  })
}

fn create_args(vault: &str, name: &str, record: &Record) -> Vec<String> {
  let mut args = strings(&[
    "item",
    "create",
    "--category",
    ITEM_CATEGORY,
    "--title",
    name,
    "--vault",
    vault,
  ]);
  push_assignments(&mut args, record);
  args
}

fn edit_args(item_id: &str, record: &Record) -> Vec<String> {
  let mut args = strings(&["item", "edit", item_id]);
  push_assignments(&mut args, record);
  args
}

fn push_assignments(args: &mut Vec<String>, record: &Record) {
  if let Some(notes) = record.notes().filter(|notes| !notes.is_empty()) {
    args.push(format!("{NOTES_PLAIN}={notes}"));
  }
  args.extend(record.variables().map(assignment));
}

fn assignment(field: &Field) -> String {
  let kind = if field.sensitivity.is_sensitive() {
    "password"
  } else {
    "text"
  };

  match &field.section {
    Some(section) => format!(
      "{}.{}[{}]={}",
      escape(section),
      escape(&field.name),
      kind,
      field.value
    ),
    None => format!("{}[{}]={}", escape(&field.name), kind, field.value),
  }
}

/// Backslash-escapes the characters `op` treats as separators in names.
fn escape(name: &str) -> String {
  let mut escaped = String::with_capacity(name.len());
  for c in name.chars() {
    if matches!(c, '.' | '=' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped
}

fn strings(args: &[&str]) -> Vec<String> {
  args.iter().map(|arg| arg.to_string()).collect()
}
