//! Structured form of one secret-store item.

use crate::sensitivity::Sensitivity;

/// Reserved name of the field holding the free-text note block.
pub const NOTES_FIELD: &str = "notes";

/// One secret-store item: a title and its ordered fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
  pub title: String,
  pub fields: Vec<Field>,
}

impl Record {
  pub fn new(title: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      fields: Vec::new(),
    }
  }

  /// The note block, if the record carries one.
  pub fn notes(&self) -> Option<&str> {
    self
      .fields
      .iter()
      .find(|field| field.is_notes())
      .map(|field| field.value.as_str())
  }

  /// All fields except the note block, in order.
  pub fn variables(&self) -> impl Iterator<Item = &Field> {
    self.fields.iter().filter(|field| !field.is_notes())
  }

  pub fn get(&self, name: &str) -> Option<&Field> {
    self.variables().find(|field| field.name == name)
  }

  /// Replaces the note block, keeping at most one notes field.
  pub fn set_notes(&mut self, notes: impl Into<String>) {
    self.fields.retain(|field| !field.is_notes());
    self.fields.push(Field::notes(notes));
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
  pub name: String,
  pub sensitivity: Sensitivity,
  pub value: String,
  pub section: Option<String>,
}

impl Field {
  /// Builds a field, deriving its sensitivity from the name.
  pub fn new(name: impl Into<String>, value: impl Into<String>, section: Option<String>) -> Self {
    let name = name.into();
    Self {
      sensitivity: Sensitivity::of(&name),
      name,
      value: value.into(),
      section,
    }
  }

  pub fn notes(value: impl Into<String>) -> Self {
    Self {
      name: NOTES_FIELD.to_string(),
      sensitivity: Sensitivity::Plain,
      value: value.into(),
      section: None,
    }
  }

  pub fn is_notes(&self) -> bool {
    self.name == NOTES_FIELD
  }
}
