//! `.env` text to [`Record`].
//!
//! Parsing is line-oriented and never fails: every line is classified into a
//! [`Line`] and anything that is not understood is skipped.
//!
//! ```text
//! # --------------------------------------------
//! # Free-form notes, stored as the `notes` field
//! # --------------------------------------------
//!
//! DATABASE_URL=postgres://localhost/app
//!
//! # Redis Configuration
//! REDIS_HOST='localhost'
//! ```

use std::{fs, io, path::Path};

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

use crate::record::{Field, Record};

pub(crate) const COMMENT_PREFIX: &str = "#";
pub(crate) const ASSIGNMENT_OPERATOR: &str = "=";

/// Classification of a single input line, independent of parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
  Blank,
  /// `#` followed by one or more dashes; opens or closes the note block.
  HeaderToggle,
  /// Any other comment with a non-empty payload.
  SectionMarker(&'a str),
  /// `KEY=VALUE` with the value already unquoted.
  Assignment { key: &'a str, value: &'a str },
  Ignored,
}

impl<'a> From<&'a str> for Line<'a> {
  fn from(s: &'a str) -> Self {
    let trimmed = s.trim();

    if trimmed.is_empty() {
      Line::Blank
    } else if let Some(rest) = trimmed.strip_prefix(COMMENT_PREFIX) {
      if is_delimiter(rest) {
        Line::HeaderToggle
      } else {
        match rest.trim() {
          "" => Line::Ignored,
          section => Line::SectionMarker(section),
        }
      }
    } else if let Some((key, value)) = trimmed.split_once(ASSIGNMENT_OPERATOR)
      && is_valid_key(key)
    {
      Line::Assignment {
        key,
        value: unquote(value),
      }
    } else {
      Line::Ignored
    }
  }
}

impl Record {
  /// Parses `.env` text into a record titled `title`.
  ///
  /// Lines inside the note block (between two delimiter lines) only
  /// contribute to the notes; assignments there are not fields. A delimiter
  /// that is never closed turns the rest of the input into notes. Every
  /// further delimiter toggles the note block again.
  pub fn parse(text: &str, title: impl Into<String>) -> Self {
    #[cfg(feature = "tracing")]
    debug!("Parsing env text with {} lines", text.lines().count());

    let mut record = Record::new(title);
    let mut current_section: Option<&str> = None;
    let mut in_header = false;
    let mut note_lines = Vec::new();

    for raw in text.lines() {
      let line = Line::from(raw);

      #[cfg(feature = "tracing")]
      trace_line(&line);

      match line {
        Line::Blank => continue,
        Line::HeaderToggle => in_header = !in_header,
        _ if in_header => {
          let trimmed = raw.trim();
          if trimmed.starts_with(COMMENT_PREFIX) {
            let note = note_text(trimmed);
            // The serializer drops blank note lines, so they are not kept here either.
            if !note.trim().is_empty() {
              note_lines.push(note);
            }
          }
        }
        Line::SectionMarker(section) => current_section = Some(section),
        Line::Assignment { key, value } => {
          record
            .fields
            .push(Field::new(key, value, current_section.map(str::to_string)));
        }
        Line::Ignored => {}
      }
    }

    if !note_lines.is_empty() {
      record.fields.push(Field::notes(note_lines.join("\n")));
    }

    #[cfg(feature = "tracing")]
    debug!(
      "Parsed {} fields, notes present: {}",
      record.fields.len(),
      record.notes().is_some()
    );

    record
  }

  /// Reads and parses the file at `path`.
  pub fn from_path<P: AsRef<Path>>(path: P, title: impl Into<String>) -> io::Result<Self> {
    #[cfg(feature = "tracing")]
    debug!("Reading env file {:?}", path.as_ref());

    let text = fs::read_to_string(path)?;
    Ok(Self::parse(&text, title))
  }
}

/// Traces a classified line. Assignment values may be secrets and are left out.
#[cfg(feature = "tracing")]
fn trace_line(line: &Line<'_>) {
  match line {
    Line::Assignment { key, .. } => trace!("Classified line as Assignment {{ key: {:?} }}", key),
    other => trace!("Classified line as {:?}", other),
  }
}

pub(crate) fn is_delimiter(after_prefix: &str) -> bool {
  let body = after_prefix.trim();
  !body.is_empty() && body.chars().all(|c| c == '-')
}

/// `[A-Z_][A-Z0-9_]*`
fn is_valid_key(key: &str) -> bool {
  let mut chars = key.chars();
  match chars.next() {
    Some(first) if first.is_ascii_uppercase() || first == '_' => {
      chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    }
    _ => false,
  }
}

/// Strips one layer of matching single or double quotes.
fn unquote(value: &str) -> &str {
  for quote in ['\'', '"'] {
    if value.len() >= 2
      && let Some(inner) = value
        .strip_prefix(quote)
        .and_then(|rest| rest.strip_suffix(quote))
    {
      return inner;
    }
  }
  value
}

/// Drops the leading `#` and at most one whitespace character after it.
fn note_text(line: &str) -> String {
  let text = line.strip_prefix(COMMENT_PREFIX).unwrap_or(line);
  let mut chars = text.chars();
  match chars.next() {
    Some(c) if c.is_whitespace() => chars.as_str().to_string(),
    _ => text.to_string(),
  }
}
