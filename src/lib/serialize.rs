//! [`Record`] back to `.env` text.
//!
//! The note block is written first between two delimiter lines, followed by
//! the ungrouped fields and then one block per section. Sections appear in the
//! order their first field appears in the record. Fields with an empty value
//! are not written at all.

use std::{fmt, fs, io, path::Path};

#[cfg(feature = "tracing")]
use tracing::debug;

use crate::parse::{ASSIGNMENT_OPERATOR, COMMENT_PREFIX, is_delimiter};
use crate::record::{Field, Record};

const DELIMITER_WIDTH: usize = 44;

impl fmt::Display for Record {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(notes) = self.notes().filter(|notes| !notes.is_empty()) {
      write_delimiter(f)?;
      // A note line shaped like `---` would read back as a delimiter.
      for line in notes
        .lines()
        .filter(|line| !line.trim().is_empty() && !is_delimiter(line))
      {
        writeln!(f, "{} {}", COMMENT_PREFIX, line)?;
      }
      write_delimiter(f)?;
      writeln!(f)?;
    }

    for (section, fields) in self.sections() {
      if let Some(section) = section {
        writeln!(f, "{} {}", COMMENT_PREFIX, section)?;
      }
      for field in fields {
        writeln!(
          f,
          "{}{}'{}'",
          field.name, ASSIGNMENT_OPERATOR, field.value
        )?;
      }
      writeln!(f)?;
    }

    Ok(())
  }
}

impl Record {
  /// Non-empty variables grouped by section: the ungrouped bucket first,
  /// then named sections by first appearance.
  pub fn sections(&self) -> Vec<(Option<&str>, Vec<&Field>)> {
    let mut ungrouped = Vec::new();
    let mut named: Vec<(&str, Vec<&Field>)> = Vec::new();

    for field in self.variables().filter(|field| !field.value.is_empty()) {
      match field.section.as_deref() {
        None => ungrouped.push(field),
        Some(section) => match named.iter_mut().find(|(name, _)| *name == section) {
          Some((_, bucket)) => bucket.push(field),
          None => named.push((section, vec![field])),
        },
      }
    }

    let mut buckets = Vec::with_capacity(named.len() + 1);
    if !ungrouped.is_empty() {
      buckets.push((None, ungrouped));
    }
    buckets.extend(
      named
        .into_iter()
        .map(|(section, fields)| (Some(section), fields)),
    );
    buckets
  }

  /// Renders the record and writes it to `path`, replacing any existing file.
  pub fn write_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
    #[cfg(feature = "tracing")]
    debug!("Writing {} fields to {:?}", self.fields.len(), path.as_ref());

    let content = self.to_string();
    fs::write(path, content)
  }
}

fn write_delimiter(f: &mut fmt::Formatter<'_>) -> fmt::Result {
  writeln!(f, "{} {}", COMMENT_PREFIX, "-".repeat(DELIMITER_WIDTH))
}
