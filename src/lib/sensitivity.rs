//! Field sensitivity inference.
//!
//! A field is considered sensitive when its name contains one of
//! [`SENSITIVE_KEYWORDS`], compared case-insensitively. Sensitive fields are
//! stored concealed in the secret store; everything else is stored as text.

use std::fmt;

/// Substrings that mark a field name as sensitive, checked in order.
pub const SENSITIVE_KEYWORDS: &[&str] = &[
  "PASSWORD",
  "PASS",
  "SECRET",
  "KEY",
  "TOKEN",
  "AUTH",
  "CREDENTIAL",
  "HASH",
  "SALT",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sensitivity {
  #[default]
  Plain,
  Sensitive,
}

impl Sensitivity {
  /// Derives the sensitivity of a field from its name.
  pub fn of(name: &str) -> Self {
    let upper = name.to_uppercase();

    if SENSITIVE_KEYWORDS
      .iter()
      .any(|keyword| upper.contains(keyword))
    {
      Sensitivity::Sensitive
    } else {
      Sensitivity::Plain
    }
  }

  pub fn is_sensitive(self) -> bool {
    matches!(self, Sensitivity::Sensitive)
  }
}

impl fmt::Display for Sensitivity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Sensitivity::Plain => write!(f, "plain"),
      Sensitivity::Sensitive => write!(f, "sensitive"),
    }
  }
}
