//! Interactive disambiguation when a vault or item cannot be found, and
//! overwrite confirmation.

use std::io::{self, BufRead, Write};

use crate::store::{ItemInfo, VaultInfo};
use crate::sync::DEFAULT_VAULT;

/// What the user picked in answer to a missing vault or item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
  /// Use an existing vault or item with this name.
  Use(String),
  /// Create a vault with this name (or reuse it if it already exists).
  Create(String),
  Cancelled,
}

pub trait Resolver {
  /// Asks whether an existing `kind` called `name` in `location` may be
  /// overwritten.
  fn confirm_overwrite(&mut self, kind: &str, name: &str, location: &str)
  -> Result<bool, PromptError>;

  fn choose_vault(&mut self, missing: &str, vaults: &[VaultInfo])
  -> Result<Resolution, PromptError>;

  fn choose_item(
    &mut self,
    vault: &str,
    missing: &str,
    items: &[ItemInfo],
  ) -> Result<Resolution, PromptError>;
}

/// Line-based prompts over any reader and writer.
pub struct TerminalResolver<R, W> {
  input: R,
  output: W,
}

impl TerminalResolver<io::StdinLock<'static>, io::Stdout> {
  pub fn stdio() -> Self {
    Self::new(io::stdin().lock(), io::stdout())
  }
}

impl<R: BufRead, W: Write> TerminalResolver<R, W> {
  pub fn new(input: R, output: W) -> Self {
    Self { input, output }
  }

  pub fn into_output(self) -> W {
    self.output
  }

  /// Reads one trimmed line; end of input reads as an empty answer.
  fn read_answer(&mut self) -> Result<String, PromptError> {
    self.output.flush()?;
    let mut line = String::new();
    self.input.read_line(&mut line)?;
    Ok(line.trim().to_string())
  }

  fn cancelled(&mut self) -> Result<Resolution, PromptError> {
    writeln!(self.output, "\nOperation cancelled.")?;
    Ok(Resolution::Cancelled)
  }

  /// Numbered pick from `names`, 1-based.
  fn pick(&mut self, heading: &str, names: &[&str]) -> Result<String, PromptError> {
    writeln!(self.output, "\n{heading}")?;
    for (index, name) in names.iter().enumerate() {
      writeln!(self.output, "   {}. {}", index + 1, name)?;
    }
    write!(self.output, "\nEnter choice: ")?;

    let answer = self.read_answer()?;
    answer
      .parse::<usize>()
      .ok()
      .and_then(|choice| choice.checked_sub(1))
      .and_then(|index| names.get(index))
      .map(|name| name.to_string())
      .ok_or(PromptError::InvalidChoice(answer))
  }
}

impl<R: BufRead, W: Write> Resolver for TerminalResolver<R, W> {
  fn confirm_overwrite(
    &mut self,
    kind: &str,
    name: &str,
    location: &str,
  ) -> Result<bool, PromptError> {
    write!(
      self.output,
      "\n{kind} '{name}' exists in {location}. Overwrite? (y/n): "
    )?;

    let answer = self.read_answer()?;
    if answer.eq_ignore_ascii_case("y") {
      Ok(true)
    } else {
      writeln!(self.output, "Operation cancelled.")?;
      Ok(false)
    }
  }

  fn choose_vault(
    &mut self,
    missing: &str,
    vaults: &[VaultInfo],
  ) -> Result<Resolution, PromptError> {
    writeln!(self.output, "\nVault '{missing}' not found.\n")?;

    if !vaults.is_empty() {
      writeln!(self.output, "Available vaults:")?;
      for vault in vaults {
        let duplicated = vaults.iter().filter(|v| v.name == vault.name).count() > 1;
        if duplicated {
          writeln!(self.output, "   - {} (ID: {})", vault.name, vault.id)?;
        } else {
          writeln!(self.output, "   - {}", vault.name)?;
        }
      }
      writeln!(self.output)?;
    }

    writeln!(self.output, "Choose an option:")?;
    writeln!(self.output, "   1. Use an existing vault")?;
    writeln!(self.output, "   2. Create new vault")?;
    writeln!(self.output, "   3. Cancel")?;
    write!(self.output, "\nEnter choice (1/2/3): ")?;

    match self.read_answer()?.as_str() {
      "1" => {
        if vaults.is_empty() {
          writeln!(self.output, "No vaults available.")?;
          return Ok(Resolution::Cancelled);
        }
        let names: Vec<&str> = vaults.iter().map(|vault| vault.name.as_str()).collect();
        let name = self.pick("Available vaults:", &names)?;
        writeln!(self.output, "\nUsing vault '{name}'.")?;
        Ok(Resolution::Use(name))
      }
      "2" => {
        write!(
          self.output,
          "\nEnter vault name (leave empty for '{DEFAULT_VAULT}'): "
        )?;
        let name = self.read_answer()?;
        if name.is_empty() {
          Ok(Resolution::Create(DEFAULT_VAULT.to_string()))
        } else {
          Ok(Resolution::Create(name))
        }
      }
      "3" => self.cancelled(),
      other => Err(PromptError::InvalidChoice(other.to_string())),
    }
  }

  fn choose_item(
    &mut self,
    vault: &str,
    missing: &str,
    items: &[ItemInfo],
  ) -> Result<Resolution, PromptError> {
    writeln!(self.output, "\nItem '{missing}' not found in vault '{vault}'.\n")?;

    if items.is_empty() {
      writeln!(self.output, "Choose an option:")?;
      writeln!(self.output, "   1. Cancel (no items found)")?;
      write!(self.output, "\nEnter choice (1): ")?;

      return match self.read_answer()?.as_str() {
        "1" => self.cancelled(),
        other => Err(PromptError::InvalidChoice(other.to_string())),
      };
    }

    writeln!(self.output, "Available items in this vault:")?;
    for item in items {
      writeln!(self.output, "   - {}", item.title)?;
    }
    writeln!(self.output)?;
    writeln!(self.output, "Choose an option:")?;
    writeln!(self.output, "   1. Use an existing item")?;
    writeln!(self.output, "   2. Cancel")?;
    write!(self.output, "\nEnter choice (1/2): ")?;

    match self.read_answer()?.as_str() {
      "1" => {
        let titles: Vec<&str> = items.iter().map(|item| item.title.as_str()).collect();
        let title = self.pick("Available items:", &titles)?;
        writeln!(self.output, "\nUsing item '{title}'.")?;
        Ok(Resolution::Use(title))
      }
      "2" => self.cancelled(),
      other => Err(PromptError::InvalidChoice(other.to_string())),
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
  /// Reading the answer or writing the prompt failed
  #[error("prompt IO error: {0}")]
  Io(#[from] io::Error),
  /// The answer was not one of the offered choices
  #[error("invalid choice: '{0}'")]
  InvalidChoice(String),
}
