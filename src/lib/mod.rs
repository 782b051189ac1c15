//! Convert `.env` files to 1Password items and back.
//!
//! This library parses `.env` files into a structured [`record::Record`] and
//! writes records back as `.env` text, keeping comment sections and a leading
//! note block. Around that core it provides the pieces needed to sync a file
//! with a 1Password item through the `op` command line tool.
//!
//! # Features
//!
//! - **Total parsing**: lines that are not understood are skipped, never an error
//! - **Sections**: `# Name` comments group the variables that follow them
//! - **Notes**: a comment block between two `# ----` lines becomes the item notes
//! - **Sensitivity**: names containing `KEY`, `TOKEN`, `SECRET`, ... are concealed
//! - **Optional tracing**: detailed logging when the `tracing` feature is enabled
//!
//! # Example
//!
//! ```rust
//! use op_dotenv::record::Record;
//!
//! let record = Record::parse("# Redis\nREDIS_URL=\"redis://localhost\"\n", "api");
//! assert_eq!(record.to_string(), "# Redis\nREDIS_URL='redis://localhost'\n\n");
//! ```

pub mod parse;
pub mod preferences;
pub mod prompt;
pub mod record;
pub mod sensitivity;
pub mod serialize;
pub mod store;
pub mod sync;
