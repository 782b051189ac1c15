use clap::{Parser, Subcommand};
use op_dotenv::preferences::Preferences;
use op_dotenv::prompt::TerminalResolver;
use op_dotenv::store::op::OpCli;
use op_dotenv::sync::{DEFAULT_ENV_FILE, OpDotenv, Outcome, SyncError, SyncOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
  name = "op-dotenv",
  about = "Convert .env files to 1Password items and vice versa",
  long_about = "Push .env files to 1Password items or pull 1Password items to .env files. Supports sections via comments.",
  version,
  author
)]
struct Cli {
  /// Override vault name (will prompt if not found)
  #[arg(long, global = true)]
  vault: Option<String>,

  /// Override item name (defaults to current directory name)
  #[arg(short, long, global = true)]
  item: Option<String>,

  /// Verbose output (-v for verbose, -vv for very verbose)
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Convert .env file to 1Password item
  Push {
    /// Path to the env file
    #[arg(default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Force overwrite without confirmation
    #[arg(short, long)]
    force: bool,
  },

  /// Convert 1Password item to .env file
  Pull {
    /// Path to the env file
    #[arg(default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Force overwrite without confirmation
    #[arg(short, long)]
    force: bool,
  },

  /// Show current configuration
  #[command(alias = "cfg")]
  Config,

  /// Remove all configuration data
  Clean,
}

fn setup_tracing(verbose: u8) {
  use tracing_subscriber::fmt;
  use tracing_subscriber::prelude::*;

  let log_level = match verbose {
    0 => "warn",
    1 => "debug",
    _ => "trace",
  };

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(tracing_subscriber::EnvFilter::new(
      std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
    ))
    .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let cli = Cli::parse();

  setup_tracing(cli.verbose);

  let preferences_path = Preferences::default_path()?;

  if let Command::Clean = cli.command {
    if Preferences::remove(&preferences_path)? {
      println!("Configuration data removed successfully.");
    } else {
      println!("No configuration data found.");
    }
    return Ok(());
  }

  let working_dir = std::env::current_dir().map_err(SyncError::CurrentDir)?;
  let preferences = Preferences::load(&preferences_path).map_err(SyncError::Preferences)?;

  let mut app = OpDotenv::new(OpCli::new(), TerminalResolver::stdio(), working_dir)
    .with_preferences(preferences, preferences_path);

  let outcome = match cli.command {
    Command::Push { env_file, force } => app.push(SyncOptions {
      env_file,
      vault: cli.vault,
      item: cli.item,
      force,
    })?,
    Command::Pull { env_file, force } => app.pull(SyncOptions {
      env_file,
      vault: cli.vault,
      item: cli.item,
      force,
    })?,
    Command::Config => {
      let config = app.config();
      if config.stored {
        println!("Current configuration for {}:", config.working_dir.display());
      } else {
        println!("No configuration found for {}.", config.working_dir.display());
        println!("Default values will be used:");
      }
      println!("  Vault: {}", config.vault);
      println!("  Item:  {}", config.item);
      return Ok(());
    }
    Command::Clean => return Ok(()),
  };

  match outcome {
    Outcome::Pushed {
      env_file,
      vault,
      item,
      ..
    } => println!(
      "\nSaved {} as {}/{} in 1Password.",
      env_file.display(),
      vault,
      item
    ),
    Outcome::Pulled {
      vault,
      item,
      env_file,
    } => println!(
      "\nSaved {}/{} as {} from 1Password.",
      vault,
      item,
      env_file.display()
    ),
    Outcome::Cancelled => {}
  }

  Ok(())
}
