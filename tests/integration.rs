use op_dotenv::preferences::Preferences;
use op_dotenv::prompt::TerminalResolver;
use op_dotenv::record::Record;
use op_dotenv::store::SecretStore;
use op_dotenv::store::memory::MemoryStore;
use op_dotenv::sync::{OpDotenv, Outcome, SyncOptions};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ENV_CONTENT: &str = "# --------------------------------------------
# Billing API
# Shared with the payments team
# --------------------------------------------

DATABASE_URL=postgres://localhost:5432/billing
STRIPE_KEY=\"sk_test_123\"
FEATURE_FLAG=

# Email Settings
SMTP_HOST=smtp.example.com
SMTP_PASSWORD='hunter2'

# Redis Configuration
REDIS_HOST=localhost
not a variable
";

fn app(
  store: MemoryStore,
  answers: &str,
  working_dir: &Path,
  preferences: Preferences,
  preferences_path: PathBuf,
) -> OpDotenv<MemoryStore, TerminalResolver<Cursor<Vec<u8>>, Vec<u8>>> {
  OpDotenv::new(
    store,
    TerminalResolver::new(Cursor::new(answers.as_bytes().to_vec()), Vec::new()),
    working_dir.to_path_buf(),
  )
  .with_preferences(preferences, preferences_path)
}

fn options(env_file: PathBuf) -> SyncOptions {
  SyncOptions {
    env_file,
    vault: None,
    item: None,
    force: false,
  }
}

#[test]
fn test_push_then_pull_integration() {
  let temp_dir = TempDir::new().unwrap();
  let project = temp_dir.path().join("billing");
  fs::create_dir(&project).unwrap();
  let preferences_path = temp_dir.path().join("config").join("config.json");

  let env_path = project.join(".env");
  fs::write(&env_path, ENV_CONTENT).unwrap();

  let mut store = MemoryStore::new();
  store.add_vault("Environments");

  let mut push = app(
    store,
    "",
    &project,
    Preferences::default(),
    preferences_path.clone(),
  );
  let outcome = push.push(options(env_path.clone())).unwrap();
  assert!(matches!(outcome, Outcome::Pushed { created: true, .. }));

  let stored = push.store().records("Environments")[0].clone();
  assert_eq!(stored.title, "billing");
  assert_eq!(
    stored.notes(),
    Some("Billing API\nShared with the payments team")
  );
  assert_eq!(stored.variables().count(), 6);

  let preferences = Preferences::load(&preferences_path).unwrap();
  assert_eq!(preferences.item_for(&project, "x"), "billing");
  assert_eq!(preferences.vault_for(&project, "x"), "Environments");

  // Pull into a fresh file with the remembered target.
  let pulled_path = project.join(".env.pulled");
  let store = push.store().clone();
  let mut pull = app(store, "", &project, preferences, preferences_path);
  pull.pull(options(pulled_path.clone())).unwrap();

  let pulled = fs::read_to_string(&pulled_path).unwrap();
  let expected = "# --------------------------------------------
# Billing API
# Shared with the payments team
# --------------------------------------------

DATABASE_URL='postgres://localhost:5432/billing'
STRIPE_KEY='sk_test_123'

# Email Settings
SMTP_HOST='smtp.example.com'
SMTP_PASSWORD='hunter2'

# Redis Configuration
REDIS_HOST='localhost'

";
  assert_eq!(pulled, expected);

  // The pulled file parses back to the same fields, minus the empty one.
  let original = Record::parse(ENV_CONTENT, "billing");
  let reparsed = Record::parse(&pulled, "billing");
  let non_empty: Vec<_> = original
    .fields
    .iter()
    .filter(|field| !field.value.is_empty())
    .collect();
  assert_eq!(non_empty, reparsed.fields.iter().collect::<Vec<_>>());
}

#[test]
fn test_pull_declined_keeps_file() {
  let temp_dir = TempDir::new().unwrap();
  let env_path = temp_dir.path().join(".env");
  fs::write(&env_path, "LOCAL=1\n").unwrap();

  let mut store = MemoryStore::new();
  store.add_vault("Environments");
  let item = Record::parse("REMOTE=2", "svc");
  store.create_item("Environments", "svc", &item).unwrap();

  let mut service = app(
    store,
    "n\n",
    temp_dir.path(),
    Preferences::default(),
    temp_dir.path().join("config.json"),
  );
  let mut opts = options(env_path.clone());
  opts.item = Some("svc".into());

  assert_eq!(service.pull(opts).unwrap(), Outcome::Cancelled);
  assert_eq!(fs::read_to_string(&env_path).unwrap(), "LOCAL=1\n");
  assert!(!temp_dir.path().join("config.json").exists());
}
