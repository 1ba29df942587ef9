//! Common test utilities for fixture round-trip tests

use std::sync::Once;
use testkit_fixtures::{get_user, FixtureConfig, SqliteStore, StoreConfig, User};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per test binary
///
/// Honors `RUST_LOG`, e.g. `RUST_LOG=testkit_fixtures=debug`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// An empty in-memory store
pub fn memory_store() -> SqliteStore {
    init_tracing();
    SqliteStore::open_in_memory().unwrap_or_else(|e| panic!("Failed to open store: {e}"))
}

/// A store configured from `TESTKIT_DB_PATH` / `TESTKIT_DB_RESET`
pub fn env_store() -> SqliteStore {
    init_tracing();
    SqliteStore::open(&StoreConfig::from_env())
        .unwrap_or_else(|e| panic!("Failed to open configured store: {e}"))
}

/// A user with every association, saved to `store`
pub fn saved_user(store: &SqliteStore, name: &str) -> User {
    let mut user = get_user(name, FixtureConfig::full());
    store
        .save_user(&mut user)
        .unwrap_or_else(|e| panic!("Failed to save user '{name}': {e}"));
    user
}
