//! Configuration for the round-trip store

use std::env;
use std::path::PathBuf;

/// Where the round-trip store keeps its database
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// SQLite database file; in-memory when unset
    pub db_path: Option<PathBuf>,
    /// Drop and recreate the fixture tables when opening
    pub reset: bool,
}

impl StoreConfig {
    /// Load configuration from environment variables
    ///
    /// - `TESTKIT_DB_PATH`: database file (default: in-memory)
    /// - `TESTKIT_DB_RESET`: `1` or `true` to start from empty tables
    pub fn from_env() -> Self {
        let db_path = env::var("TESTKIT_DB_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let reset = env::var("TESTKIT_DB_RESET")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self { db_path, reset }
    }

    /// An in-memory database
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A database file at `path`
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
            reset: false,
        }
    }

    pub fn with_reset(mut self) -> Self {
        self.reset = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        assert_eq!(StoreConfig::in_memory().db_path, None);

        let config = StoreConfig::at("/tmp/fixtures.db").with_reset();
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/fixtures.db")));
        assert!(config.reset);
    }
}
