//! SQLite persistence for fixture graphs
//!
//! Timestamps are stored as whole unix seconds, so a round trip drops
//! sub-second precision the same way many SQL dialects do.

use crate::config::StoreConfig;
use crate::models::{Account, Company, Pet, Toy, User};
use crate::{OWNER_PETS, OWNER_USERS};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use testkit_core::{NullInt64, NullTime};
use thiserror::Error;
use tracing::{debug, instrument, trace};

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("No row in {table} for {key}")]
    NotFound { table: &'static str, key: String },

    #[error("User {0} is already saved")]
    AlreadySaved(i64),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Lookups the fixture checks need to confirm a round trip
///
/// Lookups load a single row: associations are not preloaded.
pub trait FixtureStore {
    fn find_user(&self, id: i64) -> StoreResult<User>;

    fn find_pet(&self, id: i64) -> StoreResult<Pet>;

    /// First account whose `user_id` is `user_id`
    fn find_account_by_user(&self, user_id: i64) -> StoreResult<Account>;
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS companies (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL,
    name        TEXT NOT NULL,
    age         INTEGER NOT NULL,
    birthday    INTEGER,
    company_id  INTEGER REFERENCES companies(id),
    manager_id  INTEGER REFERENCES users(id),
    active      INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS accounts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL,
    user_id     INTEGER REFERENCES users(id),
    number      TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS pets (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL,
    user_id     INTEGER REFERENCES users(id),
    name        TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS toys (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL,
    name        TEXT NOT NULL,
    owner_id    INTEGER NOT NULL,
    owner_type  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS languages (
    code        TEXT PRIMARY KEY,
    name        TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS user_languages (
    user_id        INTEGER NOT NULL REFERENCES users(id),
    language_code  TEXT NOT NULL REFERENCES languages(code),
    PRIMARY KEY (user_id, language_code)
);
CREATE TABLE IF NOT EXISTS user_friends (
    user_id     INTEGER NOT NULL REFERENCES users(id),
    friend_id   INTEGER NOT NULL REFERENCES users(id),
    PRIMARY KEY (user_id, friend_id)
);
";

const DROP_TABLES: &str = "
DROP TABLE IF EXISTS user_friends;
DROP TABLE IF EXISTS user_languages;
DROP TABLE IF EXISTS languages;
DROP TABLE IF EXISTS toys;
DROP TABLE IF EXISTS pets;
DROP TABLE IF EXISTS accounts;
DROP TABLE IF EXISTS users;
DROP TABLE IF EXISTS companies;
";

/// Fixture store backed by a single SQLite connection
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the database named by `config` and create the fixture tables
    #[instrument(skip(config), fields(path = ?config.db_path, reset = config.reset))]
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let conn = match &config.db_path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };

        if config.reset {
            debug!("Dropping fixture tables");
            conn.execute_batch(DROP_TABLES)?;
        }
        conn.execute_batch(SCHEMA)?;

        Ok(Self { conn })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    /// The underlying connection, for ad-hoc queries in tests
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Persist a new user graph, writing IDs and foreign keys back into it
    ///
    /// Saves the company and manager first (so the user row can reference
    /// them), then the user, then the account, pets with their toys, the
    /// user's own toys, team members, languages and friends. Nested users
    /// that already have an ID are linked rather than inserted again.
    ///
    /// The whole graph is written in one transaction. On error nothing is
    /// written and `user` is left as it was.
    #[instrument(skip(self, user), fields(name = %user.name))]
    pub fn save_user(&self, user: &mut User) -> StoreResult<i64> {
        if user.id != 0 {
            return Err(StoreError::AlreadySaved(user.id));
        }

        let snapshot = user.clone();
        let tx = self.conn.unchecked_transaction()?;
        let result = self.insert_user(user).and_then(|id| {
            tx.commit()?;
            Ok(id)
        });
        if result.is_err() {
            *user = snapshot;
        }
        result
    }

    fn insert_user(&self, user: &mut User) -> StoreResult<i64> {
        let now = Utc::now();

        if !user.company.name.is_empty() {
            if user.company.id == 0 {
                self.insert_company(&mut user.company)?;
            }
            user.company_id = NullInt64::new(user.company.id);
        }

        if let Some(manager) = user.manager.as_deref_mut() {
            if manager.id == 0 {
                self.insert_user(manager)?;
            }
            user.manager_id = NullInt64::new(manager.id);
        }

        stamp(&mut user.created_at, &mut user.updated_at, now);
        self.conn.execute(
            "INSERT INTO users (created_at, updated_at, name, age, birthday, company_id, manager_id, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.created_at.timestamp(),
                user.updated_at.timestamp(),
                user.name,
                user.age,
                user.birthday.get().map(DateTime::timestamp),
                user.company_id.get(),
                user.manager_id.get(),
                user.active,
            ],
        )?;
        user.id = self.conn.last_insert_rowid();

        if !user.account.number.is_empty() {
            let account = &mut user.account;
            account.user_id = NullInt64::new(user.id);
            stamp(&mut account.created_at, &mut account.updated_at, now);
            self.conn.execute(
                "INSERT INTO accounts (created_at, updated_at, user_id, number) VALUES (?1, ?2, ?3, ?4)",
                params![
                    account.created_at.timestamp(),
                    account.updated_at.timestamp(),
                    account.user_id.get(),
                    account.number,
                ],
            )?;
            account.id = self.conn.last_insert_rowid();
        }

        for pet in user.pets.iter_mut().flatten() {
            self.insert_pet(user.id, pet)?;
        }
        if let Some(pet) = user.named_pet.as_deref_mut() {
            self.insert_pet(user.id, pet)?;
        }

        for toy in &mut user.toys {
            self.insert_toy(toy, user.id, OWNER_USERS)?;
        }

        for member in &mut user.team {
            member.manager_id = NullInt64::new(user.id);
            if member.id == 0 {
                self.insert_user(member)?;
            } else {
                self.conn.execute(
                    "UPDATE users SET manager_id = ?1 WHERE id = ?2",
                    params![user.id, member.id],
                )?;
            }
        }

        for language in &user.languages {
            self.conn.execute(
                "INSERT OR IGNORE INTO languages (code, name) VALUES (?1, ?2)",
                params![language.code, language.name],
            )?;
            self.conn.execute(
                "INSERT OR IGNORE INTO user_languages (user_id, language_code) VALUES (?1, ?2)",
                params![user.id, language.code],
            )?;
        }

        for friend in &mut user.friends {
            if friend.id == 0 {
                self.insert_user(friend)?;
            }
            self.conn.execute(
                "INSERT OR IGNORE INTO user_friends (user_id, friend_id) VALUES (?1, ?2)",
                params![user.id, friend.id],
            )?;
        }

        debug!(id = user.id, "Saved user");
        Ok(user.id)
    }

    fn insert_company(&self, company: &mut Company) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO companies (name) VALUES (?1)",
            params![company.name],
        )?;
        company.id = self.conn.last_insert_rowid();
        trace!(id = company.id, "Inserted company");
        Ok(())
    }

    fn insert_pet(&self, user_id: i64, pet: &mut Pet) -> StoreResult<()> {
        stamp(&mut pet.created_at, &mut pet.updated_at, Utc::now());
        pet.user_id = NullInt64::new(user_id);
        self.conn.execute(
            "INSERT INTO pets (created_at, updated_at, user_id, name) VALUES (?1, ?2, ?3, ?4)",
            params![
                pet.created_at.timestamp(),
                pet.updated_at.timestamp(),
                pet.user_id.get(),
                pet.name,
            ],
        )?;
        pet.id = self.conn.last_insert_rowid();

        if !pet.toy.name.is_empty() {
            self.insert_toy(&mut pet.toy, pet.id, OWNER_PETS)?;
        }
        trace!(id = pet.id, "Inserted pet");
        Ok(())
    }

    fn insert_toy(&self, toy: &mut Toy, owner_id: i64, owner_type: &str) -> StoreResult<()> {
        stamp(&mut toy.created_at, &mut toy.updated_at, Utc::now());
        toy.owner_id = owner_id;
        toy.owner_type = owner_type.to_string();
        self.conn.execute(
            "INSERT INTO toys (created_at, updated_at, name, owner_id, owner_type) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                toy.created_at.timestamp(),
                toy.updated_at.timestamp(),
                toy.name,
                toy.owner_id,
                toy.owner_type,
            ],
        )?;
        toy.id = self.conn.last_insert_rowid();
        Ok(())
    }
}

impl FixtureStore for SqliteStore {
    fn find_user(&self, id: i64) -> StoreResult<User> {
        trace!(id, "Loading user");
        self.conn
            .query_row(
                "SELECT id, created_at, updated_at, name, age, birthday, company_id, manager_id, active
                 FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        created_at: timestamp(row, 1)?,
                        updated_at: timestamp(row, 2)?,
                        name: row.get(3)?,
                        age: row.get(4)?,
                        birthday: NullTime::from(optional_timestamp(row, 5)?),
                        company_id: NullInt64::from(row.get::<_, Option<i64>>(6)?),
                        manager_id: NullInt64::from(row.get::<_, Option<i64>>(7)?),
                        active: row.get(8)?,
                        ..Default::default()
                    })
                },
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                table: "users",
                key: format!("id = {id}"),
            })
    }

    fn find_pet(&self, id: i64) -> StoreResult<Pet> {
        trace!(id, "Loading pet");
        self.conn
            .query_row(
                "SELECT id, created_at, updated_at, user_id, name FROM pets WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Pet {
                        id: row.get(0)?,
                        created_at: timestamp(row, 1)?,
                        updated_at: timestamp(row, 2)?,
                        user_id: NullInt64::from(row.get::<_, Option<i64>>(3)?),
                        name: row.get(4)?,
                        ..Default::default()
                    })
                },
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                table: "pets",
                key: format!("id = {id}"),
            })
    }

    fn find_account_by_user(&self, user_id: i64) -> StoreResult<Account> {
        trace!(user_id, "Loading account");
        self.conn
            .query_row(
                "SELECT id, created_at, updated_at, user_id, number FROM accounts
                 WHERE user_id = ?1 ORDER BY id LIMIT 1",
                params![user_id],
                |row| {
                    Ok(Account {
                        id: row.get(0)?,
                        created_at: timestamp(row, 1)?,
                        updated_at: timestamp(row, 2)?,
                        user_id: NullInt64::from(row.get::<_, Option<i64>>(3)?),
                        number: row.get(4)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                table: "accounts",
                key: format!("user_id = {user_id}"),
            })
    }
}

/// Set `created_at` if unset and always bump `updated_at`
fn stamp(created_at: &mut DateTime<Utc>, updated_at: &mut DateTime<Utc>, now: DateTime<Utc>) {
    if *created_at == DateTime::<Utc>::default() {
        *created_at = now;
    }
    *updated_at = now;
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs: i64 = row.get(idx)?;
    DateTime::from_timestamp(secs, 0).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, secs))
}

fn optional_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<i64>>(idx)? {
        Some(secs) => DateTime::from_timestamp(secs, 0)
            .map(Some)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, secs)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{get_user, FixtureConfig};

    #[test]
    fn test_save_assigns_ids_and_keys() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut user = get_user("save", FixtureConfig::full());
        let id = store.save_user(&mut user).unwrap();

        assert_eq!(id, user.id);
        assert_ne!(user.company.id, 0);
        assert_eq!(user.company_id.get(), Some(&user.company.id));
        let manager_id = user.manager.as_ref().unwrap().id;
        assert_eq!(user.manager_id.get(), Some(&manager_id));
        assert_eq!(user.account.user_id.get(), Some(&id));
        assert!(user.team.iter().all(|m| m.manager_id.get() == Some(&id)));
        assert!(user.toys.iter().all(|t| t.owner_type == OWNER_USERS && t.owner_id == id));
        assert!(user.friends.iter().all(|f| f.id != 0));
    }

    #[test]
    fn test_pet_toy_owned_by_pet() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut user = get_user("toy", FixtureConfig::default());
        user.pets.push(Some(Box::new(Pet {
            name: "rex".to_string(),
            toy: Toy {
                name: "bone".to_string(),
                ..Default::default()
            },
            ..Default::default()
        })));
        store.save_user(&mut user).unwrap();

        let pet = user.pets[0].as_ref().unwrap();
        assert_eq!(pet.toy.owner_type, OWNER_PETS);
        assert_eq!(pet.toy.owner_id, pet.id);
    }

    #[test]
    fn test_reload_drops_subseconds() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut user = get_user("reload", FixtureConfig::default());
        store.save_user(&mut user).unwrap();

        let loaded = store.find_user(user.id).unwrap();
        assert_eq!(loaded.name, "reload");
        assert_eq!(loaded.created_at.timestamp(), user.created_at.timestamp());
        assert_eq!(loaded.birthday, user.birthday);
        assert!(loaded.company_id.is_null());
    }

    #[test]
    fn test_missing_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(
            store.find_user(42),
            Err(StoreError::NotFound { table: "users", .. })
        ));
        assert!(matches!(
            store.find_account_by_user(42),
            Err(StoreError::NotFound { table: "accounts", .. })
        ));
    }

    #[test]
    fn test_failed_save_writes_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch("DROP TABLE user_friends")
            .unwrap();

        let mut user = get_user("partial", FixtureConfig::full());
        let before = user.clone();
        let result = store.save_user(&mut user);
        assert!(matches!(result, Err(StoreError::Sqlite(_))));

        assert_eq!(user.id, 0);
        assert_eq!(user.company.id, before.company.id);
        assert!(user.account.user_id.is_null());
        let count: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_saved_user_is_not_saved_again() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut user = get_user("twice", FixtureConfig::default());
        let id = store.save_user(&mut user).unwrap();

        assert!(matches!(
            store.save_user(&mut user),
            Err(StoreError::AlreadySaved(saved)) if saved == id
        ));
    }

    #[test]
    fn test_existing_team_member_is_linked() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut member = get_user("member", FixtureConfig::default());
        store.save_user(&mut member).unwrap();

        let mut lead = get_user("lead", FixtureConfig::default());
        lead.team.push(member.clone());
        store.save_user(&mut lead).unwrap();

        assert_eq!(lead.team[0].id, member.id);
        let reloaded = store.find_user(member.id).unwrap();
        assert_eq!(reloaded.manager_id.get(), Some(&lead.id));
    }

    #[test]
    fn test_shared_languages_inserted_once() {
        let store = SqliteStore::open_in_memory().unwrap();
        let config = FixtureConfig {
            languages: 2,
            ..Default::default()
        };
        let mut a = get_user("same", config);
        let mut b = get_user("same", config);
        store.save_user(&mut a).unwrap();
        store.save_user(&mut b).unwrap();

        let count: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM languages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }
}
