//! Fixture graphs and round-trip checks for dialect tests
//!
//! Builds nested user graphs ([`get_user`]), persists them to SQLite
//! ([`SqliteStore`]) and checks that what was saved, what was reloaded
//! and what was expected agree ([`check_user`], [`check_pet`]).

mod builder;
mod check;
mod config;
mod models;
mod store;

pub use builder::{get_user, FixtureConfig};
pub use check::{
    check_pet, check_user, ACCOUNT_FIELDS, COMPANY_FIELDS, LANGUAGE_FIELDS, PET_FIELDS,
    TOY_FIELDS, USER_FIELDS,
};
pub use config::StoreConfig;
pub use models::{Account, Company, Language, Pet, Toy, User};
pub use store::{FixtureStore, SqliteStore, StoreError, StoreResult};

/// Owner type of toys that belong to a user
pub const OWNER_USERS: &str = "users";

/// Owner type of toys that belong to a pet
pub const OWNER_PETS: &str = "pets";
