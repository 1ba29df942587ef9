//! Round-trip checks for fixture graphs
//!
//! Each check compares three things: what the store returns for a saved
//! row, the in-memory object that was saved, and the expected object.
//! Collections are sorted by ID (languages by code), highest first, before
//! being compared pairwise.

use crate::models::{Pet, User};
use crate::store::{FixtureStore, StoreResult};
use crate::{OWNER_PETS, OWNER_USERS};
use std::cmp::Reverse;
use testkit_compare::{compare_fields_at, Mismatch, MismatchKind, Report};
use testkit_core::{ToValue, ValuePath, NIL};
use tracing::{debug, instrument};

pub const USER_FIELDS: &[&str] = &[
    "ID",
    "CreatedAt",
    "UpdatedAt",
    "Name",
    "Age",
    "Birthday",
    "CompanyID",
    "ManagerID",
    "Active",
];
pub const ACCOUNT_FIELDS: &[&str] = &["ID", "CreatedAt", "UpdatedAt", "UserID", "Number"];
pub const PET_FIELDS: &[&str] = &["ID", "CreatedAt", "UpdatedAt", "UserID", "Name"];
pub const TOY_FIELDS: &[&str] = &["ID", "CreatedAt", "UpdatedAt", "Name", "OwnerID", "OwnerType"];
pub const COMPANY_FIELDS: &[&str] = &["ID", "Name"];
pub const LANGUAGE_FIELDS: &[&str] = &["Code", "Name"];

/// Check a pet against the store and against `expect`
pub fn check_pet<S: FixtureStore + ?Sized>(
    store: &S,
    pet: &Pet,
    expect: &Pet,
) -> StoreResult<Report> {
    let mut report = Report::new();
    check_pet_at(store, &ValuePath::root(), pet, expect, &mut report)?;
    Ok(report)
}

/// Check a user graph against the store and against `expect`
///
/// Store lookup failures are returned as errors; everything else ends up
/// in the report.
#[instrument(skip_all, fields(user = %user.name, id = user.id))]
pub fn check_user<S: FixtureStore + ?Sized>(
    store: &S,
    user: &User,
    expect: &User,
) -> StoreResult<Report> {
    let root = ValuePath::root();
    let mut report = Report::new();

    if user.id != 0 {
        let stored = store.find_user(user.id)?;
        report.merge(fields(&root, &stored, user, USER_FIELDS));
    }
    report.merge(fields(&root, user, expect, USER_FIELDS));

    check_account(store, user, expect, &mut report)?;
    check_pets(store, user, expect, &mut report)?;
    check_toys(user, expect, &mut report);

    report.merge(fields(
        &root.field("Company"),
        &user.company,
        &expect.company,
        COMPANY_FIELDS,
    ));

    check_manager(store, user, expect, &mut report)?;
    check_users(&root.field("Team"), &user.team, &expect.team, &mut report);
    check_languages(user, expect, &mut report);
    check_users(&root.field("Friends"), &user.friends, &expect.friends, &mut report);

    debug!(mismatches = report.len(), "Checked user");
    Ok(report)
}

fn fields<A: ToValue + ?Sized, E: ToValue + ?Sized>(
    path: &ValuePath,
    actual: &A,
    expected: &E,
    names: &[&str],
) -> Report {
    compare_fields_at(path, &actual.to_value(), &expected.to_value(), names)
}

fn check_pet_at<S: FixtureStore + ?Sized>(
    store: &S,
    path: &ValuePath,
    pet: &Pet,
    expect: &Pet,
    report: &mut Report,
) -> StoreResult<()> {
    if pet.id != 0 {
        let stored = store.find_pet(pet.id)?;
        report.merge(fields(path, &stored, pet, PET_FIELDS));
        report.merge(fields(path, &stored, expect, PET_FIELDS));
    }

    report.merge(fields(path, pet, expect, PET_FIELDS));

    let toy_path = path.field("Toy");
    report.merge(fields(&toy_path, &pet.toy, &expect.toy, TOY_FIELDS));

    if !expect.toy.name.is_empty() && expect.toy.owner_type != OWNER_PETS {
        report.push(Mismatch::check(
            toy_path.field("OwnerType"),
            expect.toy.owner_type.clone(),
            OWNER_PETS,
        ));
    }
    Ok(())
}

fn check_account<S: FixtureStore + ?Sized>(
    store: &S,
    user: &User,
    expect: &User,
    report: &mut Report,
) -> StoreResult<()> {
    let path = ValuePath::root().field("Account");
    report.merge(fields(&path, &user.account, &expect.account, ACCOUNT_FIELDS));

    if user.account.number.is_empty() {
        return Ok(());
    }
    if user.account.user_id.is_null() {
        report.push(Mismatch::check(
            path.field("UserID"),
            user.account.user_id.to_string(),
            "saved foreign key",
        ));
        return Ok(());
    }

    let stored = store.find_account_by_user(user.id)?;
    report.merge(fields(&path, &stored, &user.account, ACCOUNT_FIELDS));
    Ok(())
}

/// Whether two collections have the same length, recording a mismatch if not
fn same_length(path: &ValuePath, actual: usize, expected: usize, report: &mut Report) -> bool {
    if actual != expected {
        report.push(Mismatch::length(path.clone(), actual, expected));
        return false;
    }
    true
}

fn check_pets<S: FixtureStore + ?Sized>(
    store: &S,
    user: &User,
    expect: &User,
    report: &mut Report,
) -> StoreResult<()> {
    let path = ValuePath::root().field("Pets");
    if !same_length(&path, user.pets.len(), expect.pets.len(), report) {
        return Ok(());
    }

    let by_id = |pet: &&Option<Box<Pet>>| Reverse(pet.as_ref().map_or(0, |p| p.id));
    let mut pets: Vec<_> = user.pets.iter().collect();
    let mut expected: Vec<_> = expect.pets.iter().collect();
    pets.sort_by_key(by_id);
    expected.sort_by_key(by_id);

    for (idx, (pet, want)) in pets.into_iter().zip(expected).enumerate() {
        let pet_path = path.index(idx);
        match (pet, want) {
            (Some(pet), Some(want)) => check_pet_at(store, &pet_path, pet, want, report)?,
            _ => report.push(Mismatch::new(
                pet_path,
                MismatchKind::Presence,
                render(pet.as_deref()),
                render(want.as_deref()),
            )),
        }
    }
    Ok(())
}

fn render(pet: Option<&Pet>) -> String {
    pet.map_or_else(|| NIL.to_string(), |p| format!("{:#}", p.to_value()))
}

fn check_toys(user: &User, expect: &User, report: &mut Report) {
    let path = ValuePath::root().field("Toys");
    if !same_length(&path, user.toys.len(), expect.toys.len(), report) {
        return;
    }

    let mut toys: Vec<_> = user.toys.iter().collect();
    let mut expected: Vec<_> = expect.toys.iter().collect();
    toys.sort_by_key(|t| Reverse(t.id));
    expected.sort_by_key(|t| Reverse(t.id));

    for (idx, (toy, want)) in toys.into_iter().zip(expected).enumerate() {
        let toy_path = path.index(idx);
        if toy.owner_type != OWNER_USERS {
            report.push(Mismatch::check(
                toy_path.field("OwnerType"),
                toy.owner_type.clone(),
                OWNER_USERS,
            ));
        }
        report.merge(fields(&toy_path, toy, want, TOY_FIELDS));
    }
}

fn check_manager<S: FixtureStore + ?Sized>(
    store: &S,
    user: &User,
    expect: &User,
    report: &mut Report,
) -> StoreResult<()> {
    let path = ValuePath::root().field("Manager");

    match (&user.manager, user.manager_id.get()) {
        (Some(_), None) => report.push(Mismatch::check(
            ValuePath::root().field("ManagerID"),
            user.manager_id.to_string(),
            "saved foreign key",
        )),
        (Some(manager), Some(&manager_id)) => {
            let stored = store.find_user(manager_id)?;
            report.merge(fields(&path, &stored, manager, USER_FIELDS));
            report.merge(fields(&path, &stored, &expect.manager, USER_FIELDS));
        }
        (None, Some(_)) => report.push(Mismatch::check(
            ValuePath::root().field("ManagerID"),
            user.manager_id.to_string(),
            "no manager for zero value",
        )),
        (None, None) => {}
    }
    Ok(())
}

fn check_users(path: &ValuePath, users: &[User], expected: &[User], report: &mut Report) {
    if !same_length(path, users.len(), expected.len(), report) {
        return;
    }

    let mut users: Vec<_> = users.iter().collect();
    let mut expected: Vec<_> = expected.iter().collect();
    users.sort_by_key(|u| Reverse(u.id));
    expected.sort_by_key(|u| Reverse(u.id));

    for (idx, (user, want)) in users.into_iter().zip(expected).enumerate() {
        report.merge(fields(&path.index(idx), user, want, USER_FIELDS));
    }
}

fn check_languages(user: &User, expect: &User, report: &mut Report) {
    let path = ValuePath::root().field("Languages");
    if !same_length(&path, user.languages.len(), expect.languages.len(), report) {
        return;
    }

    let mut languages: Vec<_> = user.languages.iter().collect();
    let mut expected: Vec<_> = expect.languages.iter().collect();
    languages.sort_by(|a, b| b.code.cmp(&a.code));
    expected.sort_by(|a, b| b.code.cmp(&a.code));

    for (idx, (language, want)) in languages.into_iter().zip(expected).enumerate() {
        report.merge(fields(&path.index(idx), language, want, LANGUAGE_FIELDS));
    }
}
