//! Fixture models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use testkit_core::{NullInt64, NullTime, Record, ToValue, Value};

/// A user with every kind of association the dialect tests exercise
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub age: u32,
    pub birthday: NullTime,
    /// Has one
    pub account: Account,
    /// Has many
    pub pets: Vec<Option<Box<Pet>>>,
    /// Polymorphic has many, owner type `users`
    pub toys: Vec<Toy>,
    pub company_id: NullInt64,
    /// Belongs to
    pub company: Company,
    pub manager_id: NullInt64,
    /// Belongs to, self-referential
    pub manager: Option<Box<User>>,
    /// Users whose manager is this user
    pub team: Vec<User>,
    /// Many to many through `user_languages`
    pub languages: Vec<Language>,
    /// Many to many through `user_friends`
    pub friends: Vec<User>,
    pub active: bool,
    pub named_pet: Option<Box<Pet>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: NullInt64,
    pub number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: NullInt64,
    pub name: String,
    /// Polymorphic has one, owner type `pets`
    pub toy: Toy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Toy {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub owner_id: i64,
    pub owner_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

impl ToValue for User {
    fn to_value(&self) -> Value {
        Record::new("User")
            .field("ID", &self.id)
            .field("CreatedAt", &self.created_at)
            .field("UpdatedAt", &self.updated_at)
            .field("Name", &self.name)
            .field("Age", &self.age)
            .field("Birthday", &self.birthday)
            .field("Account", &self.account)
            .field("Pets", &self.pets)
            .field("Toys", &self.toys)
            .field("CompanyID", &self.company_id)
            .field("Company", &self.company)
            .field("ManagerID", &self.manager_id)
            .field("Manager", &self.manager)
            .field("Team", &self.team)
            .field("Languages", &self.languages)
            .field("Friends", &self.friends)
            .field("Active", &self.active)
            .field("NamedPet", &self.named_pet)
            .into()
    }
}

impl ToValue for Account {
    fn to_value(&self) -> Value {
        Record::new("Account")
            .field("ID", &self.id)
            .field("CreatedAt", &self.created_at)
            .field("UpdatedAt", &self.updated_at)
            .field("UserID", &self.user_id)
            .field("Number", &self.number)
            .into()
    }
}

impl ToValue for Pet {
    fn to_value(&self) -> Value {
        Record::new("Pet")
            .field("ID", &self.id)
            .field("CreatedAt", &self.created_at)
            .field("UpdatedAt", &self.updated_at)
            .field("UserID", &self.user_id)
            .field("Name", &self.name)
            .field("Toy", &self.toy)
            .into()
    }
}

impl ToValue for Toy {
    fn to_value(&self) -> Value {
        Record::new("Toy")
            .field("ID", &self.id)
            .field("CreatedAt", &self.created_at)
            .field("UpdatedAt", &self.updated_at)
            .field("Name", &self.name)
            .field("OwnerID", &self.owner_id)
            .field("OwnerType", &self.owner_type)
            .into()
    }
}

impl ToValue for Company {
    fn to_value(&self) -> Value {
        Record::new("Company")
            .field("ID", &self.id)
            .field("Name", &self.name)
            .into()
    }
}

impl ToValue for Language {
    fn to_value(&self) -> Value {
        Record::new("Language")
            .field("Code", &self.code)
            .field("Name", &self.name)
            .into()
    }
}
