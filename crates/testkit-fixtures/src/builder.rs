//! Fixture graph construction

use crate::models::{Account, Company, Language, Pet, Toy, User};
use chrono::{SubsecRound, Utc};
use testkit_core::NullTime;

/// Which associations [`get_user`] fills in, and how many of each
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixtureConfig {
    pub account: bool,
    pub pets: usize,
    pub toys: usize,
    pub company: bool,
    pub manager: bool,
    pub team: usize,
    pub languages: usize,
    pub friends: usize,
    pub named_pet: bool,
}

impl FixtureConfig {
    /// Every association, with two of each collection
    pub fn full() -> Self {
        Self {
            account: true,
            pets: 2,
            toys: 2,
            company: true,
            manager: true,
            team: 2,
            languages: 2,
            friends: 2,
            named_pet: true,
        }
    }
}

/// Build an unsaved user named `name` with the associations in `config`
///
/// Associated objects are named after the user: `<name>_pet_1`,
/// `<name>_toy_1`, `company-<name>`, `<name>_manager`, `<name>_team_1`,
/// `<name>_locale_1`, `<name>_friend_1`, `<name>_namepet`. Nested users
/// (manager, team, friends) have no associations of their own.
pub fn get_user(name: &str, config: FixtureConfig) -> User {
    let mut user = User {
        name: name.to_string(),
        age: 18,
        birthday: NullTime::new(Utc::now().round_subsecs(0)),
        ..Default::default()
    };

    if config.account {
        user.account = Account {
            number: format!("{name}_account"),
            ..Default::default()
        };
    }

    user.pets = (1..=config.pets)
        .map(|i| {
            Some(Box::new(Pet {
                name: format!("{name}_pet_{i}"),
                ..Default::default()
            }))
        })
        .collect();

    user.toys = (1..=config.toys)
        .map(|i| Toy {
            name: format!("{name}_toy_{i}"),
            ..Default::default()
        })
        .collect();

    if config.company {
        user.company = Company {
            name: format!("company-{name}"),
            ..Default::default()
        };
    }

    if config.manager {
        user.manager = Some(Box::new(get_user(
            &format!("{name}_manager"),
            FixtureConfig::default(),
        )));
    }

    user.team = (1..=config.team)
        .map(|i| get_user(&format!("{name}_team_{i}"), FixtureConfig::default()))
        .collect();

    user.languages = (1..=config.languages)
        .map(|i| {
            let code = format!("{name}_locale_{i}");
            Language {
                name: code.clone(),
                code,
            }
        })
        .collect();

    user.friends = (1..=config.friends)
        .map(|i| get_user(&format!("{name}_friend_{i}"), FixtureConfig::default()))
        .collect();

    if config.named_pet {
        user.named_pet = Some(Box::new(Pet {
            name: format!("{name}_namepet"),
            ..Default::default()
        }));
    }

    user
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_plain_user() {
        let user = get_user("jinzhu", FixtureConfig::default());
        assert_eq!(user.name, "jinzhu");
        assert_eq!(user.age, 18);
        assert_eq!(user.id, 0);
        assert!(user.pets.is_empty());
        assert!(user.manager.is_none());
        assert!(user.account.number.is_empty());

        let birthday = user.birthday.get().unwrap();
        assert_eq!(birthday.nanosecond(), 0);
    }

    #[test]
    fn test_naming() {
        let user = get_user("u", FixtureConfig::full());
        assert_eq!(user.account.number, "u_account");
        assert_eq!(user.pets[1].as_ref().unwrap().name, "u_pet_2");
        assert_eq!(user.toys[0].name, "u_toy_1");
        assert_eq!(user.company.name, "company-u");
        assert_eq!(user.manager.as_ref().unwrap().name, "u_manager");
        assert_eq!(user.team[1].name, "u_team_2");
        assert_eq!(user.languages[0].code, "u_locale_1");
        assert_eq!(user.languages[0].name, "u_locale_1");
        assert_eq!(user.friends[0].name, "u_friend_1");
        assert_eq!(user.named_pet.as_ref().unwrap().name, "u_namepet");
    }

    #[test]
    fn test_counts_follow_config() {
        let config = FixtureConfig {
            pets: 3,
            toys: 1,
            languages: 4,
            ..Default::default()
        };
        let user = get_user("c", config);
        assert_eq!(user.pets.len(), 3);
        assert_eq!(user.toys.len(), 1);
        assert_eq!(user.languages.len(), 4);
        assert!(user.team.is_empty());
    }

    #[test]
    fn test_nested_users_are_bare() {
        let user = get_user("n", FixtureConfig::full());
        let manager = user.manager.unwrap();
        assert!(manager.manager.is_none());
        assert!(manager.pets.is_empty());
        assert!(user.team.iter().all(|m| m.friends.is_empty()));
    }
}
