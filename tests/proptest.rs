use std::sync::Arc;

use proptest::prelude::*;

use userfacade::{CreateUserBody, StaticUserApi, UpdateUserBody, User, UserQuery, UserService};

/// Property test strategies for generating test data
pub mod strategies {
    use super::*;
    use proptest::collection::{btree_set, vec};
    use proptest::string::string_regex;

    /// Strategy for ASCII usernames
    pub fn username_strategy() -> impl Strategy<Value = String> {
        string_regex(r"[A-Za-z][A-Za-z0-9_.]{0,11}").unwrap()
    }

    /// Strategy for simple email addresses
    pub fn email_strategy() -> impl Strategy<Value = String> {
        string_regex(r"[A-Za-z0-9]{1,8}@[a-z]{1,6}\.(com|org|net|biz)").unwrap()
    }

    /// Strategy for a non-empty listing with distinct ids in upstream order
    pub fn listing_strategy() -> impl Strategy<Value = Vec<User>> {
        (1usize..12)
            .prop_flat_map(|len| {
                (
                    btree_set(1u64..10_000, len),
                    vec((username_strategy(), email_strategy()), len),
                )
            })
            .prop_flat_map(|(ids, fields)| {
                let users: Vec<User> = ids
                    .into_iter()
                    .zip(fields)
                    .map(|(id, (username, email))| User {
                        id,
                        name: format!("User {}", id),
                        username,
                        email,
                        ..Default::default()
                    })
                    .collect();
                Just(users).prop_shuffle()
            })
    }

    /// Flips the ASCII case of characters selected by `mask`
    pub fn recase(s: &str, mask: &[bool]) -> String {
        s.chars()
            .zip(mask.iter().cycle())
            .map(|(c, flip)| {
                if *flip {
                    if c.is_ascii_uppercase() {
                        c.to_ascii_lowercase()
                    } else {
                        c.to_ascii_uppercase()
                    }
                } else {
                    c
                }
            })
            .collect()
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn service_over(users: Vec<User>) -> UserService {
    UserService::new(Arc::new(StaticUserApi::new(users)))
}

proptest! {
    #[test]
    fn unfiltered_find_is_the_listing(users in strategies::listing_strategy()) {
        let service = service_over(users.clone());
        let found = runtime().block_on(service.find_users(&UserQuery::all())).unwrap();
        prop_assert_eq!(found, users);
    }

    #[test]
    fn username_filter_ignores_case(
        users in strategies::listing_strategy(),
        pick in any::<prop::sample::Index>(),
        mask in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        let target = pick.get(&users).clone();
        let query = UserQuery {
            username: Some(strategies::recase(&target.username, &mask)),
            email: None,
        };
        let service = service_over(users.clone());
        let found = runtime().block_on(service.find_users(&query)).unwrap();

        prop_assert!(found.contains(&target));
        for user in &found {
            prop_assert_eq!(user.username.to_lowercase(), target.username.to_lowercase());
        }
        let expected: Vec<User> = users
            .into_iter()
            .filter(|u| u.username.to_lowercase() == target.username.to_lowercase())
            .collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn filters_are_a_conjunction(
        users in strategies::listing_strategy(),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let username = a.get(&users).username.clone();
        let email = b.get(&users).email.clone();
        let query = UserQuery {
            username: Some(username.to_uppercase()),
            email: Some(email.to_lowercase()),
        };
        let service = service_over(users.clone());
        let found = runtime().block_on(service.find_users(&query)).unwrap();
        let expected: Vec<User> = users
            .into_iter()
            .filter(|u| {
                u.username.to_lowercase() == username.to_lowercase()
                    && u.email.to_lowercase() == email.to_lowercase()
            })
            .collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn created_id_is_one_past_the_max(users in strategies::listing_strategy()) {
        let max = users.iter().map(|u| u.id).max().unwrap();
        let service = service_over(users);
        let body = CreateUserBody {
            name: "A".to_string(),
            username: "b".to_string(),
            email: "a@b.com".to_string(),
            ..Default::default()
        };
        let user = runtime().block_on(service.create_user(body)).unwrap();
        prop_assert_eq!(user.id, max + 1);
    }

    #[test]
    fn empty_patch_is_identity(
        users in strategies::listing_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let target = pick.get(&users).clone();
        let service = service_over(users);
        let rt = runtime();
        let updated = rt.block_on(service.update_user(target.id, UpdateUserBody::default())).unwrap();
        prop_assert_eq!(&updated, &target);
        prop_assert_eq!(updated, rt.block_on(service.get_user(target.id)).unwrap());
    }

    #[test]
    fn delete_leaves_listing_untouched(
        users in strategies::listing_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let target = pick.get(&users).clone();
        let service = service_over(users.clone());
        let rt = runtime();
        rt.block_on(service.delete_user(target.id)).unwrap();
        prop_assert_eq!(rt.block_on(service.list_users()).unwrap(), users);
    }
}
