use serde::{Deserialize, Serialize};

///////////////////////////////////////////////// Geo //////////////////////////////////////////////////

/// Decimal coordinates, kept as text exactly as the upstream reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geo {
    /// Latitude.
    pub lat: String,
    /// Longitude.
    pub lng: String,
}

/////////////////////////////////////////////// Address ////////////////////////////////////////////////

/// Postal address of a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street name.
    pub street: String,
    /// Suite or apartment.
    pub suite: String,
    /// City.
    pub city: String,
    /// Postal code.
    pub zipcode: String,
    /// Coordinates of the address.
    pub geo: Geo,
}

/////////////////////////////////////////////// Company ////////////////////////////////////////////////

/// Employer of a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    /// Company name.
    pub name: String,
    /// Marketing catch phrase.
    pub catch_phrase: String,
    /// Business slogan.
    pub bs: String,
}

///////////////////////////////////////////////// User /////////////////////////////////////////////////

/// The user resource, as projected from the upstream listing.
///
/// `address` and `company` are always structurally complete.  Users synthesized by
/// [`crate::UserService::create_user`] carry [`Address::default`] and [`Company::default`]
/// unless the creation payload supplied them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier, unique within a listing and never changed after creation.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Postal address.
    pub address: Address,
    /// Phone number.
    pub phone: String,
    /// Website.
    pub website: String,
    /// Employer.
    pub company: Company,
}

impl User {
    /// Assembles a user from validated creation input under the given identifier.
    pub fn from_create(id: u64, body: CreateUserBody) -> Self {
        Self {
            id,
            name: body.name,
            username: body.username,
            email: body.email,
            address: body.address.unwrap_or_default(),
            phone: body.phone.unwrap_or_default(),
            website: body.website.unwrap_or_default(),
            company: body.company.unwrap_or_default(),
        }
    }

    /// Applies a partial update, returning the merged user.
    ///
    /// Every field present in `patch` replaces the corresponding field.  Nested objects
    /// are replaced wholesale.  The identifier is never touched.
    pub fn merge(self, patch: UpdateUserBody) -> Self {
        Self {
            id: self.id,
            name: patch.name.unwrap_or(self.name),
            username: patch.username.unwrap_or(self.username),
            email: patch.email.unwrap_or(self.email),
            address: patch.address.unwrap_or(self.address),
            phone: patch.phone.unwrap_or(self.phone),
            website: patch.website.unwrap_or(self.website),
            company: patch.company.unwrap_or(self.company),
        }
    }

    /// True when this user passes every filter set in `query`.
    ///
    /// Both comparisons are whole-value and case-insensitive.
    pub fn matches(&self, query: &UserQuery) -> bool {
        let username_ok = query
            .username
            .as_deref()
            .is_none_or(|username| self.username.to_lowercase() == username.to_lowercase());
        let email_ok = query
            .email
            .as_deref()
            .is_none_or(|email| self.email.to_lowercase() == email.to_lowercase());
        username_ok && email_ok
    }
}

/////////////////////////////////////////////// Payloads ///////////////////////////////////////////////

/// Validated input for creating a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserBody {
    /// Display name; non-empty.
    pub name: String,
    /// Login name; non-empty.
    pub username: String,
    /// Email address; syntactically valid.
    pub email: String,
    /// Optional phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Optional website; an absolute URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Optional full address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Optional full company.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
}

/// Validated partial input for updating a user.  Absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUserBody {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New login name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// New email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// New website.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Replacement address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Replacement company.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
}

/// Filters for listing users.  `None` disables a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuery {
    /// Case-insensitive exact username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Case-insensitive exact email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserQuery {
    /// A query with no filters.
    pub fn all() -> Self {
        Self::default()
    }

    /// True when neither filter is set.
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::leanne;

    #[test]
    fn user_round_trips_upstream_json() {
        let json = serde_json::json!({
            "id": 1,
            "name": "Leanne Graham",
            "username": "Bret",
            "email": "Sincere@april.biz",
            "address": {
                "street": "Kulas Light",
                "suite": "Apt. 556",
                "city": "Gwenborough",
                "zipcode": "92998-3874",
                "geo": { "lat": "-37.3159", "lng": "81.1496" }
            },
            "phone": "1-770-736-8031 x56442",
            "website": "hildegard.org",
            "company": {
                "name": "Romaguera-Crona",
                "catchPhrase": "Multi-layered client-server neural-net",
                "bs": "harness real-time e-markets"
            }
        });
        let user: User = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(user, leanne());
        assert_eq!(serde_json::to_value(&user).unwrap(), json);
    }

    #[test]
    fn from_create_fills_defaults() {
        let body = CreateUserBody {
            name: "A".to_string(),
            username: "b".to_string(),
            email: "a@b.com".to_string(),
            ..Default::default()
        };
        let user = User::from_create(11, body);
        assert_eq!(user.id, 11);
        assert_eq!(user.phone, "");
        assert_eq!(user.website, "");
        assert_eq!(user.address, Address::default());
        assert_eq!(user.address.geo, Geo::default());
        assert_eq!(user.company, Company::default());
    }

    #[test]
    fn from_create_keeps_supplied_nested_objects() {
        let body = CreateUserBody {
            name: "A".to_string(),
            username: "b".to_string(),
            email: "a@b.com".to_string(),
            company: Some(leanne().company),
            ..Default::default()
        };
        let user = User::from_create(2, body);
        assert_eq!(user.company, leanne().company);
        assert_eq!(user.address, Address::default());
    }

    #[test]
    fn merge_empty_patch_is_identity() {
        assert_eq!(leanne().merge(UpdateUserBody::default()), leanne());
    }

    #[test]
    fn merge_overwrites_only_present_fields() {
        let patch = UpdateUserBody {
            name: Some("X".to_string()),
            ..Default::default()
        };
        let merged = leanne().merge(patch);
        let mut expected = leanne();
        expected.name = "X".to_string();
        assert_eq!(merged, expected);
    }

    #[test]
    fn merge_replaces_nested_objects_wholesale() {
        let patch = UpdateUserBody {
            address: Some(Address {
                city: "Elsewhere".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = leanne().merge(patch);
        assert_eq!(merged.address.city, "Elsewhere");
        assert_eq!(merged.address.street, "");
        assert_eq!(merged.address.geo, Geo::default());
        assert_eq!(merged.company, leanne().company);
    }

    #[test]
    fn matches_is_case_insensitive_and_exact() {
        let user = leanne();
        let by_username = |u: &str| UserQuery {
            username: Some(u.to_string()),
            email: None,
        };
        assert!(user.matches(&by_username("bret")));
        assert!(user.matches(&by_username("BRET")));
        assert!(!user.matches(&by_username("bre")));
        assert!(!user.matches(&by_username("brett")));
        assert!(user.matches(&UserQuery::all()));
    }

    #[test]
    fn matches_requires_both_filters() {
        let user = leanne();
        let query = UserQuery {
            username: Some("bret".to_string()),
            email: Some("someone@else.com".to_string()),
        };
        assert!(!user.matches(&query));
        let query = UserQuery {
            username: Some("bret".to_string()),
            email: Some("SINCERE@APRIL.BIZ".to_string()),
        };
        assert!(user.matches(&query));
    }
}
