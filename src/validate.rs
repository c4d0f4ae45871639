//! # Request Validation
//!
//! Turns untyped request input (JSON bodies, query maps, path segments) into the typed
//! payloads [`crate::UserService`] accepts.  The service trusts these values completely,
//! so every constraint lives here:
//!
//! - path ids are positive integral numbers
//! - `name` and `username` are non-empty strings
//! - `email` is a syntactically valid address
//! - `website`, when given, is an absolute URL
//! - `address` and `company`, when given, are complete objects of strings
//!
//! All problems with one input are collected into a single [`ValidationError`].
//!
//! ```rust
//! use userfacade::validate_create_body;
//! use serde_json::json;
//!
//! let body = validate_create_body(&json!({
//!     "name": "Test User",
//!     "username": "testuser",
//!     "email": "test@example.com"
//! }))
//! .unwrap();
//! assert_eq!(body.username, "testuser");
//!
//! let err = validate_create_body(&json!({"name": "Test User"})).unwrap_err();
//! assert_eq!(err.issues.len(), 2);
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{Address, Company, CreateUserBody, Geo, UpdateUserBody, UserQuery};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9_'+\-]+(\.[A-Za-z0-9_'+\-]+)*@([A-Za-z0-9]([A-Za-z0-9\-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$",
    )
    .expect("email pattern compiles")
});

/// One failed constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted path of the offending field; empty for the input as a whole.
    pub path: String,
    /// What was wrong.
    pub message: String,
}

/// Every constraint an input failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed{}", summarize(.issues))]
pub struct ValidationError {
    /// The individual failures, in field order.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// True when some issue is reported at `path`.
    pub fn has_issue_at(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }
}

fn summarize(issues: &[ValidationIssue]) -> String {
    let mut summary = String::new();
    for (idx, issue) in issues.iter().enumerate() {
        summary.push_str(if idx == 0 { ": " } else { "; " });
        if !issue.path.is_empty() {
            summary.push_str(&issue.path);
            summary.push_str(": ");
        }
        summary.push_str(&issue.message);
    }
    summary
}

/// True when `s` looks like an email address.
pub fn is_valid_email(s: &str) -> bool {
    EMAIL.is_match(s)
}

/// True when `s` parses as an absolute URL.
pub fn is_valid_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

//////////////////////////////////////////////// Checker ///////////////////////////////////////////////

#[derive(Clone, Copy)]
enum Rule {
    Any,
    NonEmpty,
    Email,
    Url,
}

impl Rule {
    fn check(self, s: &str) -> Option<&'static str> {
        match self {
            Rule::NonEmpty if s.is_empty() => Some("String must contain at least 1 character(s)"),
            Rule::Email if !is_valid_email(s) => Some("Invalid email"),
            Rule::Url if !is_valid_url(s) => Some("Invalid url"),
            _ => None,
        }
    }
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

#[derive(Default)]
struct Checker {
    issues: Vec<ValidationIssue>,
}

impl Checker {
    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    fn object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        match value {
            Value::Object(obj) => Some(obj),
            other => {
                self.push(path, format!("Expected object, received {}", value_type(other)));
                None
            }
        }
    }

    fn string(
        &mut self,
        obj: &Map<String, Value>,
        prefix: &str,
        key: &str,
        required: bool,
        rule: Rule,
    ) -> Option<String> {
        let path = join(prefix, key);
        match obj.get(key) {
            None => {
                if required {
                    self.push(path, "Required");
                }
                None
            }
            Some(Value::String(s)) => match rule.check(s) {
                Some(msg) => {
                    self.push(path, msg);
                    None
                }
                None => Some(s.clone()),
            },
            Some(other) => {
                self.push(path, format!("Expected string, received {}", value_type(other)));
                None
            }
        }
    }

    fn nested<T>(
        &mut self,
        obj: &Map<String, Value>,
        prefix: &str,
        key: &str,
        required: bool,
        check: fn(&mut Self, &Value, &str) -> Option<T>,
    ) -> Option<T> {
        let path = join(prefix, key);
        match obj.get(key) {
            None => {
                if required {
                    self.push(path, "Required");
                }
                None
            }
            Some(value) => check(self, value, &path),
        }
    }

    fn geo(&mut self, value: &Value, path: &str) -> Option<Geo> {
        let obj = self.object(value, path)?;
        let lat = self.string(obj, path, "lat", true, Rule::Any);
        let lng = self.string(obj, path, "lng", true, Rule::Any);
        Some(Geo { lat: lat?, lng: lng? })
    }

    fn address(&mut self, value: &Value, path: &str) -> Option<Address> {
        let obj = self.object(value, path)?;
        let street = self.string(obj, path, "street", true, Rule::Any);
        let suite = self.string(obj, path, "suite", true, Rule::Any);
        let city = self.string(obj, path, "city", true, Rule::Any);
        let zipcode = self.string(obj, path, "zipcode", true, Rule::Any);
        let geo = self.nested(obj, path, "geo", true, Self::geo);
        Some(Address {
            street: street?,
            suite: suite?,
            city: city?,
            zipcode: zipcode?,
            geo: geo?,
        })
    }

    fn company(&mut self, value: &Value, path: &str) -> Option<Company> {
        let obj = self.object(value, path)?;
        let name = self.string(obj, path, "name", true, Rule::Any);
        let catch_phrase = self.string(obj, path, "catchPhrase", true, Rule::Any);
        let bs = self.string(obj, path, "bs", true, Rule::Any);
        Some(Company {
            name: name?,
            catch_phrase: catch_phrase?,
            bs: bs?,
        })
    }

    fn user_fields(&mut self, obj: &Map<String, Value>, required: bool) -> UpdateUserBody {
        UpdateUserBody {
            name: self.string(obj, "", "name", required, Rule::NonEmpty),
            username: self.string(obj, "", "username", required, Rule::NonEmpty),
            email: self.string(obj, "", "email", required, Rule::Email),
            phone: self.string(obj, "", "phone", false, Rule::Any),
            website: self.string(obj, "", "website", false, Rule::Url),
            address: self.nested(obj, "", "address", false, Self::address),
            company: self.nested(obj, "", "company", false, Self::company),
        }
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.issues.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError {
                issues: self.issues,
            })
        }
    }
}

////////////////////////////////////////////// Validators //////////////////////////////////////////////

/// Largest id accepted in numeric (non-decimal-integer) notation; beyond it `f64` loses precision.
const MAX_EXACT_ID: f64 = 9_007_199_254_740_991.0;

/// Validates a path id.  Any numeric form with an integral value greater than zero is
/// accepted, so `7`, `7.0` and `7e0` name the same user.
pub fn validate_user_id(raw: &str) -> Result<u64, ValidationError> {
    let mut checker = Checker::default();
    let trimmed = raw.trim();
    if let Ok(id) = trimmed.parse::<u64>() {
        if id > 0 {
            return Ok(id);
        }
        checker.push("id", "Number must be greater than 0");
        return checker.finish(0);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if !n.is_finite() || n.abs() > MAX_EXACT_ID => {
            checker.push("id", "Expected a positive integer")
        }
        Ok(n) if n.fract() != 0.0 => checker.push("id", "Expected integer, received float"),
        Ok(n) if n <= 0.0 => checker.push("id", "Number must be greater than 0"),
        Ok(n) => return Ok(n as u64),
        Err(_) => checker.push("id", "Expected a positive integer"),
    }
    checker.finish(0)
}

/// Validates list filters.  Unknown keys are ignored and an empty username is no filter.
pub fn validate_query(params: &HashMap<String, String>) -> Result<UserQuery, ValidationError> {
    let mut checker = Checker::default();
    let username = params.get("username").filter(|u| !u.is_empty()).cloned();
    let email = match params.get("email") {
        Some(email) if !is_valid_email(email) => {
            checker.push("email", "Invalid email");
            None
        }
        other => other.cloned(),
    };
    checker.finish(UserQuery { username, email })
}

/// Validates a creation body.
pub fn validate_create_body(value: &Value) -> Result<CreateUserBody, ValidationError> {
    let mut checker = Checker::default();
    let Some(obj) = checker.object(value, "") else {
        return checker.finish(CreateUserBody::default());
    };
    let fields = checker.user_fields(obj, true);
    checker.finish(CreateUserBody {
        name: fields.name.unwrap_or_default(),
        username: fields.username.unwrap_or_default(),
        email: fields.email.unwrap_or_default(),
        phone: fields.phone,
        website: fields.website,
        address: fields.address,
        company: fields.company,
    })
}

/// Validates a partial update body.  Every field is optional.
pub fn validate_update_body(value: &Value) -> Result<UpdateUserBody, ValidationError> {
    let mut checker = Checker::default();
    let Some(obj) = checker.object(value, "") else {
        return checker.finish(UpdateUserBody::default());
    };
    let fields = checker.user_fields(obj, false);
    checker.finish(fields)
}
