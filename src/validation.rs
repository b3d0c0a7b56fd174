//! Field-level validation of customer payloads.
//!
//! Each field carries an ordered list of rules. Every field is checked and
//! the first failing rule of each field is reported, so one request can
//! surface several violations at once.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::{CustomerChanges, FieldViolation, NewCustomer};

pub const CUSTOMER_ID_LENGTH: usize = 5;
pub const COMPANY_NAME_MAX: usize = 40;
pub const CONTACT_NAME_MAX: usize = 30;
pub const CONTACT_TITLE_MAX: usize = 30;
pub const ADDRESS_MAX: usize = 60;
pub const CITY_MAX: usize = 15;
pub const REGION_MAX: usize = 15;
pub const POSTAL_CODE_MAX: usize = 10;
pub const COUNTRY_MAX: usize = 15;
pub const PHONE_MAX: usize = 24;
pub const FAX_MAX: usize = 24;
pub const CONTACT_EMAIL_MAX: usize = 100;

// RFC 5322 simplified: local@domain.tld
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern compiles")
});

/// A single predicate applied to a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// The field must be present.
    Required,
    /// The value must contain a non-whitespace character.
    NotBlank,
    /// The value must have exactly this many characters.
    ExactLength(usize),
    /// The value may have at most this many characters.
    MaxLength(usize),
    /// The value must not contain NUL, which PostgreSQL text cannot store.
    NoNul,
    /// The value must look like an email address.
    Email,
}

impl Rule {
    /// Returns the violation message when `value` breaks the rule.
    ///
    /// Absent values only fail `Required`; every other rule applies to
    /// present values.
    pub fn check(&self, value: Option<&str>) -> Option<String> {
        let Some(value) = value else {
            return match self {
                Rule::Required => Some("is required".to_string()),
                _ => None,
            };
        };

        let length = value.chars().count();
        match *self {
            Rule::Required => None,
            Rule::NotBlank if value.trim().is_empty() => Some("must not be empty".to_string()),
            Rule::NoNul if value.contains('\0') => {
                Some("must not contain NUL characters".to_string())
            }
            Rule::ExactLength(n) if length != n => {
                Some(format!("must be exactly {} characters", n))
            }
            Rule::MaxLength(n) if length > n => Some(format!("must be at most {} characters", n)),
            Rule::Email if !is_valid_email(value) => {
                Some("must be a well-formed email address".to_string())
            }
            _ => None,
        }
    }
}

/// Rules shared by create and update for the descriptive fields.
const DESCRIPTIVE_RULES: [(&str, &[Rule]); 10] = [
    ("contactName", &[Rule::NoNul, Rule::MaxLength(CONTACT_NAME_MAX)]),
    ("contactTitle", &[Rule::NoNul, Rule::MaxLength(CONTACT_TITLE_MAX)]),
    ("address", &[Rule::NoNul, Rule::MaxLength(ADDRESS_MAX)]),
    ("city", &[Rule::NoNul, Rule::MaxLength(CITY_MAX)]),
    ("region", &[Rule::NoNul, Rule::MaxLength(REGION_MAX)]),
    ("postalCode", &[Rule::NoNul, Rule::MaxLength(POSTAL_CODE_MAX)]),
    ("country", &[Rule::NoNul, Rule::MaxLength(COUNTRY_MAX)]),
    ("phone", &[Rule::NoNul, Rule::MaxLength(PHONE_MAX)]),
    ("fax", &[Rule::NoNul, Rule::MaxLength(FAX_MAX)]),
    (
        "contactEmail",
        &[Rule::NoNul, Rule::Email, Rule::MaxLength(CONTACT_EMAIL_MAX)],
    ),
];

const CUSTOMER_ID_RULES: &[Rule] = &[
    Rule::Required,
    Rule::NoNul,
    Rule::ExactLength(CUSTOMER_ID_LENGTH),
];

const COMPANY_NAME_RULES: &[Rule] = &[
    Rule::Required,
    Rule::NotBlank,
    Rule::NoNul,
    Rule::MaxLength(COMPANY_NAME_MAX),
];

fn first_violation(field: &str, value: Option<&str>, rules: &[Rule]) -> Option<FieldViolation> {
    rules
        .iter()
        .find_map(|rule| rule.check(value))
        .map(|message| FieldViolation::new(field, message))
}

fn descriptive_violations(values: [Option<&str>; 10]) -> Vec<FieldViolation> {
    DESCRIPTIVE_RULES
        .iter()
        .zip(values)
        .filter_map(|((field, rules), value)| first_violation(field, value, rules))
        .collect()
}

/// Validates a create request.
pub fn validate_new_customer(request: &NewCustomer) -> Result<(), Vec<FieldViolation>> {
    let mut violations = Vec::new();

    violations.extend(first_violation(
        "customerId",
        request.customer_id.as_deref(),
        CUSTOMER_ID_RULES,
    ));
    violations.extend(first_violation(
        "companyName",
        request.company_name.as_deref(),
        COMPANY_NAME_RULES,
    ));
    violations.extend(descriptive_violations([
        request.contact_name.as_deref(),
        request.contact_title.as_deref(),
        request.address.as_deref(),
        request.city.as_deref(),
        request.region.as_deref(),
        request.postal_code.as_deref(),
        request.country.as_deref(),
        request.phone.as_deref(),
        request.fax.as_deref(),
        request.contact_email.as_deref(),
    ]));

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Validates the supplied fields of an update request.
///
/// Omitted fields are not checked. `companyName` can be replaced but never
/// cleared, so an explicit `null` is rejected.
pub fn validate_changes(changes: &CustomerChanges) -> Result<(), Vec<FieldViolation>> {
    let mut violations = Vec::new();

    if let Some(company_name) = &changes.company_name {
        violations.extend(first_violation(
            "companyName",
            company_name.as_deref(),
            COMPANY_NAME_RULES,
        ));
    }

    fn supplied(change: &Option<Option<String>>) -> Option<&str> {
        change.as_ref().and_then(|value| value.as_deref())
    }

    violations.extend(descriptive_violations([
        supplied(&changes.contact_name),
        supplied(&changes.contact_title),
        supplied(&changes.address),
        supplied(&changes.city),
        supplied(&changes.region),
        supplied(&changes.postal_code),
        supplied(&changes.country),
        supplied(&changes.phone),
        supplied(&changes.fax),
        supplied(&changes.contact_email),
    ]));

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Checks email syntax against a simplified RFC 5322 pattern.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}
