use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::{IntoParams, ToSchema};

// ============ Database Models ============

/// A customer master-data record.
///
/// Serialized with camelCase keys on the wire and mapped to snake_case
/// columns of the `customers` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Five character identifier, immutable once created.
    #[schema(example = "ALFKI")]
    pub customer_id: String,
    /// Legal or trading name of the company.
    #[schema(example = "Alfreds Futterkiste")]
    pub company_name: String,
    pub contact_name: Option<String>,
    pub contact_title: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub contact_email: Option<String>,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last update.
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Builds the record to persist from a validated create request.
    /// Both timestamps are set to `now`.
    pub fn from_new(request: NewCustomer, now: DateTime<Utc>) -> Self {
        Self {
            customer_id: request.customer_id.unwrap_or_default(),
            company_name: request.company_name.unwrap_or_default(),
            contact_name: request.contact_name,
            contact_title: request.contact_title,
            address: request.address,
            city: request.city,
            region: request.region,
            postal_code: request.postal_code,
            country: request.country,
            phone: request.phone,
            fax: request.fax,
            contact_email: request.contact_email,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the supplied fields of `changes` and refreshes `updated_at`.
    ///
    /// `updated_at` never moves backwards, so `created_at <= updated_at`
    /// holds even if the clock does.
    pub fn apply(&mut self, changes: &CustomerChanges, now: DateTime<Utc>) {
        if let Some(Some(name)) = &changes.company_name {
            self.company_name = name.clone();
        }
        assign(&mut self.contact_name, &changes.contact_name);
        assign(&mut self.contact_title, &changes.contact_title);
        assign(&mut self.address, &changes.address);
        assign(&mut self.city, &changes.city);
        assign(&mut self.region, &changes.region);
        assign(&mut self.postal_code, &changes.postal_code);
        assign(&mut self.country, &changes.country);
        assign(&mut self.phone, &changes.phone);
        assign(&mut self.fax, &changes.fax);
        assign(&mut self.contact_email, &changes.contact_email);
        self.updated_at = now.max(self.updated_at);
    }
}

fn assign(slot: &mut Option<String>, change: &Option<Option<String>>) {
    if let Some(value) = change {
        *slot = value.clone();
    }
}

/// Current time truncated to microseconds, the precision of `TIMESTAMPTZ`.
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

// ============ API Request Models ============

/// Body of `POST /api/customers`.
///
/// Every field is optional at the type level so that a missing
/// `customerId` or `companyName` is reported as a validation failure
/// rather than a deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    #[schema(example = "ALFKI")]
    pub customer_id: Option<String>,
    #[schema(example = "Alfreds Futterkiste")]
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub contact_title: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub contact_email: Option<String>,
}

/// Body of `PUT /api/customers/{id}`.
///
/// Outer `None`: field omitted, left unchanged.
/// `Some(None)`: explicit `null`, field cleared.
/// `Some(Some(v))`: field replaced with `v`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerChanges {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub company_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub contact_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub contact_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub region: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub postal_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub fax: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub contact_email: Option<Option<String>>,
}

/// Marks a key that appeared in the body, even with a `null` value.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Query parameters of `GET /api/customers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CustomerSearch {
    /// Case-insensitive substring of the company name.
    pub company_name: Option<String>,
    /// Case-insensitive substring of the contact name.
    pub contact_name: Option<String>,
    /// Case-insensitive substring of the contact email.
    pub contact_email: Option<String>,
    /// Case-insensitive substring of the phone number.
    pub phone: Option<String>,
}

impl CustomerSearch {
    /// Drops blank parameters so `?companyName=` behaves like an omitted one.
    pub fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        Self {
            company_name: keep(self.company_name),
            contact_name: keep(self.contact_name),
            contact_email: keep(self.contact_email),
            phone: keep(self.phone),
        }
    }

    /// False when a parameter holds NUL. Stored text never contains it, so
    /// such a filter matches nothing.
    pub fn can_match(&self) -> bool {
        [
            &self.company_name,
            &self.contact_name,
            &self.contact_email,
            &self.phone,
        ]
        .into_iter()
        .flatten()
        .all(|value| !value.contains('\0'))
    }

    /// True when every supplied parameter is contained in its column.
    pub fn matches(&self, customer: &Customer) -> bool {
        contains_ci(Some(&customer.company_name), self.company_name.as_deref())
            && contains_ci(customer.contact_name.as_deref(), self.contact_name.as_deref())
            && contains_ci(
                customer.contact_email.as_deref(),
                self.contact_email.as_deref(),
            )
            && contains_ci(customer.phone.as_deref(), self.phone.as_deref())
    }
}

fn contains_ci(column: Option<&str>, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(needle) => column
            .map(|value| value.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false),
    }
}

// ============ API Response Models ============

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldViolation {
    /// Wire name of the offending field.
    pub field: String,
    /// Why the value was rejected.
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// JSON body returned for every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// HTTP status code.
    #[schema(example = 404)]
    pub status: u16,
    /// Canonical reason phrase of the status.
    #[schema(example = "Not Found")]
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldViolation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Customer {
        let now = current_timestamp();
        Customer::from_new(
            NewCustomer {
                customer_id: Some("ALFKI".into()),
                company_name: Some("Alfreds Futterkiste".into()),
                contact_name: Some("Maria Anders".into()),
                phone: Some("030-0074321".into()),
                ..Default::default()
            },
            now,
        )
    }

    #[test]
    fn test_from_new_stamps_equal_timestamps() {
        let customer = sample();
        assert_eq!(customer.created_at, customer.updated_at);
        assert_eq!(customer.customer_id, "ALFKI");
    }

    #[test]
    fn test_changes_distinguish_omitted_from_null() {
        let changes: CustomerChanges =
            serde_json::from_str(r#"{"contactName": null, "city": "Berlin"}"#).unwrap();
        assert_eq!(changes.contact_name, Some(None));
        assert_eq!(changes.city, Some(Some("Berlin".to_string())));
        assert_eq!(changes.phone, None);
    }

    #[test]
    fn test_apply_touches_only_supplied_fields() {
        let mut customer = sample();
        let before = customer.clone();
        let changes: CustomerChanges =
            serde_json::from_str(r#"{"contactName": null, "city": "Berlin"}"#).unwrap();

        customer.apply(&changes, before.updated_at + Duration::seconds(1));

        assert_eq!(customer.contact_name, None);
        assert_eq!(customer.city.as_deref(), Some("Berlin"));
        assert_eq!(customer.phone, before.phone);
        assert_eq!(customer.company_name, before.company_name);
        assert_eq!(customer.created_at, before.created_at);
        assert!(customer.updated_at > before.updated_at);
    }

    #[test]
    fn test_apply_never_moves_updated_at_backwards() {
        let mut customer = sample();
        let previous = customer.updated_at;
        customer.apply(&CustomerChanges::default(), previous - Duration::hours(1));
        assert_eq!(customer.updated_at, previous);
    }

    #[test]
    fn test_search_matches_case_insensitively() {
        let customer = sample();
        let search = CustomerSearch {
            company_name: Some("FUTTER".into()),
            phone: Some("0074".into()),
            ..Default::default()
        };
        assert!(search.matches(&customer));

        let search = CustomerSearch {
            contact_email: Some("maria".into()),
            ..Default::default()
        };
        assert!(!search.matches(&customer), "null column never matches");
    }

    #[test]
    fn test_blank_search_parameters_are_dropped() {
        let search = CustomerSearch {
            company_name: Some("  ".into()),
            phone: Some("555".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(search.company_name, None);
        assert_eq!(search.phone.as_deref(), Some("555"));
    }

    #[test]
    fn test_search_with_nul_cannot_match() {
        assert!(CustomerSearch::default().can_match());

        let search = CustomerSearch {
            phone: Some("555\0".into()),
            ..Default::default()
        }
        .normalized();
        assert!(!search.can_match());
        assert!(!search.matches(&sample()));
    }

    #[test]
    fn test_search_folds_non_ascii_case() {
        let mut customer = sample();
        customer.company_name = "Ärger GmbH".into();
        let search = CustomerSearch {
            company_name: Some("ärger".into()),
            ..Default::default()
        };
        assert!(search.matches(&customer));
    }
}
