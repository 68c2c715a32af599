//! Core domain types for canonical contacts.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Lead status stamped onto every canonical contact, regardless of source
/// content.
pub const LEAD_STATUS_NEW: &str = "NEW";

/// Origin identifier stamped onto `origin` and `contact_origin`.
pub const CONTACT_ORIGIN: &str = "Biolite Website";

/// The CRM property used as the upsert key.
pub const ID_PROPERTY_EMAIL: &str = "email";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for pipeline run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// ContactProperties
// ---------------------------------------------------------------------------

/// The fixed property set of a canonical contact.
///
/// Every field is a string, never null: missing source data maps to the empty
/// string. A JSON `null` read back from the intermediate store is normalized
/// to `""` at deserialization time, so the invariant holds end to end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactProperties {
    #[serde(default, deserialize_with = "empty_if_null")]
    pub contact_origin: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub file_no: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub firstname: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub email: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub phone: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub nationality: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub gender: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub date_of_birth: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub message: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub patient_age_years: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub date_registered: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub hs_lead_status: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub origin: String,
}

/// Deserialize a possibly-null JSON string as `""` when null.
fn empty_if_null<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// CanonicalContact
// ---------------------------------------------------------------------------

/// A normalized contact record ready for CRM upsert.
///
/// `id` carries the row's email and `idProperty` is the literal `"email"`,
/// which is what makes the batch call an idempotent upsert-by-email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalContact {
    /// The canonical property set.
    pub properties: ContactProperties,
    /// Upsert key value (the row's email, possibly empty at this stage).
    #[serde(default, deserialize_with = "empty_if_null")]
    pub id: String,
    /// Upsert key property name.
    #[serde(rename = "idProperty", default, deserialize_with = "empty_if_null")]
    pub id_property: String,
}

impl CanonicalContact {
    /// The trimmed email identity key of this contact.
    pub fn email_key(&self) -> &str {
        self.properties.email.trim()
    }
}
