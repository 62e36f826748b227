//! Data models for email triage and classification
//!
//! This module contains all data structures used throughout the application,
//! including email records, operator profiles, reference-data entities and
//! the derived dashboard shapes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An email record, captured by the inbound webhook or entered manually.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRecord {
    /// Opaque unique identifier (server assigned)
    pub id: String,
    /// Sender address
    pub sender: String,
    /// One or more recipient addresses, serialized as a comma-separated string
    pub recipient: String,
    /// Subject line
    pub subject: String,
    /// Message body (plain text), if any
    pub body: Option<String>,
    /// Send timestamp, ISO-8601 text for an absolute instant
    pub sent_at: String,
    /// Assigned state code (UF), if classified
    pub state_code: Option<String>,
    /// Assigned municipality name, if classified
    pub municipality: Option<String>,
    /// True once a state and municipality have been assigned
    pub classified: bool,
    /// Profile id of the operator that created the record, if entered manually
    pub created_by: Option<String>,
    /// Timestamp when the record was created
    pub created_at: NaiveDateTime,
    /// Timestamp when the record was last updated
    pub updated_at: NaiveDateTime,
}

/// Data for creating a new email record (id and timestamps are assigned by the store)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmailRecord {
    /// Sender address
    pub sender: String,
    /// Consolidated recipient string
    pub recipient: String,
    /// Subject line
    pub subject: String,
    /// Message body, if any
    pub body: Option<String>,
    /// Send timestamp, ISO-8601 text
    pub sent_at: String,
    /// State code, required for manual entry, absent for webhook captures
    pub state_code: Option<String>,
    /// Municipality name, required for manual entry, absent for webhook captures
    pub municipality: Option<String>,
    /// True iff both location fields are present
    pub classified: bool,
    /// Creating operator, if any
    pub created_by: Option<String>,
}

/// Partial update for an email record; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct EmailChanges {
    /// New sender address
    pub sender: Option<String>,
    /// New recipient string
    pub recipient: Option<String>,
    /// New subject line
    pub subject: Option<String>,
    /// New body text
    pub body: Option<String>,
    /// New send timestamp
    pub sent_at: Option<String>,
    /// New state code
    pub state_code: Option<String>,
    /// New municipality name
    pub municipality: Option<String>,
    /// New classified flag
    pub classified: Option<bool>,
}

/// One item of a batch classification request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationUpdate {
    /// Target record id
    pub id: String,
    /// State code to assign
    pub state_code: String,
    /// Municipality name to assign
    pub municipality: String,
}

/// Aggregate outcome of a batch update; items are applied independently
/// and a failure does not roll back the others.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Ids updated successfully
    pub applied: Vec<String>,
    /// Ids that failed, with the store's message
    pub failed: Vec<(String, String)>,
}

impl BatchOutcome {
    /// True when every item was applied.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Operator role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Administrator account
    Admin,
    /// Regular operator account
    Collaborator,
}

impl Role {
    /// Database representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Collaborator => "collaborator",
        }
    }

    /// Parse a database representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "collaborator" => Some(Self::Collaborator),
            _ => None,
        }
    }
}

/// An operator/admin account, keyed by an external identity id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// External identity id
    pub id: String,
    /// Display name
    pub name: String,
    /// Account email address
    pub email: String,
    /// Account role
    pub role: Role,
    /// Timestamp when the profile was created
    pub created_at: NaiveDateTime,
    /// Timestamp when the profile was last updated
    pub updated_at: NaiveDateTime,
}

/// Data for creating a new profile
#[derive(Debug, Clone)]
pub struct NewProfile {
    /// External identity id
    pub id: String,
    /// Display name
    pub name: String,
    /// Account email address
    pub email: String,
    /// Account role
    pub role: Role,
}

/// First-level geographic subdivision (Brazilian state), as served by the
/// IBGE localidades API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    /// IBGE numeric id
    pub id: u32,
    /// Two-letter state code (UF)
    pub sigla: String,
    /// Display name
    pub nome: String,
}

/// Second-level geographic subdivision (municipality).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Municipality {
    /// IBGE numeric id; some API responses omit it
    #[serde(default)]
    pub id: u64,
    /// Display name
    pub nome: String,
    /// Owning state code; filled in by the client, the API omits it
    #[serde(default)]
    pub state_code: String,
}

/// Dashboard totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// All records
    pub total: usize,
    /// Records with a state and municipality assigned
    pub classified: usize,
    /// Records still awaiting classification
    pub pending: usize,
}

/// Per-state record count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateCount {
    /// State code
    pub state_code: String,
    /// Number of records assigned to it
    pub count: usize,
}

/// Recipient frequency entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientCount {
    /// Display form of the address (first-seen casing)
    pub address: String,
    /// Number of occurrences across all records
    pub count: usize,
}

/// One day of the send trend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    /// Calendar date key, `YYYY-MM-DD`
    pub date: String,
    /// Number of records sent on that local date
    pub count: usize,
}

/// In-memory filter for email listings
#[derive(Debug, Clone, Default)]
pub struct EmailFilter {
    /// Case-insensitive substring matched against sender, recipient and subject
    pub search: Option<String>,
    /// Date prefix (`YYYY-MM-DD`) matched against the send timestamp
    pub date: Option<String>,
}

impl EmailFilter {
    /// True when the record passes both filters.
    #[must_use]
    pub fn matches(&self, record: &EmailRecord) -> bool {
        let matches_search = self.search.as_deref().is_none_or_empty_or(|term| {
            let term = term.to_lowercase();
            record.sender.to_lowercase().contains(&term)
                || record.recipient.to_lowercase().contains(&term)
                || record.subject.to_lowercase().contains(&term)
        });

        let matches_date = self
            .date
            .as_deref()
            .is_none_or_empty_or(|prefix| record.sent_at.starts_with(prefix));

        matches_search && matches_date
    }

    /// Apply the filter to a list of records, preserving order.
    #[must_use]
    pub fn apply(&self, records: Vec<EmailRecord>) -> Vec<EmailRecord> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Treat `None` and `""` as "no filter set".
trait OptionalFilter {
    fn is_none_or_empty_or(self, check: impl FnOnce(&str) -> bool) -> bool;
}

impl OptionalFilter for Option<&str> {
    fn is_none_or_empty_or(self, check: impl FnOnce(&str) -> bool) -> bool {
        match self {
            None => true,
            Some(value) if value.is_empty() => true,
            Some(value) => check(value),
        }
    }
}
