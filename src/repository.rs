//! Repository pattern for data access.
//!
//! The [`EmailRepository`] trait is the seam between orchestration and the
//! SQLite store: services hold a boxed repository so tests can substitute a
//! stub without a database.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::db::Database;
use crate::error::Result;
use crate::models::{BatchOutcome, EmailChanges, EmailRecord, LocationUpdate, NewEmailRecord};

/// Data-access operations for email records.
#[async_trait]
pub trait EmailRepository: Send + Sync {
    /// Every record, most recently sent first.
    async fn list_all(&self) -> Result<Vec<EmailRecord>>;

    /// Unclassified records, most recently sent first.
    async fn list_pending(&self) -> Result<Vec<EmailRecord>>;

    /// Records sent on or after the ISO lower bound (loose pre-filter).
    async fn list_since(&self, lower_bound: &str) -> Result<Vec<EmailRecord>>;

    /// Fetch one record, or `None` when the id is unknown.
    async fn get_by_id(&self, id: &str) -> Result<Option<EmailRecord>>;

    /// Insert a record; the store assigns id and timestamps.
    async fn insert(&self, new_email: NewEmailRecord) -> Result<EmailRecord>;

    /// Apply a partial update and return the updated record.
    async fn update(&self, id: &str, changes: EmailChanges) -> Result<EmailRecord>;

    /// Apply independent location updates. Items are not a transaction:
    /// each succeeds or fails on its own and nothing is rolled back.
    async fn update_batch(&self, updates: &[LocationUpdate]) -> Result<BatchOutcome>;

    /// Delete a record immediately and unconditionally.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// SQLite-backed repository over the pooled [`Database`].
pub struct SqliteEmailRepository {
    database: Database,
}

impl SqliteEmailRepository {
    /// Wrap an open database.
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl EmailRepository for SqliteEmailRepository {
    async fn list_all(&self) -> Result<Vec<EmailRecord>> {
        self.database.list_emails()
    }

    async fn list_pending(&self) -> Result<Vec<EmailRecord>> {
        self.database.list_pending_emails()
    }

    async fn list_since(&self, lower_bound: &str) -> Result<Vec<EmailRecord>> {
        self.database.list_emails_since(lower_bound)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<EmailRecord>> {
        self.database.get_email(id)
    }

    async fn insert(&self, new_email: NewEmailRecord) -> Result<EmailRecord> {
        self.database.insert_email(&new_email)
    }

    async fn update(&self, id: &str, changes: EmailChanges) -> Result<EmailRecord> {
        self.database.update_email(id, &changes)
    }

    async fn update_batch(&self, updates: &[LocationUpdate]) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();

        for update in updates {
            let changes = EmailChanges {
                state_code: Some(update.state_code.clone()),
                municipality: Some(update.municipality.clone()),
                // Classified iff both fields are present and non-empty.
                classified: Some(
                    !update.state_code.is_empty() && !update.municipality.is_empty(),
                ),
                ..EmailChanges::default()
            };

            match self.database.update_email(&update.id, &changes) {
                Ok(_) => {
                    debug!(email_id = %update.id, "batch item applied");
                    outcome.applied.push(update.id.clone());
                }
                Err(err) => {
                    warn!(email_id = %update.id, error = %err, "batch item failed");
                    outcome.failed.push((update.id.clone(), err.to_string()));
                }
            }
        }

        Ok(outcome)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.database.delete_email(id)
    }
}
