//! Orchestration services over the repository layer.
//!
//! [`EmailService`] glues together the store, the webhook adapter, the
//! validation rules and the aggregation engine. All aggregation runs in
//! memory over already-fetched rows; failures from the store propagate
//! unchanged to the caller.

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use tracing::{info, warn};

use crate::db::Database;
use crate::error::Result;
use crate::inbound::{adapt_payload, InboundPayload};
use crate::metrics::{MetricsCollector, MetricsTimer};
use crate::models::{
    BatchOutcome, DashboardStats, EmailChanges, EmailFilter, EmailRecord, LocationUpdate,
    NewEmailRecord, NewProfile, Profile, RecipientCount, Role, StateCount, TrendPoint,
};
use crate::repository::EmailRepository;
use crate::stats;
use crate::validation::InputValidator;

/// Email orchestration: CRUD, classification, ingestion and statistics.
pub struct EmailService {
    repository: Box<dyn EmailRepository>,
    metrics: MetricsCollector,
}

impl EmailService {
    /// Build a service over any repository implementation.
    #[must_use]
    pub fn new(repository: Box<dyn EmailRepository>) -> Self {
        Self {
            repository,
            metrics: MetricsCollector::default(),
        }
    }

    /// List records matching the in-memory filter, most recent first.
    pub async fn list(&self, filter: &EmailFilter) -> Result<Vec<EmailRecord>> {
        let rows = self.repository.list_all().await?;
        Ok(filter.apply(rows))
    }

    /// List unclassified records matching the filter, most recent first.
    pub async fn list_pending(&self, filter: &EmailFilter) -> Result<Vec<EmailRecord>> {
        let rows = self.repository.list_pending().await?;
        Ok(filter.apply(rows))
    }

    /// Fetch one record.
    pub async fn get(&self, id: &str) -> Result<Option<EmailRecord>> {
        self.repository.get_by_id(id).await
    }

    /// Create a manually entered record. The form requires a location, so
    /// the record is stored classified; validation stops at the first
    /// violated rule, before any store call.
    pub async fn create_manual(&self, mut new_email: NewEmailRecord) -> Result<EmailRecord> {
        InputValidator::validate_manual_entry(&new_email)?;

        new_email.classified = true;
        let timer = MetricsTimer::new(self.metrics.clone(), "insert");
        let inserted = self.repository.insert(new_email).await;
        timer.finish(inserted.is_ok());

        let record = inserted?;
        self.metrics.record_ingest("manual", true);
        info!(email_id = %record.id, "manual email record created");

        Ok(record)
    }

    /// Store a webhook payload. The adapter rejects incomplete payloads
    /// before anything is written; accepted records arrive unclassified.
    pub async fn ingest(&self, payload: &InboundPayload, system_address: &str) -> Result<EmailRecord> {
        let new_email = adapt_payload(payload, system_address).inspect_err(|err| {
            self.metrics.record_ingest("webhook", false);
            warn!(error = %err, "inbound payload rejected");
        })?;

        let record = self.repository.insert(new_email).await?;
        self.metrics.record_ingest("webhook", true);
        info!(email_id = %record.id, sender = %record.sender, "inbound email stored");

        Ok(record)
    }

    /// Assign or correct the location of one record.
    ///
    /// The classified flag is recomputed here: true iff both fields are
    /// non-empty (the invariant is enforced at the point of update).
    pub async fn classify(&self, id: &str, state_code: &str, municipality: &str) -> Result<EmailRecord> {
        InputValidator::validate_location(state_code, municipality)?;

        let changes = EmailChanges {
            state_code: Some(state_code.to_string()),
            municipality: Some(municipality.to_string()),
            classified: Some(!state_code.is_empty() && !municipality.is_empty()),
            ..EmailChanges::default()
        };

        self.repository.update(id, changes).await
    }

    /// Apply a generic partial update.
    pub async fn update(&self, id: &str, changes: EmailChanges) -> Result<EmailRecord> {
        self.repository.update(id, changes).await
    }

    /// Persist a batch of pending classification edits.
    ///
    /// Entries missing either field are dropped BEFORE the store is called
    /// (they were never complete edits); the rest fan out as independent
    /// updates. The outcome reports which ids failed — best effort, not a
    /// transaction.
    pub async fn save_pending(&self, updates: Vec<LocationUpdate>) -> Result<BatchOutcome> {
        let complete: Vec<LocationUpdate> = updates
            .into_iter()
            .filter(|update| !update.state_code.is_empty() && !update.municipality.is_empty())
            .collect();

        if complete.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let outcome = self.repository.update_batch(&complete).await?;
        if !outcome.is_complete() {
            warn!(
                failed = outcome.failed.len(),
                applied = outcome.applied.len(),
                "batch save finished with failures"
            );
        }

        Ok(outcome)
    }

    /// Delete one record, immediately and unconditionally.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.repository.delete(id).await?;
        info!(email_id = %id, "email record deleted");
        Ok(())
    }

    /// Dashboard totals over all records.
    pub async fn stats(&self) -> Result<DashboardStats> {
        let rows = self.repository.list_all().await?;
        Ok(stats::dashboard_stats(&rows))
    }

    /// Per-state counts over all records, most frequent first.
    pub async fn counts_by_state(&self) -> Result<Vec<StateCount>> {
        let rows = self.repository.list_all().await?;
        Ok(stats::counts_by_state(&rows))
    }

    /// Most frequent recipients over all records.
    pub async fn top_recipients(&self) -> Result<Vec<RecipientCount>> {
        let rows = self.repository.list_all().await?;
        Ok(stats::top_recipients(&rows, stats::DEFAULT_TOP_RECIPIENTS))
    }

    /// Seven-day send trend ending today, in the local timezone.
    pub async fn trend(&self) -> Result<Vec<TrendPoint>> {
        self.trend_at(&Local::now()).await
    }

    /// Seven-day send trend ending on the calendar date of `now`.
    ///
    /// Rows are pre-filtered with a loose lower bound (seven days before
    /// `now`); the engine re-buckets by calendar day, so rows the loose
    /// filter lets through outside the window are ignored there.
    pub async fn trend_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<Vec<TrendPoint>> {
        let lower_bound = (now.clone() - Duration::days(7))
            .with_timezone(&Utc)
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string();

        let rows = self.repository.list_since(&lower_bound).await?;
        Ok(stats::send_trend(&rows, now))
    }
}

/// Profile orchestration: thin validation + store pass-through.
pub struct ProfileService {
    database: Database,
}

impl ProfileService {
    /// Build a service over an open database.
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Register an operator profile (signup path).
    pub fn create(&self, new_profile: NewProfile) -> Result<Profile> {
        InputValidator::validate_profile(&new_profile)?;
        let profile = self.database.insert_profile(&new_profile)?;
        info!(profile_id = %profile.id, "profile created");
        Ok(profile)
    }

    /// Fetch a profile.
    pub fn get(&self, id: &str) -> Result<Option<Profile>> {
        self.database.get_profile(id)
    }

    /// Edit a profile's name, email and/or role. Profiles are never
    /// deleted by this subsystem.
    pub fn update(
        &self,
        id: &str,
        name: Option<&str>,
        email: Option<&str>,
        role: Option<Role>,
    ) -> Result<Profile> {
        if let Some(email) = email {
            InputValidator::validate_email_address(email)?;
        }
        self.database.update_profile(id, name, email, role)
    }
}
