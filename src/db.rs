//! Database operations and connection pooling.
//!
//! Wraps a pooled SQLite database holding the three table groups this
//! application owns: email records, operator profiles and the geographic
//! reference snapshot. Store failures are propagated verbatim to the
//! caller; nothing here retries.

use std::fs;
use std::path::Path;

use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, TriageError};
use crate::models::{
    EmailChanges, EmailRecord, Municipality, NewEmailRecord, NewProfile, Profile, Role, State,
};
use crate::schema::{emails, municipalities, profiles, states};

/// Type alias for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
/// Type alias for one pooled connection
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Database manager for handling connections and operations
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a new database connection pool and run migrations.
    ///
    /// Accepts a plain path or a `sqlite:`/`sqlite://` prefixed URL.
    pub fn new(database_url: &str) -> Result<Self> {
        let path = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .unwrap_or(database_url);

        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().build(manager)?;

        let conn = pool.get()?;
        Self::run_migrations(&conn)?;

        Ok(Self { pool })
    }

    /// Run database migrations
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(include_str!(
            "../migrations/2025-06-02-000000_create_profiles/up.sql"
        ))?;
        conn.execute_batch(include_str!(
            "../migrations/2025-06-02-000001_create_emails/up.sql"
        ))?;
        conn.execute_batch(include_str!(
            "../migrations/2025-06-10-000000_create_reference_tables/up.sql"
        ))?;

        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    // ------------------------------------------------------------------
    // Email records
    // ------------------------------------------------------------------

    /// Insert a new email record; the store assigns the id and timestamps.
    pub fn insert_email(&self, new_email: &NewEmailRecord) -> Result<EmailRecord> {
        let conn = self.get_connection()?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                emails::TABLE,
                emails::ID,
                emails::SENDER,
                emails::RECIPIENT,
                emails::SUBJECT,
                emails::BODY,
                emails::SENT_AT,
                emails::STATE_CODE,
                emails::MUNICIPALITY,
                emails::CLASSIFIED,
                emails::CREATED_BY,
                emails::CREATED_AT,
                emails::UPDATED_AT,
            ),
            params![
                id,
                new_email.sender,
                new_email.recipient,
                new_email.subject,
                new_email.body,
                new_email.sent_at,
                new_email.state_code,
                new_email.municipality,
                new_email.classified,
                new_email.created_by,
                now,
                now,
            ],
        )?;

        debug!(email_id = %id, "inserted email record");

        self.get_email(&id)?
            .ok_or_else(|| TriageError::NotFound(format!("email {id} vanished after insert")))
    }

    /// Get an email record by id
    pub fn get_email(&self, id: &str) -> Result<Option<EmailRecord>> {
        let conn = self.get_connection()?;

        let record = conn
            .query_row(
                &format!("SELECT * FROM {} WHERE {} = ?", emails::TABLE, emails::ID),
                params![id],
                Self::map_email,
            )
            .optional()?;

        Ok(record)
    }

    /// List every email record, most recently sent first
    pub fn list_emails(&self) -> Result<Vec<EmailRecord>> {
        self.query_emails(
            &format!(
                "SELECT * FROM {} ORDER BY {} DESC",
                emails::TABLE,
                emails::SENT_AT
            ),
            params![],
        )
    }

    /// List unclassified records, most recently sent first
    pub fn list_pending_emails(&self) -> Result<Vec<EmailRecord>> {
        self.query_emails(
            &format!(
                "SELECT * FROM {} WHERE {} = 0 ORDER BY {} DESC",
                emails::TABLE,
                emails::CLASSIFIED,
                emails::SENT_AT
            ),
            params![],
        )
    }

    /// List records whose send timestamp is on or after the given ISO lower
    /// bound. The bound is a loose pre-filter; callers doing calendar-day
    /// bucketing re-check each row.
    pub fn list_emails_since(&self, lower_bound: &str) -> Result<Vec<EmailRecord>> {
        self.query_emails(
            &format!(
                "SELECT * FROM {} WHERE {} >= ? ORDER BY {} DESC",
                emails::TABLE,
                emails::SENT_AT,
                emails::SENT_AT
            ),
            params![lower_bound],
        )
    }

    /// Apply a partial update to an email record and return the new row.
    pub fn update_email(&self, id: &str, changes: &EmailChanges) -> Result<EmailRecord> {
        let conn = self.get_connection()?;

        let mut set_clauses: Vec<String> = Vec::new();
        let mut set_params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        let mut push = |column: &str, value: Box<dyn rusqlite::ToSql>| {
            set_clauses.push(format!("{column} = ?"));
            set_params.push(value);
        };

        if let Some(sender) = &changes.sender {
            push(emails::SENDER, Box::new(sender.clone()));
        }
        if let Some(recipient) = &changes.recipient {
            push(emails::RECIPIENT, Box::new(recipient.clone()));
        }
        if let Some(subject) = &changes.subject {
            push(emails::SUBJECT, Box::new(subject.clone()));
        }
        if let Some(body) = &changes.body {
            push(emails::BODY, Box::new(body.clone()));
        }
        if let Some(sent_at) = &changes.sent_at {
            push(emails::SENT_AT, Box::new(sent_at.clone()));
        }
        if let Some(state_code) = &changes.state_code {
            push(emails::STATE_CODE, Box::new(state_code.clone()));
        }
        if let Some(municipality) = &changes.municipality {
            push(emails::MUNICIPALITY, Box::new(municipality.clone()));
        }
        if let Some(classified) = changes.classified {
            push(emails::CLASSIFIED, Box::new(classified));
        }

        // Always bump the update timestamp, even for a no-op change set.
        push(emails::UPDATED_AT, Box::new(Utc::now().naive_utc()));
        set_params.push(Box::new(id.to_string()));

        let query = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            emails::TABLE,
            set_clauses.join(", "),
            emails::ID
        );

        let changed = conn.execute(&query, rusqlite::params_from_iter(set_params.iter()))?;
        if changed == 0 {
            return Err(TriageError::NotFound(format!("email {id}")));
        }

        self.get_email(id)?
            .ok_or_else(|| TriageError::NotFound(format!("email {id}")))
    }

    /// Delete an email record. Immediate and unconditional; deleting an
    /// unknown id is reported as not found.
    pub fn delete_email(&self, id: &str) -> Result<()> {
        let conn = self.get_connection()?;

        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE {} = ?", emails::TABLE, emails::ID),
            params![id],
        )?;

        if deleted == 0 {
            return Err(TriageError::NotFound(format!("email {id}")));
        }

        Ok(())
    }

    fn query_emails<P: rusqlite::Params>(&self, query: &str, params: P) -> Result<Vec<EmailRecord>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(query)?;
        let rows = stmt.query_map(params, Self::map_email)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }

    /// Map a database row to an `EmailRecord`
    fn map_email(row: &Row) -> rusqlite::Result<EmailRecord> {
        Ok(EmailRecord {
            id: row.get(emails::ID)?,
            sender: row.get(emails::SENDER)?,
            recipient: row.get(emails::RECIPIENT)?,
            subject: row.get(emails::SUBJECT)?,
            body: row.get(emails::BODY)?,
            sent_at: row.get(emails::SENT_AT)?,
            state_code: row.get(emails::STATE_CODE)?,
            municipality: row.get(emails::MUNICIPALITY)?,
            classified: row.get(emails::CLASSIFIED)?,
            created_by: row.get(emails::CREATED_BY)?,
            created_at: row.get(emails::CREATED_AT)?,
            updated_at: row.get(emails::UPDATED_AT)?,
        })
    }

    // ------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------

    /// Insert a new operator profile. The id comes from the external
    /// identity provider, so a duplicate surfaces as a store error.
    pub fn insert_profile(&self, new_profile: &NewProfile) -> Result<Profile> {
        let conn = self.get_connection()?;
        let now = Utc::now().naive_utc();

        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?)",
                profiles::TABLE,
                profiles::ID,
                profiles::NAME,
                profiles::EMAIL,
                profiles::ROLE,
                profiles::CREATED_AT,
                profiles::UPDATED_AT,
            ),
            params![
                new_profile.id,
                new_profile.name,
                new_profile.email,
                new_profile.role.as_str(),
                now,
                now,
            ],
        )?;

        self.get_profile(&new_profile.id)?.ok_or_else(|| {
            TriageError::NotFound(format!("profile {} vanished after insert", new_profile.id))
        })
    }

    /// Get a profile by id
    pub fn get_profile(&self, id: &str) -> Result<Option<Profile>> {
        let conn = self.get_connection()?;

        let profile = conn
            .query_row(
                &format!("SELECT * FROM {} WHERE {} = ?", profiles::TABLE, profiles::ID),
                params![id],
                Self::map_profile,
            )
            .optional()?;

        Ok(profile)
    }

    /// Update a profile's display name, email and/or role. Profiles are
    /// never deleted by this subsystem.
    pub fn update_profile(
        &self,
        id: &str,
        name: Option<&str>,
        email: Option<&str>,
        role: Option<Role>,
    ) -> Result<Profile> {
        let conn = self.get_connection()?;

        let mut set_clauses: Vec<String> = Vec::new();
        let mut set_params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(name) = name {
            set_clauses.push(format!("{} = ?", profiles::NAME));
            set_params.push(Box::new(name.to_string()));
        }
        if let Some(email) = email {
            set_clauses.push(format!("{} = ?", profiles::EMAIL));
            set_params.push(Box::new(email.to_string()));
        }
        if let Some(role) = role {
            set_clauses.push(format!("{} = ?", profiles::ROLE));
            set_params.push(Box::new(role.as_str()));
        }

        set_clauses.push(format!("{} = ?", profiles::UPDATED_AT));
        set_params.push(Box::new(Utc::now().naive_utc()));
        set_params.push(Box::new(id.to_string()));

        let query = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            profiles::TABLE,
            set_clauses.join(", "),
            profiles::ID
        );

        let changed = conn.execute(&query, rusqlite::params_from_iter(set_params.iter()))?;
        if changed == 0 {
            return Err(TriageError::NotFound(format!("profile {id}")));
        }

        self.get_profile(id)?
            .ok_or_else(|| TriageError::NotFound(format!("profile {id}")))
    }

    /// Map a database row to a `Profile`
    fn map_profile(row: &Row) -> rusqlite::Result<Profile> {
        let role: String = row.get(profiles::ROLE)?;
        Ok(Profile {
            id: row.get(profiles::ID)?,
            name: row.get(profiles::NAME)?,
            email: row.get(profiles::EMAIL)?,
            role: Role::parse(&role).unwrap_or(Role::Collaborator),
            created_at: row.get(profiles::CREATED_AT)?,
            updated_at: row.get(profiles::UPDATED_AT)?,
        })
    }

    // ------------------------------------------------------------------
    // Geographic reference snapshot
    // ------------------------------------------------------------------

    /// Replace the stored state list with a fresh snapshot.
    pub fn replace_states(&self, snapshot: &[State]) -> Result<()> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        tx.execute(&format!("DELETE FROM {}", states::TABLE), params![])?;
        for state in snapshot {
            tx.execute(
                &format!(
                    "INSERT INTO {} ({}, {}, {}) VALUES (?, ?, ?)",
                    states::TABLE,
                    states::ID,
                    states::SIGLA,
                    states::NOME,
                ),
                params![state.id, state.sigla, state.nome],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Read the stored state snapshot, ordered by code.
    pub fn cached_states(&self) -> Result<Vec<State>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {} ASC",
            states::TABLE,
            states::SIGLA
        ))?;

        let rows = stmt.query_map(params![], |row| {
            Ok(State {
                id: row.get(states::ID)?,
                sigla: row.get(states::SIGLA)?,
                nome: row.get(states::NOME)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }

    /// Replace the stored municipality snapshot for one state.
    pub fn replace_municipalities(&self, state_code: &str, snapshot: &[Municipality]) -> Result<()> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        tx.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?",
                municipalities::TABLE,
                municipalities::STATE_CODE
            ),
            params![state_code],
        )?;
        for municipality in snapshot {
            tx.execute(
                &format!(
                    "INSERT INTO {} ({}, {}, {}) VALUES (?, ?, ?)",
                    municipalities::TABLE,
                    municipalities::ID,
                    municipalities::NOME,
                    municipalities::STATE_CODE,
                ),
                params![municipality.id, municipality.nome, state_code],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Read the stored municipality snapshot for one state, ordered by name.
    pub fn cached_municipalities(&self, state_code: &str) -> Result<Vec<Municipality>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} WHERE {} = ? ORDER BY {} ASC",
            municipalities::TABLE,
            municipalities::STATE_CODE,
            municipalities::NOME
        ))?;

        let rows = stmt.query_map(params![state_code], |row| {
            Ok(Municipality {
                id: row.get(municipalities::ID)?,
                nome: row.get(municipalities::NOME)?,
                state_code: row.get(municipalities::STATE_CODE)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }
}

/// Initialize the database connection from the environment or a default path.
pub fn establish_connection() -> Result<Database> {
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "data/mail-triage.db".to_string());

    Database::new(&database_url)
}
