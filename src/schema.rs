//! Database schema definitions
//!
//! This module provides constants for table and column names used with rusqlite.

/// Emails table schema
pub mod emails {
    /// Table name
    pub const TABLE: &str = "emails";
    /// Primary key column
    pub const ID: &str = "id";
    /// Sender address column
    pub const SENDER: &str = "sender";
    /// Recipient list column (comma-separated)
    pub const RECIPIENT: &str = "recipient";
    /// Subject line column
    pub const SUBJECT: &str = "subject";
    /// Body text column
    pub const BODY: &str = "body";
    /// Send timestamp column (ISO-8601 text)
    pub const SENT_AT: &str = "sent_at";
    /// Assigned state code column
    pub const STATE_CODE: &str = "state_code";
    /// Assigned municipality column
    pub const MUNICIPALITY: &str = "municipality";
    /// Classification flag column
    pub const CLASSIFIED: &str = "classified";
    /// Creating operator column
    pub const CREATED_BY: &str = "created_by";
    /// Record creation timestamp column
    pub const CREATED_AT: &str = "created_at";
    /// Record update timestamp column
    pub const UPDATED_AT: &str = "updated_at";
}

/// Profiles table schema
pub mod profiles {
    /// Table name
    pub const TABLE: &str = "profiles";
    /// Primary key column (external identity id)
    pub const ID: &str = "id";
    /// Display name column
    pub const NAME: &str = "name";
    /// Account email column
    pub const EMAIL: &str = "email";
    /// Role column (admin | collaborator)
    pub const ROLE: &str = "role";
    /// Profile creation timestamp column
    pub const CREATED_AT: &str = "created_at";
    /// Profile update timestamp column
    pub const UPDATED_AT: &str = "updated_at";
}

/// States reference table schema
pub mod states {
    /// Table name
    pub const TABLE: &str = "states";
    /// IBGE numeric id column
    pub const ID: &str = "id";
    /// Two-letter code column
    pub const SIGLA: &str = "sigla";
    /// Display name column
    pub const NOME: &str = "nome";
}

/// Municipalities reference table schema
pub mod municipalities {
    /// Table name
    pub const TABLE: &str = "municipalities";
    /// IBGE numeric id column
    pub const ID: &str = "id";
    /// Display name column
    pub const NOME: &str = "nome";
    /// Owning state code column
    pub const STATE_CODE: &str = "state_code";
}
