//! Input validation for user-submitted forms.
//!
//! Rules run in declaration order and only the FIRST violated rule's
//! message is surfaced — form feedback shows one problem at a time. All
//! checks happen before any store call.

use crate::error::{Result, TriageError};
use crate::models::{NewEmailRecord, NewProfile};

/// Validation utilities for operator-entered data
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a single email address.
    pub fn validate_email_address(address: &str) -> Result<()> {
        let address = address.trim();

        if address.is_empty() {
            return Err(TriageError::Validation("Email address cannot be empty".to_string()));
        }

        if address.len() > 254 {
            return Err(TriageError::Validation(
                "Email address too long (max 254 characters)".to_string(),
            ));
        }

        let parts: Vec<&str> = address.split('@').collect();
        if parts.len() != 2 {
            return Err(TriageError::Validation(
                "Email address must have exactly one @ symbol".to_string(),
            ));
        }

        let local_part = parts[0];
        let domain_part = parts[1];

        if local_part.is_empty() || local_part.len() > 64 {
            return Err(TriageError::Validation("Email local part invalid".to_string()));
        }

        if domain_part.is_empty() || !domain_part.contains('.') {
            return Err(TriageError::Validation("Email domain invalid".to_string()));
        }

        Ok(())
    }

    /// Validate a recipient field holding one or more comma-separated addresses.
    pub fn validate_recipient_list(recipient: &str) -> Result<()> {
        if recipient.trim().is_empty() {
            return Err(TriageError::Validation("Recipient cannot be empty".to_string()));
        }

        for address in recipient.split(',') {
            Self::validate_email_address(address)?;
        }

        Ok(())
    }

    /// Validate a manually entered email record before persistence.
    ///
    /// Manual entries require a location, so the record arrives classified;
    /// rules run in form order and stop at the first violation.
    pub fn validate_manual_entry(record: &NewEmailRecord) -> Result<()> {
        Self::validate_email_address(&record.sender)?;
        Self::validate_recipient_list(&record.recipient)?;

        if record.subject.trim().is_empty() {
            return Err(TriageError::Validation("Subject is required".to_string()));
        }

        if record.sent_at.trim().is_empty() {
            return Err(TriageError::Validation("Send date is required".to_string()));
        }

        if record.state_code.as_deref().unwrap_or("").trim().is_empty() {
            return Err(TriageError::Validation("State is required".to_string()));
        }

        if record.municipality.as_deref().unwrap_or("").trim().is_empty() {
            return Err(TriageError::Validation("Municipality is required".to_string()));
        }

        Ok(())
    }

    /// Validate a new operator profile.
    pub fn validate_profile(profile: &NewProfile) -> Result<()> {
        if profile.id.trim().is_empty() {
            return Err(TriageError::Validation("Profile id cannot be empty".to_string()));
        }

        if profile.name.trim().len() < 2 {
            return Err(TriageError::Validation(
                "Name must have at least 2 characters".to_string(),
            ));
        }

        Self::validate_email_address(&profile.email)?;

        Ok(())
    }

    /// Validate a classification pair for a single-record update.
    pub fn validate_location(state_code: &str, municipality: &str) -> Result<()> {
        if state_code.trim().is_empty() {
            return Err(TriageError::Validation("State is required".to_string()));
        }

        if municipality.trim().is_empty() {
            return Err(TriageError::Validation("Municipality is required".to_string()));
        }

        Ok(())
    }
}
