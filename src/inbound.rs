//! Inbound webhook payload adapter.
//!
//! Turns a raw inbound-email payload (as delivered by the mail provider's
//! webhook) into a storable [`NewEmailRecord`]. Rejections carry a
//! machine-readable reason and never write to the store; the HTTP transport
//! itself lives outside this crate.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::error::{Result, TriageError};
use crate::models::NewEmailRecord;

/// Raw inbound payload. Address fields accept either a single string or an
/// array of strings, since both shapes occur in the wild.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundPayload {
    /// Sender address
    #[serde(default)]
    pub from: String,
    /// Primary recipients
    #[serde(default, deserialize_with = "one_or_many")]
    pub to: Vec<String>,
    /// Carbon-copy recipients
    #[serde(default, deserialize_with = "one_or_many")]
    pub cc: Vec<String>,
    /// Blind-carbon-copy recipients
    #[serde(default, deserialize_with = "one_or_many")]
    pub bcc: Vec<String>,
    /// Subject line
    #[serde(default)]
    pub subject: String,
    /// Plain-text body, if provided
    #[serde(default)]
    pub text: Option<String>,
    /// HTML body, if provided
    #[serde(default)]
    pub html: Option<String>,
    /// Send date, ISO-8601
    #[serde(default)]
    pub date: String,
    /// Raw header map, if provided
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Adapt a webhook payload into a storable record.
///
/// Validation, in order: sender, subject and send date must be non-empty;
/// after consolidation at least one non-system recipient must remain.
/// On success the record is unclassified with no location assigned.
pub fn adapt_payload(payload: &InboundPayload, system_address: &str) -> Result<NewEmailRecord> {
    if payload.from.trim().is_empty() {
        return Err(TriageError::rejected("missing_field:from"));
    }
    if payload.subject.trim().is_empty() {
        return Err(TriageError::rejected("missing_field:subject"));
    }
    if payload.date.trim().is_empty() {
        return Err(TriageError::rejected("missing_field:date"));
    }

    let recipient = consolidate_recipients(payload, system_address);
    if recipient.is_empty() {
        return Err(TriageError::rejected("no_valid_recipients"));
    }

    Ok(NewEmailRecord {
        sender: payload.from.trim().to_string(),
        recipient,
        subject: payload.subject.trim().to_string(),
        body: select_body(payload),
        sent_at: payload.date.trim().to_string(),
        state_code: None,
        municipality: None,
        classified: false,
        created_by: None,
    })
}

/// Pick the record body: HTML-derived plain text wins over provided plain
/// text; with neither, the body is null.
#[must_use]
pub fn select_body(payload: &InboundPayload) -> Option<String> {
    if let Some(html) = payload.html.as_deref() {
        let stripped = html_to_text(html);
        if !stripped.is_empty() {
            return Some(stripped);
        }
    }

    payload
        .text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
}

/// Reduce an HTML body to plain text: tags are stripped, the four entities
/// `&nbsp; &amp; &lt; &gt;` are decoded, and the result is trimmed.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let tag_re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("hard-coded regex"));

    let stripped = tag_re.replace_all(html, "");
    stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Consolidate every recipient source into one comma-separated string.
///
/// Addresses come from `to`, `cc`, `bcc` and the raw `To`/`Cc`/`Bcc`
/// headers; `"Name <addr>"` forms are reduced to the bare address; tokens
/// without an `@` and the configured system inbox address are dropped;
/// duplicates are removed case-insensitively keeping the first-seen casing.
#[must_use]
pub fn consolidate_recipients(payload: &InboundPayload, system_address: &str) -> String {
    let mut sources: Vec<&str> = Vec::new();
    for list in [&payload.to, &payload.cc, &payload.bcc] {
        sources.extend(list.iter().map(String::as_str));
    }
    for (name, value) in &payload.headers {
        if name.eq_ignore_ascii_case("to")
            || name.eq_ignore_ascii_case("cc")
            || name.eq_ignore_ascii_case("bcc")
        {
            sources.push(value.as_str());
        }
    }

    let mut seen: Vec<String> = Vec::new();
    let mut kept: Vec<String> = Vec::new();

    for source in sources {
        for token in source.split(',') {
            let Some(address) = extract_address(token) else {
                continue;
            };
            if !system_address.is_empty() && address.eq_ignore_ascii_case(system_address) {
                continue;
            }

            let normalized = address.to_lowercase();
            if seen.contains(&normalized) {
                continue;
            }
            seen.push(normalized);
            kept.push(address);
        }
    }

    kept.join(", ")
}

/// Reduce one recipient token to a bare address, if it holds one.
///
/// `"Fulano <fulano@example.com>"` yields the bracketed part; a bare token
/// is trimmed. Tokens without an `@` yield `None`.
#[must_use]
pub fn extract_address(token: &str) -> Option<String> {
    static ANGLE_RE: OnceLock<Regex> = OnceLock::new();
    let angle_re = ANGLE_RE.get_or_init(|| Regex::new(r"<([^<>]+)>").expect("hard-coded regex"));

    let candidate = angle_re
        .captures(token)
        .and_then(|captures| captures.get(1))
        .map_or_else(|| token.trim(), |matched| matched.as_str().trim());

    if candidate.is_empty() || !candidate.contains('@') {
        return None;
    }

    Some(candidate.to_string())
}

/// Accept either `"a@x.com"` or `["a@x.com", "b@y.com"]`.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_bracket_forms_are_reduced() {
        assert_eq!(
            extract_address("Fulano de Tal <fulano@example.com>"),
            Some("fulano@example.com".to_string())
        );
        assert_eq!(extract_address("  plain@example.com "), Some("plain@example.com".to_string()));
        assert_eq!(extract_address("no-address-here"), None);
        assert_eq!(extract_address(""), None);
    }

    #[test]
    fn html_entities_are_decoded_after_stripping() {
        assert_eq!(
            html_to_text("<p>Ol&aacute;? x &lt; y &amp;&nbsp;z</p>"),
            "Ol&aacute;? x < y & z"
        );
        assert_eq!(html_to_text("<div><br/></div>"), "");
    }

    #[test]
    fn payload_accepts_string_or_array_recipients() {
        let single: InboundPayload =
            serde_json::from_str(r#"{"from":"a@x.com","to":"b@y.com","subject":"s","date":"d"}"#)
                .expect("should parse");
        assert_eq!(single.to, vec!["b@y.com"]);

        let many: InboundPayload = serde_json::from_str(
            r#"{"from":"a@x.com","to":["b@y.com","c@z.com"],"subject":"s","date":"d"}"#,
        )
        .expect("should parse");
        assert_eq!(many.to.len(), 2);
    }
}
