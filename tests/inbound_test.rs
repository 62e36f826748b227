use std::collections::HashMap;

use mail_triage::error::TriageError;
use mail_triage::inbound::{adapt_payload, consolidate_recipients, select_body, InboundPayload};

const SYSTEM_ADDRESS: &str = "triagem@mail-triage.local";

fn payload() -> InboundPayload {
    InboundPayload {
        from: "cidadao@example.com".to_string(),
        to: vec!["gabinete@example.gov.br".to_string()],
        subject: "Pedido de informação".to_string(),
        text: Some("corpo em texto".to_string()),
        date: "2024-03-10T09:00:00Z".to_string(),
        ..InboundPayload::default()
    }
}

fn rejection_reason(result: mail_triage::Result<mail_triage::models::NewEmailRecord>) -> String {
    match result {
        Err(TriageError::Rejected { reason }) => reason,
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn accepted_payload_is_stored_unclassified() {
    let record = adapt_payload(&payload(), SYSTEM_ADDRESS).expect("should accept");

    assert_eq!(record.sender, "cidadao@example.com");
    assert_eq!(record.recipient, "gabinete@example.gov.br");
    assert_eq!(record.body.as_deref(), Some("corpo em texto"));
    assert!(record.state_code.is_none());
    assert!(record.municipality.is_none());
    assert!(!record.classified);
    assert!(record.created_by.is_none());
}

#[test]
fn html_body_wins_over_plain_text() {
    let mut input = payload();
    input.html = Some("<p>corpo &amp; <b>html</b>&nbsp;&lt;ok&gt;</p>".to_string());

    let record = adapt_payload(&input, SYSTEM_ADDRESS).expect("should accept");
    assert_eq!(record.body.as_deref(), Some("corpo & html <ok>"));
}

#[test]
fn empty_html_falls_back_to_text_then_null() {
    let mut input = payload();
    input.html = Some("<div><br/></div>".to_string());
    let record = adapt_payload(&input, SYSTEM_ADDRESS).expect("should accept");
    assert_eq!(record.body.as_deref(), Some("corpo em texto"));

    input.text = None;
    let record = adapt_payload(&input, SYSTEM_ADDRESS).expect("should accept");
    assert!(record.body.is_none());
}

#[test]
fn recipients_come_from_every_source() {
    let mut input = payload();
    input.to = vec!["Gabinete <gabinete@example.gov.br>".to_string()];
    input.cc = vec!["copia@example.com, Copia2 <copia2@example.com>".to_string()];
    input.bcc = vec!["oculto@example.com".to_string()];
    input.headers = HashMap::from([(
        "To".to_string(),
        "viaheader@example.com".to_string(),
    )]);

    let consolidated = consolidate_recipients(&input, SYSTEM_ADDRESS);
    assert_eq!(
        consolidated,
        "gabinete@example.gov.br, copia@example.com, copia2@example.com, oculto@example.com, viaheader@example.com"
    );
}

#[test]
fn recipients_are_deduplicated_keeping_first_casing() {
    let mut input = payload();
    input.to = vec!["Gabinete@Example.GOV.br".to_string()];
    input.cc = vec!["gabinete@example.gov.br".to_string()];

    let consolidated = consolidate_recipients(&input, SYSTEM_ADDRESS);
    assert_eq!(consolidated, "Gabinete@Example.GOV.br");
}

#[test]
fn system_address_is_excluded_case_insensitively() {
    let mut input = payload();
    input.to = vec!["TRIAGEM@mail-triage.LOCAL".to_string(), "outro@example.com".to_string()];

    let consolidated = consolidate_recipients(&input, SYSTEM_ADDRESS);
    assert_eq!(consolidated, "outro@example.com");
}

#[test]
fn malformed_tokens_are_dropped_silently() {
    let mut input = payload();
    input.to = vec!["sem-arroba, , valido@example.com".to_string()];

    let consolidated = consolidate_recipients(&input, SYSTEM_ADDRESS);
    assert_eq!(consolidated, "valido@example.com");
}

#[test]
fn missing_required_fields_are_rejected_with_reason_codes() {
    let mut input = payload();
    input.from = "  ".to_string();
    assert_eq!(rejection_reason(adapt_payload(&input, SYSTEM_ADDRESS)), "missing_field:from");

    let mut input = payload();
    input.subject = String::new();
    assert_eq!(rejection_reason(adapt_payload(&input, SYSTEM_ADDRESS)), "missing_field:subject");

    let mut input = payload();
    input.date = String::new();
    assert_eq!(rejection_reason(adapt_payload(&input, SYSTEM_ADDRESS)), "missing_field:date");
}

#[test]
fn payload_with_only_the_system_recipient_is_rejected() {
    let mut input = payload();
    input.to = vec![SYSTEM_ADDRESS.to_string()];

    assert_eq!(rejection_reason(adapt_payload(&input, SYSTEM_ADDRESS)), "no_valid_recipients");
}

#[test]
fn wire_payloads_accept_both_recipient_shapes() {
    let single: InboundPayload = serde_json::from_str(
        r#"{"from":"a@x.com","to":"b@y.com","subject":"s","date":"2024-03-10T09:00:00Z"}"#,
    )
    .expect("should parse");
    let record = adapt_payload(&single, SYSTEM_ADDRESS).expect("should accept");
    assert_eq!(record.recipient, "b@y.com");

    let many: InboundPayload = serde_json::from_str(
        r#"{"from":"a@x.com","to":["b@y.com","c@z.com"],"subject":"s","date":"2024-03-10T09:00:00Z"}"#,
    )
    .expect("should parse");
    let record = adapt_payload(&many, SYSTEM_ADDRESS).expect("should accept");
    assert_eq!(record.recipient, "b@y.com, c@z.com");
}

#[test]
fn select_body_prefers_html_derived_text() {
    let mut input = payload();
    input.html = Some("<p>html</p>".to_string());
    assert_eq!(select_body(&input).as_deref(), Some("html"));

    input.html = None;
    assert_eq!(select_body(&input).as_deref(), Some("corpo em texto"));

    input.text = Some("   ".to_string());
    assert!(select_body(&input).is_none());
}
