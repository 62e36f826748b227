use mail_triage::error::TriageError;
use mail_triage::models::{NewEmailRecord, NewProfile, Role};
use mail_triage::validation::InputValidator;

fn manual_entry() -> NewEmailRecord {
    NewEmailRecord {
        sender: "remetente@example.com".to_string(),
        recipient: "destino@example.com".to_string(),
        subject: "Assunto".to_string(),
        body: None,
        sent_at: "2024-03-10T09:00:00.000Z".to_string(),
        state_code: Some("PI".to_string()),
        municipality: Some("Piripiri".to_string()),
        classified: true,
        created_by: None,
    }
}

fn message(result: mail_triage::Result<()>) -> String {
    match result {
        Err(TriageError::Validation(message)) => message,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn valid_manual_entry_passes() {
    assert!(InputValidator::validate_manual_entry(&manual_entry()).is_ok());
}

#[test]
fn only_the_first_violation_is_reported() {
    // Both the sender and the subject are invalid; the sender rule runs
    // first and its message is the only one surfaced.
    let mut entry = manual_entry();
    entry.sender = "not-an-address".to_string();
    entry.subject = String::new();

    let reported = message(InputValidator::validate_manual_entry(&entry));
    assert!(reported.contains("@"), "unexpected message: {reported}");
}

#[test]
fn rules_run_in_form_order() {
    let mut entry = manual_entry();
    entry.subject = "  ".to_string();
    assert_eq!(message(InputValidator::validate_manual_entry(&entry)), "Subject is required");

    let mut entry = manual_entry();
    entry.sent_at = String::new();
    assert_eq!(message(InputValidator::validate_manual_entry(&entry)), "Send date is required");

    let mut entry = manual_entry();
    entry.state_code = None;
    assert_eq!(message(InputValidator::validate_manual_entry(&entry)), "State is required");

    let mut entry = manual_entry();
    entry.municipality = Some(String::new());
    assert_eq!(
        message(InputValidator::validate_manual_entry(&entry)),
        "Municipality is required"
    );
}

#[test]
fn email_address_syntax_rules() {
    assert!(InputValidator::validate_email_address("user@example.com").is_ok());
    assert!(InputValidator::validate_email_address("  padded@example.com  ").is_ok());

    assert!(InputValidator::validate_email_address("").is_err());
    assert!(InputValidator::validate_email_address("no-at-sign").is_err());
    assert!(InputValidator::validate_email_address("two@@example.com").is_err());
    assert!(InputValidator::validate_email_address("@example.com").is_err());
    assert!(InputValidator::validate_email_address("user@nodot").is_err());

    let oversized = format!("{}@example.com", "a".repeat(255));
    assert!(InputValidator::validate_email_address(&oversized).is_err());
}

#[test]
fn recipient_lists_validate_every_address() {
    assert!(InputValidator::validate_recipient_list("a@x.com, b@y.com").is_ok());
    assert!(InputValidator::validate_recipient_list("a@x.com, broken").is_err());
    assert!(InputValidator::validate_recipient_list("").is_err());
}

#[test]
fn profile_rules() {
    let valid = NewProfile {
        id: "auth-1".to_string(),
        name: "Larissa".to_string(),
        email: "larissa@example.com".to_string(),
        role: Role::Collaborator,
    };
    assert!(InputValidator::validate_profile(&valid).is_ok());

    let mut short_name = valid.clone();
    short_name.name = "L".to_string();
    assert_eq!(
        message(InputValidator::validate_profile(&short_name)),
        "Name must have at least 2 characters"
    );

    let mut bad_email = valid.clone();
    bad_email.email = "nope".to_string();
    assert!(InputValidator::validate_profile(&bad_email).is_err());
}

#[test]
fn location_pair_rules() {
    assert!(InputValidator::validate_location("PI", "Piripiri").is_ok());
    assert_eq!(message(InputValidator::validate_location("", "Piripiri")), "State is required");
    assert_eq!(
        message(InputValidator::validate_location("PI", " ")),
        "Municipality is required"
    );
}
