use std::collections::HashMap;

use tempfile::tempdir;

use mail_triage::export::{export_to_path, stored_location, write_csv, CSV_HEADER};
use mail_triage::formatters::display_date;
use mail_triage::models::EmailRecord;

fn record(id: &str, recipient: &str, subject: &str, state_code: Option<&str>, municipality: Option<&str>) -> EmailRecord {
    EmailRecord {
        id: id.to_string(),
        sender: "remetente@example.com".to_string(),
        recipient: recipient.to_string(),
        subject: subject.to_string(),
        body: None,
        sent_at: "2024-03-10T12:00:00Z".to_string(),
        state_code: state_code.map(ToString::to_string),
        municipality: municipality.map(ToString::to_string),
        classified: state_code.is_some() && municipality.is_some(),
        created_by: None,
        created_at: chrono::NaiveDateTime::default(),
        updated_at: chrono::NaiveDateTime::default(),
    }
}

fn parse_csv(bytes: &[u8]) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(false).from_reader(bytes);
    reader
        .records()
        .map(|row| {
            row.expect("valid csv row")
                .iter()
                .map(ToString::to_string)
                .collect()
        })
        .collect()
}

#[test]
fn export_writes_the_fixed_header() {
    let mut buffer = Vec::new();
    write_csv(&[], stored_location, &mut buffer).expect("export failed");

    let rows = parse_csv(&buffer);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], CSV_HEADER.map(ToString::to_string).to_vec());
}

#[test]
fn fields_with_commas_survive_the_round_trip() {
    // A multi-recipient list and a subject with a comma must not shift
    // columns: the writer quotes them.
    let records = vec![record(
        "1",
        "a@x.com, b@y.com",
        "Urgente, por favor",
        Some("PI"),
        Some("Piripiri"),
    )];

    let mut buffer = Vec::new();
    write_csv(&records, stored_location, &mut buffer).expect("export failed");

    let text = String::from_utf8(buffer.clone()).expect("utf-8 output");
    assert!(text.contains("\"a@x.com, b@y.com\""));

    let rows = parse_csv(&buffer);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].len(), 5);
    assert_eq!(rows[1][1], "a@x.com, b@y.com");
    assert_eq!(rows[1][2], display_date("2024-03-10T12:00:00Z"));
    assert_eq!(rows[1][3], "PI");
    assert_eq!(rows[1][4], "Piripiri");
}

#[test]
fn unclassified_rows_export_empty_location_fields() {
    let records = vec![record("1", "a@x.com", "Assunto", None, None)];

    let mut buffer = Vec::new();
    write_csv(&records, stored_location, &mut buffer).expect("export failed");

    let rows = parse_csv(&buffer);
    assert_eq!(rows[1][3], "");
    assert_eq!(rows[1][4], "");
}

#[test]
fn pending_edits_override_stored_locations() {
    // The pending view exports unsaved operator edits in place of the
    // stored (null) location.
    let records = vec![record("1", "a@x.com", "Assunto", None, None)];
    let edits: HashMap<String, (String, String)> =
        HashMap::from([("1".to_string(), ("CE".to_string(), "Fortaleza".to_string()))]);

    let mut buffer = Vec::new();
    write_csv(
        &records,
        |record| {
            edits
                .get(&record.id)
                .cloned()
                .unwrap_or_else(|| stored_location(record))
        },
        &mut buffer,
    )
    .expect("export failed");

    let rows = parse_csv(&buffer);
    assert_eq!(rows[1][3], "CE");
    assert_eq!(rows[1][4], "Fortaleza");
}

#[test]
fn export_to_path_creates_parent_directories() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("nested").join("emails_pendentes.csv");

    let records = vec![record("1", "a@x.com", "Assunto", Some("PI"), Some("Teresina"))];
    export_to_path(&records, &path).expect("export failed");

    let contents = std::fs::read_to_string(&path).expect("file readable");
    assert!(contents.starts_with("Remetente,Destinatário,Data,Estado,Município"));
    assert!(contents.contains("remetente@example.com"));
}
