//! CSV export of email listings.
//!
//! Writes the filtered listing with the dashboard's fixed header. Fields
//! are quoted and escaped by the csv writer, so subjects or recipient lists
//! containing commas round-trip intact.

use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::Path;

use csv::Writer;

use crate::error::Result;
use crate::formatters::display_date;
use crate::models::EmailRecord;

/// Fixed export header.
pub const CSV_HEADER: [&str; 5] = ["Remetente", "Destinatário", "Data", "Estado", "Município"];

/// Location pair used for one exported row.
pub type LocationPair = (String, String);

/// The stored location of a record, with empty strings for unclassified rows.
#[must_use]
pub fn stored_location(record: &EmailRecord) -> LocationPair {
    (
        record.state_code.clone().unwrap_or_default(),
        record.municipality.clone().unwrap_or_default(),
    )
}

/// Write records as CSV rows to any writer.
///
/// `location_of` supplies the exported location per record; the pending
/// view passes unsaved operator edits through it, everything else uses
/// [`stored_location`].
pub fn write_csv<W: Write>(
    records: &[EmailRecord],
    location_of: impl Fn(&EmailRecord) -> LocationPair,
    writer: W,
) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);

    csv_writer.write_record(CSV_HEADER)?;

    for record in records {
        let (state_code, municipality) = location_of(record);
        csv_writer.write_record([
            record.sender.as_str(),
            record.recipient.as_str(),
            display_date(&record.sent_at).as_str(),
            state_code.as_str(),
            municipality.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write records to a CSV file, creating parent directories as needed.
pub fn export_to_path(records: &[EmailRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    write_csv(records, stored_location, file)
}
