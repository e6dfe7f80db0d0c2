//! Plain-text rendering of listing records
//!
//! The rendered text is what a judge reads, so it carries only the fields a
//! reader cares about. Optional lines are left out when the source did not
//! provide them.

use crate::extract::{is_value, ListingRecord};

/// Renders one record as a prose description
pub fn describe(record: &ListingRecord) -> String {
    let mut text = String::new();

    text.push_str(&format!("Title: {}\n", record.title));
    text.push_str(&format!("Company: {}\n", record.company));
    text.push_str(&format!("Location: {}\n", record.location));

    if is_value(&record.posted_on) {
        text.push_str(&format!("Posted: {}\n", record.posted_on));
    }
    if is_value(&record.benefits) {
        text.push_str(&format!("Benefits: {}\n", record.benefits));
    }
    if is_value(&record.job_link) {
        text.push_str(&format!("Link: {}\n", record.job_link));
    }

    text.push_str("\nDescription:\n");
    text.push_str(record.full_description.trim());
    text.push('\n');

    text
}

/// Renders every record, in order
pub fn describe_all(records: &[ListingRecord]) -> Vec<String> {
    records.iter().map(describe).collect()
}
