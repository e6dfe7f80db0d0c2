//! Markdown report generation
//!
//! This module renders a finished crawl as a human-readable markdown report:
//! run information, status counts and every listing in source order.

use crate::extract::{is_value, ListingRecord, RecordStatus};
use crate::output::CrawlReport;
use crate::HarvestError;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Maximum description length shown per listing before truncation
const DESCRIPTION_PREVIEW_CHARS: usize = 600;

/// Writes a markdown report of a crawl to disk
///
/// # Arguments
///
/// * `report` - The crawl and its run metadata
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(HarvestError)` - Failed to write the report
pub fn write_markdown_report(report: &CrawlReport, output_path: &Path) -> Result<(), HarvestError> {
    let markdown = format_markdown_report(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::info!("Report written to {}", output_path.display());
    Ok(())
}

/// Formats a crawl as markdown
pub fn format_markdown_report(report: &CrawlReport) -> String {
    let result = report.result;
    let mut md = String::new();

    md.push_str("# Job-Harvest Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Search URL**: {}\n", report.search_url));
    md.push_str(&format!(
        "- **Generated**: {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(hash) = report.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    if result.cancelled {
        md.push_str("- **Status**: cancelled (partial results)\n");
    }
    md.push('\n');

    // Counts
    md.push_str("## Statistics\n\n");
    md.push_str(&format!("- **Listings**: {}\n", result.len()));
    for status in [
        RecordStatus::Complete,
        RecordStatus::Partial,
        RecordStatus::ExtractionFailed,
    ] {
        md.push_str(&format!(
            "- **{}**: {}\n",
            status,
            result.count_by_status(status)
        ));
    }
    md.push('\n');

    if result.is_empty() {
        md.push_str("No listings found.\n");
        return md;
    }

    md.push_str("## Listings\n\n");
    for (index, record) in result.records.iter().enumerate() {
        format_listing(&mut md, index + 1, record);
    }

    md
}

fn format_listing(md: &mut String, number: usize, record: &ListingRecord) {
    if is_value(&record.job_link) {
        md.push_str(&format!(
            "### {}. [{}]({})\n\n",
            number, record.title, record.job_link
        ));
    } else {
        md.push_str(&format!("### {}. {}\n\n", number, record.title));
    }

    if is_value(&record.company_link) {
        md.push_str(&format!(
            "- **Company**: [{}]({})\n",
            record.company, record.company_link
        ));
    } else {
        md.push_str(&format!("- **Company**: {}\n", record.company));
    }
    md.push_str(&format!("- **Location**: {}\n", record.location));
    md.push_str(&format!("- **Posted**: {}\n", record.posted_on));
    if is_value(&record.benefits) {
        md.push_str(&format!("- **Benefits**: {}\n", record.benefits));
    }
    md.push_str(&format!("- **Job ID**: {}\n", record.job_id));
    md.push_str(&format!("- **Status**: {}\n\n", record.status));

    if is_value(&record.full_description) {
        let description = record.full_description.trim();
        let preview: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
        for line in preview.lines() {
            md.push_str(&format!("> {}\n", line));
        }
        if description.chars().count() > DESCRIPTION_PREVIEW_CHARS {
            md.push_str("> ...\n");
        }
        md.push('\n');
    }
}
