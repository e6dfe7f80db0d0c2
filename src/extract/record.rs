use std::fmt;

/// Placeholder for any field the source did not provide
pub const NOT_SPECIFIED: &str = "Not specified";

/// Placeholder for every field of a card that could not be read at all
pub const EXTRACTION_ERROR: &str = "Error";

/// Lifecycle of a listing record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordStatus {
    /// Summary fields extracted; detail phase pending or failed
    Partial,

    /// Detail phase finished; the record is final
    Complete,

    /// The card could not be read; every summary field holds the error sentinel
    ExtractionFailed,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Partial => "partial",
            RecordStatus::Complete => "complete",
            RecordStatus::ExtractionFailed => "extraction_failed",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One job posting
///
/// Every field is always populated: absent data holds [`NOT_SPECIFIED`], and
/// a wholly unreadable card holds [`EXTRACTION_ERROR`] in its summary fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    pub title: String,
    pub company: String,
    pub company_link: String,
    pub job_link: String,
    pub location: String,
    pub posted_on: String,
    pub company_logo: String,
    pub benefits: String,
    pub job_id: String,
    pub reference_id: String,
    pub tracking_id: String,
    pub full_description: String,
    pub status: RecordStatus,
}

impl ListingRecord {
    /// A partial record with every field set to [`NOT_SPECIFIED`]
    pub fn empty() -> Self {
        Self::filled(NOT_SPECIFIED, RecordStatus::Partial)
    }

    /// The record emitted for a card that could not be read
    pub fn extraction_failed() -> Self {
        Self {
            full_description: NOT_SPECIFIED.to_string(),
            ..Self::filled(EXTRACTION_ERROR, RecordStatus::ExtractionFailed)
        }
    }

    fn filled(value: &str, status: RecordStatus) -> Self {
        Self {
            title: value.to_string(),
            company: value.to_string(),
            company_link: value.to_string(),
            job_link: value.to_string(),
            location: value.to_string(),
            posted_on: value.to_string(),
            company_logo: value.to_string(),
            benefits: value.to_string(),
            job_id: value.to_string(),
            reference_id: value.to_string(),
            tracking_id: value.to_string(),
            full_description: value.to_string(),
            status,
        }
    }

    /// Finishes the detail phase with the extracted description
    ///
    /// Consumes the record: a complete record is final. Records that failed
    /// extraction keep their status.
    pub fn complete(self, full_description: String) -> Self {
        match self.status {
            RecordStatus::Partial => Self {
                full_description,
                status: RecordStatus::Complete,
                ..self
            },
            RecordStatus::Complete | RecordStatus::ExtractionFailed => self,
        }
    }

    /// Returns whether the detail page can be requested for this record
    pub fn has_detail_link(&self) -> bool {
        self.status == RecordStatus::Partial && is_value(&self.job_link)
    }

    /// Every field as `(name, value)` pairs, in output order
    pub fn fields(&self) -> [(&'static str, &str); 12] {
        [
            ("title", self.title.as_str()),
            ("company", self.company.as_str()),
            ("company_link", self.company_link.as_str()),
            ("job_link", self.job_link.as_str()),
            ("location", self.location.as_str()),
            ("posted_on", self.posted_on.as_str()),
            ("company_logo", self.company_logo.as_str()),
            ("benefits", self.benefits.as_str()),
            ("job_id", self.job_id.as_str()),
            ("reference_id", self.reference_id.as_str()),
            ("tracking_id", self.tracking_id.as_str()),
            ("full_description", self.full_description.as_str()),
        ]
    }
}

impl Default for ListingRecord {
    fn default() -> Self {
        Self::empty()
    }
}

/// Returns whether a field holds real data rather than a sentinel
pub fn is_value(field: &str) -> bool {
    field != NOT_SPECIFIED && field != EXTRACTION_ERROR && !field.is_empty()
}
