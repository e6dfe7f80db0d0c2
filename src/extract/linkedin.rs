//! Extractor for LinkedIn's public (guest) jobs markup
//!
//! Search results are a list of `div.base-card` elements; each card carries
//! the listing's identifiers as `data-*` attributes and the visible summary
//! fields as BEM-named children. Detail pages hold the description in
//! `div.show-more-less-html__markup` (older layouts: `div.description__text`).

use crate::extract::record::{ListingRecord, NOT_SPECIFIED};
use crate::extract::ListingExtractor;
use scraper::{ElementRef, Html, Selector};
use url::Url;

const CARD: &str = "div.base-card";
const TITLE: &str = "h3.base-search-card__title";
const COMPANY: &str = "h4.base-search-card__subtitle";
const COMPANY_LINK: &str = "h4.base-search-card__subtitle a[href]";
const JOB_LINK: &str = "a.base-card__full-link[href]";
const LOCATION: &str = "span.job-search-card__location";
const POSTED_ON: &str = "time";
const LOGO: &str = "img.artdeco-entity-image";
const BENEFITS: &str = "span.job-posting-benefits__text";
const ENTITY_URN: &str = "[data-entity-urn]";
const REFERENCE_ID: &str = "[data-reference-id]";
const TRACKING_ID: &str = "[data-tracking-id]";
const DESCRIPTION: [&str; 2] = ["div.show-more-less-html__markup", "div.description__text"];

/// Listing extractor for LinkedIn job search pages
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedInExtractor;

impl LinkedInExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ListingExtractor for LinkedInExtractor {
    fn extract_cards(&self, document: &str) -> Vec<String> {
        let document = Html::parse_document(document);
        let Ok(selector) = Selector::parse(CARD) else {
            return Vec::new();
        };

        document.select(&selector).map(|card| card.html()).collect()
    }

    fn extract_summary(&self, card: &str, base: &Url) -> ListingRecord {
        let fragment = Html::parse_fragment(card);
        let root = fragment.root_element();

        if root.children().filter_map(ElementRef::wrap).next().is_none() {
            tracing::debug!("Card has no markup, marking as extraction failure");
            return ListingRecord::extraction_failed();
        }

        let job_link = link_of(root, JOB_LINK, base);
        let job_id = attr_of(root, ENTITY_URN, "data-entity-urn")
            .and_then(|urn| job_id_from_urn(&urn))
            .or_else(|| job_link.as_deref().and_then(job_id_from_link));

        ListingRecord {
            title: or_sentinel(text_of(root, TITLE)),
            company: or_sentinel(text_of(root, COMPANY)),
            company_link: or_sentinel(link_of(root, COMPANY_LINK, base)),
            job_link: or_sentinel(job_link),
            location: or_sentinel(text_of(root, LOCATION)),
            posted_on: or_sentinel(
                attr_of(root, POSTED_ON, "datetime").or_else(|| text_of(root, POSTED_ON)),
            ),
            company_logo: or_sentinel(
                attr_of(root, LOGO, "data-delayed-url")
                    .or_else(|| attr_of(root, LOGO, "src"))
                    .filter(|src| src.starts_with("http")),
            ),
            benefits: or_sentinel(text_of(root, BENEFITS)),
            job_id: or_sentinel(job_id),
            reference_id: or_sentinel(attr_of(root, REFERENCE_ID, "data-reference-id")),
            tracking_id: or_sentinel(attr_of(root, TRACKING_ID, "data-tracking-id")),
            ..ListingRecord::empty()
        }
    }

    fn extract_detail(&self, document: &str) -> String {
        let document = Html::parse_document(document);

        DESCRIPTION
            .iter()
            .find_map(|css| paragraphs_of(&document, css))
            .unwrap_or_else(|| NOT_SPECIFIED.to_string())
    }
}

fn or_sentinel(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_SPECIFIED.to_string())
}

/// Collapses runs of whitespace into single spaces
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of the first element matching `css`, whitespace-normalized
fn text_of(scope: ElementRef, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    let element = scope.select(&selector).next()?;
    let text = normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "));
    (!text.is_empty()).then_some(text)
}

/// Attribute value of the first element matching `css`
fn attr_of(scope: ElementRef, css: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    let value = scope.select(&selector).next()?.value().attr(attr)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Absolute http(s) URL of the first link matching `css`
fn link_of(scope: ElementRef, css: &str, base: &Url) -> Option<String> {
    let href = attr_of(scope, css, "href")?;
    let url = base.join(&href).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

/// Description text with one line per non-empty text node
fn paragraphs_of(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    let element = document.select(&selector).next()?;
    let lines: Vec<String> = element
        .text()
        .map(normalize_whitespace)
        .filter(|line| !line.is_empty())
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

/// "urn:li:jobPosting:3801234567" -> "3801234567"
fn job_id_from_urn(urn: &str) -> Option<String> {
    let id = urn.rsplit(':').next()?.trim();
    (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then(|| id.to_string())
}

/// "https://www.linkedin.com/jobs/view/rust-engineer-at-acme-3801234567?refId=x" -> "3801234567"
fn job_id_from_link(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let last = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let id: String = last
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    (!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::record::{RecordStatus, EXTRACTION_ERROR};

    const FULL_CARD: &str = r#"
        <div class="base-card base-search-card job-search-card"
             data-entity-urn="urn:li:jobPosting:3801234567"
             data-reference-id="ref-abc=="
             data-tracking-id="track-xyz==">
            <a class="base-card__full-link" href="https://www.linkedin.com/jobs/view/rust-engineer-at-acme-3801234567?refId=1">
                <span class="sr-only">Rust Engineer</span>
            </a>
            <div class="search-entity-media">
                <img class="artdeco-entity-image" data-delayed-url="https://media.licdn.com/logo.png" />
            </div>
            <div class="base-search-card__info">
                <h3 class="base-search-card__title">
                    Rust   Engineer
                </h3>
                <h4 class="base-search-card__subtitle">
                    <a class="hidden-nested-link" href="/company/acme?trk=public_jobs">Acme Corp</a>
                </h4>
                <div class="base-search-card__metadata">
                    <span class="job-search-card__location">Berlin, Germany</span>
                    <span class="job-posting-benefits__text">Actively Hiring</span>
                    <time class="job-search-card__listdate" datetime="2024-01-15">2 weeks ago</time>
                </div>
            </div>
        </div>
    "#;

    fn base() -> Url {
        Url::parse("https://www.linkedin.com/jobs/search/?keywords=rust").unwrap()
    }

    #[test]
    fn test_extract_cards_in_page_order() {
        let page = r#"<html><body><ul>
            <li><div class="base-card"><h3 class="base-search-card__title">First</h3></div></li>
            <li><div class="base-card"><h3 class="base-search-card__title">Second</h3></div></li>
            <li><div class="other-card">Ignored</div></li>
        </ul></body></html>"#;

        let extractor = LinkedInExtractor::new();
        let cards = extractor.extract_cards(page);
        assert_eq!(cards.len(), 2);

        let titles: Vec<String> = cards
            .iter()
            .map(|c| extractor.extract_summary(c, &base()).title)
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[test]
    fn test_extract_cards_empty_page() {
        let extractor = LinkedInExtractor::new();
        assert!(extractor.extract_cards("<html><body></body></html>").is_empty());
        assert!(extractor.extract_cards("").is_empty());
    }

    #[test]
    fn test_extract_full_card() {
        let record = LinkedInExtractor::new().extract_summary(FULL_CARD, &base());

        assert_eq!(record.status, RecordStatus::Partial);
        assert_eq!(record.title, "Rust Engineer");
        assert_eq!(record.company, "Acme Corp");
        assert_eq!(
            record.company_link,
            "https://www.linkedin.com/company/acme?trk=public_jobs"
        );
        assert_eq!(
            record.job_link,
            "https://www.linkedin.com/jobs/view/rust-engineer-at-acme-3801234567?refId=1"
        );
        assert_eq!(record.location, "Berlin, Germany");
        assert_eq!(record.posted_on, "2024-01-15");
        assert_eq!(record.company_logo, "https://media.licdn.com/logo.png");
        assert_eq!(record.benefits, "Actively Hiring");
        assert_eq!(record.job_id, "3801234567");
        assert_eq!(record.reference_id, "ref-abc==");
        assert_eq!(record.tracking_id, "track-xyz==");
        assert_eq!(record.full_description, NOT_SPECIFIED);
    }

    #[test]
    fn test_missing_fields_fall_back_individually() {
        let card = r#"<div class="base-card">
            <h3 class="base-search-card__title">Only Title</h3>
            <time>3 days ago</time>
        </div>"#;
        let record = LinkedInExtractor::new().extract_summary(card, &base());

        assert_eq!(record.status, RecordStatus::Partial);
        assert_eq!(record.title, "Only Title");
        assert_eq!(record.posted_on, "3 days ago");
        assert_eq!(record.company, NOT_SPECIFIED);
        assert_eq!(record.job_link, NOT_SPECIFIED);
        assert_eq!(record.job_id, NOT_SPECIFIED);
        assert_eq!(record.company_logo, NOT_SPECIFIED);
        assert!(!record.has_detail_link());
    }

    #[test]
    fn test_every_field_is_value_or_sentinel() {
        let cards = [FULL_CARD, "<div class=\"base-card\"></div>", "", "garbage text"];
        for card in cards {
            let record = LinkedInExtractor::new().extract_summary(card, &base());
            for (name, value) in record.fields() {
                assert!(!value.is_empty(), "field {} empty for card {:?}", name, card);
            }
        }
    }

    #[test]
    fn test_unreadable_card_is_extraction_failure() {
        let extractor = LinkedInExtractor::new();
        for card in ["", "   ", "just some text"] {
            let record = extractor.extract_summary(card, &base());
            assert_eq!(record.status, RecordStatus::ExtractionFailed);
            assert_eq!(record.title, EXTRACTION_ERROR);
        }
    }

    #[test]
    fn test_job_id_from_link_fallback() {
        let card = r#"<div class="base-card">
            <a class="base-card__full-link" href="/jobs/view/backend-dev-4087409985?trk=x">Job</a>
        </div>"#;
        let record = LinkedInExtractor::new().extract_summary(card, &base());
        assert_eq!(record.job_id, "4087409985");
        assert_eq!(
            record.job_link,
            "https://www.linkedin.com/jobs/view/backend-dev-4087409985?trk=x"
        );
    }

    #[test]
    fn test_non_http_links_rejected() {
        let card = r#"<div class="base-card">
            <a class="base-card__full-link" href="javascript:void(0)">Job</a>
            <img class="artdeco-entity-image" src="data:image/gif;base64,AAAA" />
        </div>"#;
        let record = LinkedInExtractor::new().extract_summary(card, &base());
        assert_eq!(record.job_link, NOT_SPECIFIED);
        assert_eq!(record.company_logo, NOT_SPECIFIED);
    }

    #[test]
    fn test_extract_detail() {
        let page = r#"<html><body>
            <div class="show-more-less-html__markup">
                <p>We are hiring a <strong>Rust</strong> engineer.</p>
                <ul><li>Tokio</li><li>Async</li></ul>
            </div>
        </body></html>"#;

        let description = LinkedInExtractor::new().extract_detail(page);
        assert!(description.contains("We are hiring a"));
        assert!(description.contains("Tokio"));
        assert!(description.lines().count() >= 3);
    }

    #[test]
    fn test_extract_detail_fallback_selector() {
        let page = r#"<div class="description__text">Legacy layout</div>"#;
        assert_eq!(LinkedInExtractor::new().extract_detail(page), "Legacy layout");
    }

    #[test]
    fn test_extract_detail_missing_is_sentinel() {
        let extractor = LinkedInExtractor::new();
        assert_eq!(extractor.extract_detail("<html></html>"), NOT_SPECIFIED);
        assert_eq!(extractor.extract_detail(""), NOT_SPECIFIED);
        assert_eq!(
            extractor.extract_detail(r#"<div class="show-more-less-html__markup">   </div>"#),
            NOT_SPECIFIED
        );
    }

    #[test]
    fn test_job_id_helpers() {
        assert_eq!(job_id_from_urn("urn:li:jobPosting:123"), Some("123".to_string()));
        assert_eq!(job_id_from_urn("urn:li:jobPosting:"), None);
        assert_eq!(job_id_from_urn("not-a-urn"), None);
        assert_eq!(
            job_id_from_link("https://example.com/jobs/view/title-42/"),
            Some("42".to_string())
        );
        assert_eq!(job_id_from_link("https://example.com/jobs/view/title"), None);
    }
}
