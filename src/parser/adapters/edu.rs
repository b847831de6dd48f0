use std::sync::LazyLock;

use regex::Regex;

use crate::parser::page::{element_text, Page};
use crate::record::CollegeRecord;

static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:in|at)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*,\s*[A-Z]{2})\b").unwrap()
});
static RATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:acceptance|admit)\s+rate.{0,60}?(\d+(?:\.\d+)?%)").unwrap()
});
static TITLE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:\||\s-\s).*$").unwrap());

const ADMISSION: &str = r#"[class*="admission"], [class*="stats"], [id*="admission"]"#;

pub fn extract(page: &Page, record: &mut CollegeRecord) {
    record.name = clean_title(&page.title());
    if record.name.is_empty() {
        record.name = page.first_text("h1");
    }

    if let Some(desc) = page.meta_content("description") {
        record.location = find_location(&desc).unwrap_or_default();
    }

    for el in page.elements(ADMISSION) {
        if let Some(rate) = find_rate(&element_text(el)) {
            record.acceptance_rate = rate;
            break;
        }
    }
}

/// "Stanford University | Admission" -> "Stanford University"
pub fn clean_title(title: &str) -> String {
    TITLE_SUFFIX_RE.replace(title, "").trim().to_string()
}

/// "<City>, <ST>" following "in"/"at", e.g. "located in Palo Alto, CA".
pub fn find_location(text: &str) -> Option<String> {
    LOCATION_RE.captures(text).map(|c| c[1].to_string())
}

/// Percentage following an acceptance/admit rate keyword.
pub fn find_rate(text: &str) -> Option<String> {
    RATE_RE.captures(text).map(|c| c[1].to_string())
}
