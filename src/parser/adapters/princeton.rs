use crate::parser::page::{element_text, Page};
use crate::parser::rules::{self, StatRule};
use crate::record::{CollegeRecord, StatField};

const HEADING: &str = "h1, .school-name";
const LOCATION: &str = ".location, .school-location";
const STATS: &str = ".stat, .data-point, .school-stat";

pub const RULES: &[StatRule] = &[
    StatRule::new(&["acceptance"], StatField::AcceptanceRate)
        .strip(&["acceptance rate", "acceptance"]),
    StatRule::new(&["enrollment"], StatField::Size).strip(&["total enrollment", "enrollment"]),
];

pub fn extract(page: &Page, record: &mut CollegeRecord) {
    record.name = page.heading_or_title(HEADING);
    record.location = page.first_text(LOCATION);

    for el in page.elements(STATS) {
        let text = element_text(el);
        rules::apply(RULES, record, &text, &text);
    }
}
