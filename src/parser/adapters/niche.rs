use crate::parser::page::{child_text, element_text, Page};
use crate::parser::rules::{self, StatRule};
use crate::record::{CollegeRecord, StatField};

const LOCATION: &str = ".profile__address";
const GRADE: &str = r#".niche__grade, [class*="grade"]"#;
const CARDS: &str = ".profile-grade, .scalar, .profile__bucket";
const CARD_LABEL: &str = ".scalar__label, .profile__bucket__title";
const CARD_VALUE: &str = ".scalar__value, .profile__bucket__item";
const CAMPUS: &str = r#"[data-testid*="campus"], .campus-life"#;

pub const RULES: &[StatRule] = &[
    StatRule::new(&["acceptance rate"], StatField::AcceptanceRate).strip(&["acceptance rate"]),
    StatRule::new(&["net price"], StatField::NetPrice).strip(&["net price"]),
    StatRule::new(&["enrollment"], StatField::Size),
    StatRule::new(&["sat"], StatField::SatRange).strip(&["sat range", "sat"]),
    StatRule::new(&["act"], StatField::ActRange).strip(&["act range", "act"]),
];

pub fn extract(page: &Page, record: &mut CollegeRecord) {
    record.name = page.heading_or_title("h1");
    record.location = page.first_text(LOCATION);

    let grade = page.first_text(GRADE);
    if !grade.is_empty() {
        record.rankings.insert("nicheGrade".into(), grade);
    }

    // Cards carry the label and the value in separate children
    for card in page.elements(CARDS) {
        let label = child_text(card, CARD_LABEL);
        if label.is_empty() {
            continue;
        }
        let value = child_text(card, CARD_VALUE);
        rules::apply(RULES, record, &label, &value);
    }

    for el in page.elements(CAMPUS) {
        let text = element_text(el);
        let lower = text.to_lowercase();
        if lower.contains("dorm") || lower.contains("housing") {
            record.campus_life.insert("housing".into(), text);
        } else if lower.contains("dining") {
            record.campus_life.insert("dining".into(), text);
        }
    }
}
