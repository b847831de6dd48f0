use crate::parser::page::{element_text, Page};
use crate::parser::rules::{self, StatRule};
use crate::record::{CollegeRecord, StatField};

const LOCATION: &str = r#"[data-testid="school-location"]"#;
const RANKING: &str = r#"[data-testid="hero-ranking"]"#;
const STATS: &str = r#"[data-testid*="stat"], .stat-value, .school-stat"#;
const MAJORS: &str = r#".major-link, [data-testid*="major"]"#;

pub const RULES: &[StatRule] = &[
    StatRule::new(&["acceptance rate"], StatField::AcceptanceRate).strip(&["acceptance rate"]),
    StatRule::new(&["tuition", "state"], StatField::TuitionInState).any(&["in-state", "in state"]),
    StatRule::new(&["tuition", "state"], StatField::TuitionOutOfState)
        .any(&["out-of-state", "out of state"]),
    StatRule::swallow(&["tuition", "state"]),
    StatRule::new(&["enrollment"], StatField::Size),
    StatRule::new(&["students"], StatField::Size),
    StatRule::new(&["sat"], StatField::SatRange),
    StatRule::new(&["act"], StatField::ActRange),
    StatRule::new(&["gpa"], StatField::Gpa),
];

pub fn extract(page: &Page, record: &mut CollegeRecord) {
    record.name = page.heading_or_title("h1");
    record.location = page.first_text(LOCATION);

    let ranking = page.first_text(RANKING);
    if !ranking.is_empty() {
        record.rankings.insert("overall".into(), ranking);
    }

    for el in page.elements(STATS) {
        let text = element_text(el);
        rules::apply(RULES, record, &text, &text);
    }

    for el in page.elements(MAJORS) {
        record.add_major(element_text(el));
    }
}
