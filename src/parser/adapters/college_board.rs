use crate::parser::page::{element_text, Page};
use crate::parser::rules::{self, StatRule};
use crate::record::{CollegeRecord, StatField};

const HEADING: &str = "h1, .college-name";
const LOCATION: &str = r#"[data-testid="location"], .location"#;
const KIND: &str = r#".college-type, [data-testid="type"]"#;
const ENROLLMENT: &str = r#".enrollment, [data-testid="enrollment"]"#;
const COSTS: &str = r#".cost-item, [data-testid*="cost"]"#;
const TESTS: &str = r#".test-scores, [data-testid*="test"]"#;

pub const COST_RULES: &[StatRule] = &[
    StatRule::new(&["tuition", "in-state"], StatField::TuitionInState),
    StatRule::new(&["tuition", "out-of-state"], StatField::TuitionOutOfState),
];

pub const TEST_RULES: &[StatRule] = &[
    StatRule::new(&["sat"], StatField::SatRange).strip(&["sat range", "sat"]),
    StatRule::new(&["act"], StatField::ActRange).strip(&["act range", "act"]),
];

pub fn extract(page: &Page, record: &mut CollegeRecord) {
    record.name = page.heading_or_title(HEADING);
    record.location = page.first_text(LOCATION);
    record.kind = page.first_text(KIND);
    record.size = page.first_text(ENROLLMENT);

    for el in page.elements(COSTS) {
        let text = element_text(el);
        rules::apply(COST_RULES, record, &text, &text);
    }

    for el in page.elements(TESTS) {
        let text = element_text(el);
        rules::apply(TEST_RULES, record, &text, &text);
    }
}
