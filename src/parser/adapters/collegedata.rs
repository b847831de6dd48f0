use crate::parser::page::{child_elements, element_text, Page};
use crate::parser::rules::{self, StatRule};
use crate::record::{CollegeRecord, StatField};

const HEADING: &str = "h1, .college-name";
const LOCATION: &str = ".location";
const ROWS: &str = "tr, .data-row";
const CELLS: &str = "td, .data-cell";

/// Keyed on the first cell of a row; the value is the second cell.
pub const RULES: &[StatRule] = &[
    StatRule::new(&["acceptance rate"], StatField::AcceptanceRate),
    StatRule::new(&["enrollment"], StatField::Size),
    StatRule::new(&["tuition"], StatField::TuitionOutOfState)
        .any(&["out-of-state", "out of state", "nonresident"]),
    StatRule::new(&["tuition"], StatField::TuitionInState).any(&["state", "resident"]),
    StatRule::new(&["tuition"], StatField::TuitionOutOfState),
];

pub fn extract(page: &Page, record: &mut CollegeRecord) {
    record.name = page.heading_or_title(HEADING);
    record.location = page.first_text(LOCATION);

    for row in page.elements(ROWS) {
        let cells = child_elements(row, CELLS);
        if cells.len() < 2 {
            continue;
        }
        let label = element_text(cells[0]);
        let value = element_text(cells[1]);
        rules::apply(RULES, record, &label, &value);
    }
}
