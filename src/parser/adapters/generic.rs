use crate::parser::page::Page;
use crate::record::CollegeRecord;

/// Fallback for pages no adapter claims: the title is all we trust.
pub fn extract(page: &Page, record: &mut CollegeRecord) {
    record.name = page.title();
}
