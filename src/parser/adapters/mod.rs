pub mod college_board;
pub mod collegedata;
pub mod edu;
pub mod generic;
pub mod niche;
pub mod princeton;
pub mod usnews;

use super::page::Page;
use super::site::Site;
use crate::record::CollegeRecord;

/// Run the adapter for `site` over `page`. Never fails: anything the adapter
/// cannot find stays empty.
pub fn extract(site: Site, page: &Page, url: &str) -> CollegeRecord {
    let mut record = CollegeRecord::new(url);
    record.source = site.source_name().to_string();

    match site {
        Site::UsNews => usnews::extract(page, &mut record),
        Site::Niche => niche::extract(page, &mut record),
        Site::CollegeBoard => college_board::extract(page, &mut record),
        Site::PrincetonReview => princeton::extract(page, &mut record),
        Site::CollegeData => collegedata::extract(page, &mut record),
        Site::Edu => edu::extract(page, &mut record),
        Site::Generic => generic::extract(page, &mut record),
    }

    record
}

// ── Tests ──
