pub mod adapters;
pub mod normalize;
pub mod page;
pub mod rules;
pub mod site;

use tracing::info;

use crate::record::CollegeRecord;
use page::Page;
use site::Site;

/// Dispatch on `url`, parse `html` and run the matching adapter.
pub fn process_page(url: &str, html: &str) -> CollegeRecord {
    let site = Site::for_url(url);
    let page = Page::parse(html);
    let record = adapters::extract(site, &page, url);
    info!(
        source = %site,
        name = %record.name,
        "Extracted college data from {}",
        url
    );
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_on_url() {
        let html = std::fs::read_to_string("tests/fixtures/usnews.html").unwrap();
        let r = process_page("https://www.usnews.com/best-colleges/example-university-0000", &html);
        assert_eq!(r.source, "US News");
        assert_eq!(r.acceptance_rate, "25%");

        let r = process_page("https://www.example.edu/", &html);
        assert_eq!(r.source, "Official Website");
        assert_eq!(r.name, "Example University");
    }
}
