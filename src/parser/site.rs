use std::fmt;

/// Known sources, in dispatch precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    UsNews,
    Niche,
    CollegeBoard,
    PrincetonReview,
    CollegeData,
    Edu,
    Generic,
}

/// Substring patterns checked in order. `.edu` sits after every vendor so a
/// vendor URL containing ".edu" still goes to the vendor adapter.
const PATTERNS: &[(&str, Site)] = &[
    ("usnews.com", Site::UsNews),
    ("niche.com", Site::Niche),
    ("bigfuture.collegeboard.org", Site::CollegeBoard),
    ("princetonreview.com", Site::PrincetonReview),
    ("collegedata.com", Site::CollegeData),
    (".edu", Site::Edu),
];

impl Site {
    pub fn for_url(url: &str) -> Site {
        PATTERNS
            .iter()
            .find(|(pat, _)| url.contains(pat))
            .map(|(_, site)| *site)
            .unwrap_or(Site::Generic)
    }

    /// Value stored in `CollegeRecord::source`.
    pub fn source_name(self) -> &'static str {
        match self {
            Site::UsNews => "US News",
            Site::Niche => "Niche",
            Site::CollegeBoard => "College Board",
            Site::PrincetonReview => "Princeton Review",
            Site::CollegeData => "CollegeData",
            Site::Edu => "Official Website",
            Site::Generic => "Generic",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_name())
    }
}

/// True when some dedicated adapter (anything but the fallback) handles `url`.
pub fn is_college_page(url: &str) -> bool {
    Site::for_url(url) != Site::Generic
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_urls() {
        let cases = [
            ("https://www.usnews.com/best-colleges/mit-2178", Site::UsNews),
            ("https://www.niche.com/colleges/stanford-university/", Site::Niche),
            ("https://bigfuture.collegeboard.org/colleges/yale", Site::CollegeBoard),
            ("https://www.princetonreview.com/college/brown", Site::PrincetonReview),
            ("https://www.collegedata.com/college-search/rice", Site::CollegeData),
            ("https://www.stanford.edu/admission/", Site::Edu),
            ("https://en.wikipedia.org/wiki/Harvard", Site::Generic),
            ("", Site::Generic),
        ];
        for (url, site) in cases {
            assert_eq!(Site::for_url(url), site, "{}", url);
        }
    }

    #[test]
    fn edu_never_shadows_vendor() {
        let urls = [
            "https://www.usnews.com/best-colleges/mit.edu-profile",
            "https://www.niche.com/colleges/x/?ref=www.mit.edu",
            "https://bigfuture.collegeboard.org/colleges/a.edu",
            "https://www.princetonreview.com/college/b.edu",
            "https://www.collegedata.com/c.edu",
        ];
        for url in urls {
            let site = Site::for_url(url);
            assert_ne!(site, Site::Edu, "{}", url);
            assert_ne!(site, Site::Generic, "{}", url);
        }
    }

    #[test]
    fn vendor_precedence_is_fixed() {
        // Both patterns present: the earlier entry wins
        assert_eq!(
            Site::for_url("https://www.niche.com/?from=usnews.com"),
            Site::UsNews
        );
    }

    #[test]
    fn college_page_detection() {
        assert!(is_college_page("https://www.harvard.edu/"));
        assert!(!is_college_page("https://example.com/"));
        assert_eq!(Site::Edu.to_string(), "Official Website");
    }
}
