use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::normalize::collapse_ws;

/// Upper bound on elements visited per query; stat scans never walk a whole page.
pub const MAX_ELEMENTS: usize = 200;

/// Parsed page content queried by CSS selector.
pub struct Page {
    doc: Html,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        Page {
            doc: Html::parse_document(html),
        }
    }

    /// Document `<title>`, whitespace-collapsed. Empty when missing.
    pub fn title(&self) -> String {
        self.first_text("title")
    }

    /// Text of the first element matching `css`, or "" on a miss.
    pub fn first_text(&self, css: &str) -> String {
        self.elements(css)
            .first()
            .map(|el| element_text(*el))
            .unwrap_or_default()
    }

    /// Text of the first heading matching `css`, falling back to the title.
    pub fn heading_or_title(&self, css: &str) -> String {
        let heading = self.first_text(css);
        if heading.is_empty() {
            self.title()
        } else {
            heading
        }
    }

    /// Elements matching `css` in document order, capped at [`MAX_ELEMENTS`].
    pub fn elements(&self, css: &str) -> Vec<ElementRef<'_>> {
        match selector(css) {
            Some(sel) => self.doc.select(&sel).take(MAX_ELEMENTS).collect(),
            None => Vec::new(),
        }
    }

    /// `content` attribute of `<meta name="...">`.
    pub fn meta_content(&self, name: &str) -> Option<String> {
        let css = format!(r#"meta[name="{}"]"#, name);
        self.elements(&css)
            .first()
            .and_then(|el| el.value().attr("content"))
            .map(collapse_ws)
    }
}

/// Concatenated descendant text of `el`, whitespace-collapsed.
pub fn element_text(el: ElementRef<'_>) -> String {
    collapse_ws(&el.text().collect::<String>())
}

/// Text of the first descendant of `el` matching `css`, or "".
pub fn child_text(el: ElementRef<'_>, css: &str) -> String {
    child_elements(el, css)
        .first()
        .map(|c| element_text(*c))
        .unwrap_or_default()
}

pub fn child_elements<'a>(el: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(sel) => el.select(&sel).take(MAX_ELEMENTS).collect(),
        None => Vec::new(),
    }
}

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            debug!("Bad selector {:?}: {:?}", css, e);
            None
        }
    }
}
