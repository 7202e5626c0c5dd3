use scraper::{CaseSensitivity, ElementRef, Html, Selector};
use tracing::debug;

/// The handful of queries the extractors need from a piece of markup.
///
/// Extractors are written against this trait so they never touch the
/// HTML library directly. Patterns are CSS selectors.
pub trait Fragment: Copy {
    /// All descendants matching `pattern`, in document order.
    fn find_all(&self, pattern: &str) -> Vec<Self>;

    /// The immediately preceding element sibling, if it matches `pattern`.
    fn prev_sibling(&self, pattern: &str) -> Option<Self>;

    /// Descendant text, whitespace collapsed and trimmed.
    fn text_content(&self) -> String;

    /// Text of direct child text nodes only, ignoring nested elements.
    fn own_text(&self) -> String;

    fn attribute(&self, name: &str) -> Option<String>;

    fn has_class(&self, class: &str) -> bool;

    fn find_first(&self, pattern: &str) -> Option<Self> {
        self.find_all(pattern).into_iter().next()
    }

    fn select_text(&self, pattern: &str) -> String {
        self.find_first(pattern)
            .map(|f| f.text_content())
            .unwrap_or_default()
    }

    fn select_own_text(&self, pattern: &str) -> String {
        self.find_first(pattern)
            .map(|f| f.own_text())
            .unwrap_or_default()
    }
}

impl<'a> Fragment for ElementRef<'a> {
    fn find_all(&self, pattern: &str) -> Vec<Self> {
        parse_selector(pattern)
            .map(|selector| self.select(&selector).collect())
            .unwrap_or_default()
    }

    fn prev_sibling(&self, pattern: &str) -> Option<Self> {
        let selector = parse_selector(pattern)?;
        let prev = self.prev_siblings().find_map(ElementRef::wrap)?;
        selector.matches(&prev).then_some(prev)
    }

    fn text_content(&self) -> String {
        normalize_ws(&self.text().collect::<Vec<_>>().join(" "))
    }

    fn own_text(&self) -> String {
        let parts: Vec<&str> = self
            .children()
            .filter_map(|child| child.value().as_text())
            .map(|t| &**t)
            .collect();
        normalize_ws(&parts.join(" "))
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_string)
    }

    fn has_class(&self, class: &str) -> bool {
        self.value().has_class(class, CaseSensitivity::CaseSensitive)
    }
}

pub fn parse_document(html: &str) -> Html {
    Html::parse_document(html)
}

fn parse_selector(pattern: &str) -> Option<Selector> {
    match Selector::parse(pattern) {
        Ok(selector) => Some(selector),
        Err(e) => {
            debug!(pattern, error = ?e, "invalid selector");
            None
        }
    }
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
