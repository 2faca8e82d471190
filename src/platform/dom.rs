//! Small query layer over `scraper` used by the site parsers
//!
//! A [`Document`] is built explicitly from each decoded fragment and handed to
//! the parser that needs it. Malformed selectors never panic: they simply
//! match nothing.

use scraper::{ElementRef, Html, Selector};

/// Parsed HTML document
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a full page or a loose fragment
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// All elements matching `selector`, in document order
    pub fn select(&self, selector: &str) -> Vec<Node<'_>> {
        match Selector::parse(selector) {
            Ok(sel) => self.html.select(&sel).map(Node::new).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// First element matching `selector`
    pub fn first(&self, selector: &str) -> Option<Node<'_>> {
        let sel = Selector::parse(selector).ok()?;
        self.html.select(&sel).next().map(Node::new)
    }

    pub fn count(&self, selector: &str) -> usize {
        self.select(selector).len()
    }

    pub fn exists(&self, selector: &str) -> bool {
        self.first(selector).is_some()
    }

    /// Text of every match concatenated, trimmed
    pub fn text(&self, selector: &str) -> String {
        let joined: String = self
            .select(selector)
            .iter()
            .map(|node| node.raw_text())
            .collect();
        joined.trim().to_string()
    }

    /// Text of the first match, trimmed
    pub fn first_text(&self, selector: &str) -> String {
        self.first(selector).map(|node| node.text()).unwrap_or_default()
    }

    /// Attribute of the first match; empty values count as missing
    pub fn attr(&self, selector: &str, name: &str) -> Option<String> {
        self.first(selector)
            .and_then(|node| node.attr(name))
            .map(str::to_string)
    }
}

/// Handle to one element of a [`Document`]
#[derive(Clone, Copy)]
pub struct Node<'a> {
    element: ElementRef<'a>,
}

impl<'a> Node<'a> {
    fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    fn raw_text(&self) -> String {
        self.element.text().collect()
    }

    /// Descendant text, trimmed
    pub fn text(&self) -> String {
        self.raw_text().trim().to_string()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name).filter(|value| !value.is_empty())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.element.value().classes().any(|c| c == class)
    }

    /// First descendant matching `selector`
    pub fn find(&self, selector: &str) -> Option<Node<'a>> {
        let sel = Selector::parse(selector).ok()?;
        self.element.select(&sel).next().map(Node::new)
    }

    /// Every descendant matching `selector`
    pub fn find_all(&self, selector: &str) -> Vec<Node<'a>> {
        match Selector::parse(selector) {
            Ok(sel) => self.element.select(&sel).map(Node::new).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Text of every descendant match concatenated, trimmed
    pub fn find_text(&self, selector: &str) -> String {
        let joined: String = self
            .find_all(selector)
            .iter()
            .map(|node| node.raw_text())
            .collect();
        joined.trim().to_string()
    }
}

/// First candidate that is not blank
pub fn first_non_empty<I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    candidates.into_iter().find(|text| !text.trim().is_empty())
}
