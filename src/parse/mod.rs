//! HTML extraction for listing and author profile pages.
//!
//! Parsing is synchronous and returns owned values: a parsed `Html` document
//! never lives across an await point in the crawler.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::SelectorConfig;
use crate::models::{TITLE_NOT_FOUND, URL_NOT_FOUND};

/// Errors building a parser
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("Invalid site origin '{origin}': {reason}")]
    Origin { origin: String, reason: String },
}

/// An author link as found on the listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorLink {
    pub name: String,
    pub profile_url: String,
}

/// One paper-result element of a listing page, before affiliations are known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingItem {
    pub title: String,
    pub url: String,
    pub authors: Vec<AuthorLink>,
}

/// Compiled selectors plus the origin relative links are resolved against
#[derive(Debug, Clone)]
pub struct MarkupParser {
    origin: Url,
    paper_item: Selector,
    author_block: Selector,
    affiliation_section: Selector,
    link: Selector,
    line: Selector,
}

impl MarkupParser {
    pub fn new(origin: &str, selectors: &SelectorConfig) -> Result<Self, ParseError> {
        let origin = Url::parse(origin).map_err(|e| ParseError::Origin {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            origin,
            paper_item: compile(&selectors.paper_item)?,
            author_block: compile(&selectors.author_block)?,
            affiliation_section: compile(&selectors.affiliation_section)?,
            link: compile("a[href]")?,
            line: compile("div")?,
        })
    }

    /// Extract every paper-result element of a listing page, in document order
    pub fn parse_listing(&self, markup: &str) -> Vec<ListingItem> {
        let document = Html::parse_document(markup);

        document
            .select(&self.paper_item)
            .map(|item| self.parse_item(&item))
            .collect()
    }

    fn parse_item(&self, item: &ElementRef) -> ListingItem {
        let anchor = item.select(&self.link).next();

        let title = anchor
            .map(|a| element_text(&a))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| TITLE_NOT_FOUND.to_string());

        let url = anchor
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| self.absolute(href))
            .unwrap_or_else(|| URL_NOT_FOUND.to_string());

        // Only the first author block belongs to the paper
        let authors = item
            .select(&self.author_block)
            .next()
            .map(|block| {
                block
                    .select(&self.link)
                    .filter_map(|a| {
                        let href = a.value().attr("href")?;
                        Some(AuthorLink {
                            name: element_text(&a),
                            profile_url: self
                                .absolute(href)
                                .unwrap_or_else(|| self.origin.to_string()),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        ListingItem {
            title,
            url,
            authors,
        }
    }

    /// Affiliation lines of a profile page joined with `", "`.
    ///
    /// Returns `None` when the page has no affiliation section. A section whose
    /// lines are all blank yields an empty string.
    pub fn parse_affiliation(&self, markup: &str) -> Option<String> {
        let document = Html::parse_document(markup);
        let section = document.select(&self.affiliation_section).next()?;

        let lines: Vec<String> = section
            .select(&self.line)
            .filter(|div| div.id() != section.id())
            .map(|div| own_text(&div))
            .filter(|text| !text.is_empty())
            .collect();

        Some(lines.join(", "))
    }

    /// Resolve an href against the site origin; `None` for an empty href
    pub fn absolute(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }

        match self.origin.join(href) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                tracing::debug!(href, error = %e, "Could not resolve link");
                Some(format!("{}{}", self.origin.as_str().trim_end_matches('/'), href))
            }
        }
    }
}

fn compile(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Text of `div` outside its nested `div`s, whitespace collapsed; nested
/// `div`s are lines of their own
fn own_text(div: &ElementRef) -> String {
    let mut words = Vec::new();
    collect_own_words(*div, &mut words);
    words.join(" ")
}

fn collect_own_words<'a>(element: ElementRef<'a>, words: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            words.extend(text.split_whitespace());
        } else if let Some(nested) = ElementRef::wrap(child) {
            if nested.value().name() != "div" {
                collect_own_words(nested, words);
            }
        }
    }
}

/// Visible text with whitespace collapsed
fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
