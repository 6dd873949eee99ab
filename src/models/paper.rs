//! Paper and author records extracted from a proceedings listing.

use serde::{Deserialize, Serialize};

/// Placeholder title for a result item without a usable anchor
pub const TITLE_NOT_FOUND: &str = "Title Not Found";

/// Placeholder URL for a result item without a usable anchor target
pub const URL_NOT_FOUND: &str = "URL Not Found";

/// Placeholder affiliation when the profile never yields an affiliation section
pub const AFFILIATION_NOT_AVAILABLE: &str = "N/A";

/// An author as listed under a paper, with the affiliation taken from their profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    /// Display name as shown on the listing page
    pub name: String,

    /// Absolute URL of the author's profile page
    pub profile_url: String,

    /// Comma-joined affiliation lines, or [`AFFILIATION_NOT_AVAILABLE`]
    pub affiliation: String,
}

impl AuthorRef {
    pub fn new(
        name: impl Into<String>,
        profile_url: impl Into<String>,
        affiliation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            profile_url: profile_url.into(),
            affiliation: affiliation.into(),
        }
    }

    /// Whether the affiliation could not be resolved
    pub fn affiliation_missing(&self) -> bool {
        self.affiliation == AFFILIATION_NOT_AVAILABLE
    }
}

/// A paper found on a listing page
///
/// Authors keep the order in which they appear on the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperEntry {
    /// Paper title, or [`TITLE_NOT_FOUND`]
    pub title: String,

    /// Absolute paper URL, or [`URL_NOT_FOUND`]
    pub url: String,

    /// Authors in listing order
    #[serde(default)]
    pub authors: Vec<AuthorRef>,
}

impl PaperEntry {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            authors: Vec::new(),
        }
    }

    /// Entry used when a result item carries no title anchor
    pub fn untitled() -> Self {
        Self::new(TITLE_NOT_FOUND, URL_NOT_FOUND)
    }

    /// Append a resolved author
    pub fn push_author(&mut self, author: AuthorRef) {
        self.authors.push(author);
    }

    pub fn has_title(&self) -> bool {
        self.title != TITLE_NOT_FOUND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untitled_uses_sentinels() {
        let paper = PaperEntry::untitled();
        assert_eq!(paper.title, TITLE_NOT_FOUND);
        assert_eq!(paper.url, URL_NOT_FOUND);
        assert!(!paper.has_title());
        assert!(paper.authors.is_empty());
    }

    #[test]
    fn test_authors_keep_insertion_order() {
        let mut paper = PaperEntry::new("A Study", "https://example.org/document/1");
        paper.push_author(AuthorRef::new("Ada", "https://example.org/author/1", "Univ X"));
        paper.push_author(AuthorRef::new(
            "Grace",
            "https://example.org/author/2",
            AFFILIATION_NOT_AVAILABLE,
        ));

        let names: Vec<_> = paper.authors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Grace"]);
        assert!(!paper.authors[0].affiliation_missing());
        assert!(paper.authors[1].affiliation_missing());
    }

    #[test]
    fn test_paper_serializes_nested_authors() {
        let mut paper = PaperEntry::new("T", "U");
        paper.push_author(AuthorRef::new("N", "P", "A"));

        let json = serde_json::to_value(&paper).unwrap();
        assert_eq!(json["authors"][0]["profile_url"], "P");

        let back: PaperEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, paper);
    }
}
