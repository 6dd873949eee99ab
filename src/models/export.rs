//! Flat export rows, one per (paper, author) pair.

use serde::{Deserialize, Serialize};

use super::{AuthorRef, PaperEntry};

/// One exported record
///
/// Field names map onto the column headers of the tabular export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "Paper Title")]
    pub paper_title: String,

    #[serde(rename = "Paper URL")]
    pub paper_url: String,

    #[serde(rename = "Author Name")]
    pub author_name: String,

    #[serde(rename = "Author Profile URL")]
    pub author_profile_url: String,

    #[serde(rename = "Author Affiliation")]
    pub author_affiliation: String,
}

impl ExportRow {
    pub fn new(paper: &PaperEntry, author: &AuthorRef) -> Self {
        Self {
            paper_title: paper.title.clone(),
            paper_url: paper.url.clone(),
            author_name: author.name.clone(),
            author_profile_url: author.profile_url.clone(),
            author_affiliation: author.affiliation.clone(),
        }
    }

    /// Column headers in export order
    pub const HEADERS: [&'static str; 5] = [
        "Paper Title",
        "Paper URL",
        "Author Name",
        "Author Profile URL",
        "Author Affiliation",
    ];
}
