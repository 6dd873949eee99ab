//! Core data models for crawled proceedings and their export projection.

mod export;
mod paper;

pub use export::ExportRow;
pub use paper::{
    AuthorRef, PaperEntry, AFFILIATION_NOT_AVAILABLE, TITLE_NOT_FOUND, URL_NOT_FOUND,
};
