//! # Proceedings Scraper
//!
//! Crawls a conference proceedings listing in a real browser, visits every
//! author's profile to read their current affiliation, and exports one row per
//! (paper, author) pair.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`crawler`]: The page-by-page crawl and the affiliation retry state machine
//! - [`browser`]: The [`BrowserSession`] trait with Chromium and mock implementations
//! - [`parse`]: HTML extraction for listing and profile pages
//! - [`models`]: Paper, author and export row types
//! - [`export`]: CSV and JSON writers
//! - [`utils`]: Delay policy, retry budget and progress display
//! - [`config`]: Configuration management

pub mod browser;
pub mod config;
pub mod crawler;
pub mod export;
pub mod models;
pub mod parse;
pub mod utils;

// Re-export commonly used types
pub use browser::{BrowserError, BrowserSession};
pub use crawler::{CrawlReport, PageCrawler};
pub use models::{AuthorRef, ExportRow, PaperEntry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
