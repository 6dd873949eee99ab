//! Sequential crawl over proceedings listing pages.
//!
//! For every listing page the crawler waits for the result items, parses them,
//! and visits each author's profile to read the current affiliation. Profile
//! visits replace the browser's current page, so after every author the session
//! navigates back to the listing before the next author is processed.
//!
//! A listing page that cannot be loaded is recorded as a [`PageFailure`] and the
//! crawl moves on; a listing page whose result items never appear is skipped.

mod affiliation;

pub use affiliation::{AffiliationOutcome, AffiliationState};

use std::sync::Arc;
use std::time::Duration;

use crate::browser::{BrowserError, BrowserSession};
use crate::config::{Config, SelectorConfig, SiteConfig};
use crate::models::{AuthorRef, PaperEntry};
use crate::parse::{MarkupParser, ParseError};
use crate::utils::{CrawlProgress, DelayPolicy, Pause, RetryConfig, Sleeper, TokioSleeper};

/// Errors that stop a crawl before it starts
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("Invalid page range {first}..={last}: pages are numbered from 1")]
    InvalidRange { first: u32, last: u32 },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A listing page that could not be processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub page: u32,
    pub url: String,
    pub reason: String,
}

/// How processing of a single listing page ended
#[derive(Debug, Clone, PartialEq)]
pub enum ListingStatus {
    /// Every result item was processed
    Complete,
    /// The result items never appeared; nothing was collected
    Skipped,
    /// The browser failed mid-page; papers collected so far are kept
    Abandoned(BrowserError),
}

/// Papers collected from one listing page
#[derive(Debug, Clone, PartialEq)]
pub struct ListingScrape {
    pub papers: Vec<PaperEntry>,
    pub status: ListingStatus,
    pub affiliations_resolved: usize,
    pub affiliations_exhausted: usize,
}

impl ListingScrape {
    fn new() -> Self {
        Self {
            papers: Vec::new(),
            status: ListingStatus::Complete,
            affiliations_resolved: 0,
            affiliations_exhausted: 0,
        }
    }

    fn with_status(status: ListingStatus) -> Self {
        Self {
            status,
            ..Self::new()
        }
    }
}

/// Everything a crawl produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlReport {
    /// Papers in traversal order
    pub papers: Vec<PaperEntry>,
    pub pages_visited: u32,
    /// Pages whose result items never appeared
    pub skipped_pages: Vec<u32>,
    /// Pages that could not be loaded or were abandoned
    pub failed_pages: Vec<PageFailure>,
    pub affiliations_resolved: usize,
    /// Authors recorded with the sentinel: retries exhausted or section unreadable
    pub affiliations_exhausted: usize,
}

impl CrawlReport {
    fn absorb(&mut self, page: u32, url: &str, scrape: ListingScrape) {
        self.papers.extend(scrape.papers);
        self.affiliations_resolved += scrape.affiliations_resolved;
        self.affiliations_exhausted += scrape.affiliations_exhausted;

        match scrape.status {
            ListingStatus::Complete => {}
            ListingStatus::Skipped => self.skipped_pages.push(page),
            ListingStatus::Abandoned(err) => self.failed_pages.push(PageFailure {
                page,
                url: url.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    /// Total number of authors across all papers
    pub fn author_count(&self) -> usize {
        self.papers.iter().map(|p| p.authors.len()).sum()
    }

    /// Whether every page was processed without skips or failures
    pub fn is_clean(&self) -> bool {
        self.skipped_pages.is_empty() && self.failed_pages.is_empty()
    }
}

/// Drives a browser session over a range of listing pages.
///
/// The crawler owns the session for its whole lifetime; use
/// [`PageCrawler::shutdown`] to close it or [`PageCrawler::into_session`] to
/// take it back.
pub struct PageCrawler<S> {
    session: S,
    site: SiteConfig,
    selectors: SelectorConfig,
    parser: MarkupParser,
    listing_wait: Duration,
    profile_wait: Duration,
    delays: DelayPolicy,
    retry: RetryConfig,
    sleeper: Arc<dyn Sleeper>,
    progress: CrawlProgress,
}

impl<S: BrowserSession> PageCrawler<S> {
    pub fn new(session: S, config: &Config) -> Result<Self, CrawlError> {
        let parser = MarkupParser::new(&config.site.origin, &config.selectors)?;

        Ok(Self {
            session,
            site: config.site.clone(),
            selectors: config.selectors.clone(),
            parser,
            listing_wait: config.timing.listing_wait(),
            profile_wait: config.timing.profile_wait(),
            delays: DelayPolicy::from_timing(&config.timing),
            retry: RetryConfig::from_timing(&config.timing),
            sleeper: Arc::new(TokioSleeper),
            progress: CrawlProgress::hidden(),
        })
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_delays(mut self, delays: DelayPolicy) -> Self {
        self.delays = delays;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_progress(mut self, progress: CrawlProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn into_session(self) -> S {
        self.session
    }

    /// Close the browser session
    pub async fn shutdown(mut self) -> Result<(), BrowserError> {
        self.session.quit().await
    }

    /// Crawl pages `first_page..=last_page` and return the papers found
    pub async fn run(
        &mut self,
        first_page: u32,
        last_page: u32,
    ) -> Result<Vec<PaperEntry>, CrawlError> {
        Ok(self.crawl(first_page, last_page).await?.papers)
    }

    /// Crawl pages `first_page..=last_page`, reporting skipped and failed pages
    pub async fn crawl(
        &mut self,
        first_page: u32,
        last_page: u32,
    ) -> Result<CrawlReport, CrawlError> {
        if first_page == 0 || first_page > last_page {
            return Err(CrawlError::InvalidRange {
                first: first_page,
                last: last_page,
            });
        }

        let mut report = CrawlReport::default();

        for page in first_page..=last_page {
            let url = self.site.listing_url(page);
            tracing::info!(page, "Scraping page {}", page);
            self.progress.start_page(page);
            report.pages_visited += 1;

            match self.session.navigate(&url).await {
                Ok(()) => {
                    let scrape = self.scrape_listing(&url).await;
                    tracing::info!(
                        page,
                        papers = scrape.papers.len(),
                        "Finished page {}",
                        page
                    );
                    report.absorb(page, &url, scrape);
                }
                Err(err) => {
                    tracing::error!(page, url = %url, error = %err, "Listing page could not be loaded");
                    report.failed_pages.push(PageFailure {
                        page,
                        url,
                        reason: err.to_string(),
                    });
                }
            }

            self.progress.finish_page();
            self.pause(Pause::AfterListing).await;
        }

        self.progress.finish(report.papers.len());
        tracing::info!(
            papers = report.papers.len(),
            authors = report.author_count(),
            skipped = report.skipped_pages.len(),
            failed = report.failed_pages.len(),
            "Crawl finished"
        );
        Ok(report)
    }

    /// Collect the papers of the listing page the session is currently showing.
    ///
    /// `listing_url` is where the session returns after each author profile.
    pub async fn scrape_listing(&mut self, listing_url: &str) -> ListingScrape {
        if let Err(err) = self
            .session
            .wait_for_element(&self.selectors.paper_item, self.listing_wait)
            .await
        {
            if err.is_timeout() {
                tracing::warn!(url = listing_url, "Timeout waiting for papers to load");
                return ListingScrape::with_status(ListingStatus::Skipped);
            }
            tracing::error!(url = listing_url, error = %err, "Listing page unusable");
            return ListingScrape::with_status(ListingStatus::Abandoned(err));
        }

        let markup = match self.session.current_markup().await {
            Ok(markup) => markup,
            Err(err) => {
                tracing::error!(url = listing_url, error = %err, "Could not read listing markup");
                return ListingScrape::with_status(ListingStatus::Abandoned(err));
            }
        };

        let items = self.parser.parse_listing(&markup);
        tracing::debug!(count = items.len(), "Found paper entries");

        let mut scrape = ListingScrape::new();
        let bar = self.progress.articles(items.len());

        for item in items {
            let mut paper = PaperEntry::new(item.title, item.url);

            for link in item.authors {
                let outcome = self
                    .resolve_affiliation(&link.name, &link.profile_url)
                    .await;
                if outcome.is_resolved() {
                    scrape.affiliations_resolved += 1;
                } else {
                    scrape.affiliations_exhausted += 1;
                }

                paper.push_author(AuthorRef::new(
                    link.name,
                    link.profile_url,
                    outcome.into_affiliation(),
                ));

                if let Err(err) = self.return_to_listing(listing_url).await {
                    tracing::error!(url = listing_url, error = %err, "Lost the listing page, abandoning it");
                    scrape.papers.push(paper);
                    scrape.status = ListingStatus::Abandoned(err);
                    bar.finish_and_clear();
                    return scrape;
                }
            }

            tracing::debug!(title = %paper.title, authors = paper.authors.len(), "Paper collected");
            scrape.papers.push(paper);
            bar.inc(1);
        }

        bar.finish_and_clear();
        scrape
    }

    /// Load an author profile until its affiliation section appears or the
    /// attempt budget runs out.
    ///
    /// Leaves the session on the profile page; the caller navigates back.
    pub async fn resolve_affiliation(&mut self, author: &str, profile_url: &str) -> AffiliationOutcome {
        let max_attempts = self.retry.max_attempts;
        let mut state = AffiliationState::NotStarted.start();

        while let AffiliationState::Attempting(attempt) = state {
            state = match self.attempt_profile(profile_url).await {
                Ok(Some(affiliation)) => state.advance(Ok(affiliation), max_attempts),
                Ok(None) => {
                    tracing::warn!(
                        url = profile_url,
                        "Affiliation section for {} vanished before parsing",
                        author
                    );
                    state.section_missing()
                }
                Err(err) => {
                    if self.retry.allows_retry_after(attempt) {
                        tracing::warn!(
                            error = %err,
                            "Retrying loading author profile for {} (Attempt {})",
                            author,
                            attempt + 1
                        );
                    } else {
                        tracing::warn!(
                            error = %err,
                            "Failed to load author profile for {} after {} attempts",
                            author,
                            attempt
                        );
                    }
                    state.advance(Err(err), max_attempts)
                }
            };

            if matches!(state, AffiliationState::Attempting(_)) {
                self.sleeper.sleep(self.retry.delay_after(attempt)).await;
            }
        }

        AffiliationOutcome::from(state)
    }

    /// `Ok(None)` when the marker appeared but the markup holds no section
    async fn attempt_profile(&mut self, profile_url: &str) -> Result<Option<String>, BrowserError> {
        self.session.navigate(profile_url).await?;
        self.pause(Pause::ProfileSettle).await;
        self.session
            .wait_for_element(&self.selectors.affiliation_section, self.profile_wait)
            .await?;

        let markup = self.session.current_markup().await?;
        Ok(self.parser.parse_affiliation(&markup))
    }

    /// Go back to the listing page once, reloading it directly if history fails
    async fn return_to_listing(&mut self, listing_url: &str) -> Result<(), BrowserError> {
        let result = match self.session.go_back().await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(error = %err, "Back navigation failed, reloading listing page");
                self.session.navigate(listing_url).await
            }
        };

        self.pause(Pause::AfterBack).await;
        result
    }

    async fn pause(&self, pause: Pause) {
        self.sleeper.sleep(self.delays.delay_for(pause)).await;
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for PageCrawler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCrawler")
            .field("session", &self.session)
            .field("site", &self.site)
            .field("delays", &self.delays)
            .field("retry", &self.retry)
            .finish()
    }
}
