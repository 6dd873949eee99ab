//! Mock browser session for testing purposes.
//!
//! Pages are scripted per URL. Each navigation to a URL consumes the next
//! scripted visit for it; the last visit is reused once the queue runs down, so
//! a single `route` call serves every navigation to that URL. Element waits
//! resolve immediately by matching the selector against the scripted markup.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use super::{BrowserError, BrowserSession};

/// Markup of the entry committed for a failed navigation
const ERROR_PAGE: &str = "<html><body><div id=\"main-frame-error\"></div></body></html>";

/// A scripted result of navigating to a URL
#[derive(Debug, Clone)]
enum Visit {
    Page(String),
    Unreachable(String),
}

/// A browser session serving scripted pages from memory
#[derive(Debug, Default)]
pub struct MockSession {
    routes: HashMap<String, VecDeque<Visit>>,
    history: Vec<(String, String)>,
    navigations: Vec<String>,
    back_navigations: usize,
    fail_back: bool,
    closed: bool,
}

impl MockSession {
    /// Create a mock session with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `markup` on the next navigation to `url`
    pub fn route(mut self, url: &str, markup: impl Into<String>) -> Self {
        self.push(url, Visit::Page(markup.into()));
        self
    }

    /// Fail the next navigation to `url`
    pub fn unreachable(mut self, url: &str, reason: &str) -> Self {
        self.push(url, Visit::Unreachable(reason.to_string()));
        self
    }

    /// Make every history navigation fail
    pub fn failing_back(mut self) -> Self {
        self.fail_back = true;
        self
    }

    fn push(&mut self, url: &str, visit: Visit) {
        self.routes
            .entry(url.to_string())
            .or_default()
            .push_back(visit);
    }

    fn next_visit(&mut self, url: &str) -> Option<Visit> {
        let queue = self.routes.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    fn current(&self) -> Result<&(String, String), BrowserError> {
        self.history
            .last()
            .ok_or_else(|| BrowserError::Protocol("no page loaded".to_string()))
    }

    fn ensure_open(&self) -> Result<(), BrowserError> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        Ok(())
    }

    /// Every URL navigated to, in order, including failed navigations
    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    /// Number of navigations to `url`
    pub fn navigation_count(&self, url: &str) -> usize {
        self.navigations.iter().filter(|u| *u == url).count()
    }

    /// Number of history navigations requested
    pub fn back_navigations(&self) -> usize {
        self.back_navigations
    }

    /// URL of the page currently shown
    pub fn current_url(&self) -> Option<&str> {
        self.history.last().map(|(url, _)| url.as_str())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        self.navigations.push(url.to_string());

        let (markup, result) = match self.next_visit(url) {
            Some(Visit::Page(markup)) => (markup, Ok(())),
            Some(Visit::Unreachable(reason)) => {
                (ERROR_PAGE.to_string(), Err(BrowserError::navigation(url, reason)))
            }
            None => (ERROR_PAGE.to_string(), Err(BrowserError::navigation(url, "no route"))),
        };

        // Failed loads still commit an error page; reloading the current URL
        // replaces its history entry
        if self.current_url() == Some(url) {
            self.history.pop();
        }
        self.history.push((url.to_string(), markup));
        result
    }

    async fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        self.ensure_open()?;
        let (_, markup) = self.current()?;

        let parsed = Selector::parse(selector)
            .map_err(|e| BrowserError::Protocol(format!("invalid selector '{selector}': {e}")))?;
        let present = Html::parse_document(markup).select(&parsed).next().is_some();

        if present {
            Ok(())
        } else {
            Err(BrowserError::Timeout {
                selector: selector.to_string(),
                waited: timeout,
            })
        }
    }

    async fn current_markup(&mut self) -> Result<String, BrowserError> {
        self.ensure_open()?;
        Ok(self.current()?.1.clone())
    }

    async fn go_back(&mut self) -> Result<(), BrowserError> {
        self.ensure_open()?;
        self.back_navigations += 1;

        if self.fail_back {
            return Err(BrowserError::navigation("history.back", "history unavailable"));
        }
        if self.history.len() < 2 {
            return Err(BrowserError::navigation("history.back", "no previous page"));
        }
        self.history.pop();
        Ok(())
    }

    async fn quit(&mut self) -> Result<(), BrowserError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(15);

    #[tokio::test]
    async fn test_navigate_and_wait() {
        let mut session = MockSession::new().route("http://a", "<div class='x'>hi</div>");

        session.navigate("http://a").await.unwrap();
        assert!(session.wait_for_element("div.x", WAIT).await.is_ok());

        let err = session.wait_for_element("div.y", WAIT).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_visits_are_consumed_then_sticky() {
        let mut session = MockSession::new()
            .route("http://a", "first")
            .route("http://a", "second");

        session.navigate("http://a").await.unwrap();
        assert!(session.current_markup().await.unwrap().contains("first"));
        session.navigate("http://a").await.unwrap();
        assert!(session.current_markup().await.unwrap().contains("second"));
        session.navigate("http://a").await.unwrap();
        assert!(session.current_markup().await.unwrap().contains("second"));
        assert_eq!(session.navigation_count("http://a"), 3);
    }

    #[tokio::test]
    async fn test_unknown_and_unreachable_routes() {
        let mut session = MockSession::new().unreachable("http://down", "refused");

        assert!(matches!(
            session.navigate("http://down").await,
            Err(BrowserError::Navigation { .. })
        ));
        assert!(matches!(
            session.navigate("http://nowhere").await,
            Err(BrowserError::Navigation { .. })
        ));
        assert_eq!(session.navigations().len(), 2);
    }

    #[tokio::test]
    async fn test_go_back_restores_previous_page() {
        let mut session = MockSession::new()
            .route("http://list", "list")
            .route("http://profile", "profile");

        session.navigate("http://list").await.unwrap();
        session.navigate("http://profile").await.unwrap();
        session.go_back().await.unwrap();

        assert_eq!(session.current_url(), Some("http://list"));
        assert_eq!(session.back_navigations(), 1);
        assert!(session.go_back().await.is_err());
    }

    #[tokio::test]
    async fn test_same_url_navigation_replaces_entry() {
        let mut session = MockSession::new()
            .route("http://list", "list")
            .route("http://profile", "profile");

        session.navigate("http://list").await.unwrap();
        session.navigate("http://profile").await.unwrap();
        session.navigate("http://profile").await.unwrap();
        session.go_back().await.unwrap();

        assert_eq!(session.current_url(), Some("http://list"));
    }

    #[tokio::test]
    async fn test_failed_navigation_commits_error_entry() {
        let mut session = MockSession::new()
            .route("http://list", "list")
            .unreachable("http://profile", "net::ERR_CONNECTION_RESET");

        session.navigate("http://list").await.unwrap();
        assert!(session.navigate("http://profile").await.is_err());
        assert_eq!(session.current_url(), Some("http://profile"));
        assert!(session.current_markup().await.unwrap().contains("main-frame-error"));

        session.go_back().await.unwrap();
        assert_eq!(session.current_url(), Some("http://list"));
    }

    #[tokio::test]
    async fn test_closed_session_rejects_calls() {
        let mut session = MockSession::new().route("http://a", "a");
        session.quit().await.unwrap();

        assert!(session.is_closed());
        assert_eq!(
            session.navigate("http://a").await.unwrap_err(),
            BrowserError::Closed
        );
    }
}
