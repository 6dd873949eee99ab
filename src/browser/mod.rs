//! Browser sessions driving a rendering engine.
//!
//! The crawler talks to the browser only through the [`BrowserSession`] trait.
//! Markup returned by [`BrowserSession::current_markup`] must reflect the DOM
//! after scripts have run, so a plain HTTP fetch is not a valid implementation.
//!
//! - [`ChromeSession`]: headless Chromium over the DevTools protocol
//! - [`MockSession`]: scripted in-memory pages for tests

mod chrome;
pub mod mock;

pub use chrome::ChromeSession;
pub use mock::MockSession;

use async_trait::async_trait;
use std::time::Duration;

/// A single browser tab with one current location.
///
/// Every method takes `&mut self`: a session has exactly one owner and
/// navigation always replaces the current page.
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url` in the current tab
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Block until an element matching `selector` is present, or `timeout` elapses
    async fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError>;

    /// Rendered markup of the current page
    async fn current_markup(&mut self) -> Result<String, BrowserError>;

    /// Return to the previous entry in the tab history
    async fn go_back(&mut self) -> Result<(), BrowserError>;

    /// Close the browser; the session is unusable afterwards
    async fn quit(&mut self) -> Result<(), BrowserError>;
}

/// Errors raised by a browser session
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BrowserError {
    /// The awaited element did not appear within the bound
    #[error("Timed out after {waited:?} waiting for '{selector}'")]
    Timeout { selector: String, waited: Duration },

    /// The page could not be loaded at all
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The browser process could not be started
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    /// DevTools protocol or script evaluation failure
    #[error("Browser protocol error: {0}")]
    Protocol(String),

    /// The session was already closed
    #[error("Browser session is closed")]
    Closed,
}

impl BrowserError {
    pub fn navigation(url: &str, reason: impl std::fmt::Display) -> Self {
        BrowserError::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BrowserError::Timeout { .. })
    }
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::Protocol(err.to_string())
    }
}
