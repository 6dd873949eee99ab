//! Chromium-backed browser session.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    GetNavigationHistoryParams, NavigateToHistoryEntryParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use super::{BrowserError, BrowserSession};
use crate::config::BrowserConfig;

/// Interval between element lookups while waiting for a selector
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Upper bound on restoring a history entry
const HISTORY_TIMEOUT: Duration = Duration::from_secs(30);

/// A single Chromium tab driven over the DevTools protocol
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: Option<JoinHandle<()>>,
    closed: bool,
}

impl ChromeSession {
    /// Launch Chromium and open a blank tab
    pub async fn launch(config: &BrowserConfig) -> Result<Self, BrowserError> {
        let mut builder =
            CdpBrowserConfig::builder().window_size(config.window_width, config.window_height);

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &config.executable {
            builder = builder.chrome_executable(executable);
        }
        for arg in &config.args {
            builder = builder.arg(arg.as_str());
        }

        let cdp_config = builder.build().map_err(BrowserError::Launch)?;

        tracing::info!(headless = config.headless, "Launching browser");

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // The handler must be polled for any CDP command to complete
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page,
            handler: Some(handle),
            closed: false,
        })
    }

    /// Poll until the tab shows `url` and its document has finished loading
    async fn wait_until_showing(&self, url: &str) -> Result<(), BrowserError> {
        let deadline = Instant::now() + HISTORY_TIMEOUT;

        loop {
            if self.page.url().await?.as_deref() == Some(url) {
                let state: String = self
                    .page
                    .evaluate("document.readyState")
                    .await?
                    .into_value()
                    .map_err(|e| BrowserError::Protocol(e.to_string()))?;
                if state == "complete" {
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::navigation(url, "history entry did not finish loading"));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    fn ensure_open(&self) -> Result<(), BrowserError> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        Ok(())
    }
}

/// Index of the history entry before `current_index`, if there is one
fn previous_entry_index(current_index: i64, entries: usize) -> Option<usize> {
    let index = usize::try_from(current_index.checked_sub(1)?).ok()?;
    (index < entries).then_some(index)
}

impl std::fmt::Debug for ChromeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromeSession")
            .field("closed", &self.closed)
            .finish()
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        tracing::debug!(url, "Navigating");

        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::navigation(url, e))?;
        Ok(())
    }

    async fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        self.ensure_open()?;
        let deadline = Instant::now() + timeout;

        loop {
            match self.page.find_element(selector).await {
                Ok(_) => return Ok(()),
                Err(err) => {
                    if Instant::now() >= deadline {
                        tracing::debug!(selector, error = %err, "Element never appeared");
                        return Err(BrowserError::Timeout {
                            selector: selector.to_string(),
                            waited: timeout,
                        });
                    }
                }
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn current_markup(&mut self) -> Result<String, BrowserError> {
        self.ensure_open()?;
        Ok(self.page.content().await?)
    }

    async fn go_back(&mut self) -> Result<(), BrowserError> {
        self.ensure_open()?;

        let history = self
            .page
            .execute(GetNavigationHistoryParams::default())
            .await?
            .result;
        let previous = previous_entry_index(history.current_index, history.entries.len())
            .and_then(|index| history.entries.get(index))
            .ok_or_else(|| BrowserError::navigation("history.back", "no previous page"))?;
        let (entry_id, target) = (previous.id, previous.url.clone());

        self.page
            .execute(NavigateToHistoryEntryParams::new(entry_id))
            .await
            .map_err(|e| BrowserError::navigation(&target, e))?;
        self.wait_until_showing(&target).await
    }

    async fn quit(&mut self) -> Result<(), BrowserError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        self.browser.close().await?;
        if let Some(handle) = self.handler.take() {
            if let Err(e) = handle.await {
                tracing::warn!("Browser handler task ended abnormally: {}", e);
            }
        }

        tracing::info!("Browser closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_entry_index() {
        // listing, profile: back goes to the listing
        assert_eq!(previous_entry_index(1, 2), Some(0));
        assert_eq!(previous_entry_index(3, 4), Some(2));
    }

    #[test]
    fn test_no_previous_entry() {
        assert_eq!(previous_entry_index(0, 1), None);
        assert_eq!(previous_entry_index(-1, 0), None);
        assert_eq!(previous_entry_index(5, 2), None);
        assert_eq!(previous_entry_index(i64::MIN, 3), None);
    }
}
