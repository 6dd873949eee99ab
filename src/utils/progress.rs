//! Progress bars for long crawls.
//!
//! One bar tracks listing pages; a transient bar tracks the articles of the
//! page being processed. Both are hidden when progress output is disabled.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};

/// Progress display over the pages of a crawl
#[derive(Debug, Clone)]
pub struct CrawlProgress {
    multi: MultiProgress,
    pages: ProgressBar,
    enabled: bool,
}

impl CrawlProgress {
    /// Create a page progress bar for `total_pages` pages
    pub fn new(total_pages: u64) -> Self {
        let multi = MultiProgress::new();
        let pages = multi.add(ProgressBar::new(total_pages));
        pages.set_style(
            ProgressStyle::with_template("{msg}\n{spinner:.cyan} {wide_bar:.cyan/blue} {pos}/{len} pages ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );

        Self {
            multi,
            pages,
            enabled: true,
        }
    }

    /// A progress display that draws nothing
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            pages: ProgressBar::hidden(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Announce the page being scraped
    pub fn start_page(&self, page: u32) {
        self.pages.set_message(format!("Scraping page {}", page));
    }

    /// Mark the current page as done
    pub fn finish_page(&self) {
        self.pages.inc(1);
    }

    /// Bar over the articles of the current page; clear it when done
    pub fn articles(&self, count: usize) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let bar = self.multi.add(ProgressBar::new(count as u64));
        bar.set_style(
            ProgressStyle::with_template("  {bar:30.green/white} {pos}/{len} articles {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    }

    /// Finish the page bar with a summary message
    pub fn finish(&self, papers: usize) {
        self.pages
            .finish_with_message(format!("✓ Collected {} papers", papers));
    }

    /// Number of pages marked done
    pub fn pages_done(&self) -> u64 {
        self.pages.position()
    }

    /// A stderr writer that clears the bars while each log line is printed
    pub fn log_writer(&self) -> ProgressLogWriter {
        ProgressLogWriter {
            multi: self.multi.clone(),
        }
    }
}

/// Writes to stderr with the progress bars suspended
#[derive(Debug, Clone)]
pub struct ProgressLogWriter {
    multi: MultiProgress,
}

impl Write for ProgressLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.multi.suspend(|| io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl Default for CrawlProgress {
    fn default() -> Self {
        Self::hidden()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_progress_still_counts() {
        let progress = CrawlProgress::hidden();
        assert!(!progress.is_enabled());

        progress.start_page(1);
        progress.finish_page();
        progress.finish_page();
        assert_eq!(progress.pages_done(), 2);
    }

    #[test]
    fn test_hidden_article_bar() {
        let progress = CrawlProgress::hidden();
        let bar = progress.articles(5);
        bar.inc(2);
        assert!(bar.is_hidden());
        bar.finish_and_clear();
    }

    #[test]
    fn test_log_writer_consumes_whole_lines() {
        let progress = CrawlProgress::hidden();
        let mut writer = progress.log_writer();

        assert_eq!(writer.write(b"page 1 done\n").unwrap(), 12);
        writer.flush().unwrap();
    }

    #[test]
    fn test_log_writer_keeps_bars_intact() {
        let progress = CrawlProgress::new(3);
        progress.start_page(1);
        let mut writer = progress.log_writer();

        writer.write_all(b"INFO Scraping page 1\n").unwrap();
        progress.finish_page();
        assert_eq!(progress.pages_done(), 1);
        assert!(progress.is_enabled());
    }
}
