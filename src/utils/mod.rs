//! Utility modules supporting the crawl.
//!
//! - [`DelayPolicy`]: fixed pauses between page visits
//! - [`Sleeper`]: the clock the crawler pauses on, swappable in tests
//! - [`RetryConfig`]: attempt budget and backoff for author profile loads
//! - [`CrawlProgress`]: terminal progress bars over pages and articles
//!
//! # Zero-delay crawling in tests
//!
//! ```rust
//! use proceedings_scraper::utils::{DelayPolicy, NoopSleeper, Pause, Sleeper};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let policy = DelayPolicy::none();
//! NoopSleeper.sleep(policy.delay_for(Pause::AfterListing)).await;
//! # }
//! ```

mod delay;
mod progress;
mod retry;

pub use delay::{DelayPolicy, NoopSleeper, Pause, RecordingSleeper, Sleeper, TokioSleeper};
pub use progress::{CrawlProgress, ProgressLogWriter};
pub use retry::RetryConfig;
