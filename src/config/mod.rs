//! Configuration management.
//!
//! Settings are read from a TOML file and can be overridden with environment
//! variables prefixed with `PROCEEDINGS_SCRAPER`, using `__` between section and
//! key (e.g. `PROCEEDINGS_SCRAPER_TIMING__MAX_ATTEMPTS=5`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [site]
//! origin = "https://ieeexplore.ieee.org"
//! conference_id = "10609961"
//! issue_number = "10609862"
//! first_page = 1
//! last_page = 71
//!
//! [selectors]
//! paper_item = "div.result-item-align"
//! author_block = "p.author"
//! affiliation_section = "div.current-affiliation"
//!
//! [timing]
//! listing_wait_secs = 15
//! profile_wait_secs = 15
//! after_listing_secs = 3
//! profile_settle_secs = 3
//! retry_delay_secs = 5
//! back_settle_secs = 3
//! backoff_multiplier = 1.0
//! max_attempts = 3
//!
//! [browser]
//! headless = true
//! window_width = 1366
//! window_height = 900
//!
//! [output]
//! path = "IEEE_Xplore_Papers.csv"
//! format = "csv"
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::export::OutputFormat;

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "proceedings-scraper.toml";

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "PROCEEDINGS_SCRAPER";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Listing site and page range
    #[serde(default)]
    pub site: SiteConfig,

    /// CSS selectors for the page markers
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Waits, pauses and retry budget
    #[serde(default)]
    pub timing: TimingConfig,

    /// Browser launch settings
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Export destination
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Write this configuration as TOML
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

/// Site the listing pages are fetched from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Scheme and host that relative links are joined against
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Conference home identifier in the listing path
    #[serde(default = "default_conference_id")]
    pub conference_id: String,

    /// Proceedings issue number in the listing query
    #[serde(default = "default_issue_number")]
    pub issue_number: String,

    /// First listing page (inclusive)
    #[serde(default = "default_first_page")]
    pub first_page: u32,

    /// Last listing page (inclusive)
    #[serde(default = "default_last_page")]
    pub last_page: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            conference_id: default_conference_id(),
            issue_number: default_issue_number(),
            first_page: default_first_page(),
            last_page: default_last_page(),
        }
    }
}

impl SiteConfig {
    /// Listing URL for a page number
    pub fn listing_url(&self, page: u32) -> String {
        format!(
            "{}/xpl/conhome/{}/proceeding?isnumber={}&sortType=vol-only-seq&pageNumber={}",
            self.origin.trim_end_matches('/'),
            self.conference_id,
            self.issue_number,
            page
        )
    }
}

fn default_origin() -> String {
    "https://ieeexplore.ieee.org".to_string()
}

fn default_conference_id() -> String {
    "10609961".to_string()
}

fn default_issue_number() -> String {
    "10609862".to_string()
}

fn default_first_page() -> u32 {
    1
}

fn default_last_page() -> u32 {
    71
}

/// Selectors for the DOM markers the crawler waits on and parses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default = "default_paper_item")]
    pub paper_item: String,

    #[serde(default = "default_author_block")]
    pub author_block: String,

    #[serde(default = "default_affiliation_section")]
    pub affiliation_section: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            paper_item: default_paper_item(),
            author_block: default_author_block(),
            affiliation_section: default_affiliation_section(),
        }
    }
}

fn default_paper_item() -> String {
    "div.result-item-align".to_string()
}

fn default_author_block() -> String {
    "p.author".to_string()
}

fn default_affiliation_section() -> String {
    "div.current-affiliation".to_string()
}

/// Timing configuration, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Bound on the wait for listing result items
    #[serde(default = "default_wait_secs")]
    pub listing_wait_secs: u64,

    /// Bound on the wait for the affiliation section
    #[serde(default = "default_wait_secs")]
    pub profile_wait_secs: u64,

    /// Pause after each listing page
    #[serde(default = "default_settle_secs")]
    pub after_listing_secs: f64,

    /// Pause after navigating to a profile
    #[serde(default = "default_settle_secs")]
    pub profile_settle_secs: f64,

    /// Pause before retrying a profile
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: f64,

    /// Pause after returning to the listing
    #[serde(default = "default_settle_secs")]
    pub back_settle_secs: f64,

    /// Growth factor for the retry pause (1.0 keeps it constant)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Profile load attempts per author
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            listing_wait_secs: default_wait_secs(),
            profile_wait_secs: default_wait_secs(),
            after_listing_secs: default_settle_secs(),
            profile_settle_secs: default_settle_secs(),
            retry_delay_secs: default_retry_delay_secs(),
            back_settle_secs: default_settle_secs(),
            backoff_multiplier: default_backoff_multiplier(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl TimingConfig {
    pub fn listing_wait(&self) -> Duration {
        Duration::from_secs(self.listing_wait_secs)
    }

    pub fn profile_wait(&self) -> Duration {
        Duration::from_secs(self.profile_wait_secs)
    }
}

fn default_wait_secs() -> u64 {
    15
}

fn default_settle_secs() -> f64 {
    3.0
}

fn default_retry_delay_secs() -> f64 {
    5.0
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_max_attempts() -> u32 {
    3
}

/// Browser launch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Chromium binary; auto-detected when unset
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Extra command line switches passed to Chromium
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: default_window_width(),
            window_height: default_window_height(),
            executable: None,
            args: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_window_width() -> u32 {
    1366
}

fn default_window_height() -> u32 {
    900
}

/// Export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: OutputFormat::default(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("IEEE_Xplore_Papers.csv")
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `"json"` for structured output, plain text otherwise
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Load configuration from a file, with environment overrides applied on top
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(env_source())
        .build()?;

    settings.try_deserialize()
}

/// Defaults with environment overrides applied, for runs without a config file
pub fn get_config() -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder().add_source(env_source()).build()?;

    settings.try_deserialize()
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Look for a configuration file in the working directory, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("proceedings-scraper").join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.site.first_page, 1);
        assert_eq!(config.site.last_page, 71);
        assert_eq!(config.timing.max_attempts, 3);
        assert_eq!(config.timing.retry_delay_secs, 5.0);
        assert_eq!(config.selectors.paper_item, "div.result-item-align");
        assert!(config.browser.headless);
        assert_eq!(config.output.path, PathBuf::from("IEEE_Xplore_Papers.csv"));
    }

    #[test]
    fn test_listing_url_template() {
        let site = SiteConfig::default();
        assert_eq!(
            site.listing_url(7),
            "https://ieeexplore.ieee.org/xpl/conhome/10609961/proceeding?isnumber=10609862&sortType=vol-only-seq&pageNumber=7"
        );
    }

    #[test]
    fn test_listing_url_ignores_trailing_slash() {
        let site = SiteConfig {
            origin: "http://localhost:8080/".to_string(),
            ..SiteConfig::default()
        };
        assert!(site
            .listing_url(1)
            .starts_with("http://localhost:8080/xpl/conhome/"));
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(
            &path,
            r#"
[site]
first_page = 4
last_page = 9

[timing]
max_attempts = 5
retry_delay_secs = 0.5

[output]
path = "out.json"
format = "json"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.site.first_page, 4);
        assert_eq!(config.site.last_page, 9);
        assert_eq!(config.site.conference_id, "10609961");
        assert_eq!(config.timing.max_attempts, 5);
        assert_eq!(config.timing.retry_delay_secs, 0.5);
        assert_eq!(config.timing.listing_wait_secs, 15);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.selectors, SelectorConfig::default());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.site.last_page = 3;
        config.browser.args.push("--no-sandbox".to_string());
        config.save(&path).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.site.last_page, 3);
        assert_eq!(loaded.browser.args, vec!["--no-sandbox".to_string()]);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let path = PathBuf::from("/nonexistent/proceedings-scraper.toml");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");
        std::fs::write(&path, "invalid = toml = content").unwrap();

        assert!(load_config(&path).is_err());
    }
}
