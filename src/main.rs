use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use proceedings_scraper::browser::ChromeSession;
use proceedings_scraper::config::{find_config_file, get_config, load_config, Config};
use proceedings_scraper::crawler::PageCrawler;
use proceedings_scraper::export::{export_to_file, OutputFormat};
use proceedings_scraper::utils::{CrawlProgress, ProgressLogWriter};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Proceedings Scraper - Collect papers, authors and affiliations from a proceedings listing
#[derive(Parser, Debug)]
#[command(name = "proceedings-scraper")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Collect papers, authors and affiliations from a conference proceedings listing", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Export format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    /// One row per (paper, author) pair
    Csv,
    /// Nested papers with their authors
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => OutputFormat::Csv,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl the listing pages and export the results
    #[command(alias = "c")]
    Crawl(CrawlArgs),

    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        #[arg(default_value = "proceedings-scraper.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug, Default)]
struct CrawlArgs {
    /// First listing page (overrides config)
    #[arg(long)]
    first_page: Option<u32>,

    /// Last listing page (overrides config)
    #[arg(long)]
    last_page: Option<u32>,

    /// Output file (overrides config)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Output format (overrides config)
    #[arg(long, short, value_enum)]
    format: Option<Format>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Disable progress bars
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from file if specified or found in default locations
    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
    } else if let Some(config_path) = find_config_file() {
        load_config(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
    } else {
        get_config().context("Failed to read configuration from environment")?
    };

    match cli.command {
        Some(Commands::InitConfig { path, force }) => {
            init_tracing(cli.verbose, cli.quiet, &config, CrawlProgress::hidden().log_writer());

            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
        command => {
            let args = match command {
                Some(Commands::Crawl(args)) => args,
                _ => CrawlArgs::default(),
            };
            apply_overrides(&mut config, &args);

            let progress = if cli.quiet || args.no_progress || !std::io::stderr().is_terminal() {
                CrawlProgress::hidden()
            } else {
                let pages = config.site.last_page.saturating_sub(config.site.first_page);
                CrawlProgress::new(u64::from(pages) + 1)
            };

            // Log lines share stderr with the bars
            init_tracing(cli.verbose, cli.quiet, &config, progress.log_writer());
            crawl(config, progress, cli.quiet).await
        }
    }
}

/// Initialize tracing based on verbosity and the config file
fn init_tracing(verbose: u8, quiet: bool, config: &Config, writer: ProgressLogWriter) {
    let log_level = match verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if quiet { "error" } else { log_level };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| format!("proceedings_scraper={}", env_filter)),
    );

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format.as_deref() == Some("json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(move || writer.clone()),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(move || writer.clone()))
            .init();
    }
}

fn apply_overrides(config: &mut Config, args: &CrawlArgs) {
    if let Some(first) = args.first_page {
        config.site.first_page = first;
    }
    if let Some(last) = args.last_page {
        config.site.last_page = last;
    }
    if let Some(output) = &args.output {
        config.output.path = output.clone();
    }
    if let Some(format) = args.format {
        config.output.format = format.into();
    }
    if args.headful {
        config.browser.headless = false;
    }
}

async fn crawl(config: Config, progress: CrawlProgress, quiet: bool) -> Result<()> {
    let first = config.site.first_page;
    let last = config.site.last_page;

    let session = ChromeSession::launch(&config.browser)
        .await
        .context("Could not start the browser")?;

    let mut crawler = PageCrawler::new(session, &config)?.with_progress(progress);
    let result = crawler.crawl(first, last).await;

    if let Err(e) = crawler.shutdown().await {
        tracing::warn!("Failed to close browser cleanly: {}", e);
    }

    let report = result?;
    for failure in &report.failed_pages {
        tracing::warn!(
            page = failure.page,
            url = %failure.url,
            "Page failed: {}",
            failure.reason
        );
    }
    if !report.skipped_pages.is_empty() {
        tracing::warn!(pages = ?report.skipped_pages, "Pages skipped after waiting for results");
    }

    let written = export_to_file(&report.papers, &config.output.path, config.output.format)
        .with_context(|| format!("Failed to write {}", config.output.path.display()))?;

    if !quiet {
        println!(
            "Data saved to {} ({} records from {} papers, {} authors; {} affiliations unresolved)",
            config.output.path.display(),
            written,
            report.papers.len(),
            report.author_count(),
            report.affiliations_exhausted
        );
    }
    Ok(())
}
