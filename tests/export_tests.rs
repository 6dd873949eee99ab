//! End-to-end tests: crawl scripted pages and write the export files

use proceedings_scraper::browser::MockSession;
use proceedings_scraper::config::Config;
use proceedings_scraper::crawler::PageCrawler;
use proceedings_scraper::export::{export_to_file, OutputFormat};
use proceedings_scraper::utils::NoopSleeper;
use proceedings_scraper::PaperEntry;
use std::sync::Arc;
use tempfile::TempDir;

fn scripted_session() -> MockSession {
    let listing = Config::default().site.listing_url(1);
    let markup = r#"<html><body>
        <div class="result-item-align">
            <h3><a href="/document/11/">Graph Kernels, Revisited</a></h3>
            <p class="author"><a href="/author/1"><span>Ada Lovelace</span></a>; <a href="/author/2"><span>Alan Turing</span></a></p>
        </div>
        <div class="result-item-align">
            <h3><a href="/document/12/">Front Matter</a></h3>
        </div>
    </body></html>"#;

    MockSession::new()
        .route(&listing, markup)
        .route(
            "https://ieeexplore.ieee.org/author/1",
            r#"<div class="current-affiliation"><div>Analytical Engines Ltd</div><div>London</div></div>"#,
        )
        .route(
            "https://ieeexplore.ieee.org/author/2",
            "<html><body><p>Profile unavailable</p></body></html>",
        )
}

async fn crawl_papers() -> Vec<PaperEntry> {
    let mut crawler = PageCrawler::new(scripted_session(), &Config::default())
        .unwrap()
        .with_sleeper(Arc::new(NoopSleeper));
    crawler.run(1, 1).await.unwrap()
}

#[tokio::test]
async fn test_csv_export_has_one_row_per_author() {
    let papers = crawl_papers().await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("papers.csv");

    let written = export_to_file(&papers, &path, OutputFormat::Csv).unwrap();
    assert_eq!(written, 2);

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers: Vec<String> = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    assert_eq!(
        headers,
        vec![
            "Paper Title",
            "Paper URL",
            "Author Name",
            "Author Profile URL",
            "Author Affiliation"
        ]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "Graph Kernels, Revisited");
    assert_eq!(&rows[0][1], "https://ieeexplore.ieee.org/document/11/");
    assert_eq!(&rows[0][4], "Analytical Engines Ltd, London");
    assert_eq!(&rows[1][2], "Alan Turing");
    assert_eq!(&rows[1][4], "N/A");
}

#[tokio::test]
async fn test_json_export_keeps_authorless_papers() {
    let papers = crawl_papers().await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("papers.json");

    let written = export_to_file(&papers, &path, OutputFormat::Json).unwrap();
    assert_eq!(written, 2);

    let content = std::fs::read_to_string(&path).unwrap();
    let parsed: Vec<PaperEntry> = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed, papers);
    assert!(parsed[1].authors.is_empty());
}

#[tokio::test]
async fn test_empty_crawl_writes_header_only() {
    let session = MockSession::new().route(
        &Config::default().site.listing_url(1),
        "<html><body></body></html>",
    );
    let mut crawler = PageCrawler::new(session, &Config::default())
        .unwrap()
        .with_sleeper(Arc::new(NoopSleeper));
    let papers = crawler.run(1, 1).await.unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.csv");
    assert_eq!(export_to_file(&papers, &path, OutputFormat::Csv).unwrap(), 0);

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.starts_with("Paper Title,"));
}
