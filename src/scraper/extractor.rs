use crate::model::{Record, ScraperError};
use crate::parser::{ListingParser, Parser};
use crate::scraper::fetcher::build_page_url;
use crate::scraper::traits::PageSource;

use futures::future::join_all;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// Fetches a fixed budget of listing pages and turns them into records.
///
/// Every page is fetched concurrently under its own timeout. A page that fails
/// to download or parse contributes nothing; the rest of the batch is kept.
/// Output keeps page order, then row order within a page.
pub struct RecordExtractor<S: PageSource> {
    source: S,
    parser: ListingParser,
    max_pages: u32,
    page_timeout: Duration,
}

impl<S: PageSource> RecordExtractor<S> {
    pub fn new(source: S, usd_rate: f64, max_pages: u32, page_timeout: Duration) -> Result<Self, ScraperError> {
        if max_pages == 0 {
            return Err(ScraperError::ZeroPageBudget);
        }
        Ok(Self {
            source,
            parser: ListingParser::new(usd_rate),
            max_pages,
            page_timeout,
        })
    }

    pub async fn extract(&self, locator: &str) -> Vec<Record> {
        let pages = (1..=self.max_pages).map(|page| self.extract_page(locator, page));
        let records: Vec<Record> = join_all(pages).await.into_iter().flatten().collect();

        info!("Extracted {} records from {} pages of {}", records.len(), self.max_pages, locator);
        records
    }

    async fn extract_page(&self, locator: &str, page: u32) -> Vec<Record> {
        let url = build_page_url(locator, page);

        let html = match timeout(self.page_timeout, self.source.fetch(&url)).await {
            Ok(Ok(html)) => html,
            Ok(Err(e)) => {
                warn!("Skipping page {}: {}", url, e);
                return Vec::new();
            }
            Err(_) => {
                warn!("Skipping page {}: {}", url, ScraperError::Timeout);
                return Vec::new();
            }
        };

        match self.parser.parse(&html) {
            Ok(records) => records,
            Err(e) => {
                warn!("Skipping page {}: {}", url, e);
                Vec::new()
            }
        }
    }
}
